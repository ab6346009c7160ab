//! Streaming cell patcher for worksheet XML.
//!
//! Only the targeted `<c>` elements are replaced or inserted. Every other event in the
//! worksheet (formulas, styles, merged ranges, drawings) is copied through unchanged.
//! Patched cells are written as inline strings so numeric-looking codes stay text.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use std::io::Write;

use crate::error::{ReconcileError, Result};
use crate::table::CellPatch;

/// Column (zero-based) → text for one row.
type RowCells<'a> = BTreeMap<u32, &'a str>;

/// Convert zero-based coordinates to an A1 reference.
pub fn cell_reference(row: u32, col: u32) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

pub fn column_letters(col: u32) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Parse an A1 reference into zero-based (row, col).
pub fn parse_cell_reference(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        col = col.checked_mul(26)?.checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn is_element(element: &BytesStart<'_>, local: &[u8]) -> bool {
    element.local_name().as_ref() == local
}

fn element_prefix(element: &BytesStart<'_>) -> String {
    element
        .name()
        .prefix()
        .map(|p| format!("{}:", String::from_utf8_lossy(p.as_ref())))
        .unwrap_or_default()
}

fn qualified_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

struct Patcher<W: Write> {
    writer: Writer<W>,
    prefix: String,
}

impl<W: Write> Patcher<W> {
    fn name(&self, local: &str) -> String {
        format!("{}{}", self.prefix, local)
    }

    /// Write `<c r=".." t="inlineStr"><is><t>text</t></is></c>`, keeping `style` when replacing a cell.
    fn write_cell(&mut self, row: u32, col: u32, text: &str, style: Option<&str>) -> Result<()> {
        let reference = cell_reference(row, col);
        let c = self.name("c");
        let is = self.name("is");
        let t = self.name("t");

        let mut start = BytesStart::new(c.as_str());
        start.push_attribute(("r", reference.as_str()));
        if let Some(style) = style {
            start.push_attribute(("s", style));
        }
        start.push_attribute(("t", "inlineStr"));

        let mut text_start = BytesStart::new(t.as_str());
        if text.trim() != text {
            text_start.push_attribute(("xml:space", "preserve"));
        }

        self.writer.write_event(Event::Start(start))?;
        self.writer.write_event(Event::Start(BytesStart::new(is.as_str())))?;
        self.writer.write_event(Event::Start(text_start))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(t.as_str())))?;
        self.writer.write_event(Event::End(BytesEnd::new(is.as_str())))?;
        self.writer.write_event(Event::End(BytesEnd::new(c.as_str())))?;
        Ok(())
    }

    fn write_cells(&mut self, row: u32, cells: &RowCells<'_>) -> Result<()> {
        for (&col, text) in cells {
            self.write_cell(row, col, text, None)?;
        }
        Ok(())
    }

    /// Emit whole new `<row>` elements for pending rows numbered below `before`.
    fn write_rows_before(&mut self, pending: &mut BTreeMap<u32, RowCells<'_>>, before: u32) -> Result<()> {
        let rows: Vec<u32> = pending.range(..before).map(|(&row, _)| row).collect();
        for row in rows {
            let Some(cells) = pending.remove(&row) else {
                continue;
            };
            let name = self.name("row");
            let number = (row + 1).to_string();
            let mut start = BytesStart::new(name.as_str());
            start.push_attribute(("r", number.as_str()));

            self.writer.write_event(Event::Start(start))?;
            self.write_cells(row, &cells)?;
            self.writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        }
        Ok(())
    }
}

/// Cells still to be placed in the row currently being copied.
struct OpenRow<'a> {
    row: u32,
    cells: RowCells<'a>,
    last_col: Option<u32>,
}

impl<'a> OpenRow<'a> {
    /// Write patches that sort before `element` and report whether `element` itself is replaced.
    fn place_before<W: Write>(&mut self, patcher: &mut Patcher<W>, element: &BytesStart<'_>) -> Result<bool> {
        let col = attribute(element, b"r")
            .and_then(|r| parse_cell_reference(&r))
            .map(|(_, col)| col)
            .unwrap_or_else(|| self.last_col.map_or(0, |c| c + 1));
        self.last_col = Some(col);

        let earlier: Vec<u32> = self.cells.range(..col).map(|(&c, _)| c).collect();
        for c in earlier {
            if let Some(text) = self.cells.remove(&c) {
                patcher.write_cell(self.row, c, text, None)?;
            }
        }

        match self.cells.remove(&col) {
            Some(text) => {
                let style = attribute(element, b"s");
                patcher.write_cell(self.row, col, text, style.as_deref())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Apply `patches` to a worksheet part and return the new XML.
pub fn patch_worksheet_xml(xml: &[u8], patches: &[CellPatch]) -> Result<Vec<u8>> {
    let mut pending: BTreeMap<u32, RowCells<'_>> = BTreeMap::new();
    for patch in patches {
        pending
            .entry(patch.row)
            .or_default()
            .insert(patch.col, patch.text.as_str());
    }

    let mut reader = Reader::from_reader(xml);
    let mut patcher = Patcher {
        writer: Writer::new(Vec::with_capacity(xml.len() + patches.len() * 64)),
        prefix: String::new(),
    };

    let mut in_sheet_data = false;
    let mut next_row: u32 = 0;
    let mut open_row: Option<OpenRow<'_>> = None;
    // Depth inside a replaced `<c>` whose original content is being dropped.
    let mut skipping: Option<usize> = None;

    loop {
        let event = reader.read_event()?;

        if let Some(depth) = skipping {
            skipping = match event {
                Event::Start(_) => Some(depth + 1),
                Event::End(_) if depth == 0 => None,
                Event::End(_) => Some(depth - 1),
                Event::Eof => {
                    return Err(ReconcileError::Package(
                        "worksheet XML ended inside a cell".to_string(),
                    ));
                }
                _ => Some(depth),
            };
            continue;
        }

        match event {
            Event::Eof => break,

            Event::Start(e) if is_element(&e, b"sheetData") => {
                patcher.prefix = element_prefix(&e);
                in_sheet_data = true;
                patcher.writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) if is_element(&e, b"sheetData") => {
                patcher.prefix = element_prefix(&e);
                let name = qualified_name(&e);
                patcher.writer.write_event(Event::Start(e))?;
                patcher.write_rows_before(&mut pending, u32::MAX)?;
                patcher.writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"sheetData" => {
                patcher.write_rows_before(&mut pending, u32::MAX)?;
                in_sheet_data = false;
                patcher.writer.write_event(Event::End(e))?;
            }

            Event::Start(e) if in_sheet_data && is_element(&e, b"row") => {
                let row = row_number(&e).unwrap_or(next_row);
                next_row = row + 1;
                patcher.write_rows_before(&mut pending, row)?;
                patcher.writer.write_event(Event::Start(e))?;
                open_row = pending.remove(&row).map(|cells| OpenRow {
                    row,
                    cells,
                    last_col: None,
                });
            }
            Event::Empty(e) if in_sheet_data && is_element(&e, b"row") => {
                let row = row_number(&e).unwrap_or(next_row);
                next_row = row + 1;
                patcher.write_rows_before(&mut pending, row)?;
                match pending.remove(&row) {
                    Some(cells) => {
                        let name = qualified_name(&e);
                        patcher.writer.write_event(Event::Start(e))?;
                        patcher.write_cells(row, &cells)?;
                        patcher.writer.write_event(Event::End(BytesEnd::new(name)))?;
                    }
                    None => patcher.writer.write_event(Event::Empty(e))?,
                }
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"row" => {
                if let Some(state) = open_row.take() {
                    patcher.write_cells(state.row, &state.cells)?;
                }
                patcher.writer.write_event(Event::End(e))?;
            }

            Event::Start(e) if is_element(&e, b"c") && open_row.is_some() => {
                let replaced = match open_row.as_mut() {
                    Some(state) => state.place_before(&mut patcher, &e)?,
                    None => false,
                };
                if replaced {
                    skipping = Some(0);
                } else {
                    patcher.writer.write_event(Event::Start(e))?;
                }
            }
            Event::Empty(e) if is_element(&e, b"c") && open_row.is_some() => {
                let replaced = match open_row.as_mut() {
                    Some(state) => state.place_before(&mut patcher, &e)?,
                    None => false,
                };
                if !replaced {
                    patcher.writer.write_event(Event::Empty(e))?;
                }
            }

            other => patcher.writer.write_event(other)?,
        }
    }

    if !pending.is_empty() {
        return Err(ReconcileError::Package(
            "worksheet has no sheetData element".to_string(),
        ));
    }

    Ok(patcher.writer.into_inner())
}

/// Zero-based row index from a `<row r="N">` attribute.
fn row_number(element: &BytesStart<'_>) -> Option<u32> {
    attribute(element, b"r")?
        .parse::<u32>()
        .ok()
        .and_then(|r| r.checked_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(xml: &str, patches: &[CellPatch]) -> String {
        String::from_utf8(patch_worksheet_xml(xml.as_bytes(), patches).unwrap()).unwrap()
    }

    #[test]
    fn test_cell_reference_round_trip() {
        assert_eq!(cell_reference(0, 0), "A1");
        assert_eq!(cell_reference(9, 27), "AB10");
        assert_eq!(parse_cell_reference("AB10"), Some((9, 27)));
        assert_eq!(parse_cell_reference("$C$3"), Some((2, 2)));
        assert_eq!(parse_cell_reference("12"), None);
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
    }

    #[test]
    fn test_inserts_cell_in_column_order() {
        let xml = r#"<worksheet><sheetData><row r="2"><c r="A2" t="s"><v>0</v></c><c r="D2"><v>5</v></c></row></sheetData></worksheet>"#;
        let out = patch(xml, &[CellPatch::new(1, 2, "P-001")]);
        assert_eq!(
            out,
            r#"<worksheet><sheetData><row r="2"><c r="A2" t="s"><v>0</v></c><c r="C2" t="inlineStr"><is><t>P-001</t></is></c><c r="D2"><v>5</v></c></row></sheetData></worksheet>"#
        );
    }

    #[test]
    fn test_replaces_blank_cell_and_keeps_style() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1" s="3"/><c r="B1" s="4"><v></v></c></row></sheetData></worksheet>"#;
        let out = patch(xml, &[CellPatch::new(0, 1, "00123")]);
        assert_eq!(
            out,
            r#"<worksheet><sheetData><row r="1"><c r="A1" s="3"/><c r="B1" s="4" t="inlineStr"><is><t>00123</t></is></c></row></sheetData></worksheet>"#
        );
    }

    #[test]
    fn test_appends_after_last_cell_and_creates_missing_rows() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c></row><row r="3"/></sheetData></worksheet>"#;
        let out = patch(
            xml,
            &[
                CellPatch::new(0, 1, "x"),
                CellPatch::new(1, 1, "y"),
                CellPatch::new(2, 0, "z"),
                CellPatch::new(5, 0, "w"),
            ],
        );
        assert_eq!(
            out,
            concat!(
                r#"<worksheet><sheetData>"#,
                r#"<row r="1"><c r="A1"><v>1</v></c><c r="B1" t="inlineStr"><is><t>x</t></is></c></row>"#,
                r#"<row r="2"><c r="B2" t="inlineStr"><is><t>y</t></is></c></row>"#,
                r#"<row r="3"><c r="A3" t="inlineStr"><is><t>z</t></is></c></row>"#,
                r#"<row r="6"><c r="A6" t="inlineStr"><is><t>w</t></is></c></row>"#,
                r#"</sheetData></worksheet>"#
            )
        );
    }

    #[test]
    fn test_escapes_text_and_keeps_prefix() {
        let xml = r#"<x:worksheet xmlns:x="urn:x"><x:sheetData/></x:worksheet>"#;
        let out = patch(xml, &[CellPatch::new(0, 0, "A&B ")]);
        assert_eq!(
            out,
            r#"<x:worksheet xmlns:x="urn:x"><x:sheetData><x:row r="1"><x:c r="A1" t="inlineStr"><x:is><x:t xml:space="preserve">A&amp;B </x:t></x:is></x:c></x:row></x:sheetData></x:worksheet>"#
        );
    }

    #[test]
    fn test_untouched_without_patches() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet><sheetData><row r="1"><c r="A1"><f>SUM(B1:B2)</f><v>3</v></c></row></sheetData><mergeCells count="1"><mergeCell ref="A1:B1"/></mergeCells></worksheet>"#;
        assert_eq!(patch(xml, &[]), xml);
    }
}
