//! Locating worksheet parts inside an xlsx package.

use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

use crate::error::{ReconcileError, Result};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A `<sheet>` entry from `xl/workbook.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub rel_id: String,
}

pub fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ReconcileError::Package(format!("missing part {}", name)));
        }
        Err(err) => return Err(err.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

pub fn parse_sheet_entries(workbook_xml: &str) -> Result<Vec<SheetEntry>> {
    let doc = roxmltree::Document::parse(workbook_xml)?;

    Ok(doc
        .descendants()
        .filter(|node| node.tag_name().name() == "sheet")
        .filter_map(|node| {
            let name = node.attribute("name")?;
            let rel_id = node.attribute((RELATIONSHIPS_NS, "id")).or_else(|| {
                node.attributes()
                    .find(|attr| attr.name() == "id")
                    .map(|attr| attr.value())
            })?;
            Some(SheetEntry {
                name: name.to_string(),
                rel_id: rel_id.to_string(),
            })
        })
        .collect())
}

/// Relationship id → absolute part name, for relationships declared in `xl/_rels/workbook.xml.rels`.
pub fn parse_relationship_targets(rels_xml: &str) -> Result<HashMap<String, String>> {
    let doc = roxmltree::Document::parse(rels_xml)?;

    Ok(doc
        .descendants()
        .filter(|node| node.tag_name().name() == "Relationship")
        .filter_map(|node| {
            let id = node.attribute("Id")?;
            let target = node.attribute("Target")?;
            Some((id.to_string(), resolve_target("xl", target)))
        })
        .collect())
}

/// Resolve a relationship target against the directory of the part that declared it.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Zip part name of the worksheet called `sheet_name`.
pub fn worksheet_part<R: Read + Seek>(archive: &mut ZipArchive<R>, sheet_name: &str) -> Result<String> {
    let sheets = parse_sheet_entries(&read_part(archive, WORKBOOK_PART)?)?;
    let targets = parse_relationship_targets(&read_part(archive, WORKBOOK_RELS_PART)?)?;

    let sheet = sheets
        .iter()
        .find(|s| s.name == sheet_name)
        .ok_or_else(|| ReconcileError::SheetNotFound {
            sheet: sheet_name.to_string(),
            path: WORKBOOK_PART.to_string(),
        })?;

    targets.get(&sheet.rel_id).cloned().ok_or_else(|| {
        ReconcileError::Package(format!(
            "no relationship {} for sheet '{}'",
            sheet.rel_id, sheet.name
        ))
    })
}
