//! Length × width × height extraction from free-text part numbers and specs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

static DIMENSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+)[x×X*]([0-9]+)[x×X*]([0-9]+)").expect("dimension pattern is valid")
});

/// Map full-width digits (U+FF10..U+FF19) to ASCII.
fn fold_full_width_digits(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| ('０'..='９').contains(&c)) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match c {
                '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
                other => other,
            })
            .collect(),
    )
}

/// An ordered (length, width, height) triple. `(1, 2, 3)` and `(3, 2, 1)` are different sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    pub length: u32,
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(length: u32, width: u32, height: u32) -> Self {
        Self {
            length,
            width,
            height,
        }
    }
}

impl From<(u32, u32, u32)> for Dimensions {
    fn from((length, width, height): (u32, u32, u32)) -> Self {
        Self::new(length, width, height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.length, self.width, self.height)
    }
}

/// Return the first `AxBxC` triple found in `text`.
///
/// Each separator may independently be `x`, `×`, `X` or `*`. Text without such a
/// pattern yields `None`, as does a triple whose numbers do not fit in a `u32`.
/// Full-width digits count as their ASCII counterparts.
pub fn extract_dimensions(text: Option<&str>) -> Option<Dimensions> {
    let text = fold_full_width_digits(text?.trim());
    let captures = DIMENSION_PATTERN.captures(&text)?;

    let length = captures.get(1)?.as_str().parse().ok()?;
    let width = captures.get(2)?.as_str().parse().ok()?;
    let height = captures.get(3)?.as_str().parse().ok()?;

    Some(Dimensions::new(length, width, height))
}
