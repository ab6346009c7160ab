//! Mark label canonicalization.

/// Spellings that all mean "this item carries no distinguishing mark".
const NO_MARK_ALIASES: &[&str] = &["无标记", "无标", "标记"];

/// Canonical value every "no mark" spelling folds onto.
pub const NO_MARK: &str = "";

/// Normalize a mark label for comparison.
///
/// Absent input becomes the empty string. Anything else is trimmed and lowercased,
/// then the known "no mark" spellings are folded onto [`NO_MARK`].
pub fn normalize_mark(value: Option<&str>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    let folded = value.trim().to_lowercase();
    if NO_MARK_ALIASES.contains(&folded.as_str()) {
        NO_MARK.to_string()
    } else {
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_mark_spellings_fold_together() {
        let a = normalize_mark(Some("无标记"));
        let b = normalize_mark(Some("标记"));
        let c = normalize_mark(Some(" 无标 "));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a, NO_MARK);
    }

    #[test]
    fn test_blank_and_absent_equal_no_mark() {
        assert_eq!(normalize_mark(None), NO_MARK);
        assert_eq!(normalize_mark(Some("")), NO_MARK);
        assert_eq!(normalize_mark(Some("   ")), NO_MARK);
    }

    #[test]
    fn test_other_marks_pass_through_lowercased() {
        assert_eq!(normalize_mark(Some("  Red-A ")), "red-a");
        assert_eq!(normalize_mark(Some("有标")), "有标");
    }
}
