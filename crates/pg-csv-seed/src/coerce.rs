//! Conversion of raw CSV fields into column values.
//!
//! Text and tolerant integer conversions never fail: blank or malformed input
//! becomes `None` (SQL NULL). Identifier conversion is strict and is the only
//! way a single field can fail a row.

/// Trim a text field, mapping blank input to `None`.
pub fn text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Like [`text`], but folds embedded line breaks into spaces first.
pub fn single_line(raw: &str) -> Option<String> {
    text(&raw.trim().replace("\r\n", " ").replace(['\n', '\r'], " "))
}

/// Tolerant integer conversion: blank, malformed or out-of-range input is `None`.
pub fn lenient_int(raw: &str) -> Option<i32> {
    raw.trim().parse().ok()
}

/// Strict identifier conversion used for primary and foreign keys.
///
/// The error names the offending column and value.
pub fn strict_id(raw: &str, column: &str) -> Result<i64, String> {
    let trimmed = raw.trim();
    trimmed
        .parse()
        .map_err(|_| format!("{} '{}' is not an integer", column, trimmed))
}
