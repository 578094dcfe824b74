//! Output formatting for export runs
//!
//! This module provides:
//! - Plain-text rendering of result cells for tabular files
//! - Summary and dry-run output in text or JSON
//! - Table rendering for previews and listings

use std::borrow::Cow;

use serde_json::Value;

pub mod summary;
pub mod table;

pub use summary::SummaryFormatter;
pub use table::{TableFormatter, TableStyle};

/// Render a result cell as plain text
///
/// Strings are written raw, null becomes an empty field, numbers and
/// booleans use their display form, and arrays or objects become compact
/// JSON.
///
/// # Arguments
/// * `value` - Cell value returned by the executor
///
/// # Returns
/// * `Cow<str>` - Text for the cell
pub fn cell_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!("abc")), "abc");
        assert_eq!(cell_text(&json!(42)), "42");
        assert_eq!(cell_text(&json!(1.5)), "1.5");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&json!(["a", "b"])), "[\"a\",\"b\"]");
        assert_eq!(cell_text(&json!({"k": 1})), "{\"k\":1}");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
