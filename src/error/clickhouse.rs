use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured error information extracted from a ClickHouse error response.
///
/// ClickHouse reports failures as a single text line of the form
/// `Code: 60. DB::Exception: <message>. (UNKNOWN_TABLE) (version 24.3.1.1)`
/// and repeats the numeric code in the `X-ClickHouse-Exception-Code` header.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerErrorInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    pub(crate) message: String,
}

impl ServerErrorInfo {
    /// Extract error info from the exception-code header and response body.
    ///
    /// # Arguments
    /// * `code_header` - Value of `X-ClickHouse-Exception-Code`, if present
    /// * `body` - Response body text
    ///
    /// # Returns
    /// * `Self` - Parsed error info; unparseable bodies keep the raw text
    pub fn from_response(code_header: Option<&str>, body: &str) -> Self {
        let line = body.trim().lines().next().unwrap_or("").trim();
        let line = strip_version(line);
        let (line, name) = split_error_name(line);

        let (body_code, message) = split_code(line);
        let message = message.strip_prefix("DB::Exception: ").unwrap_or(message);

        let code = code_header
            .and_then(|h| h.trim().parse().ok())
            .or(body_code);

        Self {
            code,
            name: name.map(str::to_string),
            message: message.to_string(),
        }
    }

    /// Numeric ClickHouse error code
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    /// Symbolic error name such as `UNKNOWN_TABLE`
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Human readable message without code and version decorations
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ServerErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, self.code) {
            (Some(name), Some(code)) => write!(f, "{name} ({code}): {}", self.message),
            (Some(name), None) => write!(f, "{name}: {}", self.message),
            (None, Some(code)) => write!(f, "code {code}: {}", self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

/// Drop a trailing `(version x.y.z)` suffix.
fn strip_version(line: &str) -> &str {
    match line.rfind(" (version ") {
        Some(idx) if line.ends_with(')') => line[..idx].trim_end(),
        _ => line,
    }
}

/// Split a trailing `(ERROR_NAME)` off the line.
fn split_error_name(line: &str) -> (&str, Option<&str>) {
    if let Some(without_paren) = line.strip_suffix(')') {
        if let Some(open) = without_paren.rfind('(') {
            let name = &without_paren[open + 1..];
            let is_name = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
            if is_name {
                return (line[..open].trim_end(), Some(name));
            }
        }
    }
    (line, None)
}

/// Split a leading `Code: N.` prefix off the line.
fn split_code(line: &str) -> (Option<i32>, &str) {
    let Some(rest) = line.strip_prefix("Code: ") else {
        return (None, line);
    };
    match rest.split_once(". ") {
        Some((digits, message)) => match digits.parse() {
            Ok(code) => (Some(code), message),
            Err(_) => (None, line),
        },
        None => (None, line),
    }
}
