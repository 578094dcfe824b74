use std::error::Error;

use serde::Serialize;

use super::clickhouse::ServerErrorInfo;
use super::kinds::{ExecutionError, ExportError};

/// Machine-readable description of a failed run.
///
/// Printed on stdout when the summary format is JSON so that callers
/// scripting the exporter can tell which phase failed.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub(crate) phase: &'static str,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) causes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) server: Option<ServerErrorInfo>,
}

impl ErrorReport {
    /// Build a report from an export error, walking its source chain.
    pub fn from_error(err: &ExportError) -> Self {
        let server = match err {
            ExportError::Execution(ExecutionError::Server { info, .. }) => Some(info.clone()),
            _ => None,
        };

        let message = err.to_string();

        // Wrapping errors often inline their source in their own text; skip
        // any cause already rendered by the error above it.
        let mut causes = Vec::new();
        let mut above = message.clone();
        let mut current = err.source();
        while let Some(cause) = current {
            let text = cause.to_string();
            if !above.contains(&text) {
                causes.push(text.clone());
            }
            above = text;
            current = cause.source();
        }

        Self {
            phase: err.phase(),
            message,
            causes,
            server,
        }
    }

    /// Render the message followed by every distinct cause on one line.
    pub fn to_text(&self) -> String {
        self.causes
            .iter()
            .fold(self.message.clone(), |mut text, cause| {
                text.push_str(": caused by: ");
                text.push_str(cause);
                text
            })
    }

    /// Convert the report to a compact JSON string wrapped in an `error` field.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(&serde_json::json!({ "error": self }))
    }
}
