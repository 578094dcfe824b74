//! Error handling for export runs.
//!
//! This module provides:
//! - A phase-oriented error taxonomy (input, build, execution, write, config)
//! - Structured extraction of ClickHouse server exceptions
//! - JSON error reports for scripted callers
//!
//! # Example
//!
//! ```rust
//! use driver_export::error::{ExportError, InputError};
//!
//! let err = ExportError::from(InputError::MissingCity);
//! assert_eq!(err.phase(), "input");
//! ```

pub mod clickhouse;
pub mod kinds;
pub mod report;

// Re-export commonly used types
pub use clickhouse::ServerErrorInfo;
pub use kinds::{
    BoxError, BuildError, ConfigError, ExecutionError, ExportError, InputError, Result,
    WriteError,
};
pub use report::ErrorReport;
