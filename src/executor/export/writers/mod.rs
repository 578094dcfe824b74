//! Tabular writers for export operations
//!
//! This module provides a unified interface for persisting a result set as a
//! delimited text file with one header row and one line per record.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::WriteError;
use crate::executor::Row;

pub mod csv;

pub use csv::CsvWriter;

/// Outcome of a successful write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    /// Data rows written (header excluded)
    pub rows_written: u64,
    /// Size of the persisted file in bytes
    pub bytes_written: u64,
}

/// Trait for sinks that persist columns and rows
#[async_trait]
pub trait TabularWriter: Send {
    /// Write the header and all rows in one operation
    ///
    /// # Arguments
    /// * `columns` - Column names, written as the header row
    /// * `rows` - Records, each with one cell per column
    ///
    /// # Returns
    /// * `Result<WriteReport, WriteError>` - Counts, or the underlying failure
    async fn write(&mut self, columns: &[String], rows: &[Row]) -> Result<WriteReport, WriteError>;

    /// Where the output ends up
    fn location(&self) -> &Path;
}

/// Check that the parent directory of an output path exists
///
/// # Arguments
/// * `path` - File path to validate
///
/// # Returns
/// * `Result<(), WriteError>` - `DirectoryMissing` if the parent is absent
pub(crate) fn validate_path(path: &Path) -> Result<(), WriteError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(WriteError::DirectoryMissing(parent.to_path_buf()));
        }
    }
    Ok(())
}

/// Check that every row has one cell per column
pub(crate) fn validate_rows(columns: &[String], rows: &[Row]) -> Result<(), WriteError> {
    match rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != columns.len())
    {
        Some((index, row)) => Err(WriteError::RowShape {
            row: index + 1,
            expected: columns.len(),
            found: row.len(),
        }),
        None => Ok(()),
    }
}
