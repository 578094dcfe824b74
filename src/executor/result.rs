//! Query result types
//!
//! This module defines the data returned by a SQL executor:
//! - ResultSet: ordered column names plus rows of opaque values
//! - Row: one record, one cell per column

use std::collections::HashSet;

use serde_json::Value;

use crate::error::ExecutionError;

/// One result record, one cell per column
pub type Row = Vec<Value>;

/// Columns and rows returned by one query execution
///
/// Column order defines output column order. Every row has exactly one
/// cell per column and column names are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Create a result set, enforcing its shape invariants
    ///
    /// # Arguments
    /// * `columns` - Column names in output order
    /// * `rows` - Records, each with `columns.len()` cells
    ///
    /// # Returns
    /// * `Result<Self, ExecutionError>` - `MalformedResult` on duplicate
    ///   column names or ragged rows
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, ExecutionError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ExecutionError::MalformedResult(format!(
                    "duplicate column '{name}'"
                )));
            }
        }

        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ExecutionError::MalformedResult(format!(
                "row {} has {} cells, expected {}",
                index + 1,
                row.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, rows })
    }

    /// Column names in output order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in the order returned by the server
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the query returned no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
