//! Query execution and export
//!
//! This module connects a [`QueryPlan`] to the outside world:
//! - `SqlExecutor`: runs a plan and returns a [`ResultSet`]
//! - `export`: drives one end-to-end export into a tabular writer
//!
//! [`QueryPlan`]: crate::query::QueryPlan

pub mod export;
pub mod result;

use async_trait::async_trait;

use crate::error::ExecutionError;
use crate::query::QueryPlan;

pub use export::{CsvWriter, ExportDriver, ExportSummary, TabularWriter, WriteReport};
pub use result::{ResultSet, Row};

/// Trait for clients that execute a query plan
///
/// Implementations send the statement and its bound parameters separately;
/// they never splice parameter values into the SQL text.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute a plan and collect the full result
    ///
    /// # Arguments
    /// * `plan` - Statement and bound parameters
    ///
    /// # Returns
    /// * `Result<ResultSet, ExecutionError>` - Columns and rows, or the
    ///   underlying connection/query failure
    async fn execute(&self, plan: &QueryPlan) -> Result<ResultSet, ExecutionError>;

    /// Short description of the target, safe to log (no credentials)
    fn describe(&self) -> String {
        String::from("sql executor")
    }
}
