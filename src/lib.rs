//! Driver Export Library
//!
//! This library provides the core functionality of the `export` tool: it
//! renders driver selection criteria into a parameterized ClickHouse query,
//! runs it, and writes the result set to a CSV file.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: ClickHouse HTTP client
//! - `error`: Error types and handling
//! - `executor`: Query execution and export orchestration
//! - `formatter`: Summaries and tables for the terminal
//! - `query`: Filter criteria and query construction
//!
//! # Example
//!
//! ```no_run
//! use driver_export::config::Config;
//! use driver_export::connection::ClickHouseClient;
//! use driver_export::executor::{CsvWriter, ExportDriver};
//! use driver_export::query::{FilterSpec, QueryBuilder};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = ClickHouseClient::new(&config.connection)?;
//!     let builder = QueryBuilder::new(&config.connection.database)?;
//!
//!     let spec = FilterSpec::create("std:080", Some("BIKE"))?;
//!     let mut sink = CsvWriter::new("bangalore_bikes.csv");
//!
//!     let summary = ExportDriver::new(builder).run(&client, &spec, &mut sink).await?;
//!     println!("Exported {} rows", summary.row_count);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod query;

// Re-export commonly used types
pub use config::Config;
pub use connection::ClickHouseClient;
pub use error::{ExportError, Result};
pub use executor::{CsvWriter, ExportDriver, ExportSummary, ResultSet, SqlExecutor, TabularWriter};
pub use query::{FilterSpec, QueryBuilder, QueryPlan};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
