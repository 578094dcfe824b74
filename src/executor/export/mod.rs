//! Export of query results to tabular files
//!
//! The export pipeline is built on three components:
//!
//! 1. **SqlExecutor**: runs the query plan (see the parent module)
//! 2. **ProgressTracker**: spinner feedback while the query runs
//! 3. **TabularWriter**: persists columns and rows to a delimited file
//!
//! These components are orchestrated by the **ExportDriver**.
//!
//! # Example
//!
//! ```no_run
//! use driver_export::connection::ClickHouseClient;
//! use driver_export::config::ConnectionConfig;
//! use driver_export::executor::{CsvWriter, ExportDriver};
//! use driver_export::query::{FilterSpec, QueryBuilder};
//!
//! # async fn example() -> driver_export::Result<()> {
//! let client = ClickHouseClient::new(&ConnectionConfig::default())?;
//! let spec = FilterSpec::create("Delhi", Some("CAB"))?;
//! let mut sink = CsvWriter::new("delhi_cab.csv");
//!
//! let summary = ExportDriver::new(QueryBuilder::default())
//!     .run(&client, &spec, &mut sink)
//!     .await?;
//! println!("{} rows", summary.row_count);
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod progress;
pub mod writers;

pub use coordinator::{ExportDriver, ExportSummary};
pub use progress::ProgressTracker;
pub use writers::{CsvWriter, TabularWriter, WriteReport};
