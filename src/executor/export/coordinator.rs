//! Export driver for orchestrating one export run
//!
//! This module brings together the query builder, a SQL executor and a
//! tabular writer: build plan, execute once, write once, report.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::executor::{Row, SqlExecutor};
use crate::query::{FilterSpec, QueryBuilder, QueryPlan};

use super::progress::ProgressTracker;
use super::writers::TabularWriter;

/// Result of an export operation
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    /// Number of rows exported
    pub row_count: u64,
    /// Exported column names in output order
    pub columns: Vec<String>,
    /// Where the output was written
    pub output_location: PathBuf,
    /// File size in bytes
    pub bytes_written: u64,
    /// Time taken for the export
    pub elapsed_ms: u64,
    /// Leading rows kept for display when a preview was requested
    #[serde(skip)]
    pub preview: Vec<Row>,
}

/// Driver for export operations
///
/// Executes exactly one query and performs exactly one write per run. The
/// writer is never invoked when the query fails.
pub struct ExportDriver {
    /// Builder rendering the filter into a plan
    builder: QueryBuilder,
    /// Progress tracker for user feedback
    tracker: ProgressTracker,
    /// Number of rows to keep in the summary
    preview_rows: usize,
}

impl ExportDriver {
    /// Create a new export driver
    pub fn new(builder: QueryBuilder) -> Self {
        Self {
            builder,
            tracker: ProgressTracker::hidden(),
            preview_rows: 0,
        }
    }

    /// Show progress through the given tracker
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Keep the first `rows` rows in the summary for display
    pub fn with_preview(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Build the plan a run would execute, without executing it
    pub fn plan(&self, spec: &FilterSpec) -> Result<QueryPlan> {
        self.builder.build(spec)
    }

    /// Execute the export operation
    ///
    /// This is the main entry point that orchestrates the export:
    /// 1. Build the query plan
    /// 2. Execute it through the client
    /// 3. Hand columns and rows to the writer
    /// 4. Return statistics
    ///
    /// # Arguments
    /// * `client` - Executor that runs the plan
    /// * `spec` - Filter criteria
    /// * `sink` - Writer that persists the result
    ///
    /// # Returns
    /// * `Result<ExportSummary>` - Export statistics, or the failing phase
    pub async fn run(
        &self,
        client: &dyn SqlExecutor,
        spec: &FilterSpec,
        sink: &mut dyn TabularWriter,
    ) -> Result<ExportSummary> {
        let start_time = Instant::now();

        let plan = self.builder.build(spec)?;

        info!("Executing query for {} on {}", spec, client.describe());
        self.tracker.phase("Executing query...");
        let result = match client.execute(&plan).await {
            Ok(result) => result,
            Err(e) => {
                self.tracker.finish();
                return Err(e.into());
            }
        };
        info!("Retrieved {} records", result.len());

        self.tracker
            .phase(&format!("Writing {} rows to {}", result.len(), sink.location().display()));
        let report = match sink.write(result.columns(), result.rows()).await {
            Ok(report) => report,
            Err(e) => {
                self.tracker.finish();
                return Err(e.into());
            }
        };
        self.tracker.finish();

        let output_location = sink.location().to_path_buf();
        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!("Data saved to {}", output_location.display());
        debug!(
            "Export completed: {} rows, {} bytes, {} ms",
            report.rows_written, report.bytes_written, elapsed_ms
        );

        Ok(ExportSummary {
            row_count: report.rows_written,
            columns: result.columns().to_vec(),
            output_location,
            bytes_written: report.bytes_written,
            elapsed_ms,
            preview: result.rows().iter().take(self.preview_rows).cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::{ExecutionError, ExportError, WriteError};
    use crate::executor::ResultSet;
    use crate::executor::export::WriteReport;

    // Mock executor for testing
    struct MockClient {
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockClient {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SqlExecutor for MockClient {
        async fn execute(&self, plan: &QueryPlan) -> std::result::Result<ResultSet, ExecutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(plan.parameter("city"), Some("Delhi"));
            if self.fail {
                let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
                return Err(ExecutionError::Connection(Box::new(refused)));
            }
            ResultSet::new(
                vec!["driverId".to_string(), "token".to_string()],
                vec![vec![json!("d1"), json!("t1")], vec![json!("d2"), json!("t2")]],
            )
        }
    }

    // Mock writer for testing
    struct MockSink {
        fail: bool,
        writes: usize,
        written: Vec<Row>,
        path: PathBuf,
    }

    impl MockSink {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                writes: 0,
                written: Vec::new(),
                path: PathBuf::from("mock.csv"),
            }
        }
    }

    #[async_trait]
    impl TabularWriter for MockSink {
        async fn write(
            &mut self,
            _columns: &[String],
            rows: &[Row],
        ) -> std::result::Result<WriteReport, WriteError> {
            self.writes += 1;
            if self.fail {
                let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
                return Err(WriteError::Persist {
                    path: self.path.clone(),
                    source: denied,
                });
            }
            self.written.extend_from_slice(rows);
            Ok(WriteReport {
                rows_written: rows.len() as u64,
                bytes_written: rows.len() as u64 * 10,
            })
        }

        fn location(&self) -> &Path {
            &self.path
        }
    }

    fn delhi() -> FilterSpec {
        FilterSpec::create("Delhi", Some("ALL")).unwrap()
    }

    #[tokio::test]
    async fn test_driver_basic() {
        let client = MockClient::new(false);
        let mut sink = MockSink::new(false);

        let driver = ExportDriver::new(QueryBuilder::default());
        let summary = driver.run(&client, &delhi(), &mut sink).await.unwrap();

        assert_eq!(summary.row_count, 2);
        assert_eq!(summary.columns, vec!["driverId", "token"]);
        assert_eq!(summary.output_location, PathBuf::from("mock.csv"));
        assert!(summary.preview.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.writes, 1);
        assert_eq!(sink.written.len(), 2);
    }

    #[tokio::test]
    async fn test_execution_failure_skips_write() {
        let client = MockClient::new(true);
        let mut sink = MockSink::new(false);

        let driver = ExportDriver::new(QueryBuilder::default());
        let err = driver.run(&client, &delhi(), &mut sink).await.unwrap_err();

        assert!(matches!(err, ExportError::Execution(ExecutionError::Connection(_))));
        assert_eq!(sink.writes, 0);
    }

    #[tokio::test]
    async fn test_write_failure_wrapped() {
        let client = MockClient::new(false);
        let mut sink = MockSink::new(true);

        let driver = ExportDriver::new(QueryBuilder::default());
        let err = driver.run(&client, &delhi(), &mut sink).await.unwrap_err();

        assert!(matches!(err, ExportError::Write(WriteError::Persist { .. })));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.writes, 1);
    }

    #[tokio::test]
    async fn test_preview_rows_kept() {
        let client = MockClient::new(false);
        let mut sink = MockSink::new(false);

        let driver = ExportDriver::new(QueryBuilder::default()).with_preview(1);
        let summary = driver.run(&client, &delhi(), &mut sink).await.unwrap();
        assert_eq!(summary.preview, vec![vec![json!("d1"), json!("t1")]]);
    }

    #[test]
    fn test_plan_binds_filter_without_executing() {
        let driver = ExportDriver::new(QueryBuilder::new("atlas_driver_offer_bpp").unwrap());
        let plan = driver.plan(&delhi()).unwrap();

        assert_eq!(plan.parameter("city"), Some("Delhi"));
        assert_eq!(plan.parameter("variant"), Some("ALL"));
        assert!(plan.statement().contains("atlas_driver_offer_bpp."));
    }
}
