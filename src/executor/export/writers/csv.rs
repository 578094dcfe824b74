//! CSV writer for export operations
//!
//! Serializes a result set with the `csv` crate and persists it atomically:
//! the file is written next to its destination under a temporary name and
//! renamed into place once complete, so a failed run never leaves a
//! truncated file at the output path.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::Builder;
use tracing::debug;

use crate::error::WriteError;
use crate::executor::Row;
use crate::formatter::cell_text;

use super::{TabularWriter, WriteReport, validate_path, validate_rows};

/// Default field delimiter
pub const DEFAULT_DELIMITER: u8 = b',';

/// Writer for CSV format
///
/// Writes a header row equal to the column names followed by one record per
/// row. Fields containing the delimiter, quotes or newlines are quoted.
pub struct CsvWriter {
    /// Destination path
    path: PathBuf,
    /// Field delimiter
    delimiter: u8,
}

impl CsvWriter {
    /// Create a new CSV writer
    ///
    /// # Arguments
    /// * `path` - Output file path
    ///
    /// # Returns
    /// * `Self` - Writer using a comma delimiter
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Use a different single-byte field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Serialize header and rows into memory
    ///
    /// # Arguments
    /// * `columns` - Header names
    /// * `rows` - Records to encode
    ///
    /// # Returns
    /// * `Result<Vec<u8>, WriteError>` - Encoded file contents
    fn encode(&self, columns: &[String], rows: &[Row]) -> Result<Vec<u8>, WriteError> {
        let mut writer = ::csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        writer.write_record(columns)?;
        for row in rows {
            writer.write_record(row.iter().map(|value| cell_text(value).into_owned()))?;
        }

        writer
            .into_inner()
            .map_err(|e| WriteError::Create {
                path: self.path.clone(),
                source: e.into_error(),
            })
    }
}

/// Write a file through a temporary sibling and move it onto `path`
///
/// The temporary file is deleted when any step fails, so the destination
/// either receives the complete contents or is left untouched.
///
/// # Arguments
/// * `path` - Destination file
/// * `fill` - Writes the contents into the temporary file
///
/// # Returns
/// * `Result<(), WriteError>` - `Create` for write failures, `Persist` when
///   the move fails
pub(crate) fn persist_atomically<F>(path: &Path, fill: F) -> Result<(), WriteError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("export.csv"))
    );

    let mut temp = Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|source| WriteError::Create {
            path: dir.to_path_buf(),
            source,
        })?;

    fill(temp.as_file_mut())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|source| WriteError::Create {
            path: temp.path().to_path_buf(),
            source,
        })?;

    debug!("Moving {} onto {}", temp.path().display(), path.display());
    temp.persist(path).map_err(|e| WriteError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[async_trait]
impl TabularWriter for CsvWriter {
    async fn write(&mut self, columns: &[String], rows: &[Row]) -> Result<WriteReport, WriteError> {
        validate_path(&self.path)?;
        validate_rows(columns, rows)?;

        let contents = self.encode(columns, rows)?;
        let bytes_written = contents.len() as u64;

        let path = self.path.clone();
        debug!("Writing {} bytes for {}", bytes_written, path.display());
        tokio::task::spawn_blocking(move || {
            persist_atomically(&path, |file| file.write_all(&contents))
        })
        .await
        .map_err(|e| WriteError::Create {
            path: self.path.clone(),
            source: io::Error::other(e),
        })??;

        debug!("Finalized CSV file: {} ({} rows)", self.path.display(), rows.len());
        Ok(WriteReport {
            rows_written: rows.len() as u64,
            bytes_written,
        })
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn columns() -> Vec<String> {
        vec!["driverId".to_string(), "token".to_string()]
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![vec![json!("d1"), json!("t1")], vec![json!("d2"), json!("t2")]];

        let mut writer = CsvWriter::new(&path);
        let report = writer.write(&columns(), &rows).await.unwrap();
        assert_eq!(report.rows_written, 2);
        assert_eq!(report.bytes_written, std::fs::metadata(&path).unwrap().len());

        let mut reader = ::csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, columns());

        let records: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        assert_eq!(
            records,
            vec![
                vec!["d1".to_string(), "t1".to_string()],
                vec!["d2".to_string(), "t2".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_special_characters_quoted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("special.csv");
        let rows = vec![
            vec![json!("Hello, world!"), json!("Quote: \"test\"")],
            vec![json!("Newline\ntest"), json!(null)],
        ];

        CsvWriter::new(&path).write(&columns(), &rows).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"Hello, world!\""));
        assert!(content.contains("\"Quote: \"\"test\"\"\""));

        let mut reader = ::csv::Reader::from_path(&path).unwrap();
        let second = reader.records().nth(1).unwrap().unwrap();
        assert_eq!(&second[0], "Newline\ntest");
        assert_eq!(&second[1], "");
    }

    #[tokio::test]
    async fn test_header_written_for_empty_result() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        let report = CsvWriter::new(&path).write(&columns(), &[]).await.unwrap();
        assert_eq!(report.rows_written, 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), vec!["driverId,token"]);
    }

    #[tokio::test]
    async fn test_custom_delimiter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tabs.tsv");
        let rows = vec![vec![json!("d1"), json!("a,b")]];

        CsvWriter::new(&path)
            .with_delimiter(b'\t')
            .write(&columns(), &rows)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(1), Some("d1\ta,b"));
    }

    #[tokio::test]
    async fn test_missing_directory_leaves_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        let err = CsvWriter::new(&path)
            .write(&columns(), &[vec![json!("d1"), json!("t1")]])
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::DirectoryMissing(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_no_temporary_files_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        CsvWriter::new(&path)
            .write(&columns(), &[vec![json!("d1"), json!("t1")]])
            .await
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("out.csv")]);
    }

    #[tokio::test]
    async fn test_ragged_rows_rejected_before_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let err = CsvWriter::new(&path)
            .write(&columns(), &[vec![json!("d1")]])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WriteError::RowShape {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_existing_file_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale contents\n").unwrap();

        CsvWriter::new(&path)
            .write(&columns(), &[vec![json!("d1"), json!("t1")]])
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.starts_with("driverId,token"));
    }

    fn dir_entries(dir: &Path) -> Vec<std::ffi::OsString> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect()
    }

    #[test]
    fn test_interrupted_write_removes_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let err = persist_atomically(&path, |file| {
            file.write_all(b"driverId,token\nd1,")?;
            Err(io::Error::other("File too large"))
        })
        .unwrap_err();

        assert!(matches!(err, WriteError::Create { .. }));
        assert!(!path.exists());
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_interrupted_write_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "previous\n").unwrap();

        persist_atomically(&path, |_| Err(io::Error::other("disk full"))).unwrap_err();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous\n");
        assert_eq!(dir_entries(dir.path()), vec![std::ffi::OsString::from("out.csv")]);
    }

    #[tokio::test]
    async fn test_failed_move_removes_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("inside"), "x").unwrap();

        let err = CsvWriter::new(&path)
            .write(&columns(), &[vec![json!("d1"), json!("t1")]])
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Persist { .. }));
        assert_eq!(dir_entries(dir.path()), vec![std::ffi::OsString::from("taken")]);
    }
}
