use std::path::PathBuf;
use std::{fmt, io};

use crate::error::clickhouse::ServerErrorInfo;

/// Crate-wide `Result` type using [`ExportError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Boxed cause carried by errors that wrap a foreign failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for an export run.
///
/// Every variant is fatal for the run. The variant identifies the phase
/// that failed; the wrapped value carries the underlying cause.
#[derive(Debug)]
pub enum ExportError {
    /// User-supplied filter input failed validation.
    InvalidInput(InputError),

    /// Query plan could not be constructed.
    Build(BuildError),

    /// The SQL executor failed.
    Execution(ExecutionError),

    /// The tabular writer could not persist output.
    Write(WriteError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors outside of the write phase.
    Io(io::Error),
}

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// City argument missing, empty, or whitespace-only.
    MissingCity,

    /// A value could not be interpreted.
    InvalidValue { field: String, value: String },
}

/// Query construction errors.
///
/// These indicate a programming or configuration defect rather than a
/// problem with the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Filter criteria violate their own invariants.
    InvalidFilter(String),

    /// Schema name is not a plain identifier.
    InvalidSchema(String),
}

/// Failures reported by a SQL executor.
#[derive(Debug)]
pub enum ExecutionError {
    /// Could not reach the server.
    Connection(BoxError),

    /// Request exceeded the configured timeout.
    Timeout(BoxError),

    /// Server rejected the query.
    Server {
        status: u16,
        info: ServerErrorInfo,
    },

    /// Response body could not be decoded.
    InvalidResponse(String),

    /// Decoded result violates the result set invariants.
    MalformedResult(String),

    /// Any other executor failure.
    Other(BoxError),
}

/// Failures persisting the output file.
#[derive(Debug)]
pub enum WriteError {
    /// Parent directory of the output path does not exist.
    DirectoryMissing(PathBuf),

    /// Temporary file could not be created or written.
    Create { path: PathBuf, source: io::Error },

    /// Record serialization failed.
    Serialize(csv::Error),

    /// Temporary file could not be moved onto the destination.
    Persist { path: PathBuf, source: io::Error },

    /// A row does not have one cell per column.
    RowShape {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Explicitly requested config file not found.
    FileNotFound(String),

    /// Config file exists but could not be read.
    Read { path: PathBuf, source: io::Error },

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Configuration could not be rendered.
    Serialize(String),

    /// Free-form configuration problem.
    Generic(String),
}

impl ExportError {
    /// Short name of the phase that failed, used in logs and JSON reports.
    pub fn phase(&self) -> &'static str {
        match self {
            ExportError::InvalidInput(_) => "input",
            ExportError::Build(_) => "build",
            ExportError::Execution(ExecutionError::Connection(_)) => "connection",
            ExportError::Execution(_) => "execution",
            ExportError::Write(_) => "write",
            ExportError::Config(_) => "config",
            ExportError::Io(_) => "io",
        }
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::InvalidInput(e) => write!(f, "Invalid input: {e}"),
            ExportError::Build(e) => write!(f, "Query build failed: {e}"),
            ExportError::Execution(e) => write!(f, "{e}"),
            ExportError::Write(e) => write!(f, "Write failed: {e}"),
            ExportError::Config(e) => write!(f, "Configuration error: {e}"),
            ExportError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::MissingCity => write!(f, "city parameter is required"),
            InputError::InvalidValue { field, value } => {
                write!(f, "invalid value '{value}' for {field}")
            }
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::InvalidFilter(msg) => write!(f, "invalid filter: {msg}"),
            BuildError::InvalidSchema(name) => {
                write!(f, "schema '{name}' is not a valid identifier")
            }
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::Connection(e) => write!(f, "Connection failed: {e}"),
            ExecutionError::Timeout(e) => write!(f, "Query execution timed out: {e}"),
            ExecutionError::Server { status, info } => {
                write!(f, "Query execution failed (HTTP {status}): {info}")
            }
            ExecutionError::InvalidResponse(msg) => {
                write!(f, "Query execution failed: invalid response: {msg}")
            }
            ExecutionError::MalformedResult(msg) => {
                write!(f, "Query execution failed: malformed result: {msg}")
            }
            ExecutionError::Other(e) => write!(f, "Query execution failed: {e}"),
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::DirectoryMissing(dir) => {
                write!(f, "directory does not exist: {}", dir.display())
            }
            WriteError::Create { path, source } => {
                write!(f, "cannot write {}: {source}", path.display())
            }
            WriteError::Serialize(e) => write!(f, "cannot serialize record: {e}"),
            WriteError::Persist { path, source } => {
                write!(f, "cannot move output into {}: {source}", path.display())
            }
            WriteError::RowShape {
                row,
                expected,
                found,
            } => write!(f, "row {row} has {found} cells, expected {expected}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::Read { path, source } => {
                write!(f, "Cannot read config file {}: {source}", path.display())
            }
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Serialize(msg) => write!(f, "Cannot render configuration: {msg}"),
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::InvalidInput(e) => Some(e),
            ExportError::Build(e) => Some(e),
            ExportError::Execution(e) => Some(e),
            ExportError::Write(e) => Some(e),
            ExportError::Config(e) => Some(e),
            ExportError::Io(e) => Some(e),
        }
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecutionError::Connection(e)
            | ExecutionError::Timeout(e)
            | ExecutionError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::Create { source, .. } | WriteError::Persist { source, .. } => Some(source),
            WriteError::Serialize(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl std::error::Error for InputError {}
impl std::error::Error for BuildError {}

/* ========================= Conversions to ExportError ========================= */

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<InputError> for ExportError {
    fn from(err: InputError) -> Self {
        ExportError::InvalidInput(err)
    }
}

impl From<BuildError> for ExportError {
    fn from(err: BuildError) -> Self {
        ExportError::Build(err)
    }
}

impl From<ExecutionError> for ExportError {
    fn from(err: ExecutionError) -> Self {
        ExportError::Execution(err)
    }
}

impl From<WriteError> for ExportError {
    fn from(err: WriteError) -> Self {
        ExportError::Write(err)
    }
}

impl From<ConfigError> for ExportError {
    fn from(err: ConfigError) -> Self {
        ExportError::Config(err)
    }
}

impl From<csv::Error> for WriteError {
    fn from(err: csv::Error) -> Self {
        WriteError::Serialize(err)
    }
}

impl From<reqwest::Error> for ExecutionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExecutionError::Timeout(Box::new(err))
        } else if err.is_connect() {
            ExecutionError::Connection(Box::new(err))
        } else if err.is_decode() {
            ExecutionError::InvalidResponse(err.to_string())
        } else {
            ExecutionError::Other(Box::new(err))
        }
    }
}
