use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the campus energy pipeline.
#[derive(Error, Debug)]
pub enum EnergyError {
    /// A source file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader or writer rejected the input or output stream.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A source file header lacks one of the required columns.
    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// Not a single reading survived ingestion.
    #[error("No valid meter readings found in {data_dir} ({files_attempted} files attempted)")]
    NoValidData {
        data_dir: PathBuf,
        files_attempted: usize,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the energy crates.
pub type Result<T> = std::result::Result<T, EnergyError>;

/// Why a single source row was rejected.
///
/// Rows are validated into `Result<ReadingRecord, RowError>`; a rejected row
/// is dropped and counted, never propagated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("invalid kwh '{0}'")]
    InvalidKwh(String),

    #[error("negative kwh {0}")]
    NegativeKwh(f64),
}

/// A source file that was skipped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, err: &EnergyError) -> Self {
        Self {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = EnergyError::FileRead {
            path: PathBuf::from("/data/Library.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/Library.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = EnergyError::MissingColumn {
            path: PathBuf::from("Gym.csv"),
            column: "kwh",
        };
        assert_eq!(err.to_string(), "Missing column 'kwh' in Gym.csv");
    }

    #[test]
    fn test_error_display_no_valid_data() {
        let err = EnergyError::NoValidData {
            data_dir: PathBuf::from("/empty/dir"),
            files_attempted: 0,
        };
        assert_eq!(
            err.to_string(),
            "No valid meter readings found in /empty/dir (0 files attempted)"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = EnergyError::Config("extension must not be empty".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: extension must not be empty"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: EnergyError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_row_error_display() {
        assert_eq!(
            RowError::FieldCount {
                expected: 2,
                found: 3
            }
            .to_string(),
            "expected 2 fields, found 3"
        );
        assert_eq!(
            RowError::InvalidTimestamp("yesterday".to_string()).to_string(),
            "invalid timestamp 'yesterday'"
        );
        assert_eq!(RowError::NegativeKwh(-1.5).to_string(), "negative kwh -1.5");
    }

    #[test]
    fn test_file_error_display() {
        let err = EnergyError::MissingColumn {
            path: PathBuf::from("data/Gym.csv"),
            column: "timestamp",
        };
        let file_err = FileError::new("data/Gym.csv", &err);
        assert_eq!(
            file_err.to_string(),
            "data/Gym.csv: Missing column 'timestamp' in data/Gym.csv"
        );
    }
}
