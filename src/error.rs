//! Error types.
//!
//! Errors come in two flavours:
//!
//! - **Whole-operation errors** ([`CountError`]): an unsupported model, a scan
//!   root that is not a directory, or a report that cannot be written. These
//!   are returned to the caller immediately.
//! - **Per-file errors** ([`FileReadError`]): a file that cannot be read or
//!   decoded during counting. These are recorded inside the file's
//!   [`FileCountResult`](crate::report::FileCountResult) and never abort a
//!   directory scan.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a counting or reporting operation.
#[derive(Error, Debug)]
pub enum CountError {
    /// The model identifier maps to no tokenizer, even via fallback.
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    /// A tokenizer backend failed to load.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// The scan root does not exist or is not a directory.
    #[error("Directory not found: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The formatted report could not be persisted.
    #[error("Failed to write report to {}: {source}", path.display())]
    OutputWrite {
        /// Requested output path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for counting operations
pub type Result<T> = std::result::Result<T, CountError>;

impl From<toml::de::Error> for CountError {
    fn from(err: toml::de::Error) -> Self {
        CountError::Config(err.to_string())
    }
}

/// Why a single file could not be counted.
///
/// Rendered to a string and stored in the file's result entry.
#[derive(Error, Debug)]
pub enum FileReadError {
    /// The path does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The process may not read the path.
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// The file content is not valid UTF-8.
    #[error("Invalid UTF-8 in {}: {reason}", path.display())]
    InvalidUtf8 {
        /// File path.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// A `.json` file that does not parse.
    #[error("Malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// A `.csv` file that does not parse.
    #[error("Malformed CSV: {0}")]
    MalformedCsv(#[from] csv::Error),

    /// The tokenizer rejected the content.
    #[error("Tokenizer error: {0}")]
    Tokenize(String),

    /// Any other I/O failure.
    #[error("IO error: {0}")]
    Io(io::Error),
}

impl FileReadError {
    /// Classify an I/O error raised while reading `path`.
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => FileReadError::NotFound(path),
            io::ErrorKind::PermissionDenied => FileReadError::PermissionDenied(path),
            io::ErrorKind::InvalidData => FileReadError::InvalidUtf8 {
                path,
                reason: err.to_string(),
            },
            _ => FileReadError::Io(err),
        }
    }
}
