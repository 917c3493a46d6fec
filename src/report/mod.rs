//! Counting results and their aggregation.
//!
//! [`aggregate`] is a pure fold over [`FileCountResult`]s: no I/O, so it can
//! be exercised with literal result lists.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};

/// Token statistics for a file that was counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    /// Number of tokens.
    pub tokens: usize,
    /// Unicode scalar values in the counted text.
    pub characters: usize,
    /// Top-level entries of a JSON document (array length, otherwise 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    /// Data rows of a CSV file (header excluded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Columns of a CSV file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<usize>,
}

impl FileStats {
    /// Plain text statistics
    pub fn new(tokens: usize, characters: usize) -> Self {
        Self {
            tokens,
            characters,
            entries: None,
            rows: None,
            columns: None,
        }
    }
}

/// Outcome of counting one file: a token count or an error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileOutcome {
    /// The file was read and counted.
    Counted(FileStats),
    /// The file could not be read or decoded.
    Failed {
        /// Failure reason.
        error: String,
    },
}

/// Result of counting a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCountResult {
    /// File path as given or discovered.
    ///
    /// Serialized lossily: bytes that are not UTF-8 become U+FFFD.
    #[serde(serialize_with = "serialize_path_lossy")]
    pub path: PathBuf,
    /// Model the file was counted for.
    pub model: String,
    /// Count or error.
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileCountResult {
    /// A successful count
    pub fn counted(path: impl Into<PathBuf>, model: impl Into<String>, stats: FileStats) -> Self {
        Self {
            path: path.into(),
            model: model.into(),
            outcome: FileOutcome::Counted(stats),
        }
    }

    /// A failed count
    pub fn failed(
        path: impl Into<PathBuf>,
        model: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            model: model.into(),
            outcome: FileOutcome::Failed {
                error: error.into(),
            },
        }
    }

    /// Path of the counted file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Token count, if the file was counted
    pub fn tokens(&self) -> Option<usize> {
        match &self.outcome {
            FileOutcome::Counted(stats) => Some(stats.tokens),
            FileOutcome::Failed { .. } => None,
        }
    }

    /// Statistics, if the file was counted
    pub fn stats(&self) -> Option<&FileStats> {
        match &self.outcome {
            FileOutcome::Counted(stats) => Some(stats),
            FileOutcome::Failed { .. } => None,
        }
    }

    /// Failure reason, if the file was not counted
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            FileOutcome::Counted(_) => None,
            FileOutcome::Failed { error } => Some(error),
        }
    }

    /// Whether the file failed
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }
}

/// Per-file results of a directory scan plus totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryCountResult {
    /// Sum of tokens over counted files.
    pub total_tokens: usize,
    /// Files counted successfully.
    pub succeeded: usize,
    /// Files that failed.
    pub failed: usize,
    /// Per-file results, ordered by path.
    pub files: Vec<FileCountResult>,
}

impl DirectoryCountResult {
    /// Total number of entries
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the scan found no candidate files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over failed entries
    pub fn failures(&self) -> impl Iterator<Item = &FileCountResult> {
        self.files.iter().filter(|f| f.is_failed())
    }
}

/// Fold per-file results into a directory report.
///
/// Entries keep their input order.
///
/// # Example
/// ```
/// use counttokens::report::{aggregate, FileCountResult, FileStats};
///
/// let report = aggregate(vec![
///     FileCountResult::counted("a.txt", "gpt-4", FileStats::new(7, 30)),
///     FileCountResult::failed("b.txt", "gpt-4", "File not found: b.txt"),
/// ]);
/// assert_eq!(report.total_tokens, 7);
/// assert_eq!((report.succeeded, report.failed), (1, 1));
/// ```
pub fn aggregate(results: Vec<FileCountResult>) -> DirectoryCountResult {
    let (total_tokens, succeeded, failed) =
        results
            .iter()
            .fold((0usize, 0usize, 0usize), |(total, ok, err), r| {
                match r.tokens() {
                    Some(tokens) => (total + tokens, ok + 1, err),
                    None => (total, ok, err + 1),
                }
            });

    DirectoryCountResult {
        total_tokens,
        succeeded,
        failed,
        files: results,
    }
}

fn serialize_path_lossy<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}
