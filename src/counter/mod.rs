//! Token counting for strings, files, and directory trees.
//!
//! [`TokenCounter`] owns (or borrows) a [`TokenizerProvider`], usually a
//! session's [`TokenizerCache`](crate::tokenizer::TokenizerCache), and
//! resolves the model once per call.
//!
//! Whole-operation failures (unknown model, scan root that is not a
//! directory) are returned as errors. Per-file failures are recorded in the
//! file's [`FileCountResult`] and never abort a scan.
//!
//! # Example
//!
//! ```
//! use counttokens::counter::TokenCounter;
//! use counttokens::tokenizer::{DefaultTokenizerProvider, TokenizerCache};
//!
//! let cache = TokenizerCache::new(DefaultTokenizerProvider::default());
//! let counter = TokenCounter::new(&cache);
//!
//! assert_eq!(counter.count_text("hello world", "gpt-4").unwrap(), 2);
//! assert_eq!(counter.count_text("", "gpt-4").unwrap(), 0);
//! assert!(counter.count_text("hi", "not-a-real-model").is_err());
//! ```

mod content;
mod walk;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::Result;
use crate::report::{aggregate, DirectoryCountResult, FileCountResult};
use crate::tokenizer::{Tokenizer, TokenizerProvider};

pub use content::ContentKind;
pub use walk::{ExtensionFilter, DEFAULT_EXTENSIONS};

/// Options for a directory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryScan {
    /// Extensions of candidate files.
    pub extensions: ExtensionFilter,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Count files on the rayon pool.
    pub parallel: bool,
}

impl Default for DirectoryScan {
    fn default() -> Self {
        Self {
            extensions: ExtensionFilter::default(),
            recursive: true,
            parallel: false,
        }
    }
}

impl DirectoryScan {
    /// Scan with default extensions, recursively, sequentially
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict candidates to these extensions
    pub fn with_extensions(mut self, extensions: ExtensionFilter) -> Self {
        self.extensions = extensions;
        self
    }

    /// Set the recursive flag
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the parallel flag
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Counts tokens through a [`TokenizerProvider`].
pub struct TokenCounter<P> {
    provider: P,
}

impl<P: TokenizerProvider> TokenCounter<P> {
    /// Create a counter over a provider
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The provider tokenizers are resolved from
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Count tokens in `text` for `model`.
    pub fn count_text(&self, text: &str, model: &str) -> Result<usize> {
        let tokenizer = self.provider.resolve_tokenizer(model)?;
        tokenizer.count(text)
    }

    /// Count tokens in one file.
    ///
    /// Only model resolution can fail; read and decode failures are returned
    /// inside the result.
    pub fn count_file(&self, path: impl AsRef<Path>, model: &str) -> Result<FileCountResult> {
        let tokenizer = self.provider.resolve_tokenizer(model)?;
        Ok(count_one(tokenizer.as_ref(), path.as_ref(), model))
    }

    /// Count every candidate file under `root`.
    ///
    /// Entries are ordered by path whether or not the scan ran in parallel.
    /// Paths compare component by component, so `a/b.txt` sorts before
    /// `a-b.txt`.
    pub fn count_directory(
        &self,
        root: impl AsRef<Path>,
        scan: &DirectoryScan,
        model: &str,
    ) -> Result<DirectoryCountResult> {
        let root = root.as_ref();
        let tokenizer = self.provider.resolve_tokenizer(model)?;
        let candidates = walk::collect_candidates(root, &scan.extensions, scan.recursive)?;

        tracing::info!(
            root = %root.display(),
            files = candidates.len(),
            model = %model,
            tokenizer = tokenizer.name(),
            recursive = scan.recursive,
            parallel = scan.parallel,
            "Counting directory"
        );

        let mut results: Vec<FileCountResult> = if scan.parallel {
            candidates
                .par_iter()
                .map(|path| count_one(tokenizer.as_ref(), path, model))
                .collect()
        } else {
            candidates
                .iter()
                .map(|path| count_one(tokenizer.as_ref(), path, model))
                .collect()
        };
        results.sort_by(|a, b| a.path.cmp(&b.path));

        let report = aggregate(results);
        tracing::info!(
            total_tokens = report.total_tokens,
            succeeded = report.succeeded,
            failed = report.failed,
            "Directory counted"
        );
        Ok(report)
    }
}

fn count_one(tokenizer: &dyn Tokenizer, path: &Path, model: &str) -> FileCountResult {
    match content::count_path(tokenizer, path) {
        Ok(stats) => {
            tracing::debug!(path = %path.display(), tokens = stats.tokens, "Counted file");
            FileCountResult::counted(PathBuf::from(path), model, stats)
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to count file");
            FileCountResult::failed(PathBuf::from(path), model, e.to_string())
        },
    }
}
