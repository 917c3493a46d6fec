//! # CountTokens - token counting for text, files, and directories
//!
//! Counts tokens the way a model's tokenizer sees them, aggregates the
//! results over directory trees, and exports reports as JSON or CSV.
//!
//! ## Architecture
//!
//! ```text
//!   model id ──> TokenizerProvider ──> Tokenizer (tiktoken BPE | tokenizer.json)
//!                      │ (TokenizerCache, one per session)
//!                      v
//!   text/file/dir ──> TokenCounter ──> FileCountResult* ──> aggregate()
//!                                                              │
//!                                                              v
//!                                            DirectoryCountResult ──> JSON / CSV / summary
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use counttokens::counter::{DirectoryScan, TokenCounter};
//! use counttokens::output::{to_summary, write_report};
//! use counttokens::tokenizer::{DefaultTokenizerProvider, TokenizerCache};
//!
//! let cache = TokenizerCache::new(DefaultTokenizerProvider::default());
//! let counter = TokenCounter::new(&cache);
//!
//! let report = counter
//!     .count_directory("docs", &DirectoryScan::default(), "gpt-4o")
//!     .unwrap();
//! println!("{}", to_summary(&report));
//! write_report(&report, "tokens.csv".as_ref(), None).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`tokenizer`]: provider boundary, model policy, backends, cache
//! - [`counter`]: text, file, and directory counting
//! - [`report`]: result types and aggregation
//! - [`output`]: JSON, CSV, summary, and atomic report writes
//! - [`config`]: configuration management
//! - [`error`]: error types and result aliases

pub mod config;
pub mod counter;
pub mod error;
pub mod output;
pub mod report;
pub mod tokenizer;

// Re-exports for convenience
pub use config::Config;
pub use counter::{DirectoryScan, ExtensionFilter, TokenCounter};
pub use error::{CountError, FileReadError, Result};
pub use output::{to_csv, to_json, to_summary, write_report, OutputFormat, Report};
pub use report::{aggregate, DirectoryCountResult, FileCountResult, FileOutcome, FileStats};
pub use tokenizer::{
    DefaultTokenizerProvider, Encoding, ModelPolicy, Tokenizer, TokenizerCache, TokenizerProvider,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
