//! Tokenizer provider boundary.
//!
//! Counting code depends only on two traits:
//!
//! - [`TokenizerProvider::resolve_tokenizer`]: model identifier to tokenizer
//! - [`Tokenizer::encode`]: text to token ids
//!
//! # Supported Encodings
//!
//! - **o200k_base**: GPT-4o, GPT-4.1, GPT-5, o-series models
//! - **cl100k_base**: GPT-3.5, GPT-4, embeddings (also the fallback)
//! - **p50k_base** / **p50k_edit**: Codex and text-davinci-002/003
//! - **r50k_base**: GPT-3 base models
//! - any HuggingFace `tokenizer.json` registered per model
//!
//! # Example
//!
//! ```
//! use counttokens::tokenizer::{DefaultTokenizerProvider, TokenizerCache, TokenizerProvider};
//!
//! let cache = TokenizerCache::new(DefaultTokenizerProvider::default());
//! let tokenizer = cache.resolve_tokenizer("gpt-3.5-turbo").unwrap();
//! assert_eq!(tokenizer.count("hello world").unwrap(), 2);
//! ```

mod backend;
mod cache;
mod encoding;
mod policy;

use std::sync::Arc;

use crate::error::Result;

pub use backend::{BpeTokenizer, DefaultTokenizerProvider, HuggingFaceTokenizer};
pub use cache::TokenizerCache;
pub use encoding::Encoding;
pub use policy::{
    normalize_model, ModelPolicy, Resolved, ResolvedVia, DEFAULT_FALLBACK_ENCODING,
    DEFAULT_FALLBACK_FAMILIES, MODEL_ENCODINGS, MODEL_PREFIX_ENCODINGS,
};

/// Token id produced by a tokenizer
pub type TokenId = u32;

/// A deterministic function from text to token ids.
pub trait Tokenizer: Send + Sync {
    /// Backend name (encoding name or tokenizer file)
    fn name(&self) -> &str;

    /// Encode text into token ids.
    fn encode(&self, text: &str) -> Result<Vec<TokenId>>;

    /// Count tokens in text.
    ///
    /// Always equal to `encode(text)?.len()`; backends may skip building
    /// the id vector.
    fn count(&self, text: &str) -> Result<usize> {
        if text.is_empty() {
            return Ok(0);
        }
        Ok(self.encode(text)?.len())
    }
}

/// Source of tokenizers, keyed by model identifier.
pub trait TokenizerProvider: Send + Sync {
    /// Return the tokenizer for `model`, or
    /// [`CountError::UnsupportedModel`](crate::error::CountError::UnsupportedModel).
    fn resolve_tokenizer(&self, model: &str) -> Result<Arc<dyn Tokenizer>>;
}

impl<T: TokenizerProvider + ?Sized> TokenizerProvider for &T {
    fn resolve_tokenizer(&self, model: &str) -> Result<Arc<dyn Tokenizer>> {
        (**self).resolve_tokenizer(model)
    }
}

impl<T: TokenizerProvider + ?Sized> TokenizerProvider for Arc<T> {
    fn resolve_tokenizer(&self, model: &str) -> Result<Arc<dyn Tokenizer>> {
        (**self).resolve_tokenizer(model)
    }
}
