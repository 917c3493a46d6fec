//! Session-scoped tokenizer cache.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::tokenizer::policy::normalize_model;
use crate::tokenizer::{Tokenizer, TokenizerProvider};

/// Memoizes `model -> tokenizer` over another provider.
///
/// Create one per counting session and pass it to the counter; nothing is
/// shared between caches. Reads take a shared lock. Two threads that miss
/// on the same model may both build a tokenizer; the first insert wins and
/// both callers get that instance.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use counttokens::tokenizer::{DefaultTokenizerProvider, TokenizerCache, TokenizerProvider};
///
/// let cache = TokenizerCache::new(DefaultTokenizerProvider::default());
/// let a = cache.resolve_tokenizer("gpt-4").unwrap();
/// let b = cache.resolve_tokenizer("GPT-4").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct TokenizerCache<P> {
    provider: P,
    entries: RwLock<HashMap<String, Arc<dyn Tokenizer>>>,
}

impl<P: TokenizerProvider> TokenizerCache<P> {
    /// Wrap a provider with an empty cache
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Number of cached tokenizers
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached tokenizer
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<P: TokenizerProvider> TokenizerProvider for TokenizerCache<P> {
    fn resolve_tokenizer(&self, model: &str) -> Result<Arc<dyn Tokenizer>> {
        let key = normalize_model(model);

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(hit));
        }

        // Build outside the lock; construction can take a while.
        let built = self.provider.resolve_tokenizer(model)?;
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(built)))
    }
}
