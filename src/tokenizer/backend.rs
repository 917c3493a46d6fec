//! Concrete tokenizer backends.
//!
//! - [`BpeTokenizer`]: tiktoken-rs BPE ranks for the OpenAI encodings
//! - [`HuggingFaceTokenizer`]: any `tokenizer.json` loadable by the
//!   HuggingFace `tokenizers` crate

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::error::{CountError, Result};
use crate::tokenizer::policy::normalize_model;
use crate::tokenizer::{Encoding, ModelPolicy, TokenId, Tokenizer, TokenizerProvider};

/// tiktoken BPE tokenizer for one encoding.
pub struct BpeTokenizer {
    encoding: Encoding,
    bpe: CoreBPE,
}

impl BpeTokenizer {
    /// Load the BPE ranks for `encoding`.
    pub fn new(encoding: Encoding) -> Result<Self> {
        let loaded = match encoding {
            Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            Encoding::O200kBase => tiktoken_rs::o200k_base(),
            Encoding::P50kBase => tiktoken_rs::p50k_base(),
            Encoding::P50kEdit => tiktoken_rs::p50k_edit(),
            Encoding::R50kBase => tiktoken_rs::r50k_base(),
        };
        let bpe = loaded.map_err(|e| {
            CountError::Tokenizer(format!("Failed to load {} tokenizer: {e}", encoding.name()))
        })?;
        Ok(Self { encoding, bpe })
    }

    /// Encoding used by this tokenizer
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Tokenizer for BpeTokenizer {
    fn name(&self) -> &str {
        self.encoding.name()
    }

    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        Ok(self
            .bpe
            .encode_with_special_tokens(text)
            .into_iter()
            .map(|id| id as TokenId)
            .collect())
    }

    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.bpe.encode_with_special_tokens(text).len())
    }
}

/// Tokenizer loaded from a HuggingFace `tokenizer.json`.
pub struct HuggingFaceTokenizer {
    name: String,
    inner: tokenizers::Tokenizer,
}

impl HuggingFaceTokenizer {
    /// Load a tokenizer definition from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            CountError::Tokenizer(format!(
                "Failed to load tokenizer file {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self {
            name: path.display().to_string(),
            inner,
        })
    }
}

impl Tokenizer for HuggingFaceTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| CountError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().to_vec())
    }
}

/// Provider backed by a [`ModelPolicy`] plus optional per-model
/// `tokenizer.json` files.
///
/// Every call builds a fresh tokenizer; wrap it in a
/// [`TokenizerCache`](crate::tokenizer::TokenizerCache) to reuse instances.
#[derive(Debug, Clone, Default)]
pub struct DefaultTokenizerProvider {
    policy: ModelPolicy,
    tokenizer_files: HashMap<String, PathBuf>,
}

impl DefaultTokenizerProvider {
    /// Create a provider with the given resolution policy
    pub fn new(policy: ModelPolicy) -> Self {
        Self {
            policy,
            tokenizer_files: HashMap::new(),
        }
    }

    /// Serve `model` from a HuggingFace `tokenizer.json` instead of a BPE
    /// encoding.
    pub fn with_tokenizer_file(mut self, model: &str, path: impl Into<PathBuf>) -> Self {
        self.tokenizer_files
            .insert(normalize_model(model), path.into());
        self
    }

    /// Resolution policy in use
    pub fn policy(&self) -> &ModelPolicy {
        &self.policy
    }

    /// Models served from tokenizer files, sorted by name.
    pub fn tokenizer_files(&self) -> Vec<(&str, &Path)> {
        let mut files: Vec<(&str, &Path)> = self
            .tokenizer_files
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_path()))
            .collect();
        files.sort();
        files
    }
}

impl TokenizerProvider for DefaultTokenizerProvider {
    fn resolve_tokenizer(&self, model: &str) -> Result<Arc<dyn Tokenizer>> {
        if let Some(path) = self.tokenizer_files.get(&normalize_model(model)) {
            tracing::debug!(model = %model, path = %path.display(), "Loading tokenizer file");
            return Ok(Arc::new(HuggingFaceTokenizer::from_file(path)?));
        }

        let resolved = self.policy.resolve(model)?;
        tracing::debug!(
            model = %model,
            encoding = %resolved.encoding,
            via = ?resolved.via,
            "Resolved tokenizer"
        );
        Ok(Arc::new(BpeTokenizer::new(resolved.encoding)?))
    }
}
