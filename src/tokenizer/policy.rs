//! Model identifier to encoding resolution.
//!
//! The built-in tables follow tiktoken's model map. Everything is injectable:
//! a [`ModelPolicy`] can start empty, take per-model overrides, and swap the
//! fallback rule, so a new model release never has to be guessed at in code.

use std::collections::HashMap;

use phf::phf_map;

use crate::error::{CountError, Result};
use crate::tokenizer::Encoding;

/// Exact model names.
pub static MODEL_ENCODINGS: phf::Map<&'static str, Encoding> = phf_map! {
    // o200k_base
    "gpt-5" => Encoding::O200kBase,
    "gpt-4.5" => Encoding::O200kBase,
    "gpt-4.1" => Encoding::O200kBase,
    "gpt-4o" => Encoding::O200kBase,
    "chatgpt-4o-latest" => Encoding::O200kBase,
    "o1" => Encoding::O200kBase,
    "o3" => Encoding::O200kBase,
    "o4-mini" => Encoding::O200kBase,
    // cl100k_base
    "gpt-4" => Encoding::Cl100kBase,
    "gpt-3.5-turbo" => Encoding::Cl100kBase,
    "gpt-3.5" => Encoding::Cl100kBase,
    "gpt-35-turbo" => Encoding::Cl100kBase,
    "davinci-002" => Encoding::Cl100kBase,
    "babbage-002" => Encoding::Cl100kBase,
    "text-embedding-ada-002" => Encoding::Cl100kBase,
    "text-embedding-3-small" => Encoding::Cl100kBase,
    "text-embedding-3-large" => Encoding::Cl100kBase,
    // p50k_base
    "text-davinci-003" => Encoding::P50kBase,
    "text-davinci-002" => Encoding::P50kBase,
    "code-davinci-002" => Encoding::P50kBase,
    "code-davinci-001" => Encoding::P50kBase,
    "code-cushman-002" => Encoding::P50kBase,
    "code-cushman-001" => Encoding::P50kBase,
    "davinci-codex" => Encoding::P50kBase,
    "cushman-codex" => Encoding::P50kBase,
    // p50k_edit
    "text-davinci-edit-001" => Encoding::P50kEdit,
    "code-davinci-edit-001" => Encoding::P50kEdit,
    // r50k_base
    "text-davinci-001" => Encoding::R50kBase,
    "text-curie-001" => Encoding::R50kBase,
    "text-babbage-001" => Encoding::R50kBase,
    "text-ada-001" => Encoding::R50kBase,
    "davinci" => Encoding::R50kBase,
    "curie" => Encoding::R50kBase,
    "babbage" => Encoding::R50kBase,
    "ada" => Encoding::R50kBase,
    "gpt-2" => Encoding::R50kBase,
};

/// Versioned and fine-tuned families, matched by longest prefix.
pub static MODEL_PREFIX_ENCODINGS: phf::Map<&'static str, Encoding> = phf_map! {
    "o1-" => Encoding::O200kBase,
    "o3-" => Encoding::O200kBase,
    "o4-mini-" => Encoding::O200kBase,
    "gpt-5-" => Encoding::O200kBase,
    "gpt-4.5-" => Encoding::O200kBase,
    "gpt-4.1-" => Encoding::O200kBase,
    "chatgpt-4o-" => Encoding::O200kBase,
    "gpt-4o-" => Encoding::O200kBase,
    "gpt-4-" => Encoding::Cl100kBase,
    "gpt-3.5-turbo-" => Encoding::Cl100kBase,
    "gpt-35-turbo-" => Encoding::Cl100kBase,
    "ft:gpt-4o" => Encoding::O200kBase,
    "ft:gpt-4" => Encoding::Cl100kBase,
    "ft:gpt-3.5-turbo" => Encoding::Cl100kBase,
    "ft:davinci-002" => Encoding::Cl100kBase,
    "ft:babbage-002" => Encoding::Cl100kBase,
};

/// Identifier stems that are plausibly a model we have not catalogued yet.
pub const DEFAULT_FALLBACK_FAMILIES: &[&str] =
    &["gpt-", "chatgpt-", "o1", "o3", "o4", "text-", "code-", "ft:"];

/// Encoding used for identifiers that only match a fallback family.
pub const DEFAULT_FALLBACK_ENCODING: Encoding = Encoding::Cl100kBase;

/// Which rule produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedVia {
    /// Explicit per-model override.
    Override,
    /// Exact built-in model name.
    Exact,
    /// The identifier is itself an encoding name.
    EncodingName,
    /// Longest matching family prefix.
    Prefix,
    /// Plausible family without a catalogued entry.
    Fallback,
}

/// Outcome of [`ModelPolicy::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Encoding to count with.
    pub encoding: Encoding,
    /// Rule that matched.
    pub via: ResolvedVia,
}

/// Injectable model resolution table.
///
/// # Example
/// ```
/// use counttokens::tokenizer::{Encoding, ModelPolicy, ResolvedVia};
///
/// let policy = ModelPolicy::builtin();
/// assert_eq!(policy.resolve("gpt-4o").unwrap().encoding, Encoding::O200kBase);
/// assert_eq!(policy.resolve("gpt-4-0613").unwrap().via, ResolvedVia::Prefix);
/// assert!(policy.resolve("not-a-real-model").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ModelPolicy {
    overrides: HashMap<String, Encoding>,
    exact: HashMap<String, Encoding>,
    /// Longest prefix first.
    prefixes: Vec<(String, Encoding)>,
    fallback_families: Vec<String>,
    fallback_encoding: Option<Encoding>,
}

impl Default for ModelPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelPolicy {
    /// Policy with no tables and no fallback.
    pub fn empty() -> Self {
        Self {
            overrides: HashMap::new(),
            exact: HashMap::new(),
            prefixes: Vec::new(),
            fallback_families: Vec::new(),
            fallback_encoding: None,
        }
    }

    /// Policy loaded with the built-in model and prefix tables and the
    /// default fallback rule.
    pub fn builtin() -> Self {
        let mut policy = Self::empty();
        for (model, encoding) in MODEL_ENCODINGS.entries() {
            policy.exact.insert((*model).to_string(), *encoding);
        }
        for (prefix, encoding) in MODEL_PREFIX_ENCODINGS.entries() {
            policy = policy.with_prefix(*prefix, *encoding);
        }
        policy.with_fallback(
            DEFAULT_FALLBACK_FAMILIES.iter().copied(),
            DEFAULT_FALLBACK_ENCODING,
        )
    }

    /// Pin a model identifier to an encoding, ahead of every other rule.
    pub fn with_override(mut self, model: &str, encoding: Encoding) -> Self {
        self.overrides.insert(normalize_model(model), encoding);
        self
    }

    /// Add an exact model entry.
    pub fn with_model(mut self, model: &str, encoding: Encoding) -> Self {
        self.exact.insert(normalize_model(model), encoding);
        self
    }

    /// Add a family prefix.
    pub fn with_prefix(mut self, prefix: &str, encoding: Encoding) -> Self {
        let prefix = prefix.trim().to_ascii_lowercase();
        self.prefixes.retain(|(p, _)| *p != prefix);
        self.prefixes.push((prefix, encoding));
        self.prefixes
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self
    }

    /// Replace the fallback rule.
    pub fn with_fallback<I, S>(mut self, families: I, encoding: Encoding) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_families = families
            .into_iter()
            .map(|f| f.into().trim().to_ascii_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        self.fallback_encoding = Some(encoding);
        self
    }

    /// Change only the fallback encoding, keeping the families.
    pub fn with_fallback_encoding(mut self, encoding: Encoding) -> Self {
        self.fallback_encoding = Some(encoding);
        self
    }

    /// Disable fallback: uncatalogued identifiers always fail.
    pub fn without_fallback(mut self) -> Self {
        self.fallback_encoding = None;
        self
    }

    /// Fallback encoding, if fallback is enabled.
    pub fn fallback_encoding(&self) -> Option<Encoding> {
        self.fallback_encoding
    }

    /// Resolve a model identifier to an encoding.
    pub fn resolve(&self, model: &str) -> Result<Resolved> {
        let id = normalize_model(model);
        if id.is_empty() {
            return Err(CountError::UnsupportedModel(model.to_string()));
        }

        if let Some(&encoding) = self.overrides.get(&id) {
            return Ok(Resolved {
                encoding,
                via: ResolvedVia::Override,
            });
        }
        if let Some(&encoding) = self.exact.get(&id) {
            return Ok(Resolved {
                encoding,
                via: ResolvedVia::Exact,
            });
        }
        if let Some(encoding) = Encoding::from_name(&id) {
            return Ok(Resolved {
                encoding,
                via: ResolvedVia::EncodingName,
            });
        }
        if let Some((_, encoding)) = self.prefixes.iter().find(|(p, _)| id.starts_with(p.as_str())) {
            return Ok(Resolved {
                encoding: *encoding,
                via: ResolvedVia::Prefix,
            });
        }
        if let Some(encoding) = self.fallback_encoding {
            if self.fallback_families.iter().any(|f| id.starts_with(f.as_str())) {
                tracing::warn!(
                    model = %model,
                    encoding = %encoding,
                    "Unknown model, falling back to default encoding"
                );
                return Ok(Resolved {
                    encoding,
                    via: ResolvedVia::Fallback,
                });
            }
        }

        Err(CountError::UnsupportedModel(model.to_string()))
    }

    /// Catalogued model names with their encodings, sorted by name.
    /// Overrides shadow built-in entries.
    pub fn known_models(&self) -> Vec<(String, Encoding)> {
        let mut merged: HashMap<&str, Encoding> =
            self.exact.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        for (k, v) in &self.overrides {
            merged.insert(k.as_str(), *v);
        }
        let mut models: Vec<(String, Encoding)> =
            merged.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        models.sort();
        models
    }
}

/// Canonical form of a model identifier: trimmed, lowercased, with any
/// provider prefix (`openai/gpt-4o`) reduced to its last segment.
pub fn normalize_model(model: &str) -> String {
    let trimmed = model.trim();
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.to_ascii_lowercase()
}
