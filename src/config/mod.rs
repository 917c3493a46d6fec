//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files (`--config`, or `counttokens/config.toml` under the
//!   platform config directory)
//! - Environment variables (`COUNTTOKENS_*`)
//! - CLI arguments (applied last by the binary)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::counter::{DirectoryScan, ExtensionFilter, DEFAULT_EXTENSIONS};
use crate::error::{CountError, Result};
use crate::output::OutputFormat;
use crate::tokenizer::{
    DefaultTokenizerProvider, Encoding, ModelPolicy, DEFAULT_FALLBACK_ENCODING,
    DEFAULT_FALLBACK_FAMILIES,
};

/// Environment variable naming a config file.
pub const ENV_CONFIG: &str = "COUNTTOKENS_CONFIG";
/// Environment variable overriding the default model.
pub const ENV_MODEL: &str = "COUNTTOKENS_MODEL";
/// Environment variable overriding the fallback encoding.
pub const ENV_FALLBACK_ENCODING: &str = "COUNTTOKENS_FALLBACK_ENCODING";
/// Environment variable overriding scanned extensions (comma-separated).
pub const ENV_EXTENSIONS: &str = "COUNTTOKENS_EXTENSIONS";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Counting defaults
    #[serde(default)]
    pub counting: CountingConfig,

    /// Model resolution policy
    #[serde(default)]
    pub models: ModelConfig,

    /// Report output
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            CountError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| CountError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from a variable lookup (environment in production,
    /// a map in tests).
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(model) = lookup(ENV_MODEL).filter(|m| !m.trim().is_empty()) {
            config.counting.model = model.trim().to_string();
        }
        if let Some(encoding) = lookup(ENV_FALLBACK_ENCODING) {
            config.models.fallback_encoding = encoding.parse()?;
        }
        if let Some(extensions) = lookup(ENV_EXTENSIONS) {
            config.counting.extensions = extensions
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }

        Ok(config)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("counttokens").join("config.toml"))
    }

    /// Resolve the effective configuration.
    ///
    /// File: `explicit`, else `$COUNTTOKENS_CONFIG`, else the default path
    /// if it exists. Environment variables are merged over the file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from))
            .or_else(|| Self::default_path().filter(|p| p.is_file()));

        let base = match file {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::from_file(path)?
            },
            None => Self::default(),
        };

        Ok(base.merge(Self::from_env()?))
    }

    /// Merge with another config (other takes precedence where it differs
    /// from the defaults)
    pub fn merge(self, other: Self) -> Self {
        let counting_default = CountingConfig::default();
        let models_default = ModelConfig::default();

        let mut overrides = self.models.overrides;
        overrides.extend(other.models.overrides);
        let mut tokenizer_files = self.models.tokenizer_files;
        tokenizer_files.extend(other.models.tokenizer_files);

        Self {
            counting: CountingConfig {
                model: pick(self.counting.model, other.counting.model, &counting_default.model),
                extensions: pick(
                    self.counting.extensions,
                    other.counting.extensions,
                    &counting_default.extensions,
                ),
                recursive: pick(
                    self.counting.recursive,
                    other.counting.recursive,
                    &counting_default.recursive,
                ),
                parallel: self.counting.parallel || other.counting.parallel,
            },
            models: ModelConfig {
                fallback_encoding: pick(
                    self.models.fallback_encoding,
                    other.models.fallback_encoding,
                    &models_default.fallback_encoding,
                ),
                fallback_families: pick(
                    self.models.fallback_families,
                    other.models.fallback_families,
                    &models_default.fallback_families,
                ),
                fallback: pick(
                    self.models.fallback,
                    other.models.fallback,
                    &models_default.fallback,
                ),
                overrides,
                tokenizer_files,
            },
            output: OutputConfig {
                format: other.output.format.or(self.output.format),
            },
        }
    }

    /// Model resolution policy described by this config
    pub fn policy(&self) -> ModelPolicy {
        let mut policy = ModelPolicy::builtin();
        policy = if self.models.fallback {
            policy.with_fallback(
                self.models.fallback_families.iter().cloned(),
                self.models.fallback_encoding,
            )
        } else {
            policy.without_fallback()
        };
        for (model, encoding) in &self.models.overrides {
            policy = policy.with_override(model, *encoding);
        }
        policy
    }

    /// Tokenizer provider described by this config
    pub fn provider(&self) -> DefaultTokenizerProvider {
        self.models.tokenizer_files.iter().fold(
            DefaultTokenizerProvider::new(self.policy()),
            |provider, (model, path)| provider.with_tokenizer_file(model, path.clone()),
        )
    }

    /// Directory scan options described by this config
    pub fn scan(&self) -> DirectoryScan {
        DirectoryScan::new()
            .with_extensions(ExtensionFilter::new(&self.counting.extensions))
            .recursive(self.counting.recursive)
            .parallel(self.counting.parallel)
    }
}

fn pick<T: PartialEq>(base: T, other: T, default: &T) -> T {
    if other != *default {
        other
    } else {
        base
    }
}

/// Counting defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountingConfig {
    /// Model used when the CLI does not name one
    pub model: String,

    /// Extensions scanned in directories
    pub extensions: Vec<String>,

    /// Descend into subdirectories
    pub recursive: bool,

    /// Count directory files in parallel
    pub parallel: bool,
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            recursive: true,
            parallel: false,
        }
    }
}

/// Model resolution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Allow uncatalogued but plausible models to use the fallback encoding
    pub fallback: bool,

    /// Encoding used for fallback resolution
    pub fallback_encoding: Encoding,

    /// Identifier stems considered plausible for fallback
    pub fallback_families: Vec<String>,

    /// Model -> encoding pins, checked before the built-in tables
    pub overrides: HashMap<String, Encoding>,

    /// Model -> HuggingFace `tokenizer.json` path
    pub tokenizer_files: HashMap<String, PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            fallback: true,
            fallback_encoding: DEFAULT_FALLBACK_ENCODING,
            fallback_families: DEFAULT_FALLBACK_FAMILIES
                .iter()
                .map(|f| f.to_string())
                .collect(),
            overrides: HashMap::new(),
            tokenizer_files: HashMap::new(),
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used when the output path does not decide it
    pub format: Option<OutputFormat>,
}
