//! BPE encoding identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CountError;

/// Tokenizer encoding type
///
/// Different models use different tokenizers. The encoding type determines
/// which BPE ranks are used for token counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Encoding {
    /// OpenAI cl100k_base encoding (GPT-3.5, GPT-4, embeddings v2/v3)
    #[default]
    #[serde(rename = "cl100k_base")]
    Cl100kBase,
    /// OpenAI o200k_base encoding (GPT-4o, GPT-4.1, GPT-5, o-series)
    #[serde(rename = "o200k_base")]
    O200kBase,
    /// OpenAI p50k_base encoding (Codex, text-davinci-002/003)
    #[serde(rename = "p50k_base")]
    P50kBase,
    /// OpenAI p50k_edit encoding (edit models)
    #[serde(rename = "p50k_edit")]
    P50kEdit,
    /// OpenAI r50k_base encoding (GPT-3 base models, also known as gpt2)
    #[serde(rename = "r50k_base")]
    R50kBase,
}

impl Encoding {
    /// Every supported encoding, in a stable order.
    pub const ALL: [Encoding; 5] = [
        Encoding::O200kBase,
        Encoding::Cl100kBase,
        Encoding::P50kBase,
        Encoding::P50kEdit,
        Encoding::R50kBase,
    ];

    /// Get encoding name as string
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::O200kBase => "o200k_base",
            Encoding::P50kBase => "p50k_base",
            Encoding::P50kEdit => "p50k_edit",
            Encoding::R50kBase => "r50k_base",
        }
    }

    /// Look up an encoding by its canonical name.
    ///
    /// `gpt2` is accepted as an alias for `r50k_base`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cl100k_base" => Some(Encoding::Cl100kBase),
            "o200k_base" => Some(Encoding::O200kBase),
            "p50k_base" => Some(Encoding::P50kBase),
            "p50k_edit" => Some(Encoding::P50kEdit),
            "r50k_base" | "gpt2" => Some(Encoding::R50kBase),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = CountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| CountError::Config(format!("Unknown encoding: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for encoding in Encoding::ALL {
            assert_eq!(Encoding::from_name(encoding.name()), Some(encoding));
        }
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(Encoding::from_name("GPT2"), Some(Encoding::R50kBase));
        assert_eq!(Encoding::from_name(" O200K_BASE "), Some(Encoding::O200kBase));
        assert_eq!(Encoding::from_name("heuristic"), None);
    }

    #[test]
    fn test_from_str_error() {
        let err = "bogus".parse::<Encoding>().unwrap_err();
        assert!(err.to_string().contains("Unknown encoding: bogus"));
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&Encoding::O200kBase).unwrap();
        assert_eq!(json, "\"o200k_base\"");
        let parsed: Encoding = serde_json::from_str("\"p50k_edit\"").unwrap();
        assert_eq!(parsed, Encoding::P50kEdit);
    }
}
