//! Pipeline configuration.
//!
//! Loaded from TOML; every field is optional and falls back to the values the
//! reference training setup used:
//!
//! ```toml
//! model_name = "bert-base-uncased"
//! max_seq_length = 512
//! label_all_subword_tokens = false
//! polarity_codes = ["POS", "NEG", "NEU"]
//! seed = 42
//! validation_fraction = 0.1
//! test_fraction = 0.1
//! ```

use crate::labels::LabelVocabulary;
use crate::reduce::SubwordPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for alignment, splitting, reassembly and summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsaConfig {
    /// Base model / tokenizer identifier
    pub model_name: String,
    /// Tokenizer truncation length
    pub max_seq_length: usize,
    /// Supervise every subword instead of only the first one per word
    pub label_all_subword_tokens: bool,
    /// Polarity codes, in vocabulary order
    pub polarity_codes: Vec<String>,
    /// Seed for dataset shuffling
    pub seed: u64,
    /// Fraction of sentences held out for validation
    pub validation_fraction: f64,
    /// Fraction of sentences held out for test
    pub test_fraction: f64,
    /// Decimal digits kept on reassembled confidence scores
    pub score_decimals: u32,
    /// Pros listed in a summary
    pub top_n_pros: usize,
    /// Cons listed in a summary
    pub top_n_cons: usize,
}

impl Default for AbsaConfig {
    fn default() -> Self {
        Self {
            model_name: "bert-base-uncased".to_string(),
            max_seq_length: 512,
            label_all_subword_tokens: false,
            polarity_codes: vec!["POS".into(), "NEG".into(), "NEU".into()],
            seed: 42,
            validation_fraction: 0.1,
            test_fraction: 0.1,
            score_decimals: 4,
            top_n_pros: 5,
            top_n_cons: 5,
        }
    }
}

impl AbsaConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// [`Error::Toml`] on syntax errors, [`Error::Config`] on invalid values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// IO, TOML or validation errors.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        log::debug!("loaded config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Check value ranges and that the label vocabulary can be built.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.max_seq_length == 0 {
            return Err(Error::config("max_seq_length must be > 0"));
        }
        for (name, value) in [
            ("validation_fraction", self.validation_fraction),
            ("test_fraction", self.test_fraction),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(Error::config(format!(
                    "{name} must be in [0, 1), got {value}"
                )));
            }
        }
        if self.validation_fraction + self.test_fraction >= 1.0 {
            return Err(Error::config(format!(
                "validation_fraction + test_fraction must be < 1, got {}",
                self.validation_fraction + self.test_fraction
            )));
        }
        if self.score_decimals > 12 {
            return Err(Error::config("score_decimals must be <= 12"));
        }
        self.vocabulary().map(|_| ())
    }

    /// Build the label vocabulary from `polarity_codes`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for an empty or malformed code list.
    pub fn vocabulary(&self) -> Result<LabelVocabulary> {
        LabelVocabulary::new(&self.polarity_codes)
    }

    /// Subword reduction policy selected by `label_all_subword_tokens`.
    #[must_use]
    pub fn subword_policy(&self) -> SubwordPolicy {
        SubwordPolicy::from_label_all(self.label_all_subword_tokens)
    }
}
