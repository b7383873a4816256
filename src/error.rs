//! Error types for absa.

use thiserror::Error;

/// Result type for absa operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for absa operations.
///
/// Scoring an empty or unscorable batch is not an error; see
/// [`crate::eval::AbsaMetrics::degraded`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Malformed configuration or label vocabulary. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A polarity string outside {positive, negative, neutral}.
    ///
    /// Recoverable: the alignment engine skips the offending aspect.
    #[error("Unknown polarity: {0:?}")]
    UnknownPolarity(String),

    /// Alignment inputs are inconsistent (e.g. offsets vs word ids).
    #[error("Alignment input error: {0}")]
    Alignment(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tokenizer failed to load or encode.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Evaluation error raised by a sequence evaluator.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parse error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an unknown polarity error.
    pub fn unknown_polarity(value: impl Into<String>) -> Self {
        Error::UnknownPolarity(value.into())
    }

    /// Create an alignment input error.
    pub fn alignment(msg: impl Into<String>) -> Self {
        Error::Alignment(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a tokenizer error.
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Error::Tokenizer(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create an evaluation error.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Error::Evaluation(msg.into())
    }

    /// Whether the pipeline may continue after this error by skipping the
    /// item that produced it.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        matches!(self, Error::UnknownPolarity(_))
    }
}
