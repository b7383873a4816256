//! # absa
//!
//! Aspect-based sentiment analysis plumbing for token classifiers.
//!
//! - **Alignment**: character-span aspect annotations → BIO-sentiment labels
//!   per subword token, ready for a training harness
//! - **Reassembly**: per-token predictions → aspect terms with sentiment
//! - **Evaluation**: seqeval-compatible entity-level precision/recall/F1
//! - **Data**: annotation-row grouping, seeded splits, JSONL IO
//! - **Summary**: per-term tallies, pros/cons, LLM prompt and reply parsing
//!
//! ## Label scheme
//!
//! | id | label |
//! |----|-------|
//! | 0 | `O` |
//! | 1 | `B-ASP-POS` |
//! | 2 | `B-ASP-NEG` |
//! | 3 | `B-ASP-NEU` |
//! | 4 | `I-ASP-POS` |
//! | 5 | `I-ASP-NEG` |
//! | 6 | `I-ASP-NEU` |
//!
//! Tokens excluded from the loss (special tokens, and with the default
//! policy, non-first subwords) serialize to `-100`.
//!
//! ## Quick Start
//!
//! ```rust
//! use absa::{AspectSpan, LabelAligner, LabeledSentence, Polarity, WhitespaceTokenizer};
//!
//! let sentence = LabeledSentence::new(
//!     "The battery is great",
//!     vec![AspectSpan::new("battery", Polarity::Positive, 4, 11)],
//!     "laptop",
//! );
//! let tokenizer = WhitespaceTokenizer::new();
//!
//! let aligned = LabelAligner::default().align_with(&tokenizer, &sentence).unwrap();
//! assert_eq!(aligned.labels.to_training_ids(), vec![-100, 0, 1, 0, 0, -100]);
//! ```
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! absa = "0.1"                                          # core only
//! absa = { version = "0.1", features = ["hf-tokenizer"] } # + tokenizer.json support
//! absa = { version = "0.1", features = ["parallel"] }     # + rayon batch alignment
//! ```
//!
//! The `cli` feature builds the `absa` binary.

#![warn(missing_docs)]

pub mod align;
pub mod confidence;
pub mod config;
pub mod dataset;
mod error;
pub mod eval;
pub mod labels;
pub mod offset;
pub mod reassemble;
pub mod reduce;
pub mod span;
pub mod summary;
pub mod tokenizer;

#[cfg(feature = "cli")]
pub mod cli;

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    //!
    //! ```rust
    //! use absa::prelude::*;
    //!
    //! let vocab = LabelVocabulary::standard();
    //! assert_eq!(vocab.len(), 7);
    //! ```

    pub use crate::align::{AlignedSentence, LabelAligner};
    pub use crate::config::AbsaConfig;
    pub use crate::error::{Error, Result};
    pub use crate::eval::{compute_metrics, AbsaMetrics};
    pub use crate::labels::{LabelVocabulary, Tag, TokenLabel, TokenLabelSequence, IGNORE_INDEX};
    pub use crate::offset::{TokenOffset, TokenizedSentence};
    pub use crate::reassemble::{ExtractedAspect, Reassembler, ReviewAspects, Sentiment};
    pub use crate::reduce::SubwordPolicy;
    pub use crate::span::{AspectSpan, LabeledSentence, Polarity};
    pub use crate::tokenizer::{OffsetTokenizer, WhitespaceTokenizer};
}

// Re-exports
pub use align::{align, align_raw, AlignedSentence, LabelAligner, TrainingRecord};
pub use confidence::Confidence;
pub use config::AbsaConfig;
pub use error::{Error, Result};
pub use labels::{LabelVocabulary, Tag, TokenLabel, TokenLabelSequence, IGNORE_INDEX};
pub use offset::{char_slice, TokenOffset, TokenizedSentence};
pub use reassemble::{
    reassemble, EntityGrouper, ExtractedAspect, GroupedEntity, Reassembler, ReviewAspects,
    Sentiment, SimpleAggregation, TokenPrediction,
};
pub use reduce::{reduce, SubwordPolicy};
pub use span::{AspectSpan, LabeledSentence, Polarity};
pub use tokenizer::{OffsetTokenizer, WhitespaceTokenizer};

#[cfg(feature = "hf-tokenizer")]
pub use tokenizer::HfTokenizer;
