//! Evaluation: BIO chunking, seqeval-compatible reports and training metrics.
//!
//! - [`bio`]: tag parsing, chunk extraction, validation and repair
//! - [`seqeval`]: [`SequenceEvaluator`] and the default [`SeqevalEvaluator`]
//! - [`metrics`]: [`compute_metrics`] over label-id batches
//!
//! # Example
//!
//! ```rust
//! use absa::eval::compute_metrics;
//! use absa::labels::LabelVocabulary;
//!
//! let id_to_label = LabelVocabulary::standard().id_to_label_map();
//! let gold = vec![vec![-100, 0, 1, 4, 0, -100]];
//! let pred = vec![vec![0, 0, 1, 4, 0, 0]];
//!
//! let metrics = compute_metrics(&pred, &gold, &id_to_label);
//! assert_eq!(metrics.f1, 1.0);
//! assert_eq!(metrics.to_map()["f1_ASP-POS"], 1.0);
//! ```

pub mod bio;
pub mod metrics;
pub mod seqeval;

pub use bio::{get_chunks, repair_tag_sequence, validate_tag_sequence, Chunk, RepairStrategy};
pub use metrics::{
    compute_metrics, compute_metrics_from_logits, compute_metrics_with, filter_batch,
    AbsaMetrics, DegradedReason, FilteredBatch,
};
pub use seqeval::{ClassificationReport, SeqevalEvaluator, SequenceEvaluator, TypeScores};
