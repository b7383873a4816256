//! Command implementations for absa CLI
//!
//! Each command has its own module/file.

pub mod align;
pub mod labels;
pub mod metrics;
pub mod summarize;
pub mod validate;

// Re-export argument types for parser
pub use align::{cmd_align, AlignArgs};
pub use labels::{cmd_labels, LabelsArgs};
pub use metrics::{cmd_metrics, MetricsArgs};
pub use summarize::{cmd_summarize, SummarizeArgs};
pub use validate::{cmd_validate, ValidateArgs};
