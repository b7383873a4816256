//! CLI argument parsing and structure definitions

use clap::{Parser, Subcommand, ValueEnum};

use super::commands;

/// Aspect-based sentiment labeling CLI
#[derive(Parser)]
#[command(name = "absa")]
#[command(
    author,
    version,
    about = "Aspect-based sentiment labeling: alignment, metrics, summaries",
    long_about = r#"
absa - label alignment toolkit for aspect-based sentiment token classifiers

LABELS:
  O, B-ASP-POS, B-ASP-NEG, B-ASP-NEU, I-ASP-POS, I-ASP-NEG, I-ASP-NEU
  Tokens excluded from the loss are written as -100.

EXAMPLES:
  absa labels
  absa align --input sentences.jsonl --output train.jsonl
  absa align --rows annotations.jsonl --split-dir data/
  absa metrics --input eval.json
  absa summarize --input reviews.json --prompt
  absa validate --tags "O I-ASP-POS I-ASP-POS"
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the label vocabulary
    #[command(visible_alias = "l")]
    Labels(commands::LabelsArgs),

    /// Align span annotations to token labels
    #[command(visible_alias = "a")]
    Align(commands::AlignArgs),

    /// Score predicted label ids against gold ids
    #[command(visible_alias = "m")]
    Metrics(commands::MetricsArgs),

    /// Tally extracted aspects into pros, cons and a prompt
    #[command(visible_alias = "s")]
    Summarize(commands::SummarizeArgs),

    /// Validate tag sequences or annotation files
    #[command(visible_alias = "v")]
    Validate(commands::ValidateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Output format selection for all commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// Pretty JSON
    Json,
    /// JSON lines (one object per line)
    Jsonl,
}
