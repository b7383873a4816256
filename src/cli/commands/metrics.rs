//! Metrics command: entity-level scores for label-id batches

use clap::Parser;
use serde::Deserialize;

use super::super::output::{to_json, write_output};
use super::super::parser::OutputFormat;
use super::super::utils::{load_config, read_json_file};
use crate::eval::{compute_metrics, compute_metrics_from_logits, AbsaMetrics};
use crate::labels::LabelVocabulary;

/// Score predicted label ids against gold ids
#[derive(Parser, Debug)]
pub struct MetricsArgs {
    /// JSON with `labels` and either `predictions` or `logits`
    #[arg(short, long, value_name = "PATH")]
    pub input: String,

    /// TOML config with `polarity_codes`
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,

    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,
}

/// Evaluation batch as written by a training harness.
#[derive(Debug, Deserialize)]
pub struct EvalBatch {
    /// Gold ids per sentence, `-100` for excluded tokens
    pub labels: Vec<Vec<i64>>,
    /// Predicted ids per sentence
    #[serde(default)]
    pub predictions: Option<Vec<Vec<i64>>>,
    /// Raw scores `[sentence][token][label]`
    #[serde(default)]
    pub logits: Option<Vec<Vec<Vec<f32>>>>,
}

/// Score a batch; predicted ids win over logits when both are present.
pub fn score_batch(batch: &EvalBatch, vocab: &LabelVocabulary) -> Result<AbsaMetrics, String> {
    let id_to_label = vocab.id_to_label_map();
    match (&batch.predictions, &batch.logits) {
        (Some(pred), _) => Ok(compute_metrics(pred, &batch.labels, &id_to_label)),
        (None, Some(logits)) => Ok(compute_metrics_from_logits(
            logits,
            &batch.labels,
            &id_to_label,
        )),
        (None, None) => Err("Input needs either 'predictions' or 'logits'".to_string()),
    }
}

fn render_human(metrics: &AbsaMetrics) -> String {
    let mut out = String::new();
    for (key, value) in metrics.to_map() {
        out.push_str(&format!("{:<12} {:.4}\n", key, value));
    }
    out.push_str(&format!("{:<12} {}\n", "sentences", metrics.sentences_scored));
    if let Some(reason) = &metrics.degraded {
        out.push_str(&format!("degraded: {}\n", reason));
    }
    out
}

/// Run the metrics command
pub fn cmd_metrics(args: MetricsArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let vocab = config.vocabulary().map_err(|e| e.to_string())?;
    let batch: EvalBatch = read_json_file(&args.input)?;

    let metrics = score_batch(&batch, &vocab)?;
    let output = match args.format {
        OutputFormat::Human => render_human(&metrics),
        OutputFormat::Json | OutputFormat::Jsonl => to_json(&metrics)?,
    };
    write_output(&output, None)
}
