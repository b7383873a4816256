//! Labels command: print the label vocabulary

use clap::Parser;
use serde::Serialize;

use super::super::output::{to_json, write_output};
use super::super::parser::OutputFormat;
use super::super::utils::load_config;
use crate::labels::LabelVocabulary;

/// Print the label vocabulary
#[derive(Parser, Debug)]
pub struct LabelsArgs {
    /// TOML config with `polarity_codes`
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct LabelEntry<'a> {
    id: usize,
    label: &'a str,
}

/// Render the vocabulary as `id<TAB>label` lines or JSON
pub fn render_labels(vocab: &LabelVocabulary, format: OutputFormat) -> Result<String, String> {
    let entries: Vec<LabelEntry<'_>> = vocab
        .labels()
        .iter()
        .enumerate()
        .map(|(id, label)| LabelEntry { id, label })
        .collect();

    match format {
        OutputFormat::Human => Ok(entries
            .iter()
            .map(|e| format!("{}\t{}\n", e.id, e.label))
            .collect()),
        OutputFormat::Json => to_json(&entries),
        OutputFormat::Jsonl => super::super::output::to_jsonl(&entries),
    }
}

/// Run the labels command
pub fn cmd_labels(args: LabelsArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let vocab = config.vocabulary().map_err(|e| e.to_string())?;
    write_output(&render_labels(&vocab, args.format)?, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_listing() {
        let out = render_labels(&LabelVocabulary::standard(), OutputFormat::Human).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "0\tO");
        assert_eq!(lines[1], "1\tB-ASP-POS");
        assert_eq!(lines[6], "6\tI-ASP-NEU");
    }

    #[test]
    fn test_json_listing() {
        let out = render_labels(&LabelVocabulary::standard(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[2]["label"], "B-ASP-NEG");
    }
}
