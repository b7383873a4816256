//! Align command: span annotations → token training records

use clap::Parser;
use std::path::Path;
use std::time::Instant;

use super::super::output::{log_info, to_jsonl, write_output};
use super::super::utils::{load_config, read_jsonl_file};
use crate::align::{LabelAligner, TrainingRecord};
use crate::config::AbsaConfig;
use crate::dataset::{prepare_sentences, split_dataset, AnnotationRow};
use crate::span::LabeledSentence;
use crate::tokenizer::{OffsetTokenizer, WhitespaceTokenizer};

/// Align span annotations to token labels
#[derive(Parser, Debug)]
pub struct AlignArgs {
    /// JSONL of labeled sentences (`sentence`, `aspects`, `domain`)
    #[arg(short, long, value_name = "PATH", required_unless_present = "rows")]
    pub input: Option<String>,

    /// JSONL of annotation rows (one aspect per row), grouped before aligning
    #[arg(long, value_name = "PATH", conflicts_with = "input")]
    pub rows: Option<String>,

    /// HuggingFace `tokenizer.json` (requires --features hf-tokenizer)
    #[arg(short, long, value_name = "PATH")]
    pub tokenizer: Option<String>,

    /// Label every subword instead of only the first of each word
    #[arg(long)]
    pub label_all_subwords: bool,

    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,

    /// Write records here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<String>,

    /// Split into train/validation/test JSONL files in this directory
    #[arg(long, value_name = "DIR", conflicts_with = "output")]
    pub split_dir: Option<String>,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Pick the tokenizer: `tokenizer.json` if given, otherwise whitespace.
pub fn build_tokenizer(
    path: Option<&str>,
    config: &AbsaConfig,
) -> Result<Box<dyn OffsetTokenizer>, String> {
    match path {
        None => Ok(Box::new(
            WhitespaceTokenizer::new().with_max_length(config.max_seq_length),
        )),
        #[cfg(feature = "hf-tokenizer")]
        Some(path) => crate::tokenizer::HfTokenizer::from_file(path, config.max_seq_length)
            .map(|t| Box::new(t) as Box<dyn OffsetTokenizer>)
            .map_err(|e| e.to_string()),
        #[cfg(not(feature = "hf-tokenizer"))]
        Some(_) => Err(
            "Loading tokenizer.json requires the 'hf-tokenizer' feature. Enable with: cargo build --features hf-tokenizer"
                .to_string(),
        ),
    }
}

fn load_sentences(args: &AlignArgs, quiet: bool) -> Result<Vec<LabeledSentence>, String> {
    if let Some(rows_path) = &args.rows {
        let rows: Vec<AnnotationRow> = read_jsonl_file(rows_path)?;
        let prepared = prepare_sentences(&rows);
        log_info(
            &format!(
                "Grouped {} of {} rows into {} sentences",
                prepared.stats.rows_kept,
                prepared.stats.rows_in,
                prepared.sentences.len()
            ),
            quiet,
        );
        return Ok(prepared.sentences);
    }
    match &args.input {
        Some(path) => read_jsonl_file(path),
        None => Err("Provide --input or --rows".to_string()),
    }
}

/// Align sentences into training records.
pub fn align_records(
    aligner: &LabelAligner,
    tokenizer: &dyn OffsetTokenizer,
    sentences: &[LabeledSentence],
) -> Result<Vec<TrainingRecord>, String> {
    let aligned = aligner
        .align_batch(tokenizer, sentences)
        .map_err(|e| format!("Alignment failed: {}", e))?;
    Ok(aligned.iter().map(|a| a.to_training_record()).collect())
}

/// Run the align command
pub fn cmd_align(args: AlignArgs) -> Result<(), String> {
    let mut config = load_config(args.config.as_deref())?;
    if args.label_all_subwords {
        config.label_all_subword_tokens = true;
    }

    let sentences = load_sentences(&args, args.quiet)?;
    for sentence in &sentences {
        for problem in sentence.validation_errors() {
            log::warn!(
                "{}: {}",
                sentence.id.as_deref().unwrap_or("<unnamed>"),
                problem
            );
        }
    }

    let tokenizer = build_tokenizer(args.tokenizer.as_deref(), &config)?;
    let aligner = LabelAligner::from_config(&config).map_err(|e| e.to_string())?;

    let start = Instant::now();
    if let Some(dir) = &args.split_dir {
        let splits = split_dataset(
            sentences,
            config.validation_fraction,
            config.test_fraction,
            config.seed,
        )
        .map_err(|e| e.to_string())?;
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create directory {}: {}", dir, e))?;

        for (name, part) in [
            ("train", &splits.train),
            ("validation", &splits.validation),
            ("test", &splits.test),
        ] {
            let records = align_records(&aligner, tokenizer.as_ref(), part)?;
            let path = Path::new(dir).join(format!("{name}.jsonl"));
            let path = path.to_string_lossy().into_owned();
            write_output(&to_jsonl(&records)?, Some(path.as_str()))?;
            log_info(&format!("Wrote {} records to {}", records.len(), path), args.quiet);
        }
    } else {
        let records = align_records(&aligner, tokenizer.as_ref(), &sentences)?;
        write_output(&to_jsonl(&records)?, args.output.as_deref())?;
        log_info(
            &format!(
                "Aligned {} sentences in {:.2}ms",
                records.len(),
                start.elapsed().as_secs_f64() * 1000.0
            ),
            args.quiet,
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{AspectSpan, Polarity};

    #[test]
    fn test_align_records_with_whitespace_tokenizer() {
        let config = AbsaConfig::default();
        let tokenizer = build_tokenizer(None, &config).unwrap();
        let sentence = LabeledSentence::new(
            "The battery is great",
            vec![AspectSpan::new("battery", Polarity::Positive, 4, 11)],
            "laptop",
        )
        .with_id("laptop_1");

        let records =
            align_records(&LabelAligner::default(), tokenizer.as_ref(), &[sentence]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_deref(), Some("laptop_1"));
        assert_eq!(records[0].labels, vec![-100, 0, 1, 0, 0, -100]);
        assert_eq!(records[0].tokens[2], "battery");
    }

    #[cfg(not(feature = "hf-tokenizer"))]
    #[test]
    fn test_tokenizer_file_needs_feature() {
        let err = build_tokenizer(Some("tokenizer.json"), &AbsaConfig::default())
            .err()
            .unwrap();
        assert!(err.contains("hf-tokenizer"));
    }
}
