//! Validate command: IOB2 tag sequences and annotation files

use clap::Parser;

use super::super::output::write_output;
use super::super::utils::read_jsonl_file;
use crate::eval::bio::{repair_tag_sequence, validate_tag_sequence, RepairStrategy};
use crate::span::LabeledSentence;

/// Validate tag sequences or annotation files
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Whitespace-separated tag sequence
    #[arg(short, long, required_unless_present = "input")]
    pub tags: Option<String>,

    /// JSONL of labeled sentences to check span offsets
    #[arg(short, long, value_name = "PATH", conflicts_with = "tags")]
    pub input: Option<String>,

    /// Print a repaired sequence (orphan I- tags promoted to B-)
    #[arg(long)]
    pub repair: bool,

    /// Repair orphan I- tags by dropping them to O instead
    #[arg(long, requires = "repair")]
    pub discard: bool,
}

/// Check one tag sequence; returns the report and whether it was valid.
pub fn check_tags(tags: &str, repair: Option<RepairStrategy>) -> (String, bool) {
    let tags: Vec<&str> = tags.split_whitespace().collect();
    let errors = validate_tag_sequence(&tags);

    let mut out = if errors.is_empty() {
        format!("valid ({} tags)\n", tags.len())
    } else {
        errors.iter().map(|e| format!("{}\n", e)).collect()
    };
    if let Some(strategy) = repair {
        out.push_str(&repair_tag_sequence(&tags, strategy).join(" "));
        out.push('\n');
    }
    (out, errors.is_empty())
}

/// Check span offsets of every sentence; returns the report and problem count.
pub fn check_sentences(sentences: &[LabeledSentence]) -> (String, usize) {
    let mut out = String::new();
    let mut problems = 0;
    for (i, sentence) in sentences.iter().enumerate() {
        let name = sentence.id.clone().unwrap_or_else(|| format!("line {}", i + 1));
        for problem in sentence.validation_errors() {
            out.push_str(&format!("{}: {}\n", name, problem));
            problems += 1;
        }
    }
    out.push_str(&format!(
        "{} sentences, {} problems\n",
        sentences.len(),
        problems
    ));
    (out, problems)
}

/// Run the validate command
pub fn cmd_validate(args: ValidateArgs) -> Result<(), String> {
    if let Some(path) = &args.input {
        let sentences: Vec<LabeledSentence> = read_jsonl_file(path)?;
        let (report, problems) = check_sentences(&sentences);
        write_output(&report, None)?;
        return if problems == 0 {
            Ok(())
        } else {
            Err(format!("{} annotation problems in {}", problems, path))
        };
    }

    let strategy = args.repair.then_some(if args.discard {
        RepairStrategy::Discard
    } else {
        RepairStrategy::PromoteToBegin
    });
    let tags = args.tags.as_deref().unwrap_or_default();
    let (report, valid) = check_tags(tags, strategy);
    write_output(&report, None)?;
    if valid {
        Ok(())
    } else {
        Err("invalid tag sequence".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{AspectSpan, Polarity};

    #[test]
    fn test_check_tags() {
        let (report, valid) = check_tags("O B-ASP-POS I-ASP-POS", None);
        assert!(valid);
        assert_eq!(report, "valid (3 tags)\n");

        let (report, valid) = check_tags("O I-ASP-POS", Some(RepairStrategy::PromoteToBegin));
        assert!(!valid);
        assert!(report.contains("follows O"));
        assert!(report.ends_with("O B-ASP-POS\n"));
    }

    #[test]
    fn test_check_sentences() {
        let ok = LabeledSentence::new(
            "Good screen",
            vec![AspectSpan::new("screen", Polarity::Positive, 5, 11)],
            "laptop",
        );
        let bad = LabeledSentence::new(
            "Good screen",
            vec![AspectSpan::new("screen", Polarity::Positive, 5, 40)],
            "laptop",
        )
        .with_id("laptop_2");
        let (report, problems) = check_sentences(&[ok, bad]);
        assert_eq!(problems, 1);
        assert!(report.contains("laptop_2"));
    }
}
