//! Summarize command: tally extracted aspects into pros and cons

use clap::Parser;
use serde::Serialize;

use super::super::output::{to_json, write_output};
use super::super::parser::OutputFormat;
use super::super::utils::{load_config, read_input_file, read_json_file};
use crate::reassemble::ReviewAspects;
use crate::summary::{
    build_summary_prompt, parse_summary_response, FinalSummary, ProsCons, SentimentCounts,
    SentimentTally,
};

/// Tally extracted aspects into pros, cons and a prompt
#[derive(Parser, Debug)]
pub struct SummarizeArgs {
    /// JSON array of `{review_text, extracted_aspects}`
    #[arg(short, long, value_name = "PATH")]
    pub input: String,

    /// Number of pros to keep (default from config)
    #[arg(long)]
    pub top_pros: Option<usize>,

    /// Number of cons to keep (default from config)
    #[arg(long)]
    pub top_cons: Option<usize>,

    /// Print the text-generation prompt instead of a local summary
    #[arg(long)]
    pub prompt: bool,

    /// Parse a saved generator reply and print it as the summary
    #[arg(long, value_name = "PATH", conflicts_with = "prompt")]
    pub response: Option<String>,

    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct TermRow<'a> {
    term: &'a str,
    #[serde(flatten)]
    counts: SentimentCounts,
}

#[derive(Serialize)]
struct SummaryReport<'a> {
    aspects: Vec<TermRow<'a>>,
    pros_cons: &'a ProsCons,
    final_summary: &'a FinalSummary,
}

fn render_human(tally: &SentimentTally, summary: &FinalSummary) -> String {
    let mut out = format!("{} distinct aspects\n\n", tally.len());
    for (term, c) in tally.iter() {
        out.push_str(&format!(
            "  {:<24} +{} -{} ={}\n",
            term, c.positive, c.negative, c.neutral
        ));
    }
    out.push_str("\nPros:\n");
    for pro in &summary.pros {
        out.push_str(&format!("  - {}\n", pro));
    }
    out.push_str("Cons:\n");
    for con in &summary.cons {
        out.push_str(&format!("  - {}\n", con));
    }
    out.push('\n');
    out.push_str(&summary.summary_paragraph);
    out.push('\n');
    out
}

/// Run the summarize command
pub fn cmd_summarize(args: SummarizeArgs) -> Result<(), String> {
    let config = load_config(args.config.as_deref())?;
    let top_pros = args.top_pros.unwrap_or(config.top_n_pros);
    let top_cons = args.top_cons.unwrap_or(config.top_n_cons);

    let reviews: Vec<ReviewAspects> = read_json_file(&args.input)?;
    let tally = SentimentTally::from_reviews(&reviews);

    if args.prompt {
        return write_output(&build_summary_prompt(&tally, top_pros, top_cons), None);
    }

    let pros_cons = ProsCons::from_tally(&tally, top_pros, top_cons);
    let summary = match &args.response {
        Some(path) => parse_summary_response(&read_input_file(path)?)
            .unwrap_or_else(FinalSummary::failed),
        None if reviews.is_empty() => FinalSummary::empty(),
        None => pros_cons.to_summary(),
    };

    let output = match args.format {
        OutputFormat::Human => render_human(&tally, &summary),
        OutputFormat::Json | OutputFormat::Jsonl => to_json(&SummaryReport {
            aspects: tally
                .iter()
                .map(|(term, counts)| TermRow {
                    term,
                    counts: *counts,
                })
                .collect(),
            pros_cons: &pros_cons,
            final_summary: &summary,
        })?,
    };
    write_output(&output, None)
}
