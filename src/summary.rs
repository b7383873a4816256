//! Aggregating extracted aspects into a pros/cons summary.
//!
//! [`SentimentTally`] counts mentions per term across reviews. From there a
//! summary is either computed locally ([`ProsCons`]) or delegated to an
//! external text generator through the [`Summarizer`] capability, using the
//! prompt from [`build_summary_prompt`] and parsing the reply with
//! [`parse_summary_response`].

use crate::reassemble::{ReviewAspects, Sentiment};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Mention counts for one term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SentimentCounts {
    /// Positive mentions
    pub positive: usize,
    /// Negative mentions
    pub negative: usize,
    /// Neutral mentions
    pub neutral: usize,
    /// Mentions with an unrecognized sentiment
    pub unknown: usize,
}

impl SentimentCounts {
    /// Count one mention.
    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Unknown => self.unknown += 1,
        }
    }

    /// All mentions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral + self.unknown
    }
}

/// Per-term counts in first-seen order. Terms are matched exactly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SentimentTally {
    terms: Vec<(String, SentimentCounts)>,
    index: HashMap<String, usize>,
}

impl SentimentTally {
    /// Empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally every aspect of every review.
    #[must_use]
    pub fn from_reviews(reviews: &[ReviewAspects]) -> Self {
        let mut tally = Self::new();
        for review in reviews {
            for aspect in &review.extracted_aspects {
                tally.record(&aspect.term, aspect.sentiment);
            }
        }
        tally
    }

    /// Count one mention of `term`.
    pub fn record(&mut self, term: &str, sentiment: Sentiment) {
        let slot = match self.index.get(term) {
            Some(&slot) => slot,
            None => {
                self.terms.push((term.to_string(), SentimentCounts::default()));
                self.index.insert(term.to_string(), self.terms.len() - 1);
                self.terms.len() - 1
            }
        };
        self.terms[slot].1.record(sentiment);
    }

    /// Counts for `term`.
    #[must_use]
    pub fn get(&self, term: &str) -> Option<&SentimentCounts> {
        self.index.get(term).map(|&i| &self.terms[i].1)
    }

    /// Distinct terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// No mentions recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate `(term, counts)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SentimentCounts)> {
        self.terms.iter().map(|(t, c)| (t.as_str(), c))
    }
}

/// A ranked term with the count it was ranked by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedTerm {
    /// Aspect term
    pub term: String,
    /// Positive mentions for pros, negative for cons
    pub mentions: usize,
}

/// Locally computed pros and cons.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProsCons {
    /// Most praised terms
    pub pros: Vec<RankedTerm>,
    /// Most criticized terms
    pub cons: Vec<RankedTerm>,
}

impl ProsCons {
    /// Rank terms with more positive than negative mentions as pros (by
    /// positive count) and the reverse as cons. Ties keep first-seen order.
    #[must_use]
    pub fn from_tally(tally: &SentimentTally, top_n_pros: usize, top_n_cons: usize) -> Self {
        let rank = |keep: fn(&SentimentCounts) -> Option<usize>, top_n: usize| {
            let mut ranked: Vec<RankedTerm> = tally
                .iter()
                .filter_map(|(term, counts)| {
                    keep(counts).map(|mentions| RankedTerm {
                        term: term.to_string(),
                        mentions,
                    })
                })
                .collect();
            // stable sort keeps first-seen order on ties
            ranked.sort_by(|a, b| b.mentions.cmp(&a.mentions));
            ranked.truncate(top_n);
            ranked
        };

        Self {
            pros: rank(|c| (c.positive > c.negative).then_some(c.positive), top_n_pros),
            cons: rank(|c| (c.negative > c.positive).then_some(c.negative), top_n_cons),
        }
    }

    /// Render as a [`FinalSummary`] without any text generator.
    #[must_use]
    pub fn to_summary(&self) -> FinalSummary {
        let describe = |t: &RankedTerm, kind: &str| {
            let plural = if t.mentions == 1 { "" } else { "s" };
            format!("{} ({} {} mention{})", t.term, t.mentions, kind, plural)
        };
        let join = |terms: &[RankedTerm]| {
            terms
                .iter()
                .map(|t| t.term.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let summary_paragraph = match (self.pros.is_empty(), self.cons.is_empty()) {
            (true, true) => "No clear pros or cons emerged from the reviews.".to_string(),
            (false, true) => format!("Reviewers mostly praise {}.", join(&self.pros)),
            (true, false) => format!("Reviewers mostly criticize {}.", join(&self.cons)),
            (false, false) => format!(
                "Reviewers praise {} but criticize {}.",
                join(&self.pros),
                join(&self.cons)
            ),
        };

        FinalSummary {
            pros: self.pros.iter().map(|t| describe(t, "positive")).collect(),
            cons: self.cons.iter().map(|t| describe(t, "negative")).collect(),
            summary_paragraph,
        }
    }
}

/// Summary returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FinalSummary {
    /// Pros, one sentence each
    pub pros: Vec<String>,
    /// Cons, one sentence each
    pub cons: Vec<String>,
    /// Overall paragraph
    pub summary_paragraph: String,
}

impl FinalSummary {
    fn message(summary_paragraph: String) -> Self {
        Self {
            pros: Vec::new(),
            cons: Vec::new(),
            summary_paragraph,
        }
    }

    /// No text generator is configured.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::message("LLM Summarizer (Gemma) not available or not configured.".to_string())
    }

    /// Nothing to summarize.
    #[must_use]
    pub fn empty() -> Self {
        Self::message("No aspects found to summarize.".to_string())
    }

    /// Generation or parsing failed.
    #[must_use]
    pub fn failed(detail: impl std::fmt::Display) -> Self {
        Self::message(format!("Error generating summary via LLM: {detail}"))
    }
}

/// The `Aggregated Aspect Sentiments` block of the prompt.
#[must_use]
pub fn format_tally(tally: &SentimentTally) -> String {
    let mut out = String::from("Aggregated Aspect Sentiments from customer reviews:");
    for (term, c) in tally.iter() {
        let _ = write!(
            out,
            "\n- Aspect: '{}', Positive mentions: {}, Negative mentions: {}, Neutral mentions: {}",
            term, c.positive, c.negative, c.neutral
        );
    }
    out
}

/// Instruction text asking a generator for JSON pros, cons and a paragraph.
#[must_use]
pub fn build_summary_prompt(tally: &SentimentTally, top_n_pros: usize, top_n_cons: usize) -> String {
    format!(
        r#"
Based on the following aggregated aspect sentiment data from customer reviews:

{data}

Please perform the following tasks:
1. Identify and list the top {top_n_pros} most significant "Pros" (primarily positive aspects, consider frequency).
2. Identify and list the top {top_n_cons} most significant "Cons" (primarily negative aspects, consider frequency).
3. Write a concise and brief overall summary paragraph based on these pros and cons.

Your response MUST be a single, valid JSON object with the following keys:
- "pros": A list of strings, where each string describes a pro (include aspect and positive frequency if relevant).
- "cons": A list of strings, where each string describes a con (include aspect and negative frequency if relevant).
- "summary_paragraph": A string containing the overall summary.

Example of desired JSON output:
{{
  "pros": ["Battery life is highly praised (25 positive mentions).", "The price offers great value (30 positive mentions)."],
  "cons": ["Screen quality is a common concern (15 negative mentions).", "Customer service issues were reported (10 negative mentions)."],
  "summary_paragraph": "Overall, customers appreciate the excellent battery life and value, though some had concerns regarding screen quality and customer service."
}}

JSON Response:
"#,
        data = format_tally(tally)
    )
}

/// Parse a generator reply, tolerating a Markdown ```json fence.
///
/// # Errors
///
/// [`Error::Parse`] if the body is not a JSON object with `pros`, `cons`
/// and `summary_paragraph`.
pub fn parse_summary_response(text: &str) -> Result<FinalSummary> {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest.trim();
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest.trim();
    }
    serde_json::from_str(body).map_err(|e| Error::parse(format!("summary response: {e}")))
}

/// External text generator (an LLM endpoint).
pub trait Summarizer: Send + Sync {
    /// Complete `prompt`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; surfaced as [`FinalSummary::failed`].
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Summarize reviews through `summarizer`, never failing.
///
/// `None` yields [`FinalSummary::unavailable`], no reviews yield
/// [`FinalSummary::empty`], and generation or parse errors yield
/// [`FinalSummary::failed`].
#[must_use]
pub fn summarize_reviews(
    reviews: &[ReviewAspects],
    summarizer: Option<&dyn Summarizer>,
    top_n_pros: usize,
    top_n_cons: usize,
) -> FinalSummary {
    let Some(summarizer) = summarizer else {
        return FinalSummary::unavailable();
    };
    if reviews.is_empty() {
        return FinalSummary::empty();
    }

    let tally = SentimentTally::from_reviews(reviews);
    let prompt = build_summary_prompt(&tally, top_n_pros, top_n_cons);
    log::debug!("summary prompt covers {} terms", tally.len());

    match summarizer
        .generate(&prompt)
        .and_then(|reply| parse_summary_response(&reply))
    {
        Ok(summary) => summary,
        Err(e) => {
            log::warn!("summary generation failed: {e}");
            FinalSummary::failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reassemble::ExtractedAspect;

    fn review(aspects: &[(&str, Sentiment)]) -> ReviewAspects {
        ReviewAspects {
            review_text: String::new(),
            extracted_aspects: aspects
                .iter()
                .map(|(term, sentiment)| ExtractedAspect {
                    term: term.to_string(),
                    sentiment: *sentiment,
                    score: 0.9,
                })
                .collect(),
        }
    }

    fn reviews() -> Vec<ReviewAspects> {
        use Sentiment::*;
        vec![
            review(&[("battery", Positive), ("screen", Negative)]),
            review(&[("battery", Positive), ("price", Neutral), ("screen", Negative)]),
            review(&[("keyboard", Positive), ("screen", Positive), ("fan", Unknown)]),
        ]
    }

    struct Canned(Result<String>);

    impl Summarizer for Canned {
        fn generate(&self, _prompt: &str) -> Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(Error::invalid_input(e.to_string())),
            }
        }
    }

    #[test]
    fn test_tally_counts_in_first_seen_order() {
        let tally = SentimentTally::from_reviews(&reviews());
        let terms: Vec<&str> = tally.iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["battery", "screen", "price", "keyboard", "fan"]);
        assert_eq!(
            *tally.get("screen").unwrap(),
            SentimentCounts {
                positive: 1,
                negative: 2,
                neutral: 0,
                unknown: 0
            }
        );
        assert_eq!(tally.get("fan").unwrap().unknown, 1);
        assert_eq!(tally.get("battery").unwrap().total(), 2);
    }

    #[test]
    fn test_pros_cons_ranking() {
        let tally = SentimentTally::from_reviews(&reviews());
        let pc = ProsCons::from_tally(&tally, 5, 5);
        let pros: Vec<&str> = pc.pros.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(pros, vec!["battery", "keyboard"]);
        assert_eq!(pc.cons, vec![RankedTerm { term: "screen".into(), mentions: 2 }]);

        let top1 = ProsCons::from_tally(&tally, 1, 0);
        assert_eq!(top1.pros.len(), 1);
        assert!(top1.cons.is_empty());

        let summary = pc.to_summary();
        assert_eq!(summary.pros[0], "battery (2 positive mentions)");
        assert_eq!(summary.cons[0], "screen (2 negative mentions)");
        assert!(summary.summary_paragraph.contains("criticize screen"));
    }

    #[test]
    fn test_prompt_lists_every_term() {
        let tally = SentimentTally::from_reviews(&reviews());
        let prompt = build_summary_prompt(&tally, 3, 2);
        assert!(prompt.contains("Aggregated Aspect Sentiments from customer reviews:"));
        assert!(prompt.contains(
            "- Aspect: 'screen', Positive mentions: 1, Negative mentions: 2, Neutral mentions: 0"
        ));
        assert!(prompt.contains("top 3 most significant \"Pros\""));
        assert!(prompt.contains("top 2 most significant \"Cons\""));
        assert!(prompt.contains("\"summary_paragraph\""));
    }

    #[test]
    fn test_parse_response_with_fence() {
        let reply = "```json\n{\"pros\": [\"Battery\"], \"cons\": [], \"summary_paragraph\": \"Good.\"}\n```";
        let summary = parse_summary_response(reply).unwrap();
        assert_eq!(summary.pros, vec!["Battery"]);
        assert_eq!(summary.summary_paragraph, "Good.");

        let plain = parse_summary_response("{\"pros\": [], \"cons\": [\"Fan\"], \"summary_paragraph\": \"\"}").unwrap();
        assert_eq!(plain.cons, vec!["Fan"]);

        assert!(matches!(parse_summary_response("not json"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_summarize_fallbacks() {
        let ok = Canned(Ok("{\"pros\": [\"a\"], \"cons\": [\"b\"], \"summary_paragraph\": \"c\"}".into()));
        assert_eq!(
            summarize_reviews(&reviews(), None, 5, 5),
            FinalSummary::unavailable()
        );
        assert_eq!(summarize_reviews(&[], Some(&ok), 5, 5), FinalSummary::empty());
        assert_eq!(summarize_reviews(&reviews(), Some(&ok), 5, 5).pros, vec!["a"]);

        let garbled = Canned(Ok("sorry, I cannot".into()));
        let failed = summarize_reviews(&reviews(), Some(&garbled), 5, 5);
        assert!(failed.pros.is_empty());
        assert!(failed
            .summary_paragraph
            .starts_with("Error generating summary via LLM: "));
    }
}
