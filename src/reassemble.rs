//! Entity reassembly: token predictions back to aspect terms.
//!
//! The inverse of [`crate::align`]. A model emits one probability row per
//! token; the arg-max label and its probability are grouped into entities and
//! each `ASP-*` entity becomes an aspect with a sentiment:
//!
//! ```text
//! token    [CLS]  The  bat     ##tery   is   great  [SEP]
//! argmax   O      O    B-POS   I-POS    O    O      O
//! score    .99    .98  .97     .95      .99  .96    .99
//!
//! group              └ ASP-POS ┘
//!                    "battery", mean(.97, .95) = 0.96
//!
//! aspect   { term: "battery", sentiment: positive, score: 0.96 }
//! ```
//!
//! Grouping is a tokenizer-side capability ([`EntityGrouper`]);
//! [`SimpleAggregation`] follows the common "simple" strategy of
//! token-classification pipelines.

use crate::confidence::Confidence;
use crate::config::AbsaConfig;
use crate::labels::{LabelVocabulary, ASPECT_PREFIX};
use crate::offset::{char_slice, TokenizedSentence};
use crate::span::Polarity;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arg-max label and its probability for one token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenPrediction {
    /// Predicted label id
    pub label_id: usize,
    /// Probability of that label
    pub score: Confidence,
}

impl TokenPrediction {
    /// Create a prediction, clamping the score into `[0, 1]`.
    #[must_use]
    pub fn new(label_id: usize, score: f64) -> Self {
        Self {
            label_id,
            score: Confidence::saturating(score),
        }
    }
}

/// Numerically stable softmax over one logit row.
#[must_use]
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![0.0; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest entry; the first one wins ties. NaN entries
/// are ignored.
#[must_use]
pub fn argmax(row: &[f32]) -> Option<(usize, f32)> {
    row.iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

/// Arg-max prediction per probability row.
///
/// # Errors
///
/// [`Error::InvalidInput`] if a row is empty or all NaN.
pub fn argmax_predictions(probabilities: &[Vec<f32>]) -> Result<Vec<TokenPrediction>> {
    probabilities
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            argmax(row)
                .map(|(label_id, p)| TokenPrediction::new(label_id, f64::from(p)))
                .ok_or_else(|| Error::invalid_input(format!("token {idx}: empty probability row")))
        })
        .collect()
}

/// A contiguous run of same-type token predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedEntity {
    /// Entity type without BIO prefix (`ASP-POS`)
    pub entity_group: String,
    /// Mean token score
    pub score: Confidence,
    /// Text from the first token's start to the last token's end
    pub word: String,
    /// Start character
    pub start: usize,
    /// End character (exclusive)
    pub end: usize,
}

/// Tokenizer-side capability merging token predictions into entities.
pub trait EntityGrouper: Send + Sync {
    /// Group `predictions` (one per token of `tokens`) into entities.
    ///
    /// # Errors
    ///
    /// [`Error::Alignment`] if `predictions` and `tokens` differ in length.
    fn group(
        &self,
        text: &str,
        tokens: &TokenizedSentence,
        predictions: &[TokenPrediction],
        vocab: &LabelVocabulary,
    ) -> Result<Vec<GroupedEntity>>;
}

/// "Simple" aggregation.
///
/// - special tokens (offset `(0,0)`) are dropped
/// - `B-X`, or any change of type, starts a new group; `I-X` after `X` extends it
/// - `O` runs form groups of their own and are discarded
/// - group score is the mean of member scores
///
/// Ids outside the vocabulary are read as `O`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleAggregation;

struct Pending {
    entity: String,
    start: usize,
    end: usize,
    scores: Vec<Confidence>,
}

impl SimpleAggregation {
    fn split_tag(tag: &str) -> (bool, &str) {
        if let Some(rest) = tag.strip_prefix("B-") {
            (true, rest)
        } else if let Some(rest) = tag.strip_prefix("I-") {
            (false, rest)
        } else {
            (false, tag)
        }
    }

    fn finish(text: &str, pending: Pending, out: &mut Vec<GroupedEntity>) {
        if pending.entity == "O" {
            return;
        }
        let score = Confidence::mean(pending.scores.iter().copied()).unwrap_or(Confidence::MIN);
        out.push(GroupedEntity {
            word: char_slice(text, pending.start, pending.end).to_string(),
            entity_group: pending.entity,
            score,
            start: pending.start,
            end: pending.end,
        });
    }
}

impl EntityGrouper for SimpleAggregation {
    fn group(
        &self,
        text: &str,
        tokens: &TokenizedSentence,
        predictions: &[TokenPrediction],
        vocab: &LabelVocabulary,
    ) -> Result<Vec<GroupedEntity>> {
        if predictions.len() != tokens.len() {
            return Err(Error::alignment(format!(
                "{} predictions for {} tokens",
                predictions.len(),
                tokens.len()
            )));
        }

        let mut groups = Vec::new();
        let mut pending: Option<Pending> = None;

        for (off, pred) in tokens.offsets.iter().zip(predictions) {
            if off.is_special() {
                continue;
            }
            let tag = vocab.id_to_label(pred.label_id).unwrap_or_else(|| {
                log::warn!("label id {} not in vocabulary, reading as O", pred.label_id);
                "O"
            });
            let (is_begin, entity) = Self::split_tag(tag);

            match pending.as_mut() {
                Some(p) if p.entity == entity && !is_begin => {
                    p.end = off.end;
                    p.scores.push(pred.score);
                }
                _ => {
                    if let Some(done) = pending.take() {
                        Self::finish(text, done, &mut groups);
                    }
                    pending = Some(Pending {
                        entity: entity.to_string(),
                        start: off.start,
                        end: off.end,
                        scores: vec![pred.score],
                    });
                }
            }
        }
        if let Some(done) = pending {
            Self::finish(text, done, &mut groups);
        }

        Ok(groups)
    }
}

/// Sentiment of an extracted aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// `ASP-POS`
    Positive,
    /// `ASP-NEG`
    Negative,
    /// `ASP-NEU`
    Neutral,
    /// Any other `ASP-*` code
    Unknown,
}

impl Sentiment {
    /// Map an entity group (`ASP-POS`) to a sentiment. `None` for groups that
    /// are not aspects.
    #[must_use]
    pub fn from_entity_group(group: &str) -> Option<Self> {
        let code = group.strip_prefix(ASPECT_PREFIX)?.strip_prefix('-')?;
        Some(match Polarity::from_code(code) {
            Some(p) => p.into(),
            None => Sentiment::Unknown,
        })
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Unknown => "unknown",
        }
    }
}

impl From<Polarity> for Sentiment {
    fn from(p: Polarity) -> Self {
        match p {
            Polarity::Positive => Sentiment::Positive,
            Polarity::Negative => Sentiment::Negative,
            Polarity::Neutral => Sentiment::Neutral,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An aspect term recovered from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAspect {
    /// Aspect text, trimmed
    pub term: String,
    /// Sentiment
    pub sentiment: Sentiment,
    /// Rounded mean token probability
    pub score: f64,
}

/// All aspects extracted from one review.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewAspects {
    /// The review
    pub review_text: String,
    /// Aspects in text order
    pub extracted_aspects: Vec<ExtractedAspect>,
}

/// Interpret grouped entities as aspects.
///
/// Groups whose type is not `ASP-*` are dropped. Terms are trimmed, scores
/// rounded to `decimals`.
#[must_use]
pub fn interpret_entities(groups: &[GroupedEntity], decimals: u32) -> Vec<ExtractedAspect> {
    groups
        .iter()
        .filter_map(|g| {
            let sentiment = Sentiment::from_entity_group(&g.entity_group)?;
            Some(ExtractedAspect {
                term: g.word.trim().to_string(),
                sentiment,
                score: g.score.rounded(decimals).get(),
            })
        })
        .collect()
}

/// Group token predictions and interpret them as aspects.
///
/// Empty or whitespace-only `text` yields no aspects.
///
/// # Errors
///
/// Errors from the grouper (e.g. prediction/token count mismatch).
pub fn reassemble(
    text: &str,
    tokens: &TokenizedSentence,
    predictions: &[TokenPrediction],
    vocab: &LabelVocabulary,
    grouper: &dyn EntityGrouper,
    decimals: u32,
) -> Result<Vec<ExtractedAspect>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let groups = grouper.group(text, tokens, predictions, vocab)?;
    Ok(interpret_entities(&groups, decimals))
}

/// Reassembly bound to a vocabulary, a grouper and a score precision.
pub struct Reassembler {
    vocab: LabelVocabulary,
    grouper: Box<dyn EntityGrouper>,
    decimals: u32,
}

impl Reassembler {
    /// Simple aggregation, four decimals.
    #[must_use]
    pub fn new(vocab: LabelVocabulary) -> Self {
        Self {
            vocab,
            grouper: Box::new(SimpleAggregation),
            decimals: 4,
        }
    }

    /// Vocabulary and score precision from a config.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the vocabulary cannot be built.
    pub fn from_config(config: &AbsaConfig) -> Result<Self> {
        Ok(Self::new(config.vocabulary()?).with_decimals(config.score_decimals))
    }

    /// Replace the grouping strategy.
    #[must_use]
    pub fn with_grouper(mut self, grouper: Box<dyn EntityGrouper>) -> Self {
        self.grouper = grouper;
        self
    }

    /// Set score precision.
    #[must_use]
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Aspects from arg-max predictions.
    ///
    /// # Errors
    ///
    /// See [`reassemble`].
    pub fn reassemble(
        &self,
        text: &str,
        tokens: &TokenizedSentence,
        predictions: &[TokenPrediction],
    ) -> Result<Vec<ExtractedAspect>> {
        reassemble(
            text,
            tokens,
            predictions,
            &self.vocab,
            self.grouper.as_ref(),
            self.decimals,
        )
    }

    /// Aspects for one review from per-token probability rows.
    ///
    /// # Errors
    ///
    /// Empty probability rows, or a row count that does not match `tokens`.
    pub fn review(
        &self,
        text: &str,
        tokens: &TokenizedSentence,
        probabilities: &[Vec<f32>],
    ) -> Result<ReviewAspects> {
        let predictions = argmax_predictions(probabilities)?;
        Ok(ReviewAspects {
            review_text: text.to_string(),
            extracted_aspects: self.reassemble(text, tokens, &predictions)?,
        })
    }
}

impl fmt::Debug for Reassembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reassembler")
            .field("vocab", &self.vocab)
            .field("decimals", &self.decimals)
            .finish_non_exhaustive()
    }
}
