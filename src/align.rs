//! Span-to-token label alignment.
//!
//! Turns character-span aspect annotations into one BIO-sentiment label per
//! subword token:
//!
//! ```text
//! sentence   "The battery is great"
//! aspect     battery  [4,11)  positive
//!
//! token      [CLS]  The   bat     ##tery   is   great  [SEP]
//! offset     (0,0)  0..3  4..7    7..11   12..14 15..20 (0,0)
//! raw        -100   O     B-POS   I-POS    O     O     -100
//! ```
//!
//! # Rules
//!
//! 1. Tokens with the `(0,0)` offset start excluded; every other token starts
//!    as `O`.
//! 2. Aspects are applied in input order. A token is labeled only while it is
//!    still `O`, so on overlap the first listed aspect wins.
//! 3. A token belongs to an aspect when `token.start < to && token.end > from`.
//!    Spans need not fall on token boundaries.
//! 4. Per aspect, the first overlapping token that starts at or after `from`
//!    and begins a word gets `B-ASP-<pol>`; all other overlapping tokens get
//!    `I-ASP-<pol>`. An aspect therefore yields at most one `B`.
//! 5. Aspects with an unknown polarity, a polarity missing from the
//!    vocabulary, or `from >= to` are skipped with a warning.
//!
//! The raw sequence then goes through [`crate::reduce`].

use crate::config::AbsaConfig;
use crate::labels::{LabelVocabulary, Tag, TokenLabel, TokenLabelSequence};
use crate::offset::TokenizedSentence;
use crate::reduce::{reduce, SubwordPolicy};
use crate::span::{AspectSpan, LabeledSentence};
use crate::tokenizer::OffsetTokenizer;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Label every token by overlap with `aspects`, before subword reduction.
///
/// # Errors
///
/// [`Error::Alignment`] if `tokens` has mismatched offset and word-id lists.
pub fn align_raw(
    aspects: &[AspectSpan],
    tokens: &TokenizedSentence,
    vocab: &LabelVocabulary,
) -> Result<TokenLabelSequence> {
    if tokens.offsets.len() != tokens.word_ids.len() {
        return Err(Error::alignment(format!(
            "{} token offsets but {} word ids",
            tokens.offsets.len(),
            tokens.word_ids.len()
        )));
    }

    let outside = TokenLabel::Supervised(vocab.outside_id());
    let mut labels: Vec<TokenLabel> = tokens
        .offsets
        .iter()
        .map(|off| {
            if off.is_special() {
                TokenLabel::Excluded
            } else {
                outside
            }
        })
        .collect();

    for aspect in aspects {
        let Some((begin, inside)) = aspect_label_ids(aspect, vocab) else {
            continue;
        };

        let mut begun = false;
        for (idx, off) in tokens.offsets.iter().enumerate() {
            if off.is_special() || !aspect.overlaps(off.start, off.end) {
                continue;
            }
            // first aspect wins
            if labels[idx] != outside {
                continue;
            }
            if !begun && off.start >= aspect.from && tokens.is_first_subword(idx) {
                labels[idx] = TokenLabel::Supervised(begin);
                begun = true;
            } else {
                labels[idx] = TokenLabel::Supervised(inside);
            }
        }
    }

    Ok(TokenLabelSequence::new(labels))
}

/// `(B, I)` ids for an aspect, or `None` (with a warning) if it must be skipped.
fn aspect_label_ids(aspect: &AspectSpan, vocab: &LabelVocabulary) -> Option<(usize, usize)> {
    if !aspect.is_well_formed() {
        log::warn!(
            "skipping aspect {:?}: empty span [{}, {})",
            aspect.term,
            aspect.from,
            aspect.to
        );
        return None;
    }
    let polarity = match aspect.parsed_polarity() {
        Ok(p) => p,
        Err(e) => {
            log::warn!("skipping aspect {:?}: {}", aspect.term, e);
            return None;
        }
    };
    match (
        vocab.id_of(Tag::Begin(polarity)),
        vocab.id_of(Tag::Inside(polarity)),
    ) {
        (Some(b), Some(i)) => Some((b, i)),
        _ => {
            log::warn!(
                "skipping aspect {:?}: polarity {} not in label vocabulary",
                aspect.term,
                polarity
            );
            None
        }
    }
}

/// Align and reduce in one step.
///
/// `sentence` is only used to report aspects that run past its end; overlap
/// assignment still applies to them.
///
/// # Errors
///
/// [`Error::Alignment`] if `tokens` has mismatched offset and word-id lists.
pub fn align(
    sentence: &str,
    aspects: &[AspectSpan],
    tokens: &TokenizedSentence,
    vocab: &LabelVocabulary,
    policy: SubwordPolicy,
) -> Result<TokenLabelSequence> {
    let len = sentence.chars().count();
    for aspect in aspects.iter().filter(|a| a.to > len) {
        log::debug!(
            "aspect {:?} ends at {} past sentence length {}",
            aspect.term,
            aspect.to,
            len
        );
    }
    let raw = align_raw(aspects, tokens, vocab)?;
    Ok(reduce(&raw, &tokens.word_ids, policy))
}

/// A sentence's tokenization with its aligned labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedSentence {
    /// Identifier carried over from the input, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tokenizer output
    pub tokens: TokenizedSentence,
    /// One label per token
    pub labels: TokenLabelSequence,
}

/// Training-harness record: ids with `-100` for excluded tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// Identifier carried over from the input, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Token strings, when known
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    /// Label ids
    pub labels: Vec<i64>,
}

impl AlignedSentence {
    /// Convert to the record handed to a training harness.
    #[must_use]
    pub fn to_training_record(&self) -> TrainingRecord {
        TrainingRecord {
            id: self.id.clone(),
            tokens: self.tokens.tokens.clone(),
            labels: self.labels.to_training_ids(),
        }
    }
}

/// Alignment engine bound to one vocabulary and reduction policy.
#[derive(Debug, Clone)]
pub struct LabelAligner {
    vocab: LabelVocabulary,
    policy: SubwordPolicy,
}

impl LabelAligner {
    /// Create an aligner.
    #[must_use]
    pub fn new(vocab: LabelVocabulary, policy: SubwordPolicy) -> Self {
        Self { vocab, policy }
    }

    /// Build from configuration.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the vocabulary cannot be built.
    pub fn from_config(config: &AbsaConfig) -> Result<Self> {
        Ok(Self::new(config.vocabulary()?, config.subword_policy()))
    }

    /// The vocabulary in use.
    #[must_use]
    pub fn vocab(&self) -> &LabelVocabulary {
        &self.vocab
    }

    /// The reduction policy in use.
    #[must_use]
    pub fn policy(&self) -> SubwordPolicy {
        self.policy
    }

    /// Align a sentence against precomputed tokenizer output.
    ///
    /// # Errors
    ///
    /// [`Error::Alignment`] on inconsistent tokenizer output.
    pub fn align(
        &self,
        sentence: &LabeledSentence,
        tokens: &TokenizedSentence,
    ) -> Result<TokenLabelSequence> {
        align(
            &sentence.sentence,
            &sentence.aspects,
            tokens,
            &self.vocab,
            self.policy,
        )
    }

    /// Tokenize and align a sentence.
    ///
    /// # Errors
    ///
    /// Tokenizer or alignment errors.
    pub fn align_with(
        &self,
        tokenizer: &dyn OffsetTokenizer,
        sentence: &LabeledSentence,
    ) -> Result<AlignedSentence> {
        let tokens = tokenizer.encode(&sentence.sentence)?;
        let labels = self.align(sentence, &tokens)?;
        Ok(AlignedSentence {
            id: sentence.id.clone(),
            tokens,
            labels,
        })
    }

    /// Tokenize and align many sentences. Output order matches input order.
    ///
    /// Runs on rayon when the `parallel` feature is enabled.
    ///
    /// # Errors
    ///
    /// The first tokenizer or alignment error encountered.
    pub fn align_batch(
        &self,
        tokenizer: &dyn OffsetTokenizer,
        sentences: &[LabeledSentence],
    ) -> Result<Vec<AlignedSentence>> {
        log::debug!(
            "aligning {} sentences with {} tokenizer",
            sentences.len(),
            tokenizer.name()
        );

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            sentences
                .par_iter()
                .map(|s| self.align_with(tokenizer, s))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            sentences
                .iter()
                .map(|s| self.align_with(tokenizer, s))
                .collect()
        }
    }
}

impl Default for LabelAligner {
    fn default() -> Self {
        Self::new(LabelVocabulary::standard(), SubwordPolicy::default())
    }
}
