//! BIO-sentiment label vocabulary.
//!
//! The tag set is fixed by the polarity codes:
//!
//! | id | tag |
//! |----|-----|
//! | 0 | `O` |
//! | 1 | `B-ASP-POS` |
//! | 2 | `B-ASP-NEG` |
//! | 3 | `B-ASP-NEU` |
//! | 4 | `I-ASP-POS` |
//! | 5 | `I-ASP-NEG` |
//! | 6 | `I-ASP-NEU` |
//!
//! A [`LabelVocabulary`] is built once and passed by reference to alignment,
//! reassembly and metrics. It is never mutated after construction.
//!
//! Positions that must not contribute to loss or metrics are
//! [`TokenLabel::Excluded`] internally; the numeric `-100` ([`IGNORE_INDEX`])
//! only appears when a sequence is handed to a training harness.

use crate::span::Polarity;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Label id meaning "exclude from loss and metrics" in training-harness ids.
pub const IGNORE_INDEX: i64 = -100;

/// Entity type prefix shared by every aspect tag.
pub const ASPECT_PREFIX: &str = "ASP";

/// A single BIO-sentiment tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Outside any aspect
    Outside,
    /// First token of an aspect
    Begin(Polarity),
    /// Continuation of an aspect
    Inside(Polarity),
}

impl Tag {
    /// Parse `O`, `B-ASP-POS`, `I-ASP-NEU`, ...
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        if tag == "O" {
            return Some(Tag::Outside);
        }
        let (prefix, rest) = tag.split_once('-')?;
        let code = rest.strip_prefix(ASPECT_PREFIX)?.strip_prefix('-')?;
        let polarity = Polarity::from_code(code)?;
        match prefix {
            "B" => Some(Tag::Begin(polarity)),
            "I" => Some(Tag::Inside(polarity)),
            _ => None,
        }
    }

    /// Polarity carried by the tag, if any.
    #[must_use]
    pub const fn polarity(self) -> Option<Polarity> {
        match self {
            Tag::Outside => None,
            Tag::Begin(p) | Tag::Inside(p) => Some(p),
        }
    }

    /// Entity type without the BIO prefix (`ASP-POS`).
    #[must_use]
    pub fn entity_type(self) -> Option<String> {
        self.polarity()
            .map(|p| format!("{}-{}", ASPECT_PREFIX, p.code()))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Outside => f.write_str("O"),
            Tag::Begin(p) => write!(f, "B-{}-{}", ASPECT_PREFIX, p.code()),
            Tag::Inside(p) => write!(f, "I-{}-{}", ASPECT_PREFIX, p.code()),
        }
    }
}

/// Label of one token: a vocabulary id, or excluded from supervision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenLabel {
    /// Supervised with this label id
    Supervised(usize),
    /// Excluded from loss and metrics
    Excluded,
}

impl TokenLabel {
    /// Id handed to a training harness (`Excluded` becomes [`IGNORE_INDEX`]).
    #[must_use]
    pub fn to_training_id(self) -> i64 {
        match self {
            TokenLabel::Supervised(id) => id as i64,
            TokenLabel::Excluded => IGNORE_INDEX,
        }
    }

    /// Parse a training-harness id.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for negative ids other than [`IGNORE_INDEX`].
    pub fn from_training_id(id: i64) -> Result<Self> {
        if id == IGNORE_INDEX {
            Ok(TokenLabel::Excluded)
        } else if id >= 0 {
            Ok(TokenLabel::Supervised(id as usize))
        } else {
            Err(Error::invalid_input(format!("invalid label id {id}")))
        }
    }

    /// The supervised id, if any.
    #[must_use]
    pub const fn id(self) -> Option<usize> {
        match self {
            TokenLabel::Supervised(id) => Some(id),
            TokenLabel::Excluded => None,
        }
    }

    /// Whether this position is excluded.
    #[must_use]
    pub const fn is_excluded(self) -> bool {
        matches!(self, TokenLabel::Excluded)
    }
}

/// Per-token labels for one tokenized sentence.
///
/// Always as long as the sentence's token list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenLabelSequence {
    labels: Vec<TokenLabel>,
}

impl TokenLabelSequence {
    /// Wrap a label list.
    #[must_use]
    pub fn new(labels: Vec<TokenLabel>) -> Self {
        Self { labels }
    }

    /// Labels in token order.
    #[must_use]
    pub fn labels(&self) -> &[TokenLabel] {
        &self.labels
    }

    /// Consume into the label list.
    #[must_use]
    pub fn into_labels(self) -> Vec<TokenLabel> {
        self.labels
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of token `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<TokenLabel> {
        self.labels.get(idx).copied()
    }

    /// Ids for a training harness, with [`IGNORE_INDEX`] for excluded tokens.
    #[must_use]
    pub fn to_training_ids(&self) -> Vec<i64> {
        self.labels.iter().map(|l| l.to_training_id()).collect()
    }

    /// Parse training-harness ids.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] on a negative id other than [`IGNORE_INDEX`].
    pub fn from_training_ids(ids: &[i64]) -> Result<Self> {
        ids.iter()
            .map(|&id| TokenLabel::from_training_id(id))
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    /// Tag strings, `None` for excluded tokens or ids outside `vocab`.
    #[must_use]
    pub fn tags<'v>(&self, vocab: &'v LabelVocabulary) -> Vec<Option<&'v str>> {
        self.labels
            .iter()
            .map(|l| l.id().and_then(|id| vocab.id_to_label(id)))
            .collect()
    }

    /// Number of supervised (non-excluded) tokens.
    #[must_use]
    pub fn supervised_count(&self) -> usize {
        self.labels.iter().filter(|l| !l.is_excluded()).count()
    }
}

impl FromIterator<TokenLabel> for TokenLabelSequence {
    fn from_iter<I: IntoIterator<Item = TokenLabel>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Bijective tag ⇄ id mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    polarities: Vec<Polarity>,
    labels: Vec<String>,
    label_to_id: HashMap<String, usize>,
}

impl LabelVocabulary {
    /// Build the vocabulary from polarity codes (`POS`, `NEG`, `NEU`).
    ///
    /// Tags are laid out as `O`, then one `B-ASP-*` per code, then one
    /// `I-ASP-*` per code, in the order the codes are given.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if `codes` is empty, contains an unknown code, or
    /// repeats a code.
    pub fn new<S: AsRef<str>>(codes: &[S]) -> Result<Self> {
        if codes.is_empty() {
            return Err(Error::config("label vocabulary needs at least one polarity code"));
        }

        let mut polarities = Vec::with_capacity(codes.len());
        for code in codes {
            let code = code.as_ref();
            let polarity = Polarity::from_code(code).ok_or_else(|| {
                Error::config(format!(
                    "unknown polarity code {code:?} (expected POS, NEG or NEU)"
                ))
            })?;
            if polarities.contains(&polarity) {
                return Err(Error::config(format!("duplicate polarity code {code:?}")));
            }
            polarities.push(polarity);
        }

        Ok(Self::from_polarities(polarities))
    }

    /// The standard seven-tag vocabulary (`POS`, `NEG`, `NEU`).
    #[must_use]
    pub fn standard() -> Self {
        Self::from_polarities(Polarity::ALL.to_vec())
    }

    fn from_polarities(polarities: Vec<Polarity>) -> Self {
        let mut labels = Vec::with_capacity(1 + 2 * polarities.len());
        labels.push(Tag::Outside.to_string());
        labels.extend(polarities.iter().map(|&p| Tag::Begin(p).to_string()));
        labels.extend(polarities.iter().map(|&p| Tag::Inside(p).to_string()));

        let label_to_id = labels
            .iter()
            .enumerate()
            .map(|(id, label)| (label.clone(), id))
            .collect();

        Self {
            polarities,
            labels,
            label_to_id,
        }
    }

    /// Number of labels (`K`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false: a vocabulary holds at least `O` plus one B/I pair.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Tag strings in id order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Polarities covered, in code order.
    #[must_use]
    pub fn polarities(&self) -> &[Polarity] {
        &self.polarities
    }

    /// Id of the `O` tag.
    #[must_use]
    pub const fn outside_id(&self) -> usize {
        0
    }

    /// Look up a tag string.
    #[must_use]
    pub fn label_to_id(&self, label: &str) -> Option<usize> {
        self.label_to_id.get(label).copied()
    }

    /// Look up an id.
    #[must_use]
    pub fn id_to_label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Id of a typed tag. `None` when the tag's polarity is not in this
    /// vocabulary.
    #[must_use]
    pub fn id_of(&self, tag: Tag) -> Option<usize> {
        let n = self.polarities.len();
        match tag {
            Tag::Outside => Some(0),
            Tag::Begin(p) => self.polarities.iter().position(|&q| q == p).map(|i| 1 + i),
            Tag::Inside(p) => self
                .polarities
                .iter()
                .position(|&q| q == p)
                .map(|i| 1 + n + i),
        }
    }

    /// Typed tag of an id.
    #[must_use]
    pub fn tag_of(&self, id: usize) -> Option<Tag> {
        let n = self.polarities.len();
        match id {
            0 => Some(Tag::Outside),
            i if i <= n => Some(Tag::Begin(self.polarities[i - 1])),
            i if i <= 2 * n => Some(Tag::Inside(self.polarities[i - 1 - n])),
            _ => None,
        }
    }

    /// `id → tag` map keyed by training-harness ids, as consumed by
    /// [`crate::eval::compute_metrics`].
    #[must_use]
    pub fn id_to_label_map(&self) -> HashMap<i64, String> {
        self.labels
            .iter()
            .enumerate()
            .map(|(id, label)| (id as i64, label.clone()))
            .collect()
    }
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let vocab = LabelVocabulary::standard();
        assert_eq!(
            vocab.labels(),
            &[
                "O",
                "B-ASP-POS",
                "B-ASP-NEG",
                "B-ASP-NEU",
                "I-ASP-POS",
                "I-ASP-NEG",
                "I-ASP-NEU"
            ]
        );
        assert_eq!(vocab.len(), 7);
    }

    #[test]
    fn test_new_matches_standard() {
        let built = LabelVocabulary::new(&["POS", "NEG", "NEU"]).unwrap();
        assert_eq!(built, LabelVocabulary::standard());
    }

    #[test]
    fn test_bijection() {
        let vocab = LabelVocabulary::standard();
        for id in 0..vocab.len() {
            let label = vocab.id_to_label(id).unwrap();
            assert_eq!(vocab.label_to_id(label), Some(id));
            let tag = vocab.tag_of(id).unwrap();
            assert_eq!(tag.to_string(), label);
            assert_eq!(vocab.id_of(tag), Some(id));
        }
        assert_eq!(vocab.tag_of(7), None);
        assert_eq!(vocab.label_to_id("B-PER"), None);
    }

    #[test]
    fn test_fails_fast_on_bad_codes() {
        let empty: [&str; 0] = [];
        assert!(matches!(LabelVocabulary::new(&empty), Err(Error::Config(_))));
        assert!(matches!(
            LabelVocabulary::new(&["POS", "MIX"]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            LabelVocabulary::new(&["POS", "POS"]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_partial_vocabulary() {
        let vocab = LabelVocabulary::new(&["NEG", "POS"]).unwrap();
        assert_eq!(vocab.labels(), &["O", "B-ASP-NEG", "B-ASP-POS", "I-ASP-NEG", "I-ASP-POS"]);
        assert_eq!(vocab.id_of(Tag::Begin(Polarity::Neutral)), None);
        assert_eq!(vocab.id_of(Tag::Inside(Polarity::Positive)), Some(4));
    }

    #[test]
    fn test_tag_parse() {
        assert_eq!(Tag::parse("O"), Some(Tag::Outside));
        assert_eq!(Tag::parse("B-ASP-POS"), Some(Tag::Begin(Polarity::Positive)));
        assert_eq!(Tag::parse("I-ASP-NEU"), Some(Tag::Inside(Polarity::Neutral)));
        assert_eq!(Tag::parse("B-PER"), None);
        assert_eq!(Tag::parse("E-ASP-POS"), None);
        assert_eq!(
            Tag::Inside(Polarity::Negative).entity_type().as_deref(),
            Some("ASP-NEG")
        );
    }

    #[test]
    fn test_training_id_boundary() {
        assert_eq!(TokenLabel::Excluded.to_training_id(), -100);
        assert_eq!(TokenLabel::Supervised(3).to_training_id(), 3);
        assert_eq!(TokenLabel::from_training_id(-100).unwrap(), TokenLabel::Excluded);
        assert_eq!(TokenLabel::from_training_id(2).unwrap(), TokenLabel::Supervised(2));
        assert!(TokenLabel::from_training_id(-1).is_err());
    }

    #[test]
    fn test_sequence_training_ids() {
        let seq = TokenLabelSequence::from_training_ids(&[-100, 0, 1, 4, -100]).unwrap();
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.supervised_count(), 3);
        assert_eq!(seq.to_training_ids(), vec![-100, 0, 1, 4, -100]);
        let vocab = LabelVocabulary::standard();
        assert_eq!(
            seq.tags(&vocab),
            vec![None, Some("O"), Some("B-ASP-POS"), Some("I-ASP-POS"), None]
        );
        assert!(TokenLabelSequence::from_training_ids(&[0, -3]).is_err());
    }

    #[test]
    fn test_id_to_label_map() {
        let map = LabelVocabulary::standard().id_to_label_map();
        assert_eq!(map.len(), 7);
        assert_eq!(map[&1], "B-ASP-POS");
    }
}
