//! Aspect span annotations.
//!
//! An [`AspectSpan`] marks one aspect mention inside a review sentence by
//! character offsets, together with the sentiment expressed towards it:
//!
//! ```text
//! "The battery is great but the screen is bad."
//!      └─battery─┘              └screen┘
//!      from=4, to=11            from=31, to=37
//!      positive                 negative
//! ```
//!
//! Offsets are **character** offsets (not bytes), `from` inclusive and `to`
//! exclusive. The polarity is kept as the annotation's raw string so that an
//! unexpected value reaches the alignment engine, which skips that aspect
//! instead of rejecting the whole sentence.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Sentiment polarity of an aspect mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Positive sentiment (`POS`)
    Positive,
    /// Negative sentiment (`NEG`)
    Negative,
    /// Neutral sentiment (`NEU`)
    Neutral,
}

impl Polarity {
    /// All polarities, in label-vocabulary order.
    pub const ALL: [Polarity; 3] = [Polarity::Positive, Polarity::Negative, Polarity::Neutral];

    /// Short code used inside tags (`B-ASP-POS`).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Polarity::Positive => "POS",
            Polarity::Negative => "NEG",
            Polarity::Neutral => "NEU",
        }
    }

    /// Annotation name (`positive`, `negative`, `neutral`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
            Polarity::Neutral => "neutral",
        }
    }

    /// Parse a tag code (`POS`, `NEG`, `NEU`). Case-sensitive, like the tags.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "POS" => Some(Polarity::Positive),
            "NEG" => Some(Polarity::Negative),
            "NEU" => Some(Polarity::Neutral),
            _ => None,
        }
    }

    /// Parse an annotation polarity name, ignoring case and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPolarity`] for anything outside
    /// `{positive, negative, neutral}`.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Polarity::Positive),
            "negative" => Ok(Polarity::Negative),
            "neutral" => Ok(Polarity::Neutral),
            _ => Err(Error::unknown_polarity(value)),
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Polarity::parse(s)
    }
}

/// One annotated aspect mention: character span plus polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectSpan {
    /// Surface form of the aspect term
    pub term: String,
    /// Polarity as written in the source annotation
    pub polarity: String,
    /// Character offset (start, inclusive)
    pub from: usize,
    /// Character offset (end, exclusive)
    pub to: usize,
}

impl AspectSpan {
    /// Create an aspect span with a known polarity.
    #[must_use]
    pub fn new(term: impl Into<String>, polarity: Polarity, from: usize, to: usize) -> Self {
        Self {
            term: term.into(),
            polarity: polarity.as_str().to_string(),
            from,
            to,
        }
    }

    /// Create an aspect span from a raw annotation polarity string.
    #[must_use]
    pub fn with_raw_polarity(
        term: impl Into<String>,
        polarity: impl Into<String>,
        from: usize,
        to: usize,
    ) -> Self {
        Self {
            term: term.into(),
            polarity: polarity.into(),
            from,
            to,
        }
    }

    /// Parsed polarity.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPolarity`] when the annotation carries an unexpected value.
    pub fn parsed_polarity(&self) -> Result<Polarity> {
        Polarity::parse(&self.polarity)
    }

    /// Character range `[from, to)`.
    #[must_use]
    pub const fn char_range(&self) -> Range<usize> {
        self.from..self.to
    }

    /// Whether the span is non-empty (`from < to`).
    #[must_use]
    pub const fn is_well_formed(&self) -> bool {
        self.from < self.to
    }

    /// Half-open overlap test against a token's character range.
    #[must_use]
    pub const fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.to && end > self.from
    }

    /// Check `from < to <= sentence_chars`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] describing the violated bound.
    pub fn validate(&self, sentence_chars: usize) -> Result<()> {
        if self.from >= self.to {
            return Err(Error::invalid_input(format!(
                "aspect {:?}: from ({}) must be < to ({})",
                self.term, self.from, self.to
            )));
        }
        if self.to > sentence_chars {
            return Err(Error::invalid_input(format!(
                "aspect {:?}: to ({}) exceeds sentence length ({})",
                self.term, self.to, sentence_chars
            )));
        }
        Ok(())
    }

    /// The sentence text covered by this span.
    #[must_use]
    pub fn covered_text(&self, sentence: &str) -> String {
        sentence
            .chars()
            .skip(self.from)
            .take(self.to.saturating_sub(self.from))
            .collect()
    }
}

/// A review sentence with its ordered aspect annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSentence {
    /// Stable identifier (`{domain}_{source id}`), if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Sentence text
    pub sentence: String,
    /// Aspect mentions in annotation order
    #[serde(default)]
    pub aspects: Vec<AspectSpan>,
    /// Source domain (e.g. `laptop`, `restaurant`)
    #[serde(default)]
    pub domain: String,
}

impl LabeledSentence {
    /// Create a labeled sentence without an identifier.
    #[must_use]
    pub fn new(
        sentence: impl Into<String>,
        aspects: Vec<AspectSpan>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            sentence: sentence.into(),
            aspects,
            domain: domain.into(),
        }
    }

    /// Attach an identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sentence length in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.sentence.chars().count()
    }

    /// Validate every aspect; returns one message per invalid aspect.
    #[must_use]
    pub fn validation_errors(&self) -> Vec<String> {
        let len = self.char_len();
        self.aspects
            .iter()
            .filter_map(|a| {
                a.validate(len)
                    .and_then(|()| a.parsed_polarity().map(|_| ()))
                    .err()
                    .map(|e| e.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_codes_roundtrip() {
        for p in Polarity::ALL {
            assert_eq!(Polarity::from_code(p.code()), Some(p));
            assert_eq!(Polarity::parse(p.as_str()).unwrap(), p);
        }
        assert_eq!(Polarity::from_code("pos"), None);
    }

    #[test]
    fn test_polarity_parse_lenient_case() {
        assert_eq!(Polarity::parse(" Positive ").unwrap(), Polarity::Positive);
        assert!(matches!(
            Polarity::parse("conflict"),
            Err(Error::UnknownPolarity(_))
        ));
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = AspectSpan::new("battery", Polarity::Positive, 4, 11);
        assert!(a.overlaps(4, 11));
        assert!(a.overlaps(10, 12));
        assert!(!a.overlaps(11, 13));
        assert!(!a.overlaps(0, 4));
    }

    #[test]
    fn test_validate_bounds() {
        let sentence = "The battery is great";
        let ok = AspectSpan::new("battery", Polarity::Positive, 4, 11);
        assert!(ok.validate(sentence.chars().count()).is_ok());
        assert_eq!(ok.covered_text(sentence), "battery");

        let empty = AspectSpan::new("x", Polarity::Neutral, 5, 5);
        assert!(empty.validate(20).is_err());

        let past_end = AspectSpan::new("x", Polarity::Neutral, 18, 25);
        assert!(past_end.validate(20).is_err());
    }

    #[test]
    fn test_covered_text_uses_chars() {
        let sentence = "Le café est bon";
        let a = AspectSpan::new("café", Polarity::Positive, 3, 7);
        assert_eq!(a.covered_text(sentence), "café");
    }

    #[test]
    fn test_serde_field_names() {
        let json = r#"{"sentence":"Great food","aspects":[{"term":"food","polarity":"positive","from":6,"to":10}],"domain":"restaurant"}"#;
        let s: LabeledSentence = serde_json::from_str(json).unwrap();
        assert_eq!(s.aspects[0].from, 6);
        assert_eq!(s.aspects[0].parsed_polarity().unwrap(), Polarity::Positive);
        assert!(s.id.is_none());
        assert!(s.validation_errors().is_empty());
    }

    #[test]
    fn test_validation_errors_reports_bad_polarity() {
        let s = LabeledSentence::new(
            "Great food",
            vec![AspectSpan::with_raw_polarity("food", "mixed", 6, 10)],
            "restaurant",
        );
        let errors = s.validation_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("mixed"));
    }
}
