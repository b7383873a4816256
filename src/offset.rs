//! Token offsets in character coordinates.
//!
//! A subword tokenizer reports, for every token, the character span it
//! covers and the word it belongs to:
//!
//! ```text
//! Text:      "The battery lasts"
//!
//!   token     [CLS]   The    bat    ##tery   lasts   [SEP]
//!   offset    (0,0)  (0,3)  (4,7)   (7,11)  (12,17)  (0,0)
//!   word id   None     0      1       1        2     None
//!                           └─ same word ─┘
//! ```
//!
//! Special tokens carry the sentinel offset `(0,0)` and no word id. A token
//! with `start == end == 0` is always treated as non-content, even if a
//! tokenizer produced it for real text.
//!
//! Offsets here are **character** offsets, matching [`crate::span::AspectSpan`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Character span `[start, end)` of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenOffset {
    /// Start character (inclusive)
    pub start: usize,
    /// End character (exclusive)
    pub end: usize,
}

impl TokenOffset {
    /// The `(0,0)` sentinel used for special tokens.
    pub const SPECIAL: TokenOffset = TokenOffset { start: 0, end: 0 };

    /// Create an offset.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether this is the non-content sentinel `(0,0)`.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    /// Half-open overlap with a character range.
    #[must_use]
    pub const fn overlaps(&self, from: usize, to: usize) -> bool {
        self.start < to && self.end > from
    }
}

impl From<(usize, usize)> for TokenOffset {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

/// Tokenizer output for one sentence: per-token offsets and word ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenizedSentence {
    /// Character span per token
    pub offsets: Vec<TokenOffset>,
    /// Word id per token (`None` for special tokens)
    pub word_ids: Vec<Option<u32>>,
    /// Token strings, when the tokenizer exposes them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
}

impl TokenizedSentence {
    /// Create from parallel offset and word-id lists.
    ///
    /// # Errors
    ///
    /// [`Error::Alignment`] if the two lists differ in length.
    pub fn new(offsets: Vec<TokenOffset>, word_ids: Vec<Option<u32>>) -> Result<Self> {
        if offsets.len() != word_ids.len() {
            return Err(Error::alignment(format!(
                "{} token offsets but {} word ids",
                offsets.len(),
                word_ids.len()
            )));
        }
        Ok(Self {
            offsets,
            word_ids,
            tokens: Vec::new(),
        })
    }

    /// Attach token strings.
    ///
    /// # Errors
    ///
    /// [`Error::Alignment`] if `tokens` does not match the token count.
    pub fn with_tokens(mut self, tokens: Vec<String>) -> Result<Self> {
        if tokens.len() != self.offsets.len() {
            return Err(Error::alignment(format!(
                "{} token strings for {} tokens",
                tokens.len(),
                self.offsets.len()
            )));
        }
        self.tokens = tokens;
        Ok(self)
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether there are no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Whether token `idx` starts a new word: its word id differs from the
    /// previous token's, or it is the first token.
    #[must_use]
    pub fn is_first_subword(&self, idx: usize) -> bool {
        idx == 0 || self.word_ids.get(idx) != self.word_ids.get(idx - 1)
    }
}

/// Slice `text` by character offsets. Out-of-range offsets are clamped.
#[must_use]
pub fn char_slice(text: &str, char_start: usize, char_end: usize) -> &str {
    if char_start >= char_end {
        return "";
    }
    let mut indices = text.char_indices().map(|(b, _)| b).chain(std::iter::once(text.len()));
    let Some(byte_start) = indices.nth(char_start) else {
        return "";
    };
    let byte_end = indices
        .nth(char_end - char_start - 1)
        .unwrap_or(text.len());
    &text[byte_start..byte_end]
}
