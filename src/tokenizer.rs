//! Offset-reporting tokenizers.
//!
//! Alignment only needs two things from a tokenizer: the character span of
//! each token and the word each token belongs to. [`OffsetTokenizer`] is that
//! capability; any subword tokenizer that can report both plugs in.
//!
//! - [`WhitespaceTokenizer`]: dependency-free, deterministic. Useful for tests
//!   and for data inspection without a model.
//! - [`HfTokenizer`] (feature `hf-tokenizer`): a HuggingFace `tokenizer.json`.

use crate::offset::{TokenOffset, TokenizedSentence};
use crate::Result;

/// Tokenizer capability consumed by the alignment engine.
pub trait OffsetTokenizer: Send + Sync {
    /// Tokenize `text`, returning character offsets and word ids.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Tokenizer`] if encoding fails.
    fn encode(&self, text: &str) -> Result<TokenizedSentence>;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

/// Rule-based tokenizer with word-piece style splitting.
///
/// Words are maximal runs of alphanumeric characters, or a single
/// punctuation/symbol character. Whitespace separates but never becomes a
/// token. Words longer than `max_subword_chars` are cut into consecutive
/// pieces (`bat`, `##ter`, `##y`) sharing one word id.
#[derive(Debug, Clone)]
pub struct WhitespaceTokenizer {
    add_special_tokens: bool,
    max_subword_chars: Option<usize>,
    max_length: Option<usize>,
}

impl Default for WhitespaceTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl WhitespaceTokenizer {
    /// `[CLS] … [SEP]` framing, no subword splitting, no truncation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            add_special_tokens: true,
            max_subword_chars: None,
            max_length: None,
        }
    }

    /// Toggle `[CLS]`/`[SEP]` framing.
    #[must_use]
    pub fn with_special_tokens(mut self, add: bool) -> Self {
        self.add_special_tokens = add;
        self
    }

    /// Split words into pieces of at most `n` characters (`n >= 1`).
    #[must_use]
    pub fn with_max_subword_chars(mut self, n: usize) -> Self {
        self.max_subword_chars = Some(n.max(1));
        self
    }

    /// Truncate to at most `n` tokens, special tokens included.
    ///
    /// With `n < 2` the framing itself is cut: `n == 1` keeps only `[CLS]`,
    /// `n == 0` yields no tokens.
    #[must_use]
    pub fn with_max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    fn words(text: &str) -> Vec<(usize, usize)> {
        let mut words = Vec::new();
        let mut run_start: Option<usize> = None;
        let mut idx = 0;
        for ch in text.chars() {
            if ch.is_alphanumeric() {
                run_start.get_or_insert(idx);
            } else {
                if let Some(start) = run_start.take() {
                    words.push((start, idx));
                }
                if !ch.is_whitespace() {
                    words.push((idx, idx + 1));
                }
            }
            idx += 1;
        }
        if let Some(start) = run_start {
            words.push((start, idx));
        }
        words
    }
}

impl OffsetTokenizer for WhitespaceTokenizer {
    fn encode(&self, text: &str) -> Result<TokenizedSentence> {
        let chars: Vec<char> = text.chars().collect();
        let limit = self.max_length.unwrap_or(usize::MAX);
        // framing is dropped once it alone would exceed the limit: [SEP] first, then [CLS]
        let add_cls = self.add_special_tokens && limit >= 1;
        let add_sep = self.add_special_tokens && limit >= 2;
        let budget = limit - usize::from(add_cls) - usize::from(add_sep);

        let mut offsets = Vec::new();
        let mut word_ids = Vec::new();
        let mut tokens = Vec::new();

        if add_cls {
            offsets.push(TokenOffset::SPECIAL);
            word_ids.push(None);
            tokens.push("[CLS]".to_string());
        }

        let mut content = 0usize;
        'words: for (word_id, (start, end)) in Self::words(text).into_iter().enumerate() {
            let piece = self.max_subword_chars.unwrap_or(end - start);
            let mut piece_start = start;
            while piece_start < end {
                if content >= budget {
                    break 'words;
                }
                let piece_end = (piece_start + piece).min(end);
                let surface: String = chars[piece_start..piece_end].iter().collect();
                tokens.push(if piece_start == start {
                    surface
                } else {
                    format!("##{surface}")
                });
                offsets.push(TokenOffset::new(piece_start, piece_end));
                word_ids.push(Some(word_id as u32));
                content += 1;
                piece_start = piece_end;
            }
        }

        if add_sep {
            offsets.push(TokenOffset::SPECIAL);
            word_ids.push(None);
            tokens.push("[SEP]".to_string());
        }

        TokenizedSentence::new(offsets, word_ids)?.with_tokens(tokens)
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

#[cfg(feature = "hf-tokenizer")]
pub use hf::HfTokenizer;

#[cfg(feature = "hf-tokenizer")]
mod hf {
    use super::OffsetTokenizer;
    use crate::offset::{TokenOffset, TokenizedSentence};
    use crate::{Error, Result};
    use std::path::Path;
    use tokenizers::{Tokenizer, TruncationParams};

    /// HuggingFace tokenizer loaded from `tokenizer.json`.
    ///
    /// Encodes with character offsets (`encode_char_offsets`) so spans line up
    /// with annotation offsets on non-ASCII text.
    pub struct HfTokenizer {
        tokenizer: Tokenizer,
        name: String,
    }

    impl HfTokenizer {
        /// Load `tokenizer.json` and truncate encodings at `max_length` tokens.
        ///
        /// # Errors
        ///
        /// [`Error::Tokenizer`] if the file is missing or malformed.
        pub fn from_file(path: impl AsRef<Path>, max_length: usize) -> Result<Self> {
            let path = path.as_ref();
            log::info!("loading tokenizer from {}", path.display());
            if !path.exists() {
                return Err(Error::tokenizer(format!(
                    "tokenizer file not found: {}",
                    path.display()
                )));
            }
            let mut tokenizer = Tokenizer::from_file(path)
                .map_err(|e| Error::tokenizer(format!("failed to load tokenizer: {e}")))?;
            tokenizer
                .with_truncation(Some(TruncationParams {
                    max_length,
                    ..Default::default()
                }))
                .map_err(|e| Error::tokenizer(format!("failed to set truncation: {e}")))?;
            Ok(Self {
                tokenizer,
                name: path.display().to_string(),
            })
        }
    }

    impl OffsetTokenizer for HfTokenizer {
        fn encode(&self, text: &str) -> Result<TokenizedSentence> {
            let encoding = self
                .tokenizer
                .encode_char_offsets(text, true)
                .map_err(|e| Error::tokenizer(format!("encoding failed: {e}")))?;

            let special = encoding.get_special_tokens_mask();
            let offsets = encoding
                .get_offsets()
                .iter()
                .zip(special)
                .map(|(&(s, e), &is_special)| {
                    if is_special == 1 {
                        TokenOffset::SPECIAL
                    } else {
                        TokenOffset::new(s, e)
                    }
                })
                .collect();

            TokenizedSentence::new(offsets, encoding.get_word_ids().to_vec())?
                .with_tokens(encoding.get_tokens().to_vec())
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}
