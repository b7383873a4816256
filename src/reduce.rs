//! Subword-label reduction.
//!
//! After alignment every content token carries a label. Most training setups
//! supervise only one token per word:
//!
//! ```text
//! tokens     [CLS]   The   bat    ##tery   [SEP]
//! aligned    -100     O    B-POS  I-POS    -100
//! first      -100     O    B-POS  -100     -100     (FirstSubword)
//! all        -100     O    B-POS  I-POS    -100     (AllSubwords)
//! ```

use crate::labels::{TokenLabel, TokenLabelSequence};
use serde::{Deserialize, Serialize};

/// Which subword tokens keep a supervised label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubwordPolicy {
    /// Only the first subword of each word (`label_all_subword_tokens = false`)
    #[default]
    FirstSubword,
    /// Every subword (`label_all_subword_tokens = true`)
    AllSubwords,
}

impl SubwordPolicy {
    /// Policy for the `label_all_subword_tokens` flag.
    #[must_use]
    pub const fn from_label_all(label_all_subword_tokens: bool) -> Self {
        if label_all_subword_tokens {
            SubwordPolicy::AllSubwords
        } else {
            SubwordPolicy::FirstSubword
        }
    }
}

/// Apply `policy` to an aligned sequence.
///
/// Under [`SubwordPolicy::FirstSubword`] a token is excluded when its word id
/// equals the previous token's, or when it has no word id. Under
/// [`SubwordPolicy::AllSubwords`] labels pass through unchanged. Tokens
/// already excluded stay excluded.
#[must_use]
pub fn reduce(
    raw: &TokenLabelSequence,
    word_ids: &[Option<u32>],
    policy: SubwordPolicy,
) -> TokenLabelSequence {
    match policy {
        SubwordPolicy::AllSubwords => raw.clone(),
        SubwordPolicy::FirstSubword => raw
            .labels()
            .iter()
            .enumerate()
            .map(|(idx, &label)| {
                let word = word_ids.get(idx).copied().flatten();
                let prev = idx
                    .checked_sub(1)
                    .and_then(|p| word_ids.get(p).copied().flatten());
                if word.is_none() || prev == word {
                    TokenLabel::Excluded
                } else {
                    label
                }
            })
            .collect(),
    }
}
