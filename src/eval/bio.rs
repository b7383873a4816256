//! BIO tag parsing, chunking and validation.
//!
//! Chunking follows seqeval's default (non-strict) rules, so a model output
//! like `O I-ASP-POS I-ASP-POS` still yields one `ASP-POS` chunk. Use
//! [`validate_tag_sequence`] to find such transitions and
//! [`repair_tag_sequence`] to fix them.
//!
//! # Example
//!
//! ```rust
//! use absa::eval::bio::{get_chunks, Chunk};
//!
//! let tags = ["O", "B-ASP-POS", "I-ASP-POS", "O", "B-ASP-NEG"];
//! let chunks = get_chunks(&tags);
//! assert_eq!(chunks, vec![
//!     Chunk::new("ASP-POS", 1, 3),
//!     Chunk::new("ASP-NEG", 4, 5),
//! ]);
//! ```

use serde::{Deserialize, Serialize};

/// A parsed tag: one-letter prefix plus entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag<'a> {
    prefix: char,
    entity_type: &'a str,
}

impl<'a> ParsedTag<'a> {
    const OUTSIDE: ParsedTag<'static> = ParsedTag {
        prefix: 'O',
        entity_type: "_",
    };

    /// `B-ASP-POS` → (`B`, `ASP-POS`); `O` → (`O`, `_`).
    fn parse(tag: &'a str) -> Self {
        let mut chars = tag.chars();
        let Some(prefix) = chars.next() else {
            return Self::OUTSIDE;
        };
        let rest = chars.as_str();
        let entity_type = match rest.split_once('-') {
            Some((_, t)) => t,
            None => rest,
        };
        Self {
            prefix,
            entity_type: if entity_type.is_empty() { "_" } else { entity_type },
        }
    }

    fn is_outside(&self) -> bool {
        self.prefix == 'O'
    }
}

/// A chunk: entity type plus token range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Chunk {
    /// Entity type (`ASP-POS`)
    pub entity_type: String,
    /// First token
    pub start: usize,
    /// One past the last token
    pub end: usize,
}

impl Chunk {
    /// Create a chunk.
    #[must_use]
    pub fn new(entity_type: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
        }
    }
}

fn end_of_chunk(prev: &ParsedTag<'_>, tag: &ParsedTag<'_>) -> bool {
    match (prev.prefix, tag.prefix) {
        ('E' | 'S', _) => true,
        ('B' | 'I', 'B' | 'S' | 'O') => true,
        (p, _) if p != 'O' && p != '.' && prev.entity_type != tag.entity_type => true,
        _ => false,
    }
}

fn start_of_chunk(prev: &ParsedTag<'_>, tag: &ParsedTag<'_>) -> bool {
    match (prev.prefix, tag.prefix) {
        (_, 'B' | 'S') => true,
        ('E' | 'S' | 'O', 'E' | 'I') => true,
        (_, t) if t != 'O' && t != '.' && prev.entity_type != tag.entity_type => true,
        _ => false,
    }
}

/// Extract chunks from one tag sequence (seqeval default mode).
#[must_use]
pub fn get_chunks<S: AsRef<str>>(tags: &[S]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut prev = ParsedTag::OUTSIDE;
    let mut begin = 0;

    let sentinel = std::iter::once(ParsedTag::OUTSIDE);
    for (i, tag) in tags
        .iter()
        .map(|t| ParsedTag::parse(t.as_ref()))
        .chain(sentinel)
        .enumerate()
    {
        if end_of_chunk(&prev, &tag) {
            chunks.push(Chunk::new(prev.entity_type, begin, i));
        }
        if start_of_chunk(&prev, &tag) {
            begin = i;
        }
        prev = tag;
    }
    chunks
}

/// Report invalid IOB2 transitions: `I-X` after `O`, or after a tag of
/// another type, and unrecognized prefixes.
#[must_use]
pub fn validate_tag_sequence<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut prev = ParsedTag::OUTSIDE;

    for (i, raw) in tags.iter().enumerate() {
        let raw = raw.as_ref();
        let tag = ParsedTag::parse(raw);
        match tag.prefix {
            'O' if raw == "O" => {}
            'B' => {}
            'I' if prev.is_outside() => errors.push(format!(
                "Position {}: I-{} follows O (should be B-{})",
                i, tag.entity_type, tag.entity_type
            )),
            'I' if prev.entity_type != tag.entity_type => errors.push(format!(
                "Position {}: I-{} follows {}-{} (type mismatch)",
                i, tag.entity_type, prev.prefix, prev.entity_type
            )),
            'I' => {}
            _ => errors.push(format!("Position {i}: unrecognized tag {raw:?}")),
        }
        prev = tag;
    }

    errors
}

/// How [`repair_tag_sequence`] fixes an orphan `I-X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairStrategy {
    /// Turn it into `B-X`.
    #[default]
    PromoteToBegin,
    /// Turn it into `O`.
    Discard,
}

/// Repair orphan `I-X` tags so the sequence is valid IOB2.
#[must_use]
pub fn repair_tag_sequence<S: AsRef<str>>(tags: &[S], strategy: RepairStrategy) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    let mut prev_type: Option<String> = None;

    for raw in tags {
        let raw = raw.as_ref();
        let tag = ParsedTag::parse(raw);
        let repaired = match tag.prefix {
            'I' if prev_type.as_deref() != Some(tag.entity_type) => match strategy {
                RepairStrategy::PromoteToBegin => format!("B-{}", tag.entity_type),
                RepairStrategy::Discard => "O".to_string(),
            },
            _ => raw.to_string(),
        };
        prev_type = match ParsedTag::parse(&repaired) {
            t if t.is_outside() => None,
            t => Some(t.entity_type.to_string()),
        };
        out.push(repaired);
    }
    out
}
