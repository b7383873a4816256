//! Dataset preparation: annotation rows → labeled sentences → splits.
//!
//! Source corpora (SemEval-style laptop/restaurant reviews) ship one row per
//! aspect mention:
//!
//! ```text
//! id    domain      sentence                         aspect_term  polarity  from  to
//! 2339  laptop      I charge it at night and ...     cord         neutral   41    45
//! 2339  laptop      I charge it at night and ...     battery life positive  74    86
//! ```
//!
//! [`prepare_sentences`] cleans the rows and groups them by `{domain}_{id}`
//! into [`LabeledSentence`]s. [`split_dataset`] makes a seeded
//! train/validation/test split.

use crate::span::{AspectSpan, LabeledSentence, Polarity};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Source row identifier; corpora use both numbers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    /// Numeric id
    Number(i64),
    /// String id
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Number(n) => write!(f, "{n}"),
            RowId::Text(s) => f.write_str(s),
        }
    }
}

/// One aspect mention as it appears in a source corpus.
///
/// Every field but `id` and `domain` may be missing; such rows are dropped
/// during preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRow {
    /// Sentence id within its domain
    #[serde(alias = "Id")]
    pub id: RowId,
    /// Corpus domain
    #[serde(default, alias = "Domain")]
    pub domain: String,
    /// Sentence text
    #[serde(default, alias = "Sentence")]
    pub sentence: Option<String>,
    /// Aspect surface form
    #[serde(default, alias = "Aspect Term", alias = "aspect term")]
    pub aspect_term: Option<String>,
    /// Polarity label as annotated
    #[serde(default, alias = "Polarity")]
    pub polarity: Option<String>,
    /// Start character
    #[serde(default)]
    pub from: Option<i64>,
    /// End character (exclusive)
    #[serde(default)]
    pub to: Option<i64>,
}

/// Normalize an annotated polarity.
///
/// Lowercases and trims; `conflict` becomes `neutral`. Anything outside
/// `{positive, negative, neutral}` is rejected.
///
/// # Errors
///
/// [`Error::UnknownPolarity`] for unexpected values.
pub fn normalize_polarity(raw: &str) -> Result<Polarity> {
    let value = raw.trim().to_ascii_lowercase();
    if value == "conflict" {
        return Ok(Polarity::Neutral);
    }
    Polarity::parse(&value)
}

/// Counts from [`prepare_sentences`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreparationStats {
    /// Rows read
    pub rows_in: usize,
    /// Rows kept as aspects
    pub rows_kept: usize,
    /// Dropped: a required field was missing
    pub missing_fields: usize,
    /// Dropped: negative offset
    pub invalid_offsets: usize,
    /// Dropped: polarity outside the expected set
    pub unexpected_polarity: usize,
    /// Kept: `conflict` mapped to `neutral`
    pub conflict_mapped: usize,
}

/// Prepared sentences plus cleaning counts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreparedDataset {
    /// One entry per `{domain}_{id}`, in first-seen order
    pub sentences: Vec<LabeledSentence>,
    /// Cleaning counts
    pub stats: PreparationStats,
}

/// Clean rows and group them into sentences.
///
/// Sentence and term text are trimmed. The sentence text of a group comes
/// from its first row.
#[must_use]
pub fn prepare_sentences(rows: &[AnnotationRow]) -> PreparedDataset {
    let mut stats = PreparationStats {
        rows_in: rows.len(),
        ..PreparationStats::default()
    };
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sentences: Vec<LabeledSentence> = Vec::new();

    for row in rows {
        let (Some(sentence), Some(term), Some(polarity), Some(from), Some(to)) = (
            row.sentence.as_deref(),
            row.aspect_term.as_deref(),
            row.polarity.as_deref(),
            row.from,
            row.to,
        ) else {
            stats.missing_fields += 1;
            continue;
        };
        let (Ok(from), Ok(to)) = (usize::try_from(from), usize::try_from(to)) else {
            stats.invalid_offsets += 1;
            continue;
        };
        let polarity = match normalize_polarity(polarity) {
            Ok(p) => {
                if polarity.trim().eq_ignore_ascii_case("conflict") {
                    stats.conflict_mapped += 1;
                }
                p
            }
            Err(_) => {
                stats.unexpected_polarity += 1;
                continue;
            }
        };

        let key = format!("{}_{}", row.domain, row.id);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            sentences.push(
                LabeledSentence::new(sentence.trim(), Vec::new(), row.domain.clone()).with_id(key),
            );
            sentences.len() - 1
        });
        sentences[slot]
            .aspects
            .push(AspectSpan::new(term.trim(), polarity, from, to));
        stats.rows_kept += 1;
    }

    if stats.unexpected_polarity > 0 {
        log::warn!(
            "filtered out {} rows with unexpected polarities",
            stats.unexpected_polarity
        );
    }
    if stats.missing_fields + stats.invalid_offsets > 0 {
        log::warn!(
            "dropped {} rows with missing fields and {} with invalid offsets",
            stats.missing_fields,
            stats.invalid_offsets
        );
    }
    log::info!(
        "grouped {} aspect rows into {} sentences",
        stats.rows_kept,
        sentences.len()
    );

    PreparedDataset { sentences, stats }
}

/// [`prepare_sentences`] without the counts.
#[must_use]
pub fn group_annotations(rows: &[AnnotationRow]) -> Vec<LabeledSentence> {
    prepare_sentences(rows).sentences
}

/// Train / validation / test partition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetSplits<T> {
    /// Training items
    pub train: Vec<T>,
    /// Validation items
    pub validation: Vec<T>,
    /// Test items
    pub test: Vec<T>,
}

impl<T> DatasetSplits<T> {
    /// Total item count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    /// Whether all three parts are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn ceil_count(n: usize, fraction: f64) -> usize {
    // tolerate float noise such as 0.1 + 0.1 = 0.20000000000000001
    ((n as f64 * fraction) - 1e-9).ceil().max(0.0) as usize
}

/// Shuffle with a seeded RNG, then split.
///
/// The held-out part is `ceil(n * (validation + test))` items, divided
/// between test (rounded up) and validation. With 0.1/0.1 this is the usual
/// 80/10/10 split.
///
/// # Errors
///
/// [`Error::InvalidInput`] if a fraction is outside `[0, 1)` or they sum to 1
/// or more.
pub fn split_dataset<T>(
    mut items: Vec<T>,
    validation_fraction: f64,
    test_fraction: f64,
    seed: u64,
) -> Result<DatasetSplits<T>> {
    let valid = |f: f64| (0.0..1.0).contains(&f);
    if !valid(validation_fraction)
        || !valid(test_fraction)
        || validation_fraction + test_fraction >= 1.0
    {
        return Err(Error::invalid_input(format!(
            "invalid split fractions: validation {validation_fraction}, test {test_fraction}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let n = items.len();
    let held_fraction = validation_fraction + test_fraction;
    let held = ceil_count(n, held_fraction).min(n);
    let test_len = if held_fraction > 0.0 {
        ceil_count(held, test_fraction / held_fraction).min(held)
    } else {
        0
    };

    let mut held_out = items.split_off(n - held);
    let test = held_out.split_off(held - test_len);

    log::debug!(
        "dataset split: {} train, {} validation, {} test",
        items.len(),
        held_out.len(),
        test.len()
    );

    Ok(DatasetSplits {
        train: items,
        validation: held_out,
        test,
    })
}

/// Parse JSON Lines from a reader. Blank lines are skipped.
///
/// # Errors
///
/// IO errors, or [`Error::Parse`] naming the offending line.
pub fn read_jsonl_from<T: DeserializeOwned, R: BufRead>(reader: R) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line)
            .map_err(|e| Error::parse(format!("line {}: {}", n + 1, e)))?;
        items.push(item);
    }
    Ok(items)
}

/// Read a JSON Lines file.
///
/// # Errors
///
/// See [`read_jsonl_from`].
pub fn read_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let file = File::open(path.as_ref())?;
    read_jsonl_from(BufReader::new(file))
}

/// Write items as JSON Lines.
///
/// # Errors
///
/// IO or serialization errors.
pub fn write_jsonl_to<T: Serialize, W: Write>(mut writer: W, items: &[T]) -> Result<()> {
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a JSON Lines file.
///
/// # Errors
///
/// IO or serialization errors.
pub fn write_jsonl<T: Serialize>(path: impl AsRef<Path>, items: &[T]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_jsonl_to(BufWriter::new(file), items)
}
