//! Entity-level sequence-labeling evaluation.
//!
//! [`SeqevalEvaluator`] reproduces seqeval's `classification_report` in its
//! default mode: chunks are extracted with non-strict IOB rules, a predicted
//! chunk counts only if type, start and end all match a gold chunk, and
//! divisions by zero yield 0.0.
//!
//! # Averages
//!
//! - **micro**: pool true positives over all types, then divide
//! - **macro**: unweighted mean of per-type scores
//! - **weighted**: per-type scores weighted by gold support

use super::bio::get_chunks;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Precision, recall, F1 and support for one row of a report.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeScores {
    /// Precision
    pub precision: f64,
    /// Recall
    pub recall: f64,
    /// F1
    #[serde(rename = "f1-score")]
    pub f1: f64,
    /// Gold chunk count
    pub support: usize,
}

impl TypeScores {
    /// Scores from raw counts, with zero for any zero denominator.
    #[must_use]
    pub fn from_counts(true_positives: usize, predicted: usize, gold: usize) -> Self {
        let precision = ratio(true_positives, predicted);
        let recall = ratio(true_positives, gold);
        Self {
            precision,
            recall,
            f1: f1(precision, recall),
            support: gold,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(p: f64, r: f64) -> f64 {
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Per-type scores plus averages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Scores per entity type, sorted by type
    pub per_type: BTreeMap<String, TypeScores>,
    /// Micro average
    pub micro: TypeScores,
    /// Macro average
    pub macro_avg: TypeScores,
    /// Support-weighted average
    pub weighted: TypeScores,
}

impl ClassificationReport {
    /// F1 of one type, 0.0 if the type never occurred.
    #[must_use]
    pub fn f1_for(&self, entity_type: &str) -> f64 {
        self.per_type.get(entity_type).map_or(0.0, |s| s.f1)
    }

    /// Plain-text table in seqeval's layout.
    #[must_use]
    pub fn to_table(&self) -> String {
        let width = self
            .per_type
            .keys()
            .map(String::len)
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);
        let row = |name: &str, s: &TypeScores| {
            format!(
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
                name, s.precision, s.recall, s.f1, s.support
            )
        };

        let mut out = format!(
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}\n\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for (name, scores) in &self.per_type {
            out.push_str(&row(name, scores));
        }
        out.push('\n');
        out.push_str(&row("micro avg", &self.micro));
        out.push_str(&row("macro avg", &self.macro_avg));
        out.push_str(&row("weighted avg", &self.weighted));
        out
    }
}

/// External sequence-labeling evaluator capability.
pub trait SequenceEvaluator: Send + Sync {
    /// Score predicted tag sequences against gold ones.
    ///
    /// # Errors
    ///
    /// Implementation-defined; [`SeqevalEvaluator`] rejects batches whose
    /// sentence counts or lengths differ.
    fn evaluate(&self, gold: &[Vec<String>], pred: &[Vec<String>]) -> Result<ClassificationReport>;
}

/// seqeval-compatible evaluator (default mode, `zero_division = 0`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SeqevalEvaluator;

impl SequenceEvaluator for SeqevalEvaluator {
    fn evaluate(&self, gold: &[Vec<String>], pred: &[Vec<String>]) -> Result<ClassificationReport> {
        if gold.len() != pred.len() {
            return Err(Error::evaluation(format!(
                "{} gold sentences but {} predicted",
                gold.len(),
                pred.len()
            )));
        }

        // (type, sentence, start, end)
        let mut gold_chunks: HashSet<(String, usize, usize, usize)> = HashSet::new();
        let mut pred_chunks: HashSet<(String, usize, usize, usize)> = HashSet::new();
        for (sent, (g, p)) in gold.iter().zip(pred).enumerate() {
            if g.len() != p.len() {
                return Err(Error::evaluation(format!(
                    "sentence {}: {} gold tags but {} predicted",
                    sent,
                    g.len(),
                    p.len()
                )));
            }
            gold_chunks.extend(
                get_chunks(g)
                    .into_iter()
                    .map(|c| (c.entity_type, sent, c.start, c.end)),
            );
            pred_chunks.extend(
                get_chunks(p)
                    .into_iter()
                    .map(|c| (c.entity_type, sent, c.start, c.end)),
            );
        }

        let types: BTreeSet<&str> = gold_chunks
            .iter()
            .chain(&pred_chunks)
            .map(|c| c.0.as_str())
            .collect();

        let mut per_type = BTreeMap::new();
        let (mut tp_all, mut pred_all, mut gold_all) = (0, 0, 0);
        for ty in types {
            let g: HashSet<_> = gold_chunks.iter().filter(|c| c.0 == ty).collect();
            let p: HashSet<_> = pred_chunks.iter().filter(|c| c.0 == ty).collect();
            let tp = g.intersection(&p).count();
            tp_all += tp;
            pred_all += p.len();
            gold_all += g.len();
            per_type.insert(ty.to_string(), TypeScores::from_counts(tp, p.len(), g.len()));
        }

        let micro = TypeScores::from_counts(tp_all, pred_all, gold_all);
        let n = per_type.len();
        let macro_avg = if n == 0 {
            TypeScores::default()
        } else {
            let sum = |f: fn(&TypeScores) -> f64| per_type.values().map(f).sum::<f64>() / n as f64;
            TypeScores {
                precision: sum(|s| s.precision),
                recall: sum(|s| s.recall),
                f1: sum(|s| s.f1),
                support: gold_all,
            }
        };
        let weighted = if gold_all == 0 {
            TypeScores::default()
        } else {
            let wsum = |f: fn(&TypeScores) -> f64| {
                per_type
                    .values()
                    .map(|s| f(s) * s.support as f64)
                    .sum::<f64>()
                    / gold_all as f64
            };
            TypeScores {
                precision: wsum(|s| s.precision),
                recall: wsum(|s| s.recall),
                f1: wsum(|s| s.f1),
                support: gold_all,
            }
        };

        Ok(ClassificationReport {
            per_type,
            micro,
            macro_avg,
            weighted,
        })
    }
}
