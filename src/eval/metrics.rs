//! Training-time metrics from label-id batches.
//!
//! A training harness hands over parallel batches of predicted and gold ids
//! (gold uses `-100` for excluded positions). Positions are filtered, mapped
//! to tags and scored with a [`SequenceEvaluator`]:
//!
//! ```text
//! gold   [-100,  0,  1,  4, -100]      pred   [ 0,  0,  1,  4,  2]
//!            ↓ drop gold == -100 (and ids missing from the map)
//! gold   [O, B-ASP-POS, I-ASP-POS]     pred   [O, B-ASP-POS, I-ASP-POS]
//!            ↓ evaluator
//! { precision, recall, f1, f1_ASP-POS, f1_ASP-NEG, f1_ASP-NEU }
//! ```
//!
//! When nothing is left to score, or the evaluator is absent or fails, the
//! result is all zeros with [`AbsaMetrics::degraded`] set. This is never an
//! error.

use super::seqeval::{ClassificationReport, SeqevalEvaluator, SequenceEvaluator};
use crate::labels::IGNORE_INDEX;
use crate::reassemble::argmax;
use crate::span::Polarity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Why metrics came back as zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum DegradedReason {
    /// No sentence had a scorable position
    NoValidSentences,
    /// No evaluator was provided
    EvaluatorUnavailable,
    /// The evaluator returned an error
    EvaluatorFailed(String),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedReason::NoValidSentences => f.write_str("no valid sentences to score"),
            DegradedReason::EvaluatorUnavailable => f.write_str("sequence evaluator unavailable"),
            DegradedReason::EvaluatorFailed(e) => write!(f, "sequence evaluator failed: {e}"),
        }
    }
}

/// Micro-averaged scores plus per-aspect-type F1.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AbsaMetrics {
    /// Micro precision
    pub precision: f64,
    /// Micro recall
    pub recall: f64,
    /// Micro F1
    pub f1: f64,
    /// F1 per `ASP-*` type; always holds `ASP-POS`, `ASP-NEG`, `ASP-NEU`
    pub per_type_f1: BTreeMap<String, f64>,
    /// Set when the result is the zero-valued fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<DegradedReason>,
    /// Sentences that contributed at least one position
    pub sentences_scored: usize,
}

fn aspect_type(p: Polarity) -> String {
    format!("ASP-{}", p.code())
}

impl AbsaMetrics {
    /// All-zero metrics carrying `reason`.
    #[must_use]
    pub fn zeros(reason: DegradedReason) -> Self {
        Self {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            per_type_f1: Polarity::ALL.iter().map(|&p| (aspect_type(p), 0.0)).collect(),
            degraded: Some(reason),
            sentences_scored: 0,
        }
    }

    /// Take micro averages and aspect-type F1 from a report.
    #[must_use]
    pub fn from_report(report: &ClassificationReport, sentences_scored: usize) -> Self {
        Self {
            precision: report.micro.precision,
            recall: report.micro.recall,
            f1: report.micro.f1,
            per_type_f1: Polarity::ALL
                .iter()
                .map(|&p| {
                    let ty = aspect_type(p);
                    let f1 = report.f1_for(&ty);
                    (ty, f1)
                })
                .collect(),
            degraded: None,
            sentences_scored,
        }
    }

    /// Whether this is the zero-valued fallback.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// F1 of one aspect type.
    #[must_use]
    pub fn f1_for(&self, polarity: Polarity) -> f64 {
        self.per_type_f1
            .get(&aspect_type(polarity))
            .copied()
            .unwrap_or(0.0)
    }

    /// Flat metrics dictionary: `precision`, `recall`, `f1`, `f1_ASP-POS`,
    /// `f1_ASP-NEG`, `f1_ASP-NEU`.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("precision".to_string(), self.precision);
        map.insert("recall".to_string(), self.recall);
        map.insert("f1".to_string(), self.f1);
        for p in Polarity::ALL {
            map.insert(format!("f1_{}", aspect_type(p)), self.f1_for(p));
        }
        map
    }
}

/// Filtered tag sequences ready for an evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredBatch {
    /// Gold tags per retained sentence
    pub gold: Vec<Vec<String>>,
    /// Predicted tags per retained sentence
    pub pred: Vec<Vec<String>>,
    /// Positions dropped because an id was missing from the map
    pub unmapped: usize,
}

/// Drop excluded and unmappable positions, then drop empty sentences.
#[must_use]
pub fn filter_batch(
    predictions: &[Vec<i64>],
    gold: &[Vec<i64>],
    id_to_label: &HashMap<i64, String>,
) -> FilteredBatch {
    if predictions.len() != gold.len() {
        log::warn!(
            "{} predicted sentences but {} gold; scoring the first {}",
            predictions.len(),
            gold.len(),
            predictions.len().min(gold.len())
        );
    }

    let mut batch = FilteredBatch::default();
    for (pred_ids, gold_ids) in predictions.iter().zip(gold) {
        let mut g = Vec::new();
        let mut p = Vec::new();
        for (&pid, &gid) in pred_ids.iter().zip(gold_ids) {
            if gid == IGNORE_INDEX {
                continue;
            }
            match (id_to_label.get(&gid), id_to_label.get(&pid)) {
                (Some(gl), Some(pl)) => {
                    g.push(gl.clone());
                    p.push(pl.clone());
                }
                _ => batch.unmapped += 1,
            }
        }
        if !g.is_empty() {
            batch.gold.push(g);
            batch.pred.push(p);
        }
    }
    if batch.unmapped > 0 {
        log::warn!("dropped {} positions with ids missing from the label map", batch.unmapped);
    }
    batch
}

/// Score id batches with the seqeval-compatible evaluator.
#[must_use]
pub fn compute_metrics(
    predictions: &[Vec<i64>],
    gold: &[Vec<i64>],
    id_to_label: &HashMap<i64, String>,
) -> AbsaMetrics {
    compute_metrics_with(predictions, gold, id_to_label, Some(&SeqevalEvaluator))
}

/// Score id batches with an injected evaluator; `None` means unavailable.
#[must_use]
pub fn compute_metrics_with(
    predictions: &[Vec<i64>],
    gold: &[Vec<i64>],
    id_to_label: &HashMap<i64, String>,
    evaluator: Option<&dyn SequenceEvaluator>,
) -> AbsaMetrics {
    let batch = filter_batch(predictions, gold, id_to_label);
    if batch.gold.is_empty() {
        log::warn!("{}; returning zero metrics", DegradedReason::NoValidSentences);
        return AbsaMetrics::zeros(DegradedReason::NoValidSentences);
    }
    let Some(evaluator) = evaluator else {
        log::warn!("{}; returning zero metrics", DegradedReason::EvaluatorUnavailable);
        return AbsaMetrics::zeros(DegradedReason::EvaluatorUnavailable);
    };

    match evaluator.evaluate(&batch.gold, &batch.pred) {
        Ok(report) => AbsaMetrics::from_report(&report, batch.gold.len()),
        Err(e) => {
            let reason = DegradedReason::EvaluatorFailed(e.to_string());
            log::warn!("{reason}; returning zero metrics");
            AbsaMetrics::zeros(reason)
        }
    }
}

/// Arg-max over the label axis of `[sentence][token][label]` logits, then
/// [`compute_metrics`].
#[must_use]
pub fn compute_metrics_from_logits(
    logits: &[Vec<Vec<f32>>],
    gold: &[Vec<i64>],
    id_to_label: &HashMap<i64, String>,
) -> AbsaMetrics {
    let predictions: Vec<Vec<i64>> = logits
        .iter()
        .map(|sentence| {
            sentence
                .iter()
                .map(|row| argmax(row).map_or(IGNORE_INDEX, |(i, _)| i as i64))
                .collect()
        })
        .collect();
    compute_metrics(&predictions, gold, id_to_label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelVocabulary;
    use crate::Error;

    fn map() -> HashMap<i64, String> {
        LabelVocabulary::standard().id_to_label_map()
    }

    #[test]
    fn test_empty_batch_is_zeros() {
        let m = compute_metrics(&[], &[], &map());
        assert!(m.is_degraded());
        let expected: BTreeMap<String, f64> = [
            "precision",
            "recall",
            "f1",
            "f1_ASP-POS",
            "f1_ASP-NEG",
            "f1_ASP-NEU",
        ]
        .into_iter()
        .map(|k| (k.to_string(), 0.0))
        .collect();
        assert_eq!(m.to_map(), expected);
    }

    #[test]
    fn test_all_excluded_is_zeros() {
        let m = compute_metrics(&[vec![1, 4]], &[vec![-100, -100]], &map());
        assert_eq!(m.degraded, Some(DegradedReason::NoValidSentences));
    }

    #[test]
    fn test_identical_sequences_score_one() {
        let gold = vec![vec![-100, 0, 1, 4, 0, 2, -100], vec![-100, 3, 0, -100]];
        let m = compute_metrics(&gold, &gold, &map());
        assert!(!m.is_degraded());
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
        assert_eq!(m.f1_for(Polarity::Positive), 1.0);
        assert_eq!(m.f1_for(Polarity::Negative), 1.0);
        assert_eq!(m.f1_for(Polarity::Neutral), 1.0);
        assert_eq!(m.sentences_scored, 2);
    }

    #[test]
    fn test_excluded_positions_ignore_predictions() {
        // prediction under -100 gold would otherwise add a spurious chunk
        let gold = vec![vec![-100, 1, 0, -100]];
        let pred = vec![vec![2, 1, 0, 5]];
        let m = compute_metrics(&pred, &gold, &map());
        assert_eq!(m.f1, 1.0);
        assert_eq!(m.f1_for(Polarity::Negative), 0.0);
    }

    #[test]
    fn test_unmapped_prediction_dropped() {
        let gold = vec![vec![1, 0, 2]];
        let pred = vec![vec![1, 99, 2]];
        let batch = filter_batch(&pred, &gold, &map());
        assert_eq!(batch.unmapped, 1);
        assert_eq!(batch.gold, vec![vec!["B-ASP-POS", "B-ASP-NEG"]]);
        let m = compute_metrics(&pred, &gold, &map());
        assert_eq!(m.f1, 1.0);
    }

    #[test]
    fn test_partial_match() {
        // gold: POS chunk and NEG chunk; pred: POS correct, NEG missed
        let gold = vec![vec![0, 1, 4, 0, 2]];
        let pred = vec![vec![0, 1, 4, 0, 0]];
        let m = compute_metrics(&pred, &gold, &map());
        assert!((m.precision - 1.0).abs() < 1e-9);
        assert!((m.recall - 0.5).abs() < 1e-9);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.f1_for(Polarity::Positive), 1.0);
        assert_eq!(m.f1_for(Polarity::Negative), 0.0);
    }

    #[test]
    fn test_evaluator_unavailable() {
        let gold = vec![vec![0, 1]];
        let m = compute_metrics_with(&gold, &gold, &map(), None);
        assert_eq!(m.degraded, Some(DegradedReason::EvaluatorUnavailable));
        assert_eq!(m.f1, 0.0);
    }

    struct Failing;

    impl SequenceEvaluator for Failing {
        fn evaluate(
            &self,
            _gold: &[Vec<String>],
            _pred: &[Vec<String>],
        ) -> crate::Result<ClassificationReport> {
            Err(Error::evaluation("boom"))
        }
    }

    #[test]
    fn test_evaluator_failure_degrades() {
        let gold = vec![vec![0, 1]];
        let m = compute_metrics_with(&gold, &gold, &map(), Some(&Failing));
        assert!(matches!(m.degraded, Some(DegradedReason::EvaluatorFailed(_))));
        assert_eq!(m.to_map()["f1"], 0.0);
    }

    #[test]
    fn test_from_logits() {
        let gold = vec![vec![-100, 1, 0]];
        let logits = vec![vec![
            vec![5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
        ]];
        let m = compute_metrics_from_logits(&logits, &gold, &map());
        assert_eq!(m.f1, 1.0);
    }
}
