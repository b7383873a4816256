//! Prediction confidence bounded to [0.0, 1.0].
//!
//! Scores here are softmax probabilities of the arg-max label. A reassembled
//! aspect's score is the mean over its tokens, rounded for display:
//!
//! ```text
//! token     bat      ##tery
//! p(max)    0.99123  0.97351
//! aspect    mean = 0.98237 → 0.9824 (4 decimals)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A score guaranteed to be in `[0.0, 1.0]`.
///
/// - [`Confidence::new`]: `None` if out of range or NaN
/// - [`Confidence::saturating`]: clamps, NaN becomes 0.0
#[derive(Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    /// Zero confidence.
    pub const MIN: Self = Self(0.0);

    /// Full confidence.
    pub const MAX: Self = Self(1.0);

    /// Create a confidence score, returning `None` if out of range.
    #[must_use]
    #[inline]
    pub fn new(value: f64) -> Option<Self> {
        if (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a confidence score, clamping to `[0.0, 1.0]`. NaN becomes 0.0.
    #[must_use]
    #[inline]
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Inner value.
    #[must_use]
    #[inline]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Arithmetic mean of `scores`; `None` when empty.
    #[must_use]
    pub fn mean<I: IntoIterator<Item = Confidence>>(scores: I) -> Option<Self> {
        let (sum, n) = scores
            .into_iter()
            .fold((0.0, 0usize), |(s, n), c| (s + c.0, n + 1));
        (n > 0).then(|| Self::saturating(sum / n as f64))
    }

    /// Round to `decimals` digits; see [`round_to`].
    #[must_use]
    pub fn rounded(self, decimals: u32) -> Self {
        Self::saturating(round_to(self.0, decimals))
    }
}

/// Round `value` to `decimals` digits.
///
/// Rounds the exact decimal expansion of `value` with ties to even, the
/// way Python's `round(x, n)` does, so `0.125` becomes `0.12` and a value
/// stored as `2.67499…` never rounds up.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.prec$}", prec = decimals as usize)
        .parse()
        .unwrap_or(value)
}

impl fmt::Debug for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Confidence({:.4})", self.0)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

impl From<Confidence> for f64 {
    #[inline]
    fn from(conf: Confidence) -> Self {
        conf.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_out_of_range() {
        assert!(Confidence::new(0.0).is_some());
        assert!(Confidence::new(1.0).is_some());
        assert!(Confidence::new(-0.1).is_none());
        assert!(Confidence::new(1.1).is_none());
        assert!(Confidence::new(f64::NAN).is_none());
    }

    #[test]
    fn saturating_clamps() {
        assert_eq!(Confidence::saturating(2.0).get(), 1.0);
        assert_eq!(Confidence::saturating(-1.0).get(), 0.0);
        assert_eq!(Confidence::saturating(f64::NAN).get(), 0.0);
    }

    #[test]
    fn mean_of_scores() {
        let scores = [0.9912, 0.9735].map(Confidence::saturating);
        let m = Confidence::mean(scores).unwrap();
        assert!((m.get() - 0.98235).abs() < 1e-12);
        assert!(Confidence::mean(std::iter::empty()).is_none());
    }

    #[test]
    fn rounding_to_four_decimals() {
        assert_eq!(Confidence::saturating(0.987_654).rounded(4).get(), 0.9877);
        assert_eq!(Confidence::saturating(0.5).rounded(4).get(), 0.5);
        assert_eq!(round_to(0.123_45, 2), 0.12);
    }

    #[test]
    fn rounding_uses_exact_decimal_ties_to_even() {
        // exact binary ties round to even
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(0.5, 0), 0.0);
        // 2.675 is stored just below the tie
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(0.891_725_003_5, 4), 0.8917);
        assert!(round_to(f64::NAN, 4).is_nan());
    }

    #[test]
    fn serde_is_plain_number() {
        let json = serde_json::to_string(&Confidence::saturating(0.85)).unwrap();
        assert_eq!(json, "0.85");
    }
}
