//! Label Generation for Regime Classification
//!
//! Converts raw per-day label series into one binary target per sample.
//!
//! # Strategies
//!
//! - [`binary_labels`]: classification target. A sample (winter) is positive
//!   if **any** day of its label series is positive.
//! - [`forecast_labels`]: prediction target. A sample is positive if any day
//!   inside the forecast window `[cutoff, cutoff + interval)` is positive.
//!
//! ```text
//! day:      0 1 2 ... cutoff-1 | cutoff ... cutoff+interval-1 | ...
//! input:    ───── features ────┘
//! target:                      └────── any positive? ─────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use regime_eval::labeling::binary_labels;
//!
//! let raw = array![[0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0]];
//! assert_eq!(binary_labels(raw.view()).to_vec(), vec![1, 0, 1]);
//! ```

use crate::error::{EvalError, Result};
use ndarray::{s, Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Value that marks a positive day in raw label series.
pub const POSITIVE_DAY: f64 = 1.0;

#[inline]
fn any_positive(days: ArrayView1<f64>) -> bool {
    days.iter().any(|&v| v == POSITIVE_DAY)
}

/// Reduce `[N, D]` per-day labels to `[N]` binary labels (any positive day).
pub fn binary_labels(raw: ArrayView2<f64>) -> Array1<u8> {
    raw.axis_iter(Axis(0))
        .map(|days| u8::from(any_positive(days)))
        .collect()
}

/// Labels for predicting `interval` days ahead of `cutoff`.
///
/// # Errors
///
/// - `interval == 0`
/// - `cutoff + interval` exceeds the number of days
pub fn forecast_labels(raw: ArrayView2<f64>, cutoff: usize, interval: usize) -> Result<Array1<u8>> {
    if interval == 0 {
        return Err(EvalError::config("prediction interval must be > 0"));
    }
    let n_days = raw.ncols();
    let end = cutoff + interval;
    if end > n_days {
        return Err(EvalError::config(format!(
            "forecast window [{cutoff}, {end}) exceeds the {n_days}-day label series"
        )));
    }
    Ok(binary_labels(raw.slice(s![.., cutoff..end])))
}

/// Class balance statistics for a binary label vector.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use regime_eval::labeling::LabelStats;
///
/// let stats = LabelStats::from_labels(array![0u8, 0, 0, 1].view());
/// assert_eq!(stats.positives, 1);
/// assert_eq!(stats.imbalance_ratio(), 3.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStats {
    /// Total number of labels
    pub total: usize,

    /// Number of positive (1) labels
    pub positives: usize,

    /// Number of negative (0) labels
    pub negatives: usize,
}

impl LabelStats {
    pub fn from_labels(labels: ArrayView1<u8>) -> Self {
        let positives = labels.iter().filter(|&&l| l == 1).count();
        Self {
            total: labels.len(),
            positives,
            negatives: labels.len() - positives,
        }
    }

    /// Fraction of positive labels in `[0, 1]`.
    pub fn positive_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.positives as f64 / self.total as f64
    }

    /// Majority count divided by minority count (`inf` if a class is absent).
    pub fn imbalance_ratio(&self) -> f64 {
        let minority = self.positives.min(self.negatives);
        let majority = self.positives.max(self.negatives);
        if minority == 0 {
            return f64::INFINITY;
        }
        majority as f64 / minority as f64
    }

    /// Both classes are present.
    pub fn has_both_classes(&self) -> bool {
        self.positives > 0 && self.negatives > 0
    }
}

impl std::fmt::Display for LabelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} labels ({} positive, {} negative, {:.1}% positive)",
            self.total,
            self.positives,
            self.negatives,
            self.positive_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_binary_labels_any_positive() {
        let raw = array![[0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0]];
        assert_eq!(binary_labels(raw.view()), array![1u8, 0, 1]);
    }

    #[test]
    fn test_binary_labels_empty_days() {
        let raw = Array2::<f64>::zeros((2, 0));
        assert_eq!(binary_labels(raw.view()), array![0u8, 0]);
    }

    #[test]
    fn test_forecast_labels_window() {
        // positives on day 1 (before cutoff) and day 4 (after window)
        let raw = array![
            [0.0, 1.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 0.0]
        ];
        let labels = forecast_labels(raw.view(), 2, 2).unwrap();
        assert_eq!(labels, array![0u8, 1, 1]);
    }

    #[test]
    fn test_forecast_labels_out_of_range() {
        let raw = Array2::<f64>::zeros((3, 10));
        assert!(forecast_labels(raw.view(), 8, 3).unwrap_err().is_config());
        assert!(forecast_labels(raw.view(), 8, 0).unwrap_err().is_config());
        assert!(forecast_labels(raw.view(), 8, 2).is_ok());
    }

    #[test]
    fn test_label_stats() {
        let stats = LabelStats::from_labels(array![1u8, 0, 0, 0, 0].view());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.positives, 1);
        assert_eq!(stats.negatives, 4);
        assert!((stats.positive_rate() - 0.2).abs() < 1e-12);
        assert_eq!(stats.imbalance_ratio(), 4.0);
        assert!(stats.has_both_classes());

        let empty = LabelStats::from_labels(array![0u8, 0].view());
        assert!(empty.imbalance_ratio().is_infinite());
        assert!(!empty.has_both_classes());
    }
}
