//! Binary classification metrics.
//!
//! All metrics score **hard** predictions (labels in `{0, 1}`), matching how
//! both evaluation paths call them. [`roc_auc`] also accepts continuous
//! scores; fed hard labels it reduces to the balanced accuracy
//! `(TPR + TNR) / 2`.
//!
//! | Kind | Record name | Plot label | Undefined when |
//! |------|-------------|------------|----------------|
//! | [`MetricKind::F1`] | `F1` | `F1` | never (zero division → 0) |
//! | [`MetricKind::F1Macro`] | `F1_macro` | `F1 (macro)` | never |
//! | [`MetricKind::Auroc`] | `AUROC` | `ROCAUC` | `y_true` has one class |
//! | [`MetricKind::Accuracy`] | `Accuracy` | `Accuracy` | empty input |

use crate::error::{EvalError, Result};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics reported by the evaluation harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    #[serde(rename = "F1")]
    F1,
    #[serde(rename = "F1_macro")]
    F1Macro,
    #[serde(rename = "AUROC", alias = "ROCAUC")]
    Auroc,
    #[serde(rename = "Accuracy")]
    Accuracy,
}

impl MetricKind {
    /// The metric list of the classification task, in report order.
    pub const CLASSIFICATION: [MetricKind; 3] =
        [MetricKind::F1, MetricKind::Auroc, MetricKind::Accuracy];

    /// The metric pair of the prediction task.
    pub const PREDICTION: [MetricKind; 2] = [MetricKind::Auroc, MetricKind::F1Macro];

    /// Name stored in result records.
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::F1 => "F1",
            MetricKind::F1Macro => "F1_macro",
            MetricKind::Auroc => "AUROC",
            MetricKind::Accuracy => "Accuracy",
        }
    }

    /// Label used in logs and plots.
    pub fn display_name(&self) -> &'static str {
        match self {
            MetricKind::F1 => "F1",
            MetricKind::F1Macro => "F1 (macro)",
            MetricKind::Auroc => "ROCAUC",
            MetricKind::Accuracy => "Accuracy",
        }
    }

    /// Score hard predictions against the truth.
    pub fn score(&self, y_true: ArrayView1<u8>, y_pred: ArrayView1<u8>) -> Result<f64> {
        check_lengths(y_true, y_pred.len())?;
        match self {
            MetricKind::F1 => Ok(f1(y_true, y_pred)),
            MetricKind::F1Macro => Ok(f1_macro(y_true, y_pred)),
            MetricKind::Auroc => {
                let scores: Vec<f64> = y_pred.iter().map(|&p| f64::from(p)).collect();
                roc_auc(y_true, ArrayView1::from(&scores))
            }
            MetricKind::Accuracy => accuracy(y_true, y_pred),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn check_lengths(y_true: ArrayView1<u8>, n_pred: usize) -> Result<()> {
    if y_true.len() != n_pred {
        return Err(EvalError::data(format!(
            "{} true labels but {n_pred} predictions",
            y_true.len()
        )));
    }
    Ok(())
}

/// (tp, fp, fn) for `positive` treated as the positive class.
fn confusion(y_true: ArrayView1<u8>, y_pred: ArrayView1<u8>, positive: u8) -> (usize, usize, usize) {
    y_true
        .iter()
        .zip(y_pred.iter())
        .fold((0, 0, 0), |(tp, fp, fn_), (&t, &p)| {
            match (t == positive, p == positive) {
                (true, true) => (tp + 1, fp, fn_),
                (false, true) => (tp, fp + 1, fn_),
                (true, false) => (tp, fp, fn_ + 1),
                (false, false) => (tp, fp, fn_),
            }
        })
}

fn f1_for(y_true: ArrayView1<u8>, y_pred: ArrayView1<u8>, positive: u8) -> f64 {
    let (tp, fp, fn_) = confusion(y_true, y_pred, positive);
    let denom = 2 * tp + fp + fn_;
    if denom == 0 {
        0.0
    } else {
        2.0 * tp as f64 / denom as f64
    }
}

/// Binary F1 of the positive class (1). Zero when there are no true or
/// predicted positives.
pub fn f1(y_true: ArrayView1<u8>, y_pred: ArrayView1<u8>) -> f64 {
    f1_for(y_true, y_pred, 1)
}

/// Unweighted mean of the per-class F1 over classes present in either
/// `y_true` or `y_pred`.
pub fn f1_macro(y_true: ArrayView1<u8>, y_pred: ArrayView1<u8>) -> f64 {
    let present: Vec<u8> = [0u8, 1]
        .into_iter()
        .filter(|&c| y_true.iter().chain(y_pred.iter()).any(|&l| l == c))
        .collect();
    if present.is_empty() {
        return 0.0;
    }
    present
        .iter()
        .map(|&c| f1_for(y_true, y_pred, c))
        .sum::<f64>()
        / present.len() as f64
}

/// Fraction of matching labels.
pub fn accuracy(y_true: ArrayView1<u8>, y_pred: ArrayView1<u8>) -> Result<f64> {
    check_lengths(y_true, y_pred.len())?;
    if y_true.is_empty() {
        return Err(EvalError::UndefinedMetric {
            metric: MetricKind::Accuracy.name().to_string(),
            reason: "no samples".to_string(),
        });
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Area under the ROC curve via the rank statistic, ties sharing their
/// average rank.
///
/// # Errors
///
/// [`EvalError::UndefinedMetric`] if `y_true` contains only one class.
pub fn roc_auc(y_true: ArrayView1<u8>, scores: ArrayView1<f64>) -> Result<f64> {
    check_lengths(y_true, scores.len())?;
    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&l| l == 1).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(EvalError::UndefinedMetric {
            metric: MetricKind::Auroc.name().to_string(),
            reason: "only one class present in y_true".to_string(),
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // ascending 1-based ranks, ties averaged
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && scores[order[j]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        rank_sum_pos += avg_rank * order[i..j].iter().filter(|&&k| y_true[k] == 1).count() as f64;
        i = j;
    }

    let (p, q) = (n_pos as f64, n_neg as f64);
    Ok((rank_sum_pos - p * (p + 1.0) / 2.0) / (p * q))
}
