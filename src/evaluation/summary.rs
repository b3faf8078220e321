//! Per-metric score aggregation across folds.

use super::MetricKind;
use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of a score list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub mean: f64,
    pub std: f64,
}

impl ScoreSummary {
    /// Summarise `scores`; an empty list gives NaN for both fields.
    pub fn from_scores(scores: &[f64]) -> Self {
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std: var.sqrt(),
        }
    }
}

/// Scores of several metrics, one list per metric, in metric order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScores {
    pub metrics: Vec<MetricKind>,
    pub scores: Vec<Vec<f64>>,
}

impl MetricScores {
    pub fn new(metrics: &[MetricKind]) -> Self {
        Self {
            metrics: metrics.to_vec(),
            scores: vec![Vec::new(); metrics.len()],
        }
    }

    /// Append one score per metric (one fold).
    pub(crate) fn push_fold(&mut self, fold_scores: &[f64]) {
        for (list, &s) in self.scores.iter_mut().zip(fold_scores) {
            list.push(s);
        }
    }

    pub fn summaries(&self) -> Vec<ScoreSummary> {
        self.scores.iter().map(|s| ScoreSummary::from_scores(s)).collect()
    }

    pub fn means(&self) -> Vec<f64> {
        self.summaries().iter().map(|s| s.mean).collect()
    }

    pub fn stds(&self) -> Vec<f64> {
        self.summaries().iter().map(|s| s.std).collect()
    }

    /// Scores of one metric, if it was evaluated.
    pub fn get(&self, metric: MetricKind) -> Option<&[f64]> {
        self.metrics
            .iter()
            .position(|&m| m == metric)
            .map(|i| self.scores[i].as_slice())
    }
}
