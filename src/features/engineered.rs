//! Engineered time-series features for the forecast task.
//!
//! The feature engineer sees a flat table: each original sample contributes
//! `feature_count` consecutive rows, one per variable, in sample-major order:
//!
//! ```text
//! row 0: sample 0, variable 0
//! row 1: sample 0, variable 1
//! row 2: sample 0, variable 2
//! row 3: sample 1, variable 0
//! ...
//! ```
//!
//! Downstream column keys depend on exactly this ordering, so
//! [`flatten_samples`] and every [`FeatureEngineer`] must agree on it.
//!
//! [`SummaryFeatureEngineer`] computes a fixed list of per-row statistics and
//! lays them out per sample as `variable × statistic`. Some statistics are
//! undefined for degenerate rows (a one-day slope, the variation coefficient of
//! a zero-mean row); they come out as NaN or ±inf and are zero-filled later.

use super::FeatureSet;
use crate::error::{EvalError, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

/// Flatten `[N, V, D]` into `[N * V, D]`, sample-major then variable.
pub fn flatten_samples(raw: ArrayView3<f64>) -> Array2<f64> {
    let (n, v, d) = raw.dim();
    let mut rows = Array2::<f64>::zeros((n * v, d));
    for (i, sample) in raw.axis_iter(Axis(0)).enumerate() {
        for (j, series) in sample.axis_iter(Axis(0)).enumerate() {
            rows.row_mut(i * v + j).assign(&series);
        }
    }
    rows
}

/// Caller-supplied feature-engineering step over the flattened table.
pub trait FeatureEngineer: Send + Sync {
    /// Turn `[N * feature_count, D]` rows into an `[N, K]` feature set.
    ///
    /// `variables` names the `feature_count` rows of each sample, in order.
    fn engineer(
        &self,
        rows: ArrayView2<f64>,
        feature_count: usize,
        variables: &[String],
    ) -> Result<FeatureSet>;

    /// Columns produced per input row (so `K = feature_count * this`).
    fn statistics_per_row(&self) -> usize;
}

/// Per-row summary statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    StandardDeviation,
    Variance,
    Minimum,
    Maximum,
    Median,
    SumValues,
    AbsEnergy,
    FirstValue,
    LastValue,
    MeanChange,
    MeanAbsChange,
    LinearTrendSlope,
    VariationCoefficient,
}

impl Statistic {
    /// Every statistic, in default column order.
    pub const ALL: [Statistic; 14] = [
        Statistic::Mean,
        Statistic::StandardDeviation,
        Statistic::Variance,
        Statistic::Minimum,
        Statistic::Maximum,
        Statistic::Median,
        Statistic::SumValues,
        Statistic::AbsEnergy,
        Statistic::FirstValue,
        Statistic::LastValue,
        Statistic::MeanChange,
        Statistic::MeanAbsChange,
        Statistic::LinearTrendSlope,
        Statistic::VariationCoefficient,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::StandardDeviation => "standard_deviation",
            Statistic::Variance => "variance",
            Statistic::Minimum => "minimum",
            Statistic::Maximum => "maximum",
            Statistic::Median => "median",
            Statistic::SumValues => "sum_values",
            Statistic::AbsEnergy => "abs_energy",
            Statistic::FirstValue => "first_value",
            Statistic::LastValue => "last_value",
            Statistic::MeanChange => "mean_change",
            Statistic::MeanAbsChange => "mean_abs_change",
            Statistic::LinearTrendSlope => "linear_trend_slope",
            Statistic::VariationCoefficient => "variation_coefficient",
        }
    }

    /// Evaluate on one series. Empty or too-short series give NaN.
    pub fn compute(&self, series: ArrayView1<f64>) -> f64 {
        let n = series.len();
        let mean = || series.sum() / n as f64;
        let variance = || {
            let m = mean();
            series.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n as f64
        };
        let changes = || series.windows(2).into_iter().map(|w| w[1] - w[0]);

        match self {
            Statistic::Mean => mean(),
            Statistic::StandardDeviation => variance().sqrt(),
            Statistic::Variance => variance(),
            Statistic::Minimum => series.iter().copied().reduce(f64::min).unwrap_or(f64::NAN),
            Statistic::Maximum => series.iter().copied().reduce(f64::max).unwrap_or(f64::NAN),
            Statistic::Median => median(series),
            Statistic::SumValues => series.sum(),
            Statistic::AbsEnergy => series.iter().map(|x| x * x).sum(),
            Statistic::FirstValue => series.iter().next().copied().unwrap_or(f64::NAN),
            Statistic::LastValue => series.iter().last().copied().unwrap_or(f64::NAN),
            Statistic::MeanChange => changes().sum::<f64>() / (n as f64 - 1.0),
            Statistic::MeanAbsChange => changes().map(f64::abs).sum::<f64>() / (n as f64 - 1.0),
            Statistic::LinearTrendSlope => linear_trend_slope(series),
            Statistic::VariationCoefficient => variance().sqrt() / mean(),
        }
    }
}

fn median(series: ArrayView1<f64>) -> f64 {
    if series.is_empty() {
        return f64::NAN;
    }
    let mut sorted = series.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Least-squares slope against the day index.
fn linear_trend_slope(series: ArrayView1<f64>) -> f64 {
    let n = series.len() as f64;
    let mean_t = (n - 1.0) / 2.0;
    let mean_y = series.sum() / n;
    let (num, den) = series
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (t, y)| {
            let dt = t as f64 - mean_t;
            (num + dt * (y - mean_y), den + dt * dt)
        });
    num / den
}

/// Fixed list of summary statistics per variable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryFeatureEngineer {
    statistics: Vec<Statistic>,
}

impl Default for SummaryFeatureEngineer {
    fn default() -> Self {
        Self::new(Statistic::ALL.to_vec())
    }
}

impl SummaryFeatureEngineer {
    pub fn new(statistics: Vec<Statistic>) -> Self {
        Self { statistics }
    }

    pub fn statistics(&self) -> &[Statistic] {
        &self.statistics
    }

    /// Column keys for the given variables: variable-major, then statistic.
    pub fn keys(&self, variables: &[String]) -> Vec<String> {
        variables
            .iter()
            .flat_map(|var| {
                self.statistics
                    .iter()
                    .map(move |stat| format!("{var}__{}", stat.name()))
            })
            .collect()
    }
}

impl FeatureEngineer for SummaryFeatureEngineer {
    fn engineer(
        &self,
        rows: ArrayView2<f64>,
        feature_count: usize,
        variables: &[String],
    ) -> Result<FeatureSet> {
        if feature_count == 0 || rows.nrows() % feature_count != 0 {
            return Err(EvalError::data(format!(
                "{} rows cannot be grouped into samples of {feature_count} variables",
                rows.nrows()
            )));
        }
        if variables.len() != feature_count {
            return Err(EvalError::data(format!(
                "{} variable names for {feature_count} rows per sample",
                variables.len()
            )));
        }

        let n_samples = rows.nrows() / feature_count;
        let n_stats = self.statistics.len();
        let mut matrix = Array2::<f64>::zeros((n_samples, feature_count * n_stats));

        for (r, series) in rows.axis_iter(Axis(0)).enumerate() {
            let (sample, variable) = (r / feature_count, r % feature_count);
            for (s, stat) in self.statistics.iter().enumerate() {
                matrix[[sample, variable * n_stats + s]] = stat.compute(series);
            }
        }

        FeatureSet::new(matrix, self.keys(variables))
    }

    fn statistics_per_row(&self) -> usize {
        self.statistics.len()
    }
}
