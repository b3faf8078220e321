//! Feature production strategies.
//!
//! Both evaluation paths train the same kind of classifier on a feature
//! matrix; they differ only in how the matrix is produced from the raw
//! `[N, V, D]` tensor. That difference is captured by [`FeatureStrategy`]:
//!
//! ```text
//! FeatureStrategy (trait)
//!     ├── HistogramStrategy          [N, V*B] bin counts (batch-local ranges)
//!     └── EngineeredFeatureStrategy  flatten [N*V, D] → FeatureEngineer → [N, V*S]
//! ```
//!
//! Every strategy returns a [`FeatureSet`]: the matrix plus one key per
//! column, so diagnostics (feature importances) and the feature cache can
//! name columns.
//!
//! # Column keys
//!
//! | Strategy | Key format | Example |
//! |----------|------------|---------|
//! | Histogram | `{variable}__hist_{bin:03}` | `wind_60__hist_004` |
//! | Engineered | `{variable}__{statistic}` | `temp_60_90__median` |

pub mod engineered;
pub mod histogram;

pub use engineered::{flatten_samples, FeatureEngineer, Statistic, SummaryFeatureEngineer};
pub use histogram::{HistogramFeaturizer, DEFAULT_BINS};

use crate::error::{EvalError, Result};
use ndarray::{Array2, ArrayView1, ArrayView3};

/// Feature matrix with one key per column.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    /// `[N_samples, N_features]`
    pub matrix: Array2<f64>,

    /// Column keys, `keys.len() == matrix.ncols()`
    pub keys: Vec<String>,
}

impl FeatureSet {
    /// Pair a matrix with its keys, checking that they line up.
    pub fn new(matrix: Array2<f64>, keys: Vec<String>) -> Result<Self> {
        if keys.len() != matrix.ncols() {
            return Err(EvalError::data(format!(
                "{} feature keys for {} feature columns",
                keys.len(),
                matrix.ncols()
            )));
        }
        Ok(Self { matrix, keys })
    }

    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.matrix.ncols()
    }
}

/// Replace NaN and ±inf with zero, returning how many values were replaced.
pub fn zero_fill_non_finite(matrix: &mut Array2<f64>) -> usize {
    let mut replaced = 0;
    matrix.mapv_inplace(|x| {
        if x.is_finite() {
            x
        } else {
            replaced += 1;
            0.0
        }
    });
    replaced
}

/// How a raw `[N, V, D]` tensor becomes a feature matrix.
pub trait FeatureStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Learn whatever the strategy needs from training data.
    ///
    /// Both shipped strategies are stateless, so the default does nothing.
    fn fit(&mut self, _raw: ArrayView3<f64>, _labels: Option<ArrayView1<u8>>) -> Result<()> {
        Ok(())
    }

    /// Produce features for a batch.
    fn produce(&self, raw: ArrayView3<f64>) -> Result<FeatureSet>;

    /// Number of columns `produce` yields for `n_variables` input variables.
    fn expected_key_count(&self, n_variables: usize) -> usize;
}

/// Histogram density features over named variables.
#[derive(Debug, Clone)]
pub struct HistogramStrategy {
    featurizer: HistogramFeaturizer,
    variables: Vec<String>,
}

impl HistogramStrategy {
    pub fn new(featurizer: HistogramFeaturizer, variables: Vec<String>) -> Self {
        Self {
            featurizer,
            variables,
        }
    }

    pub fn featurizer(&self) -> &HistogramFeaturizer {
        &self.featurizer
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Same variables, different bin count.
    pub fn with_bins(&self, n_bins: usize) -> Result<Self> {
        Ok(Self::new(HistogramFeaturizer::new(n_bins)?, self.variables.clone()))
    }

    /// Column keys, variable-major then bin.
    pub fn keys(&self) -> Vec<String> {
        self.variables
            .iter()
            .flat_map(|var| (0..self.featurizer.n_bins()).map(move |b| format!("{var}__hist_{b:03}")))
            .collect()
    }
}

impl FeatureStrategy for HistogramStrategy {
    fn name(&self) -> &'static str {
        "histogram"
    }

    fn produce(&self, raw: ArrayView3<f64>) -> Result<FeatureSet> {
        if raw.dim().1 != self.variables.len() {
            return Err(EvalError::data(format!(
                "tensor has {} variables, strategy was built for {}",
                raw.dim().1,
                self.variables.len()
            )));
        }
        FeatureSet::new(self.featurizer.transform(raw)?, self.keys())
    }

    fn expected_key_count(&self, n_variables: usize) -> usize {
        self.featurizer.n_features(n_variables)
    }
}

/// Engineered summary features over the flattened per-variable rows.
#[derive(Debug, Clone)]
pub struct EngineeredFeatureStrategy<E> {
    engineer: E,
    variables: Vec<String>,
}

impl<E: FeatureEngineer> EngineeredFeatureStrategy<E> {
    pub fn new(engineer: E, variables: Vec<String>) -> Self {
        Self {
            engineer,
            variables,
        }
    }

    pub fn engineer(&self) -> &E {
        &self.engineer
    }
}

impl<E: FeatureEngineer> FeatureStrategy for EngineeredFeatureStrategy<E> {
    fn name(&self) -> &'static str {
        "engineered"
    }

    fn produce(&self, raw: ArrayView3<f64>) -> Result<FeatureSet> {
        let feature_count = raw.dim().1;
        if feature_count != self.variables.len() {
            return Err(EvalError::data(format!(
                "tensor has {feature_count} variables, strategy was built for {}",
                self.variables.len()
            )));
        }
        let rows = flatten_samples(raw);
        let features = self.engineer.engineer(rows.view(), feature_count, &self.variables)?;
        if features.n_samples() != raw.dim().0 {
            return Err(EvalError::data(format!(
                "feature engineer returned {} rows for {} samples",
                features.n_samples(),
                raw.dim().0
            )));
        }
        Ok(features)
    }

    fn expected_key_count(&self, n_variables: usize) -> usize {
        n_variables * self.engineer.statistics_per_row()
    }
}
