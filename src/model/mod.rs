//! Binary classifiers trained on feature matrices.
//!
//! Both evaluation paths treat the classifier as a fit/predict component
//! behind the [`Classifier`] trait. Two tree ensembles ship with the crate:
//!
//! | Kind | Trees | Split criterion | Leaf value | Importances |
//! |------|-------|-----------------|------------|-------------|
//! | [`RandomForest`] | bootstrap CART, √F features per split | Gini | positive fraction | mean decrease in impurity |
//! | [`GradientBoosting`] | sequential, all rows | second-order logistic gain | `-G / (H + λ)` | total gain |
//!
//! Labels are `u8` in `{0, 1}`; `predict_proba` returns `P(y = 1)` and
//! `predict` thresholds it at 0.5.
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use regime_eval::model::ClassifierConfig;
//!
//! let x = array![[0.0], [0.1], [0.9], [1.0]];
//! let y = array![0u8, 0, 1, 1];
//!
//! let mut model = ClassifierConfig::random_forest().with_n_estimators(10).build(7).unwrap();
//! model.fit(x.view(), y.view()).unwrap();
//! assert_eq!(model.predict(x.view()).unwrap().to_vec(), vec![0, 0, 1, 1]);
//! ```

mod boosting;
mod forest;
mod tree;

pub use boosting::GradientBoosting;
pub use forest::RandomForest;

use crate::error::{EvalError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trainable binary classifier.
pub trait Classifier: Send + Sync {
    /// Short display name, used in logs and result records.
    fn name(&self) -> &'static str;

    /// Fit on `x` `[N, F]` and labels `y` `[N]`.
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<()>;

    /// Positive-class probability per row.
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>>;

    /// Hard labels (`P(y = 1) > 0.5`).
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<u8>> {
        Ok(self.predict_proba(x)?.mapv(|p| u8::from(p > 0.5)))
    }

    /// Normalised feature importances, `None` before fitting.
    fn feature_importances(&self) -> Option<Array1<f64>>;
}

/// Ensemble family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassifierKind {
    RandomForest,
    #[serde(alias = "XGBoost")]
    GradientBoosting,
}

impl ClassifierKind {
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::RandomForest => "RandomForest",
            ClassifierKind::GradientBoosting => "GradientBoosting",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of candidate features examined at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `max(1, ⌊√F⌋)`
    Sqrt,
    /// Every feature
    All,
    /// A fixed count, capped at `F`
    Count(usize),
}

impl MaxFeatures {
    /// Resolve against the number of available features.
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Classifier hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Ensemble family
    pub kind: ClassifierKind,

    /// Number of trees (forest) or boosting rounds
    pub n_estimators: usize,

    /// Maximum tree depth (`None` = grow until pure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node
    pub min_samples_split: usize,

    /// Minimum samples in each child
    pub min_samples_leaf: usize,

    /// Candidate features per split
    pub max_features: MaxFeatures,

    /// Shrinkage (boosting only)
    pub learning_rate: f64,

    /// L2 regularisation on leaf weights (boosting only)
    pub lambda: f64,

    /// Minimum hessian sum in a child (boosting only)
    pub min_child_weight: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::random_forest()
    }
}

impl ClassifierConfig {
    /// Random-forest defaults (100 fully grown trees, √F features).
    pub fn random_forest() -> Self {
        Self {
            kind: ClassifierKind::RandomForest,
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            learning_rate: 1.0,
            lambda: 0.0,
            min_child_weight: 0.0,
        }
    }

    /// Gradient-boosting defaults (depth 6, learning rate 0.3, λ = 1).
    pub fn gradient_boosting() -> Self {
        Self {
            kind: ClassifierKind::GradientBoosting,
            n_estimators: 100,
            max_depth: Some(6),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            learning_rate: 0.3,
            lambda: 1.0,
            min_child_weight: 1.0,
        }
    }

    pub fn for_kind(kind: ClassifierKind) -> Self {
        match kind {
            ClassifierKind::RandomForest => Self::random_forest(),
            ClassifierKind::GradientBoosting => Self::gradient_boosting(),
        }
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Validate hyperparameters.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(EvalError::config("n_estimators must be > 0"));
        }
        if self.max_depth == Some(0) {
            return Err(EvalError::config("max_depth must be > 0 when set"));
        }
        if self.min_samples_split < 2 {
            return Err(EvalError::config("min_samples_split must be >= 2"));
        }
        if self.min_samples_leaf == 0 {
            return Err(EvalError::config("min_samples_leaf must be >= 1"));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(EvalError::config("max_features count must be > 0"));
        }
        if self.kind == ClassifierKind::GradientBoosting {
            if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
                return Err(EvalError::config(format!(
                    "learning_rate must be in (0, 1], got {}",
                    self.learning_rate
                )));
            }
            if !(self.lambda >= 0.0) || !(self.min_child_weight >= 0.0) {
                return Err(EvalError::config(
                    "lambda and min_child_weight must be non-negative",
                ));
            }
        }
        Ok(())
    }

    /// Build an unfitted classifier seeded with `seed`.
    pub fn build(&self, seed: u64) -> Result<Box<dyn Classifier>> {
        self.validate()?;
        Ok(match self.kind {
            ClassifierKind::RandomForest => Box::new(RandomForest::new(self.clone(), seed)),
            ClassifierKind::GradientBoosting => Box::new(GradientBoosting::new(self.clone(), seed)),
        })
    }
}

/// Reject training data the ensembles cannot use.
fn check_training_data(x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(EvalError::data(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(EvalError::data(format!(
            "cannot fit on an empty {:?} feature matrix",
            x.dim()
        )));
    }
    if let Some(bad) = y.iter().find(|&&l| l > 1) {
        return Err(EvalError::data(format!("label {bad} is not binary")));
    }
    Ok(())
}

/// Reject prediction input whose width differs from the training data.
fn check_prediction_input(fitted_features: Option<usize>, x: ArrayView2<f64>) -> Result<()> {
    match fitted_features {
        None => Err(EvalError::config("classifier used before fit")),
        Some(n) if n != x.ncols() => Err(EvalError::data(format!(
            "model was fitted on {n} features, got {}",
            x.ncols()
        ))),
        Some(_) => Ok(()),
    }
}

/// Scale raw importance totals to sum to one.
fn normalise_importances(mut totals: Array1<f64>) -> Array1<f64> {
    let sum = totals.sum();
    if sum > 0.0 {
        totals /= sum;
    }
    totals
}
