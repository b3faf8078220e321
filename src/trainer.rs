//! Shared train/test adapter.
//!
//! Both the classification pipeline and the forecast run train and score
//! models the same way; [`ModelTrainer`] is that shared capability. It owns
//! the classifier hyperparameters and the seed, so a trainer value fully
//! determines the model it produces from a given training set.
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use regime_eval::model::ClassifierConfig;
//! use regime_eval::trainer::ModelTrainer;
//!
//! let x = array![[0.0, 1.0], [0.2, 0.0], [0.8, 1.0], [1.0, 0.0]];
//! let y = array![0u8, 0, 1, 1];
//!
//! let trainer = ModelTrainer::new(ClassifierConfig::gradient_boosting().with_n_estimators(5), 42);
//! let model = trainer.train(x.view(), y.view(), None).unwrap();
//! let scores = trainer.test(model.as_ref(), x.view(), y.view()).unwrap();
//! assert!(scores.auroc >= 0.5);
//! ```

use crate::error::Result;
use crate::evaluation::metrics::{f1_macro, MetricKind};
use crate::model::{Classifier, ClassifierConfig};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Number of top-ranked features reported after training.
pub const TOP_FEATURES: usize = 3;

/// Held-out scores of a trained model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestScores {
    pub auroc: f64,
    pub f1_macro: f64,
}

/// Trains and scores classifiers with fixed hyperparameters and seed.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTrainer {
    config: ClassifierConfig,
    seed: u64,
}

impl ModelTrainer {
    pub fn new(config: ClassifierConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fit a fresh classifier on `(x, y)`.
    ///
    /// Logs the [`TOP_FEATURES`] highest importances, named by `keys` when
    /// given and by column index otherwise.
    pub fn train(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<u8>,
        keys: Option<&[String]>,
    ) -> Result<Box<dyn Classifier>> {
        let mut model = self.config.build(self.seed)?;
        log::info!(
            "Training {} on {} samples x {} features",
            model.name(),
            x.nrows(),
            x.ncols()
        );
        model.fit(x, y)?;

        if let Some(importances) = model.feature_importances() {
            for (rank, (name, value)) in top_features(&importances, keys, TOP_FEATURES)
                .into_iter()
                .enumerate()
            {
                log::info!("  feature #{}: {} ({:.4})", rank + 1, name, value);
            }
        }
        Ok(model)
    }

    /// Predict `x` and score against `y`.
    pub fn test(
        &self,
        model: &dyn Classifier,
        x: ArrayView2<f64>,
        y: ArrayView1<u8>,
    ) -> Result<TestScores> {
        let predicted = model.predict(x)?;
        let auroc = MetricKind::Auroc.score(y, predicted.view())?;
        let f1_macro = f1_macro(y, predicted.view());
        log::info!("AUROC: {:.4}, F1 (macro): {:.4}", auroc, f1_macro);
        Ok(TestScores { auroc, f1_macro })
    }
}

/// The `n` largest importances, highest first, with their names.
pub fn top_features(
    importances: &Array1<f64>,
    keys: Option<&[String]>,
    n: usize,
) -> Vec<(String, f64)> {
    let mut ranked: Vec<(usize, f64)> = importances.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(n)
        .map(|(i, value)| {
            let name = keys
                .and_then(|k| k.get(i).cloned())
                .unwrap_or_else(|| format!("feature_{i}"));
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_top_features_ranking() {
        let imp = array![0.1, 0.5, 0.05, 0.35];
        let keys: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let top = top_features(&imp, Some(keys.as_slice()), 3);
        assert_eq!(
            top.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            vec!["b", "d", "a"]
        );

        let unnamed = top_features(&imp, None, 1);
        assert_eq!(unnamed[0].0, "feature_1");
    }

    #[test]
    fn test_train_then_test() {
        let x = Array2::from_shape_fn((30, 1), |(i, _)| i as f64);
        let y: Array1<u8> = (0..30).map(|i| u8::from(i >= 20)).collect();
        let trainer = ModelTrainer::new(ClassifierConfig::random_forest().with_n_estimators(10), 1);

        let model = trainer.train(x.view(), y.view(), None).unwrap();
        let scores = trainer.test(model.as_ref(), x.view(), y.view()).unwrap();
        assert_eq!(scores.auroc, 1.0);
        assert_eq!(scores.f1_macro, 1.0);
    }

    #[test]
    fn test_importances_do_not_change_predictions() {
        let x = Array2::from_shape_fn((30, 2), |(i, j)| (i * (j + 1)) as f64);
        let y: Array1<u8> = (0..30).map(|i| u8::from(i % 3 == 0)).collect();
        let trainer = ModelTrainer::new(ClassifierConfig::gradient_boosting().with_n_estimators(5), 3);

        let model = trainer.train(x.view(), y.view(), None).unwrap();
        let before = model.predict_proba(x.view()).unwrap();
        let _ = model.feature_importances();
        assert_eq!(model.predict_proba(x.view()).unwrap(), before);
    }
}
