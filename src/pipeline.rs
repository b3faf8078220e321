//! Feature-strategy → classifier pipeline.
//!
//! A [`Pipeline`] couples one [`FeatureStrategy`] with a [`ModelTrainer`].
//! Fitting runs the strategy on the training batch and trains a fresh model
//! on the result; predicting runs the strategy again on the new batch.
//!
//! ```text
//! fit(raw_train, y_train)
//!   strategy.fit(raw_train) → strategy.produce(raw_train) → trainer.train
//!
//! predict(raw_test)
//!   strategy.produce(raw_test) → model.predict
//! ```
//!
//! # Fold Safety
//!
//! Cross-validation builds a **new** pipeline from a template for every fold
//! (see [`Pipeline::fresh`]). Nothing a strategy or model learns on one fold
//! is visible to another, and the histogram range of a held-out fold is
//! computed from that fold alone.

use crate::error::{EvalError, Result};
use crate::features::{zero_fill_non_finite, FeatureSet, FeatureStrategy};
use crate::model::Classifier;
use crate::trainer::ModelTrainer;
use ndarray::{Array1, ArrayView1, ArrayView3};

/// Feature production plus classifier, fitted together.
pub struct Pipeline<S> {
    strategy: S,
    trainer: ModelTrainer,
    model: Option<Box<dyn Classifier>>,
    n_features: usize,
}

impl<S: FeatureStrategy + Clone> Pipeline<S> {
    pub fn new(strategy: S, trainer: ModelTrainer) -> Self {
        Self {
            strategy,
            trainer,
            model: None,
            n_features: 0,
        }
    }

    /// Unfitted copy with the same strategy and trainer.
    pub fn fresh(&self) -> Self {
        Self::new(self.strategy.clone(), self.trainer.clone())
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn trainer(&self) -> &ModelTrainer {
        &self.trainer
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    fn features(&self, raw: ArrayView3<f64>) -> Result<FeatureSet> {
        let mut features = self.strategy.produce(raw)?;
        let replaced = zero_fill_non_finite(&mut features.matrix);
        if replaced > 0 {
            log::warn!(
                "{} strategy produced {} non-finite values, replaced with 0",
                self.strategy.name(),
                replaced
            );
        }
        Ok(features)
    }

    /// Fit the strategy and train a new model on `(raw, labels)`.
    pub fn fit(&mut self, raw: ArrayView3<f64>, labels: ArrayView1<u8>) -> Result<&mut Self> {
        if raw.dim().0 != labels.len() {
            return Err(EvalError::data(format!(
                "{} samples but {} labels",
                raw.dim().0,
                labels.len()
            )));
        }
        self.strategy.fit(raw, Some(labels))?;
        let features = self.features(raw)?;
        let model = self
            .trainer
            .train(features.matrix.view(), labels, Some(features.keys.as_slice()))?;
        self.n_features = features.n_features();
        self.model = Some(model);
        Ok(self)
    }

    /// Predict hard labels for a new batch.
    pub fn predict(&self, raw: ArrayView3<f64>) -> Result<Array1<u8>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| EvalError::config("pipeline used before fit"))?;
        let features = self.features(raw)?;
        if features.n_features() != self.n_features {
            return Err(EvalError::data(format!(
                "pipeline was fitted on {} features, batch produced {}",
                self.n_features,
                features.n_features()
            )));
        }
        model.predict(features.matrix.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{HistogramFeaturizer, HistogramStrategy};
    use crate::model::ClassifierConfig;
    use ndarray::Array3;

    fn pipeline() -> Pipeline<HistogramStrategy> {
        Pipeline::new(
            HistogramStrategy::new(HistogramFeaturizer::new(4).unwrap(), vec!["v".into()]),
            ModelTrainer::new(ClassifierConfig::random_forest().with_n_estimators(5), 0),
        )
    }

    #[test]
    fn test_predict_before_fit() {
        let raw = Array3::<f64>::zeros((2, 1, 3));
        assert!(pipeline().predict(raw.view()).unwrap_err().is_config());
    }

    #[test]
    fn test_fit_predict_shapes() {
        // positives spend their days high, negatives low
        let raw = Array3::from_shape_fn((20, 1, 6), |(n, _, d)| {
            if n % 2 == 0 { d as f64 } else { 10.0 + d as f64 }
        });
        let labels: Array1<u8> = (0..20).map(|n| u8::from(n % 2 == 1)).collect();

        let mut p = pipeline();
        p.fit(raw.view(), labels.view()).unwrap();
        assert!(p.is_fitted());
        assert_eq!(p.predict(raw.view()).unwrap(), labels);

        let fresh = p.fresh();
        assert!(!fresh.is_fitted());
    }

    #[test]
    fn test_label_count_mismatch() {
        let raw = Array3::<f64>::zeros((3, 1, 2));
        let labels = Array1::<u8>::zeros(2);
        assert!(pipeline().fit(raw.view(), labels.view()).is_err());
    }
}
