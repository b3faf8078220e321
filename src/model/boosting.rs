//! Gradient-boosted trees with logistic loss.
//!
//! Each round fits a tree to the gradient/hessian of the logistic loss at
//! the current margins:
//!
//! ```text
//! p_i = σ(margin_i)
//! g_i = p_i - y_i
//! h_i = max(p_i (1 - p_i), 1e-6)
//! margin_i += learning_rate · tree(x_i)
//! ```
//!
//! Margins start at the log-odds of the training positive rate.

use super::tree::{Criterion, DecisionTree, TreeParams};
use super::{
    check_prediction_input, check_training_data, normalise_importances, Classifier,
    ClassifierConfig,
};
use crate::error::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;

const MIN_HESSIAN: f64 = 1e-6;
const PROB_CLAMP: f64 = 1e-6;

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Sequential ensemble of Newton-step regression trees.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    config: ClassifierConfig,
    seed: u64,
    base_score: f64,
    trees: Vec<DecisionTree>,
    importances: Option<Array1<f64>>,
    n_features: Option<usize>,
}

impl GradientBoosting {
    pub fn new(config: ClassifierConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            base_score: 0.0,
            trees: Vec::new(),
            importances: None,
            n_features: None,
        }
    }

    /// Initial margin (log-odds of the training positive rate).
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }

    fn margin(&self, row: ArrayView1<f64>) -> f64 {
        self.base_score
            + self.config.learning_rate * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }
}

impl Classifier for GradientBoosting {
    fn name(&self) -> &'static str {
        "GradientBoosting"
    }

    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<()> {
        check_training_data(x, y)?;

        let targets: Vec<f64> = y.iter().map(|&l| f64::from(l)).collect();
        let rate = (targets.iter().sum::<f64>() / targets.len() as f64)
            .clamp(PROB_CLAMP, 1.0 - PROB_CLAMP);
        self.base_score = (rate / (1.0 - rate)).ln();

        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(x.ncols()),
            criterion: Criterion::Newton {
                lambda: self.config.lambda,
                min_child_weight: self.config.min_child_weight,
            },
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut margins = vec![self.base_score; targets.len()];
        let mut totals = vec![0.0; x.ncols()];
        let mut trees = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            let stats: Vec<(f64, f64)> = margins
                .iter()
                .zip(&targets)
                .map(|(&m, &t)| {
                    let p = sigmoid(m);
                    (p - t, (p * (1.0 - p)).max(MIN_HESSIAN))
                })
                .collect();

            let tree = DecisionTree::grow(
                x,
                &stats,
                (0..targets.len()).collect(),
                &params,
                &mut rng,
                &mut totals,
            );
            for (margin, row) in margins.iter_mut().zip(x.rows()) {
                *margin += self.config.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        log::debug!(
            "GradientBoosting: {} rounds on {:?}, base score {:.4}",
            trees.len(),
            x.dim(),
            self.base_score
        );
        self.trees = trees;
        self.importances = Some(normalise_importances(Array1::from(totals)));
        self.n_features = Some(x.ncols());
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        check_prediction_input(self.n_features, x)?;
        Ok(x.rows().into_iter().map(|row| sigmoid(self.margin(row))).collect())
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.importances.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_base_score_is_log_odds() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0u8, 0, 0, 1];
        let mut model =
            GradientBoosting::new(ClassifierConfig::gradient_boosting().with_n_estimators(1), 0);
        model.fit(x.view(), y.view()).unwrap();
        assert_relative_eq!(model.base_score(), (0.25f64 / 0.75).ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_boosting_learns_threshold() {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3) as f64 });
        let y: Array1<u8> = (0..40).map(|i| u8::from(i >= 30)).collect();

        let mut model =
            GradientBoosting::new(ClassifierConfig::gradient_boosting().with_n_estimators(20), 0);
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.n_rounds(), 20);
        assert_eq!(model.predict(x.view()).unwrap(), y);

        let imp = model.feature_importances().unwrap();
        assert!(imp[0] > 0.9);
    }

    #[test]
    fn test_single_class_training() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0u8, 0, 0];
        let mut model =
            GradientBoosting::new(ClassifierConfig::gradient_boosting().with_n_estimators(5), 0);
        model.fit(x.view(), y.view()).unwrap();
        assert!(model.predict_proba(x.view()).unwrap().iter().all(|&p| p < 0.01));
    }
}
