//! Random forest of bootstrap Gini trees.

use super::tree::{Criterion, DecisionTree, TreeParams};
use super::{
    check_prediction_input, check_training_data, normalise_importances, Classifier,
    ClassifierConfig,
};
use crate::error::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Derive an independent seed for tree `index` so results do not depend on
/// the order in which trees are grown.
fn tree_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Bagged ensemble of CART trees with per-split feature subsampling.
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ClassifierConfig,
    seed: u64,
    trees: Vec<DecisionTree>,
    importances: Option<Array1<f64>>,
    n_features: Option<usize>,
}

impl RandomForest {
    pub fn new(config: ClassifierConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            trees: Vec::new(),
            importances: None,
            n_features: None,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn grow_tree(
        &self,
        index: usize,
        x: ArrayView2<f64>,
        stats: &[(f64, f64)],
        params: &TreeParams,
    ) -> (DecisionTree, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(tree_seed(self.seed, index));
        let n = x.nrows();
        let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        let mut importances = vec![0.0; x.ncols()];
        let tree = DecisionTree::grow(x, stats, bootstrap, params, &mut rng, &mut importances);
        (tree, importances)
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "RandomForest"
    }

    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<u8>) -> Result<()> {
        check_training_data(x, y)?;

        let stats: Vec<(f64, f64)> = y.iter().map(|&l| (f64::from(l), 1.0)).collect();
        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(x.ncols()),
            criterion: Criterion::Gini,
        };

        #[cfg(feature = "parallel")]
        let grown: Vec<_> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|i| self.grow_tree(i, x, &stats, &params))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let grown: Vec<_> = (0..self.config.n_estimators)
            .map(|i| self.grow_tree(i, x, &stats, &params))
            .collect();

        let mut totals = Array1::<f64>::zeros(x.ncols());
        let mut trees = Vec::with_capacity(grown.len());
        for (tree, importances) in grown {
            totals += &Array1::from(importances);
            trees.push(tree);
        }

        log::debug!(
            "RandomForest: {} trees on {:?} (max_features={})",
            trees.len(),
            x.dim(),
            params.max_features
        );
        self.trees = trees;
        self.importances = Some(normalise_importances(totals));
        self.n_features = Some(x.ncols());
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        check_prediction_input(self.n_features, x)?;
        let n_trees = self.trees.len() as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.importances.clone()
    }
}
