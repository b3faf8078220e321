//! Stratified k-fold partitioning.
//!
//! Each class is (optionally) shuffled and dealt round-robin across the
//! folds, continuing the deal where the previous class stopped so fold sizes
//! differ by at most one. Every fold therefore holds `⌊c/k⌋` or `⌈c/k⌉`
//! members of a class of size `c`.
//!
//! A class with fewer than `k` members cannot appear in every test fold, so
//! it is rejected with a configuration error instead of silently falling
//! back to unstratified folds.

use crate::error::{EvalError, Result};
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// One train/test partition of sample indices. Both lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified k-fold splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl StratifiedKFold {
    /// Shuffled splitter with `n_splits` folds.
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle: true,
            seed,
        }
    }

    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// Partition sample indices by label.
    ///
    /// # Errors
    ///
    /// Configuration error if `n_splits < 2`, only one class is present, or
    /// any class has fewer than `n_splits` members.
    pub fn split(&self, labels: ArrayView1<u8>) -> Result<Vec<Fold>> {
        let k = self.n_splits;
        if k < 2 {
            return Err(EvalError::config(format!(
                "stratified k-fold needs at least 2 splits, got {k}"
            )));
        }

        let mut classes: Vec<(u8, Vec<usize>)> = Vec::new();
        for (i, &label) in labels.iter().enumerate() {
            match classes.iter_mut().find(|(c, _)| *c == label) {
                Some((_, members)) => members.push(i),
                None => classes.push((label, vec![i])),
            }
        }
        classes.sort_by_key(|(c, _)| *c);

        if classes.len() < 2 {
            return Err(EvalError::config(format!(
                "stratified k-fold needs two classes, labels contain {}",
                classes.len()
            )));
        }
        if let Some((class, members)) = classes.iter().find(|(_, m)| m.len() < k) {
            return Err(EvalError::config(format!(
                "class {class} has only {} members, fewer than n_splits={k}",
                members.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut fold_of = vec![0usize; labels.len()];
        let mut next = 0;
        for (_, members) in classes.iter_mut() {
            if self.shuffle {
                members.shuffle(&mut rng);
            }
            for &i in members.iter() {
                fold_of[i] = next % k;
                next += 1;
            }
        }

        Ok((0..k)
            .map(|f| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&i| fold_of[i] == f);
                Fold { train, test }
            })
            .collect())
    }
}
