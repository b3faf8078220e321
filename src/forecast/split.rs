//! Stratified train/test split.

use crate::error::{EvalError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Train and test partitions of a feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<u8>,
    pub y_test: Array1<u8>,
}

/// Test-set share of each class: floors of the proportional allocation,
/// topped up by largest remainder until they sum to `n_test`.
fn allocate(class_sizes: &[usize], n: usize, n_test: usize) -> Vec<usize> {
    let ideal: Vec<f64> = class_sizes
        .iter()
        .map(|&c| c as f64 * n_test as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = ideal.iter().map(|x| x.floor() as usize).collect();

    let mut by_remainder: Vec<usize> = (0..class_sizes.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = ideal[a] - ideal[a].floor();
        let rb = ideal[b] - ideal[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    let mut missing = n_test - alloc.iter().sum::<usize>();
    for &k in by_remainder.iter().cycle().take(class_sizes.len() * 2) {
        if missing == 0 {
            break;
        }
        if alloc[k] < class_sizes[k] {
            alloc[k] += 1;
            missing -= 1;
        }
    }
    alloc
}

/// Split `(x, y)` so both partitions keep the class proportions of `y`.
///
/// `ceil(test_fraction · n)` rows go to the test set. Rows are chosen by a
/// seeded shuffle within each class; partitions keep the original row order.
///
/// # Errors
///
/// Configuration error if `test_fraction` is not in `(0, 1)`, either
/// partition would be empty, or any class has fewer than two members.
pub fn train_test_split_stratified(
    x: ArrayView2<f64>,
    y: ArrayView1<u8>,
    test_fraction: f64,
    seed: u64,
) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(EvalError::config(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let n = y.len();
    if x.nrows() != n {
        return Err(EvalError::data(format!(
            "{} feature rows but {n} labels",
            x.nrows()
        )));
    }
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(EvalError::config(format!(
            "cannot split {n} samples with test fraction {test_fraction}"
        )));
    }

    let mut classes: Vec<(u8, Vec<usize>)> = Vec::new();
    for (i, &label) in y.iter().enumerate() {
        match classes.iter_mut().find(|(c, _)| *c == label) {
            Some((_, members)) => members.push(i),
            None => classes.push((label, vec![i])),
        }
    }
    classes.sort_by_key(|(c, _)| *c);
    if let Some((class, _)) = classes.iter().find(|(_, m)| m.len() < 2) {
        return Err(EvalError::config(format!(
            "class {class} has a single member and cannot be stratified"
        )));
    }

    let sizes: Vec<usize> = classes.iter().map(|(_, m)| m.len()).collect();
    let alloc = allocate(&sizes, n, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut test_idx = Vec::with_capacity(n_test);
    let mut train_idx = Vec::with_capacity(n - n_test);
    for ((_, members), &take) in classes.iter_mut().zip(&alloc) {
        members.shuffle(&mut rng);
        test_idx.extend_from_slice(&members[..take]);
        train_idx.extend_from_slice(&members[take..]);
    }
    test_idx.sort_unstable();
    train_idx.sort_unstable();

    Ok(Split {
        x_train: x.select(Axis(0), &train_idx),
        x_test: x.select(Axis(0), &test_idx),
        y_train: y.select(Axis(0), &train_idx),
        y_test: y.select(Axis(0), &test_idx),
    })
}
