//! Synthetic minority oversampling (SMOTE).
//!
//! Every class smaller than the majority is grown to the majority count. A
//! synthetic row is placed on the segment between a random class member and
//! one of its `k` nearest same-class neighbours:
//!
//! ```text
//! x_new = x_i + gap · (x_nn - x_i),   gap ~ U[0, 1)
//! ```
//!
//! Neighbours are found by brute-force Euclidean distance, which is fine for
//! the few hundred seasons a training partition holds.

use crate::error::{EvalError, Result};
use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Default neighbourhood size.
pub const DEFAULT_NEIGHBORS: usize = 5;

/// Seeded SMOTE oversampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Smote {
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            k_neighbors: DEFAULT_NEIGHBORS,
            seed: 0,
        }
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    /// Original rows followed by the synthetic rows of every minority class.
    ///
    /// # Errors
    ///
    /// - Configuration error if `k_neighbors` is zero
    /// - Resampling error if `y` holds fewer than two classes, or a class that
    ///   needs oversampling has fewer than two members
    pub fn fit_resample(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<u8>,
    ) -> Result<(Array2<f64>, Array1<u8>)> {
        if self.k_neighbors == 0 {
            return Err(EvalError::config("SMOTE needs k_neighbors > 0"));
        }
        if x.nrows() != y.len() {
            return Err(EvalError::data(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
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
        if classes.len() < 2 {
            return Err(EvalError::Resampling(format!(
                "need two classes to oversample, training labels contain {}",
                classes.len()
            )));
        }

        let majority = classes.iter().map(|(_, m)| m.len()).max().unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut synthetic_rows: Vec<Array1<f64>> = Vec::new();
        let mut synthetic_labels: Vec<u8> = Vec::new();

        for (class, members) in &classes {
            let needed = majority - members.len();
            if needed == 0 {
                continue;
            }
            if members.len() < 2 {
                return Err(EvalError::Resampling(format!(
                    "class {class} has {} member(s); SMOTE needs at least 2",
                    members.len()
                )));
            }
            let k = if self.k_neighbors > members.len() - 1 {
                log::warn!(
                    "SMOTE: class {} has {} members, using k={} instead of {}",
                    class,
                    members.len(),
                    members.len() - 1,
                    self.k_neighbors
                );
                members.len() - 1
            } else {
                self.k_neighbors
            };

            let neighbours = nearest_neighbours(x, members, k);
            for _ in 0..needed {
                let i = rng.gen_range(0..members.len());
                let nn = neighbours[i][rng.gen_range(0..k)];
                let gap: f64 = rng.gen();
                let base = x.row(members[i]);
                let towards = x.row(nn);
                synthetic_rows.push(&base + &((&towards - &base) * gap));
                synthetic_labels.push(*class);
            }
            log::info!(
                "SMOTE: class {} oversampled {} -> {}",
                class,
                members.len(),
                majority
            );
        }

        if synthetic_rows.is_empty() {
            return Ok((x.to_owned(), y.to_owned()));
        }
        let views: Vec<ArrayView2<f64>> = synthetic_rows
            .iter()
            .map(|r| r.view().insert_axis(Axis(0)))
            .collect();
        let synthetic = concatenate(Axis(0), &views)?;
        let x_out = concatenate(Axis(0), &[x.view(), synthetic.view()])?;
        let y_out = y.iter().copied().chain(synthetic_labels).collect();
        Ok((x_out, y_out))
    }
}

/// For each member, the row indices of its `k` nearest other members.
fn nearest_neighbours(x: ArrayView2<f64>, members: &[usize], k: usize) -> Vec<Vec<usize>> {
    members
        .iter()
        .map(|&i| {
            let mut others: Vec<(f64, usize)> = members
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (squared_distance(x.row(i), x.row(j)), j))
                .collect();
            others.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            others.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_balances_classes() {
        let x = Array2::from_shape_fn((12, 2), |(i, j)| (i + j) as f64);
        let y: Array1<u8> = (0..12).map(|i| u8::from(i >= 9)).collect();
        let (xr, yr) = Smote::new(5, 1).fit_resample(x.view(), y.view()).unwrap();

        assert_eq!(xr.nrows(), 18);
        assert_eq!(yr.iter().filter(|&&l| l == 1).count(), 9);
        assert_eq!(yr.iter().filter(|&&l| l == 0).count(), 9);
        // originals come first, untouched
        assert_eq!(xr.slice(ndarray::s![..12, ..]), x);
    }

    #[test]
    fn test_synthetic_rows_between_neighbours() {
        // minority points on the line y = 2x
        let x = array![[0.0, 0.0], [1.0, 2.0], [3.0, 6.0], [9.0, 1.0], [8.0, 0.0], [7.0, 3.0], [9.5, 2.0]];
        let y = array![1u8, 1, 1, 0, 0, 0, 0];
        let (xr, yr) = Smote::new(2, 3).fit_resample(x.view(), y.view()).unwrap();

        assert_eq!(yr.len(), 8);
        let row = xr.row(7);
        assert_eq!(yr[7], 1);
        assert!((row[1] - 2.0 * row[0]).abs() < 1e-9);
        assert!((0.0..=3.0).contains(&row[0]));
    }

    #[test]
    fn test_single_member_class_fails() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0u8, 0, 1];
        let err = Smote::default().fit_resample(x.view(), y.view()).unwrap_err();
        assert!(matches!(err, EvalError::Resampling(_)));
    }

    #[test]
    fn test_single_class_fails() {
        let x = array![[0.0], [1.0]];
        let y = array![0u8, 0];
        assert!(matches!(
            Smote::default().fit_resample(x.view(), y.view()),
            Err(EvalError::Resampling(_))
        ));
    }

    #[test]
    fn test_balanced_input_unchanged() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0u8, 1, 0, 1];
        let (xr, yr) = Smote::default().fit_resample(x.view(), y.view()).unwrap();
        assert_eq!(xr, x);
        assert_eq!(yr, y);
    }

    #[test]
    fn test_resamples_a_sliced_view() {
        // trailing rows and column are outside the view
        let x = Array2::from_shape_fn((15, 3), |(i, j)| (i * 3 + j) as f64);
        let y: Array1<u8> = (0..12).map(|i| u8::from(i >= 9)).collect();
        let view = x.slice(ndarray::s![..12, ..2]);
        let (xr, yr) = Smote::new(5, 1).fit_resample(view, y.view()).unwrap();

        assert_eq!(xr.dim(), (18, 2));
        assert_eq!(yr.iter().filter(|&&l| l == 1).count(), 9);
        assert_eq!(xr.slice(ndarray::s![..12, ..]), view);
    }
}
