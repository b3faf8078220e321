//! Histogram density features.
//!
//! Turns a `[N, V, D]` raw series tensor into a `[N, V * B]` matrix of bin
//! counts: for each variable, every sample's `D` daily values are binned into
//! `B` equal-width bins spanning that variable's range **over the current
//! batch**.
//!
//! ```text
//! raw [N, V, D] ──per variable v──▶ range_v = [min, max] over all (n, d)
//!                                  │
//!                                  ▼
//!                 counts[n, v, b] = #{d : value(n, v, d) ∈ bin_b(range_v)}
//!                                  │
//!                                  ▼
//!               features [N, V*B], column = v * B + b (variable-major)
//! ```
//!
//! The range is recomputed on every call to [`HistogramFeaturizer::transform`],
//! so a training batch and a test batch are binned against different edges.
//! This keeps the featurizer stateless; it also means features of the two
//! batches are only comparable when their ranges roughly agree.
//!
//! Binning follows NumPy's `histogram` with an explicit range: bins are
//! half-open `[e_b, e_{b+1})` except the last, which also includes the
//! maximum; a zero-width range is widened to `[v - 0.5, v + 0.5]`.

use crate::error::{EvalError, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayView3, ArrayViewMut1, Axis};

/// Default number of bins, tuned by cross-validation on simulated data.
pub const DEFAULT_BINS: usize = 20;

/// Stateless histogram transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramFeaturizer {
    n_bins: usize,
}

impl Default for HistogramFeaturizer {
    fn default() -> Self {
        Self {
            n_bins: DEFAULT_BINS,
        }
    }
}

impl HistogramFeaturizer {
    /// Create a featurizer with `n_bins` bins per variable.
    pub fn new(n_bins: usize) -> Result<Self> {
        if n_bins == 0 {
            return Err(EvalError::config("histogram bin count must be > 0"));
        }
        Ok(Self { n_bins })
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Number of output columns for `n_variables` input variables.
    pub fn n_features(&self, n_variables: usize) -> usize {
        n_variables * self.n_bins
    }

    /// No-op: there is nothing to learn. Present so the featurizer composes
    /// with the fit/transform protocol of the pipeline.
    pub fn fit(&mut self, _data: ArrayView3<f64>) -> Result<&mut Self> {
        Ok(self)
    }

    /// Compute `[N, V * B]` histogram counts for a `[N, V, D]` tensor.
    ///
    /// # Errors
    ///
    /// Returns a data error if the tensor contains NaN or infinite values,
    /// since no finite bin range exists for them.
    pub fn transform(&self, data: ArrayView3<f64>) -> Result<Array2<f64>> {
        let (n_samples, n_variables, _) = data.dim();
        let mut features = Array2::<f64>::zeros((n_samples, n_variables * self.n_bins));

        for (v, variable) in data.axis_iter(Axis(1)).enumerate() {
            let columns = v * self.n_bins..(v + 1) * self.n_bins;
            let counts = self.histograms_for_variable(variable, v)?;
            features
                .slice_mut(ndarray::s![.., columns])
                .assign(&counts);
        }

        Ok(features)
    }

    /// Histograms of every sample of one variable (`[N, D]` → `[N, B]`).
    fn histograms_for_variable(&self, values: ArrayView2<f64>, v: usize) -> Result<Array2<f64>> {
        let (n_samples, _) = values.dim();
        let mut counts = Array2::<f64>::zeros((n_samples, self.n_bins));
        if values.is_empty() {
            return Ok(counts);
        }

        let range = batch_range(values)
            .ok_or_else(|| EvalError::data(format!("variable {v} contains non-finite values")))?;
        let bins = BinEdges::new(range, self.n_bins);

        for (row, series) in counts.axis_iter_mut(Axis(0)).zip(values.axis_iter(Axis(0))) {
            bins.accumulate(series, row);
        }
        Ok(counts)
    }
}

/// `[min, max]` over all values, `None` if any value is not finite.
fn batch_range(values: ArrayView2<f64>) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &x in values.iter() {
        if !x.is_finite() {
            return None;
        }
        lo = lo.min(x);
        hi = hi.max(x);
    }
    Some((lo, hi))
}

/// Equal-width bin edges over a fixed range.
struct BinEdges {
    edges: Vec<f64>,
    first: f64,
    norm: f64,
    n_bins: usize,
}

impl BinEdges {
    fn new((mut lo, mut hi): (f64, f64), n_bins: usize) -> Self {
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let step = (hi - lo) / n_bins as f64;
        let mut edges: Vec<f64> = (0..=n_bins).map(|i| lo + step * i as f64).collect();
        edges[n_bins] = hi;
        Self {
            edges,
            first: lo,
            norm: n_bins as f64 / (hi - lo),
            n_bins,
        }
    }

    /// Add the bin counts of `series` into `out` (length `n_bins`).
    fn accumulate(&self, series: ArrayView1<f64>, mut out: ArrayViewMut1<f64>) {
        let last = self.edges[self.n_bins];
        for &x in series.iter() {
            if x < self.first || x > last {
                continue;
            }
            out[self.index(x)] += 1.0;
        }
    }

    /// Bin index of an in-range value, corrected against the exact edges so
    /// floating-point rounding in `norm` never misplaces a boundary value.
    fn index(&self, x: f64) -> usize {
        let mut idx = (((x - self.first) * self.norm) as usize).min(self.n_bins - 1);
        if x < self.edges[idx] && idx > 0 {
            idx -= 1;
        } else if idx + 1 < self.n_bins && x >= self.edges[idx + 1] {
            idx += 1;
        }
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_zero_bins_rejected() {
        assert!(HistogramFeaturizer::new(0).unwrap_err().is_config());
    }

    #[test]
    fn test_single_variable_counts() {
        // range [0, 4], 2 bins: [0, 2) and [2, 4]
        let data = Array3::from_shape_vec((2, 1, 3), vec![0.0, 1.0, 4.0, 2.0, 3.0, 4.0]).unwrap();
        let f = HistogramFeaturizer::new(2).unwrap();
        let out = f.transform(data.view()).unwrap();
        assert_eq!(out, array![[2.0, 1.0], [0.0, 3.0]]);
    }

    #[test]
    fn test_maximum_lands_in_last_bin() {
        let data = Array3::from_shape_vec((1, 1, 4), vec![0.0, 0.1, 0.2, 0.3]).unwrap();
        let f = HistogramFeaturizer::new(3).unwrap();
        let out = f.transform(data.view()).unwrap();
        assert_eq!(out.row(0).sum(), 4.0);
        assert_eq!(out[[0, 2]], 2.0); // 0.2 and 0.3 (boundary 0.2 goes right)
    }

    #[test]
    fn test_degenerate_range_single_bin() {
        let data = Array3::from_elem((3, 1, 5), 7.0);
        let f = HistogramFeaturizer::new(4).unwrap();
        let out = f.transform(data.view()).unwrap();
        for row in out.rows() {
            assert_eq!(row.sum(), 5.0);
            assert_eq!(row.iter().filter(|&&c| c > 0.0).count(), 1);
        }
        // Widened to [6.5, 7.5]: 7.0 sits exactly on the middle edge
        assert_eq!(out[[0, 2]], 5.0);
    }

    #[test]
    fn test_non_finite_is_data_error() {
        let mut data = Array3::<f64>::zeros((2, 2, 3));
        data[[1, 1, 2]] = f64::NAN;
        let f = HistogramFeaturizer::new(3).unwrap();
        assert!(matches!(
            f.transform(data.view()).unwrap_err(),
            EvalError::Data(_)
        ));
    }

    #[test]
    fn test_fit_is_noop() {
        let data = Array3::from_shape_fn((4, 2, 6), |(n, v, d)| (n * 7 + v * 3 + d) as f64);
        let mut f = HistogramFeaturizer::new(5).unwrap();
        let before = f.transform(data.view()).unwrap();
        f.fit(data.view()).unwrap();
        assert_eq!(f.transform(data.view()).unwrap(), before);
        assert_eq!(f, HistogramFeaturizer::new(5).unwrap());
    }

    #[test]
    fn test_empty_days() {
        let data = Array3::<f64>::zeros((3, 2, 0));
        let out = HistogramFeaturizer::new(4).unwrap().transform(data.view()).unwrap();
        assert_eq!(out.dim(), (3, 8));
        assert_eq!(out.sum(), 0.0);
    }
}
