//! Grid search over the histogram bin count.

use super::harness::write_records;
use super::EvaluationHarness;
use crate::error::Result;
use crate::features::HistogramStrategy;
use crate::pipeline::Pipeline;
use crate::report::{MemorySink, ResultSink};
use ndarray::{ArrayView1, ArrayView3};
use serde::{Deserialize, Serialize};

/// Bin counts tried by default.
pub const DEFAULT_BIN_GRID: [usize; 9] = [5, 10, 20, 30, 50, 80, 120, 150, 200];

/// Mean cross-validated scores for one bin count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSweepPoint {
    pub n_bins: usize,
    /// One mean per harness metric, in metric order
    pub means: Vec<f64>,
}

impl EvaluationHarness<HistogramStrategy> {
    /// Cross-validate once per bin count, keeping everything else fixed.
    ///
    /// Records of every run are buffered and written to `sink` only after the
    /// whole grid has succeeded, so a failing bin count leaves `sink` untouched.
    pub fn sweep_bins(
        &self,
        bins: &[usize],
        raw: ArrayView3<f64>,
        labels: ArrayView1<u8>,
        sink: &mut dyn ResultSink,
    ) -> Result<Vec<BinSweepPoint>> {
        let mut points = Vec::with_capacity(bins.len());
        let mut buffer = MemorySink::new();
        for &n_bins in bins {
            let strategy = self.pipeline().strategy().with_bins(n_bins)?;
            let harness = EvaluationHarness::new(
                Pipeline::new(strategy, self.pipeline().trainer().clone()),
                *self.folds(),
                self.metrics().to_vec(),
                *self.context(),
            );
            let means = harness
                .evaluate_cross_validated(raw, labels, &mut buffer, None)?
                .means();
            log::info!("n_bins: {} --> {:.4?}", n_bins, means);
            points.push(BinSweepPoint { n_bins, means });
        }
        write_records(sink, &buffer.records)?;
        Ok(points)
    }
}

/// The point with the highest mean for metric index `metric`.
pub fn best_bins(points: &[BinSweepPoint], metric: usize) -> Option<&BinSweepPoint> {
    points
        .iter()
        .filter(|p| p.means.get(metric).is_some_and(|m| m.is_finite()))
        .max_by(|a, b| a.means[metric].total_cmp(&b.means[metric]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_bins() {
        let points = vec![
            BinSweepPoint {
                n_bins: 5,
                means: vec![0.4, 0.9],
            },
            BinSweepPoint {
                n_bins: 10,
                means: vec![0.6, 0.8],
            },
            BinSweepPoint {
                n_bins: 20,
                means: vec![f64::NAN, 0.7],
            },
        ];
        assert_eq!(best_bins(&points, 0).unwrap().n_bins, 10);
        assert_eq!(best_bins(&points, 1).unwrap().n_bins, 5);
        assert!(best_bins(&points, 2).is_none());
    }
}
