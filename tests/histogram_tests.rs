//! Histogram Featurizer Integration Tests
//!
//! Shape, mass conservation and binning-edge behaviour of the histogram
//! features, through both the featurizer and the strategy wrapper.

use ndarray::{array, Array3};
use proptest::prelude::*;
use regime_eval::features::{FeatureStrategy, HistogramFeaturizer, HistogramStrategy};

fn vars(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Shape and Mass
// ============================================================================

#[test]
fn test_output_shape_is_samples_by_variables_times_bins() {
    let raw = Array3::from_shape_fn((7, 3, 30), |(i, v, d)| (i + v * 2 + d) as f64);
    let features = HistogramFeaturizer::new(10).unwrap().transform(raw.view()).unwrap();
    assert_eq!(features.dim(), (7, 30));
}

#[test]
fn test_each_variable_block_sums_to_day_count() {
    let raw = Array3::from_shape_fn((5, 2, 30), |(i, v, d)| ((i * 7 + v * 3 + d * 11) % 23) as f64);
    let n_bins = 8;
    let features = HistogramFeaturizer::new(n_bins).unwrap().transform(raw.view()).unwrap();

    for row in features.rows() {
        for v in 0..2 {
            let block: f64 = row.iter().skip(v * n_bins).take(n_bins).sum();
            assert_eq!(block, 30.0);
        }
    }
}

#[test]
fn test_batch_maximum_lands_in_last_bin() {
    // range [0, 4], 4 bins: 4.0 belongs to the closed last bin
    let raw = Array3::from_shape_vec((1, 1, 5), vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
    let features = HistogramFeaturizer::new(4).unwrap().transform(raw.view()).unwrap();
    assert_eq!(features.row(0).to_vec(), vec![1.0, 1.0, 1.0, 2.0]);
}

#[test]
fn test_constant_batch_does_not_divide_by_zero() {
    let raw = Array3::from_elem((3, 1, 6), 2.5);
    let features = HistogramFeaturizer::new(5).unwrap().transform(raw.view()).unwrap();
    for row in features.rows() {
        assert_eq!(row.sum(), 6.0);
        assert!(row.iter().all(|c| c.is_finite()));
    }
}

#[test]
fn test_range_is_shared_across_samples_of_a_batch() {
    // Sample 0 covers [0, 1], sample 1 covers [9, 10]; with a batch range of
    // [0, 10] they fall into opposite ends.
    let raw = array![[[0.0, 1.0]], [[9.0, 10.0]]];
    let features = HistogramFeaturizer::new(2).unwrap().transform(raw.view()).unwrap();
    assert_eq!(features.row(0).to_vec(), vec![2.0, 0.0]);
    assert_eq!(features.row(1).to_vec(), vec![0.0, 2.0]);
}

#[test]
fn test_non_finite_input_rejected() {
    let mut raw = Array3::from_elem((2, 1, 4), 1.0);
    raw[[1, 0, 2]] = f64::NAN;
    let err = HistogramFeaturizer::new(5).unwrap().transform(raw.view()).unwrap_err();
    assert!(!err.is_config());
}

#[test]
fn test_zero_bins_is_config_error() {
    assert!(HistogramFeaturizer::new(0).unwrap_err().is_config());
}

// ============================================================================
// Strategy
// ============================================================================

#[test]
fn test_strategy_keys_are_variable_major() {
    let strategy = HistogramStrategy::new(HistogramFeaturizer::new(3).unwrap(), vars(&["t", "u"]));
    let raw = Array3::from_shape_fn((4, 2, 9), |(i, v, d)| (i * v + d) as f64);
    let set = strategy.produce(raw.view()).unwrap();

    assert_eq!(set.n_features(), strategy.expected_key_count(2));
    assert_eq!(
        set.keys,
        vec!["t__hist_000", "t__hist_001", "t__hist_002", "u__hist_000", "u__hist_001", "u__hist_002"]
    );
}

#[test]
fn test_strategy_rejects_wrong_variable_count() {
    let strategy = HistogramStrategy::new(HistogramFeaturizer::new(3).unwrap(), vars(&["t"]));
    let raw = Array3::<f64>::zeros((2, 2, 5));
    assert!(strategy.produce(raw.view()).is_err());
}

proptest! {
    #[test]
    fn prop_shape_and_mass(
        n in 1usize..12,
        v in 1usize..4,
        d in 1usize..40,
        bins in 1usize..25,
        seed in 0u64..1000,
    ) {
        let raw = Array3::from_shape_fn((n, v, d), |(i, j, k)| {
            (((i as u64 * 31 + j as u64 * 17 + k as u64 * 7 + seed) % 101) as f64) - 50.0
        });
        let features = HistogramFeaturizer::new(bins).unwrap().transform(raw.view()).unwrap();

        prop_assert_eq!(features.dim(), (n, v * bins));
        prop_assert!(features.iter().all(|&c| c >= 0.0 && c.fract() == 0.0));
        for row in features.rows() {
            prop_assert_eq!(row.sum(), (v * d) as f64);
        }
    }
}
