//! Feature Cache Integration Tests
//!
//! File naming, persistence, invalidation and rejection of malformed records.

use ndarray::{array, Array2};
use regime_eval::error::EvalError;
use regime_eval::forecast::{FeatureCache, FeatureCacheRecord};
use std::fs;
use tempfile::TempDir;

fn record() -> FeatureCacheRecord {
    FeatureCacheRecord::new(
        array![[1.0, f64::NAN, 3.0], [4.0, 5.0, f64::INFINITY]],
        vec!["a__mean".into(), "a__slope".into(), "a__cv".into()],
    )
}

#[test]
fn test_missing_file_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = FeatureCache::for_cutoff(dir.path(), 60);
    assert!(cache.load().unwrap().is_none());
    assert!(!cache.invalidate().unwrap());
}

#[test]
fn test_store_creates_directory_and_round_trips_non_finite_values() {
    let dir = TempDir::new().unwrap();
    let cache = FeatureCache::for_cutoff(dir.path().join("nested/cache"), 45);
    cache.store(&record()).unwrap();
    assert!(cache.path().ends_with("features45.bin"));

    let loaded = cache.load().unwrap().unwrap();
    assert_eq!(loaded.feature_keys, record().feature_keys);
    assert_eq!(loaded.features.dim(), (2, 3));
    assert!(loaded.features[[0, 1]].is_nan());
    assert_eq!(loaded.features[[1, 2]], f64::INFINITY);
    assert_eq!(loaded.features[[1, 0]], 4.0);
}

#[test]
fn test_store_leaves_no_temporary_files() {
    let dir = TempDir::new().unwrap();
    let cache = FeatureCache::for_cutoff(dir.path(), 60);
    cache.store(&record()).unwrap();
    cache.store(&record()).unwrap();

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["features60.bin".to_string()]);
}

#[test]
fn test_invalidate_removes_record() {
    let dir = TempDir::new().unwrap();
    let cache = FeatureCache::for_cutoff(dir.path(), 60);
    cache.store(&record()).unwrap();
    assert!(cache.invalidate().unwrap());
    assert!(cache.load().unwrap().is_none());
}

#[test]
fn test_key_count_must_match_columns() {
    let dir = TempDir::new().unwrap();
    let cache = FeatureCache::at(dir.path().join("features.bin"));
    cache
        .store(&FeatureCacheRecord::new(Array2::zeros((4, 3)), vec!["only".into()]))
        .unwrap();

    let err = cache.load().unwrap_err();
    assert!(err.is_config());
    assert!(matches!(err, EvalError::IncompatibleCache { .. }));
}

#[test]
fn test_corrupt_file_is_a_codec_error() {
    let dir = TempDir::new().unwrap();
    let cache = FeatureCache::for_cutoff(dir.path(), 60);
    fs::write(cache.path(), b"not a cache record").unwrap();

    let err = cache.load().unwrap_err();
    assert!(matches!(err, EvalError::Bincode(_)));
    assert!(!err.is_config());
}
