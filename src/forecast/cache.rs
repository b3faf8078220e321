//! On-disk cache of engineered feature matrices.
//!
//! Feature engineering over the flattened table is the slowest step of a
//! forecast run, so its result is stored once per cutoff point:
//!
//! ```text
//! <cache_dir>/features<cutoff>.bin   bincode((features [N, K], feature_keys [K]))
//! ```
//!
//! The cache is never invalidated automatically. A record is stale as soon as
//! the upstream data or the feature engineer changes; delete the file (or call
//! [`FeatureCache::invalidate`]) to force recomputation. Records whose shape
//! does not fit the current run are rejected as incompatible rather than
//! silently recomputed.
//!
//! Writes go to a temporary file that is renamed into place, so readers never
//! observe a half-written record. Two runs with the same cutoff racing to
//! store are not coordinated: the last rename wins.

use crate::error::{EvalError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Cached features with their column keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCacheRecord {
    /// `[N_samples, K]`, stored before non-finite values are zero-filled
    pub features: Array2<f64>,
    pub feature_keys: Vec<String>,
}

impl FeatureCacheRecord {
    pub fn new(features: Array2<f64>, feature_keys: Vec<String>) -> Self {
        Self {
            features,
            feature_keys,
        }
    }
}

/// Location of one cached record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCache {
    path: PathBuf,
}

impl FeatureCache {
    /// Cache file for `cutoff` inside `dir`.
    pub fn for_cutoff<P: AsRef<Path>>(dir: P, cutoff: usize) -> Self {
        Self {
            path: dir.as_ref().join(format!("features{cutoff}.bin")),
        }
    }

    /// Cache at an explicit file path.
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record, `None` if the cache file does not exist.
    pub fn load(&self) -> Result<Option<FeatureCacheRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No feature cache at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let record: FeatureCacheRecord = bincode::deserialize_from(BufReader::new(file))?;
        if record.feature_keys.len() != record.features.ncols() {
            return Err(EvalError::IncompatibleCache {
                path: self.path.clone(),
                reason: format!(
                    "{} keys for {} feature columns",
                    record.feature_keys.len(),
                    record.features.ncols()
                ),
            });
        }
        log::info!(
            "Loaded cached features {:?} from {}",
            record.features.dim(),
            self.path.display()
        );
        Ok(Some(record))
    }

    /// Write the record, replacing any previous one.
    pub fn store(&self, record: &FeatureCacheRecord) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| {
                EvalError::config(format!(
                    "cache path '{}' has no file name",
                    self.path.display()
                ))
            })?
            .to_string_lossy();
        let temp_path = parent.join(format!("{file_name}.tmp-{}", std::process::id()));

        let written = File::create(&temp_path)
            .map_err(EvalError::from)
            .and_then(|file| {
                let mut writer = BufWriter::new(file);
                bincode::serialize_into(&mut writer, record)?;
                writer.flush()?;
                Ok(())
            });
        if let Err(e) = written.and_then(|()| Ok(fs::rename(&temp_path, &self.path)?)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        log::info!(
            "Stored features {:?} in {}",
            record.features.dim(),
            self.path.display()
        );
        Ok(())
    }

    /// Delete the cache file. Returns whether a file was removed.
    pub fn invalidate(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    #[test]
    fn test_path_for_cutoff() {
        let cache = FeatureCache::for_cutoff("data", 60);
        assert_eq!(cache.path(), Path::new("data/features60.bin"));
    }

    #[test]
    fn test_round_trip_keeps_nan() {
        let dir = TempDir::new().unwrap();
        let cache = FeatureCache::for_cutoff(dir.path().join("nested"), 30);
        let record = FeatureCacheRecord::new(
            array![[1.0, f64::NAN], [f64::INFINITY, -2.5]],
            vec!["a__mean".into(), "a__median".into()],
        );

        assert!(cache.load().unwrap().is_none());
        cache.store(&record).unwrap();
        let loaded = cache.load().unwrap().unwrap();

        assert_eq!(loaded.feature_keys, record.feature_keys);
        assert_eq!(loaded.features[[0, 0]], 1.0);
        assert!(loaded.features[[0, 1]].is_nan());
        assert_eq!(loaded.features[[1, 0]], f64::INFINITY);
        assert_eq!(loaded.features[[1, 1]], -2.5);
    }

    #[test]
    fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = FeatureCache::for_cutoff(dir.path(), 10);
        assert!(!cache.invalidate().unwrap());
        cache
            .store(&FeatureCacheRecord::new(array![[1.0]], vec!["k".into()]))
            .unwrap();
        assert!(cache.invalidate().unwrap());
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_record_is_error() {
        let dir = TempDir::new().unwrap();
        let cache = FeatureCache::for_cutoff(dir.path(), 10);
        cache
            .store(&FeatureCacheRecord::new(array![[1.0, 2.0]], vec!["only_one".into()]))
            .unwrap();
        assert!(cache.load().unwrap_err().is_config());
    }
}
