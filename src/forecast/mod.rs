//! Predicting an event `N` days after a cutoff point.
//!
//! # Flow
//!
//! ```text
//! raw [N, V, D] ──cutoff_for_prediction──▶ [N, V, cutoff]
//!                                              │
//!                          FeatureCache ◀──────┤ hit: load (features, keys)
//!                                              │ miss: flatten [N*V, cutoff]
//!                                              │       → FeatureEngineer → store
//!                                              ▼
//!                              zero-fill NaN / ±inf → [N, K]
//!                                              │
//! labels [N, D] ──any positive in [cutoff, cutoff+interval)──▶ y [N]
//!                                              │
//!                        stratified split (test_fraction, split_seed)
//!                             │                              │
//!                    SMOTE(train only)                 test untouched
//!                             ▼                              ▼
//!                   ModelTrainer.train              ModelTrainer.test → AUROC, F1 (macro)
//! ```
//!
//! # Configuration
//!
//! | Field | Default | Meaning |
//! |-------|---------|---------|
//! | `cutoff_point` | 60 | Days of input per sample |
//! | `prediction_interval` | 5 | Days after the cutoff searched for an event |
//! | `test_fraction` | 0.2 | Share of samples held out |
//! | `split_seed` | 42 | Seed of the split and of SMOTE |
//! | `smote_neighbors` | 5 | Neighbourhood size for oversampling |
//! | `cache_dir` | none | Directory of `features{cutoff}.bin` |

pub mod cache;
pub mod smote;
pub mod split;
pub mod splitter;
pub mod window;

pub use cache::{FeatureCache, FeatureCacheRecord};
pub use smote::Smote;
pub use split::{train_test_split_stratified, Split};
pub use splitter::{ForecastOutcome, ForecastRun, ForecastSplit, ForecastSplitter};
pub use window::cutoff_for_prediction;

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Forecast task parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of leading days used as input
    pub cutoff_point: usize,

    /// Length of the label window after the cutoff
    pub prediction_interval: usize,

    /// Fraction of samples in the test partition
    pub test_fraction: f64,

    /// Seed of the stratified split and the oversampler
    pub split_seed: u64,

    /// SMOTE neighbourhood size
    pub smote_neighbors: usize,

    /// Directory holding the feature cache (no caching when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            cutoff_point: 60,
            prediction_interval: 5,
            test_fraction: 0.2,
            split_seed: 42,
            smote_neighbors: smote::DEFAULT_NEIGHBORS,
            cache_dir: None,
        }
    }
}

impl ForecastConfig {
    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cutoff_point == 0 {
            return Err(EvalError::config("cutoff_point must be > 0"));
        }
        if self.prediction_interval == 0 {
            return Err(EvalError::config("prediction_interval must be > 0"));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(EvalError::config(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.smote_neighbors == 0 {
            return Err(EvalError::config("smote_neighbors must be > 0"));
        }
        Ok(())
    }
}
