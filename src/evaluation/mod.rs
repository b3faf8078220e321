//! Model evaluation: metrics, folds, and the evaluation harness.
//!
//! # Protocols
//!
//! ```text
//! cross-validated (simulated data)          cross-dataset (simulated → real)
//! ─────────────────────────────────         ─────────────────────────────────
//! StratifiedKFold.split(labels)             pipeline.fit(raw_train, y_train)
//!   for each fold:                          pipeline.predict(raw_test)
//!     fresh pipeline.fit(train)             score every metric once
//!     predict(test), score every metric     1 record per metric, 1 score each
//! summaries (mean, std) → plot?
//! 1 record per metric, k scores each
//! ```
//!
//! Records are buffered until the protocol finished, so a failing run never
//! leaves partial results in the sink.

pub mod folds;
pub mod harness;
pub mod metrics;
pub mod summary;
pub mod sweep;

pub use folds::{Fold, StratifiedKFold};
pub use harness::EvaluationHarness;
pub use metrics::{accuracy, f1, f1_macro, roc_auc, MetricKind};
pub use summary::{MetricScores, ScoreSummary};
pub use sweep::{best_bins, BinSweepPoint, DEFAULT_BIN_GRID};
