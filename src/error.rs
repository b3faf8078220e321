//! Error types shared by every stage of the evaluation pipeline.
//!
//! # Taxonomy
//!
//! | Variant | Meaning | Recovery |
//! |---------|---------|----------|
//! | [`EvalError::Config`] | Bad parameters, too few class members for the fold count, incompatible cache, missing input | Run aborts, nothing is written |
//! | [`EvalError::Data`] | Shape mismatches, non-finite raw input | Run aborts |
//! | [`EvalError::Resampling`] | Oversampling a class that cannot be interpolated | Run aborts |
//! | [`EvalError::UndefinedMetric`] | Metric has no value for the given labels | Run aborts |
//! | I/O and codec variants | Wrapped errors from files and serializers | Run aborts |
//!
//! Non-finite *engineered* features are not an error: they are zero-filled by
//! the forecast splitter before any split or training happens.

use std::io;
use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EvalError>;

/// All failures surfaced by the library.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Configuration error: the run cannot proceed with the given setup.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required input file or directory does not exist.
    #[error("configuration error: missing input {}", .0.display())]
    MissingInput(PathBuf),

    /// A cached feature record does not match what the current run expects.
    #[error("configuration error: incompatible feature cache {}: {reason}", path.display())]
    IncompatibleCache { path: PathBuf, reason: String },

    /// Input data has the wrong shape or contains unusable values.
    #[error("data error: {0}")]
    Data(String),

    /// Minority-class oversampling could not be performed.
    #[error("resampling error: {0}")]
    Resampling(String),

    /// A metric is undefined for the given labels (e.g. AUROC with one class).
    #[error("undefined metric {metric}: {reason}")]
    UndefinedMetric { metric: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read .npy array: {0}")]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("feature cache codec error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl EvalError {
    /// Shorthand for a [`EvalError::Config`] error.
    pub fn config(msg: impl Into<String>) -> Self {
        EvalError::Config(msg.into())
    }

    /// Shorthand for a [`EvalError::Data`] error.
    pub fn data(msg: impl Into<String>) -> Self {
        EvalError::Data(msg.into())
    }

    /// True for the configuration-class errors (bad setup rather than bad data).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            EvalError::Config(_) | EvalError::MissingInput(_) | EvalError::IncompatibleCache { .. }
        )
    }
}
