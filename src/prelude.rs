//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```ignore
//! use regime_eval::prelude::*;
//!
//! let config = RunConfig::load_toml("configs/cp07.toml")?;
//! let source = NpyDataSource::open(&config.input.train_path)?;
//! ```
//!
//! # What's Included
//!
//! ## Configuration
//! - [`RunConfig`], [`ClassifierConfig`], [`ForecastConfig`]
//!
//! ## Data and Labels
//! - [`DataSource`], [`NpyDataSource`], [`InMemoryDataSource`]
//! - [`Definition`], [`Variable`]
//! - [`binary_labels`], [`forecast_labels`], [`LabelStats`]
//!
//! ## Features
//! - [`FeatureStrategy`] with [`HistogramStrategy`] and [`EngineeredFeatureStrategy`]
//! - [`HistogramFeaturizer`], [`SummaryFeatureEngineer`]
//!
//! ## Training and Evaluation
//! - [`Classifier`], [`ModelTrainer`], [`Pipeline`]
//! - [`EvaluationHarness`], [`StratifiedKFold`], [`MetricKind`]
//!
//! ## Forecasting
//! - [`ForecastSplitter`], [`ForecastRun`], [`FeatureCache`], [`Smote`]
//!
//! ## Reporting
//! - [`ResultSink`], [`JsonLinesSink`], [`MemorySink`], [`TextBarChart`]
//!
//! ## Errors
//! - [`EvalError`], [`Result`]

pub use crate::config::RunConfig;
pub use crate::data::{DataSource, Definition, InMemoryDataSource, NpyDataSource, Variable};
pub use crate::error::{EvalError, Result};
pub use crate::evaluation::{EvaluationHarness, MetricKind, MetricScores, StratifiedKFold};
pub use crate::features::{
    EngineeredFeatureStrategy, FeatureEngineer, FeatureSet, FeatureStrategy, HistogramFeaturizer,
    HistogramStrategy, SummaryFeatureEngineer,
};
pub use crate::forecast::{
    FeatureCache, ForecastConfig, ForecastRun, ForecastSplit, ForecastSplitter, Smote,
};
pub use crate::labeling::{binary_labels, forecast_labels, LabelStats};
pub use crate::model::{Classifier, ClassifierConfig, ClassifierKind};
pub use crate::pipeline::Pipeline;
pub use crate::report::{
    DataType, JsonLinesSink, MemorySink, RecordContext, ResultSink, ScorePlotter, TaskKind,
    TextBarChart,
};
pub use crate::trainer::ModelTrainer;
