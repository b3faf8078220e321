//! Regime Evaluation
//!
//! Leakage-free evaluation of classifiers that predict stratospheric regime
//! definitions (e.g. `CP07`, `U65`) from daily atmospheric time series.
//!
//! # Overview
//!
//! Two tasks are supported:
//!
//! - **Classification**: histogram density features of a whole season,
//!   evaluated by stratified k-fold cross-validation on simulated data or by
//!   training on simulated and scoring on real data.
//! - **Prediction**: engineered summary features of the first `cutoff` days,
//!   predicting whether an event happens in the following `interval` days,
//!   with a cached feature matrix, a stratified split and SMOTE oversampling
//!   of the training partition.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Regime Evaluation                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  data/        - Dataset access (.npy directories, in-memory)    │
//! │  labeling/    - Any-positive and forecast-window labels         │
//! │  features/    - Histogram and engineered feature strategies     │
//! │  model/       - Random forest and gradient-boosted trees        │
//! │  trainer      - Shared train/test adapter                       │
//! │  pipeline     - Strategy → classifier, refit per fold           │
//! │  evaluation/  - Metrics, stratified folds, harness, bin sweep   │
//! │  forecast/    - Window, cache, split, SMOTE, forecast run       │
//! │  report/      - Metric records, sinks, text charts              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use ndarray::{Array1, Array3};
//! use regime_eval::prelude::*;
//!
//! // 40 seasons, 1 variable, 10 days; positives run warm
//! let labels: Array1<u8> = (0..40).map(|i| u8::from(i % 4 == 0)).collect();
//! let raw = Array3::from_shape_fn((40, 1, 10), |(i, _, d)| {
//!     (d % 5) as f64 + if labels[i] == 1 { 10.0 } else { 0.0 }
//! });
//!
//! let strategy = HistogramStrategy::new(HistogramFeaturizer::new(5)?, vec!["temp".into()]);
//! let trainer = ModelTrainer::new(ClassifierConfig::random_forest().with_n_estimators(10), 0);
//! let harness = EvaluationHarness::new(
//!     Pipeline::new(strategy, trainer),
//!     StratifiedKFold::new(5, 0),
//!     MetricKind::CLASSIFICATION.to_vec(),
//!     RunConfig::default().record_context(TaskKind::Classification),
//! );
//!
//! let mut sink = MemorySink::new();
//! let scores = harness.evaluate_cross_validated(raw.view(), labels.view(), &mut sink, None)?;
//! assert_eq!(scores.means().len(), 3);
//! assert_eq!(sink.records.len(), 3);
//! # Ok::<(), regime_eval::EvalError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod forecast;
pub mod labeling;
pub mod model;
pub mod pipeline;
pub mod prelude;
pub mod report;
pub mod trainer;

// Re-exports - Errors
pub use error::{EvalError, Result};

// Re-exports - Config
pub use config::{EvaluationConfig, InputConfig, OutputConfig, RunConfig};

// Re-exports - Data
pub use data::{DataSource, Definition, InMemoryDataSource, NpyDataSource, Variable};

// Re-exports - Labeling
pub use labeling::{binary_labels, forecast_labels, LabelStats};

// Re-exports - Features
pub use features::{
    EngineeredFeatureStrategy, FeatureEngineer, FeatureSet, FeatureStrategy, HistogramFeaturizer,
    HistogramStrategy, Statistic, SummaryFeatureEngineer,
};

// Re-exports - Models
pub use model::{Classifier, ClassifierConfig, ClassifierKind, MaxFeatures};
pub use pipeline::Pipeline;
pub use trainer::{ModelTrainer, TestScores};

// Re-exports - Evaluation
pub use evaluation::{EvaluationHarness, MetricKind, MetricScores, ScoreSummary, StratifiedKFold};

// Re-exports - Forecast
pub use forecast::{
    FeatureCache, FeatureCacheRecord, ForecastConfig, ForecastRun, ForecastSplit, ForecastSplitter,
    Smote, Split,
};

// Re-exports - Reporting
pub use report::{
    DataType, JsonLinesSink, MemorySink, MetricRecord, RecordContext, ResultSink, TaskKind,
};
