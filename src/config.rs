//! Run configuration management.
//!
//! One [`RunConfig`] describes a complete evaluation run (inputs, feature
//! parameters, classifier, forecast options, output, seed) and can be
//! versioned next to its results.
//!
//! # Features
//!
//! - **Unified Configuration**: single struct for both binaries
//! - **Serialization**: save/load as TOML or JSON
//! - **Validation**: loading always validates
//! - **Reproducibility**: the seed is part of the file, nothing is global
//!
//! # Example
//!
//! ```ignore
//! use regime_eval::config::RunConfig;
//! use regime_eval::data::Definition;
//!
//! let config = RunConfig::default()
//!     .with_definition(Definition::U65)
//!     .with_bins(30)
//!     .with_seed(7);
//!
//! config.save_toml("configs/u65.toml")?;
//! let loaded = RunConfig::load_toml("configs/u65.toml")?;
//! ```

use crate::data::{Definition, Variable};
use crate::error::{EvalError, Result};
use crate::evaluation::{MetricKind, StratifiedKFold};
use crate::features::DEFAULT_BINS;
use crate::forecast::ForecastConfig;
use crate::model::ClassifierConfig;
use crate::report::{DataType, RecordContext, TaskKind};
use crate::trainer::ModelTrainer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Unified run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Event definition whose labels are predicted
    pub definition: Definition,

    /// Kind of the training dataset. `Real` requires `input.test_path`,
    /// since only cross-dataset evaluation scores real data.
    pub dataset: DataType,

    /// Seed for every stochastic step (folds, bootstrap, feature sampling)
    pub seed: u64,

    /// Input locations and variables
    pub input: InputConfig,

    /// Histogram and cross-validation settings
    pub evaluation: EvaluationConfig,

    /// Classifier hyperparameters
    pub classifier: ClassifierConfig,

    /// Forecast task settings (optional - only the forecast tool needs them)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<ForecastConfig>,

    /// Output locations
    pub output: OutputConfig,
}

/// Where the data lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Training (or only) dataset directory
    pub train_path: PathBuf,

    /// Held-out dataset directory for cross-dataset evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_path: Option<PathBuf>,

    /// Input variables, in feature order
    pub variables: Vec<Variable>,
}

/// Feature and cross-validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Histogram bins per variable
    pub n_bins: usize,

    /// Number of stratified folds
    pub folds: usize,

    /// Metrics, in report order
    pub metrics: Vec<MetricKind>,

    /// Render the score chart after cross-validation
    #[serde(default)]
    pub plot: bool,
}

/// Where results go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON-lines file receiving metric records
    pub results_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from("data/labeled_simulated"),
            test_path: None,
            variables: Variable::DEFAULT.to_vec(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            n_bins: DEFAULT_BINS,
            folds: 5,
            metrics: MetricKind::CLASSIFICATION.to_vec(),
            plot: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from("output/results.jsonl"),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            definition: Definition::Cp07,
            dataset: DataType::Simulated,
            seed: 0,
            input: InputConfig::default(),
            evaluation: EvaluationConfig::default(),
            classifier: ClassifierConfig::random_forest(),
            forecast: None,
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definition(mut self, definition: Definition) -> Self {
        self.definition = definition;
        self
    }

    pub fn with_bins(mut self, n_bins: usize) -> Self {
        self.evaluation.n_bins = n_bins;
        self
    }

    pub fn with_folds(mut self, folds: usize) -> Self {
        self.evaluation.folds = folds;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_forecast(mut self, forecast: ForecastConfig) -> Self {
        self.forecast = Some(forecast);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_train_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.input.train_path = path.into();
        self
    }

    pub fn with_test_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.input.test_path = Some(path.into());
        self
    }

    pub fn with_results_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output.results_path = path.into();
        self
    }

    /// Keys of the configured input variables.
    pub fn variable_keys(&self) -> Vec<String> {
        Variable::keys(&self.input.variables)
    }

    /// Fold splitter seeded from the run seed.
    pub fn fold_splitter(&self) -> StratifiedKFold {
        StratifiedKFold::new(self.evaluation.folds, self.seed)
    }

    /// Trainer seeded from the run seed.
    pub fn trainer(&self) -> ModelTrainer {
        ModelTrainer::new(self.classifier.clone(), self.seed)
    }

    /// Fields shared by every record of this run.
    pub fn record_context(&self, task: TaskKind) -> RecordContext {
        RecordContext {
            classifier: self.classifier.kind,
            task,
            data_type: self.dataset,
            definition: self.definition,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.input.variables.is_empty() {
            return Err(EvalError::config("at least one input variable is required"));
        }
        if self.evaluation.n_bins == 0 {
            return Err(EvalError::config("n_bins must be > 0"));
        }
        if self.evaluation.folds < 2 {
            return Err(EvalError::config(format!(
                "folds must be >= 2, got {}",
                self.evaluation.folds
            )));
        }
        if self.evaluation.metrics.is_empty() {
            return Err(EvalError::config("at least one metric is required"));
        }
        if self.dataset == DataType::Real && self.input.test_path.is_none() {
            return Err(EvalError::config(
                "dataset = real requires input.test_path for cross-dataset evaluation",
            ));
        }
        self.classifier.validate()?;
        if let Some(forecast) = &self.forecast {
            forecast.validate()?;
        }
        Ok(())
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Load and validate configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = read_config(path.as_ref())?;
        let config: RunConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        fs::write(path, json_string)?;
        Ok(())
    }

    /// Load and validate configuration from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = read_config(path.as_ref())?;
        let config: RunConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => EvalError::MissingInput(path.to_path_buf()),
        _ => e.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaxFeatures;
    use tempfile::TempDir;

    #[test]
    fn test_run_config_default() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.evaluation.n_bins, 20);
        assert_eq!(config.variable_keys(), vec!["temp_60_90", "wind_60", "wind_65"]);
    }

    #[test]
    fn test_save_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.toml");
        let config = RunConfig::default()
            .with_definition(Definition::UAndT)
            .with_classifier(
                ClassifierConfig::gradient_boosting().with_max_features(MaxFeatures::Count(4)),
            )
            .with_forecast(ForecastConfig::default().with_cache_dir("data"))
            .with_test_path("data/labeled_real")
            .with_seed(99);

        config.save_toml(&path).unwrap();
        let loaded = RunConfig::load_toml(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");
        let config = RunConfig::default().with_bins(50);

        config.save_json(&path).unwrap();
        let loaded = RunConfig::load_json(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_config_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        RunConfig::default().with_folds(1).save_json(&path).unwrap();
        assert!(RunConfig::load_json(&path).unwrap_err().is_config());

        assert!(RunConfig::default().with_bins(0).validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = RunConfig::load_toml("/no/such/run.toml").unwrap_err();
        assert!(matches!(err, EvalError::MissingInput(_)));
    }

    #[test]
    fn test_record_context() {
        let ctx = RunConfig::default()
            .with_definition(Definition::ZPolTemp)
            .record_context(TaskKind::Classification);
        assert_eq!(ctx.definition, Definition::ZPolTemp);
        assert_eq!(ctx.data_type, DataType::Simulated);
    }

    #[test]
    fn test_real_dataset_requires_test_path() {
        let mut config = RunConfig::default();
        config.dataset = DataType::Real;
        assert!(config.validate().unwrap_err().is_config());

        let config = config.with_test_path("data/labeled_real");
        assert!(config.validate().is_ok());
    }
}
