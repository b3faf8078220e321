//! Building the forecast train/test split and scoring a model on it.

use super::cache::{FeatureCache, FeatureCacheRecord};
use super::smote::Smote;
use super::split::{train_test_split_stratified, Split};
use super::window::cutoff_for_prediction;
use super::ForecastConfig;
use crate::error::{EvalError, Result};
use crate::evaluation::harness::write_records;
use crate::evaluation::MetricKind;
use crate::features::{zero_fill_non_finite, FeatureSet, FeatureStrategy};
use crate::labeling::{forecast_labels, LabelStats};
use crate::report::{RecordContext, ResultSink, TaskKind};
use crate::trainer::{ModelTrainer, TestScores};
use ndarray::{ArrayView2, ArrayView3};

/// Split ready for training, with the feature column keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSplit {
    /// Training partition is oversampled; test partition is untouched
    pub split: Split,
    pub feature_keys: Vec<String>,
    /// Features were loaded from the cache instead of computed
    pub cache_hit: bool,
}

/// Windows, featurizes (through the cache), splits and oversamples.
#[derive(Debug, Clone)]
pub struct ForecastSplitter<S> {
    strategy: S,
    config: ForecastConfig,
}

impl<S: FeatureStrategy> ForecastSplitter<S> {
    pub fn new(strategy: S, config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { strategy, config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<FeatureCache> {
        self.config
            .cache_dir
            .as_ref()
            .map(|dir| FeatureCache::for_cutoff(dir, self.config.cutoff_point))
    }

    /// Features of the windowed tensor, from the cache when possible.
    ///
    /// Returned values are raw: non-finite entries are not yet zero-filled.
    pub fn features(&self, raw: ArrayView3<f64>) -> Result<(FeatureSet, bool)> {
        let (n_samples, n_variables, _) = raw.dim();
        let expected_keys = self.strategy.expected_key_count(n_variables);
        let cache = self.cache();

        if let Some(cache) = &cache {
            if let Some(record) = cache.load()? {
                if record.features.nrows() != n_samples || record.feature_keys.len() != expected_keys {
                    return Err(EvalError::IncompatibleCache {
                        path: cache.path().to_path_buf(),
                        reason: format!(
                            "cached {} rows x {} keys, run expects {} rows x {} keys",
                            record.features.nrows(),
                            record.feature_keys.len(),
                            n_samples,
                            expected_keys
                        ),
                    });
                }
                let features = FeatureSet::new(record.features, record.feature_keys)?;
                return Ok((features, true));
            }
            log::info!("Feature cache miss, computing {} features", self.strategy.name());
        }

        let window = cutoff_for_prediction(raw, self.config.cutoff_point)?;
        let features = self.strategy.produce(window.view())?;
        if let Some(cache) = &cache {
            cache.store(&FeatureCacheRecord::new(
                features.matrix.clone(),
                features.keys.clone(),
            ))?;
        }
        Ok((features, false))
    }

    /// Build the split for `raw` `[N, V, D]` and per-day labels `[N, D]`.
    pub fn build(&self, raw: ArrayView3<f64>, raw_labels: ArrayView2<f64>) -> Result<ForecastSplit> {
        let labels = forecast_labels(
            raw_labels,
            self.config.cutoff_point,
            self.config.prediction_interval,
        )?;
        if labels.len() != raw.dim().0 {
            return Err(EvalError::data(format!(
                "{} samples but {} label series",
                raw.dim().0,
                labels.len()
            )));
        }
        log::info!("Forecast labels: {}", LabelStats::from_labels(labels.view()));

        let (mut features, cache_hit) = self.features(raw)?;
        let replaced = zero_fill_non_finite(&mut features.matrix);
        if replaced > 0 {
            log::warn!("Replaced {} non-finite feature values with 0", replaced);
        }

        let split = train_test_split_stratified(
            features.matrix.view(),
            labels.view(),
            self.config.test_fraction,
            self.config.split_seed,
        )?;
        let smote = Smote::new(self.config.smote_neighbors, self.config.split_seed);
        let (x_train, y_train) = smote.fit_resample(split.x_train.view(), split.y_train.view())?;

        log::info!("Train labels after oversampling: {}", LabelStats::from_labels(y_train.view()));
        log::info!("Test labels: {}", LabelStats::from_labels(split.y_test.view()));

        Ok(ForecastSplit {
            split: Split {
                x_train,
                y_train,
                ..split
            },
            feature_keys: features.keys,
            cache_hit,
        })
    }
}

/// Result of one forecast run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastOutcome {
    pub scores: TestScores,
    pub cache_hit: bool,
}

/// Splitter + trainer + sink: one forecast experiment.
pub struct ForecastRun<S> {
    splitter: ForecastSplitter<S>,
    trainer: ModelTrainer,
    context: RecordContext,
}

impl<S: FeatureStrategy> ForecastRun<S> {
    /// Records are always tagged with the prediction task.
    pub fn new(splitter: ForecastSplitter<S>, trainer: ModelTrainer, context: RecordContext) -> Self {
        Self {
            splitter,
            trainer,
            context: RecordContext {
                task: TaskKind::Prediction,
                ..context
            },
        }
    }

    pub fn splitter(&self) -> &ForecastSplitter<S> {
        &self.splitter
    }

    /// Split, train, test, and write the AUROC and macro-F1 records.
    pub fn run(
        &self,
        raw: ArrayView3<f64>,
        raw_labels: ArrayView2<f64>,
        sink: &mut dyn ResultSink,
    ) -> Result<ForecastOutcome> {
        let ForecastSplit {
            split,
            feature_keys,
            cache_hit,
        } = self.splitter.build(raw, raw_labels)?;

        let model = self.trainer.train(
            split.x_train.view(),
            split.y_train.view(),
            Some(feature_keys.as_slice()),
        )?;
        let scores = self
            .trainer
            .test(model.as_ref(), split.x_test.view(), split.y_test.view())?;
        log::info!(
            "{} days in advance, AUROC: {:.2}, F1: {:.2}",
            self.splitter.config().prediction_interval,
            scores.auroc,
            scores.f1_macro
        );

        let records = [
            self.context.record(MetricKind::Auroc, vec![scores.auroc]),
            self.context.record(MetricKind::F1Macro, vec![scores.f1_macro]),
        ];
        write_records(sink, &records)?;
        Ok(ForecastOutcome { scores, cache_hit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{EngineeredFeatureStrategy, Statistic, SummaryFeatureEngineer};
    use ndarray::{Array2, Array3};

    fn strategy() -> EngineeredFeatureStrategy<SummaryFeatureEngineer> {
        EngineeredFeatureStrategy::new(
            SummaryFeatureEngineer::new(vec![Statistic::Mean, Statistic::LinearTrendSlope]),
            vec!["a".into(), "b".into()],
        )
    }

    fn data() -> (Array3<f64>, Array2<f64>) {
        let n = 60;
        let raw = Array3::from_shape_fn((n, 2, 12), |(i, v, d)| ((i * 13 + v * 5 + d) % 17) as f64);
        // every 5th sample has an event on day 9
        let labels = Array2::from_shape_fn((n, 12), |(i, d)| if i % 5 == 0 && d == 9 { 1.0 } else { 0.0 });
        (raw, labels)
    }

    fn config() -> ForecastConfig {
        ForecastConfig {
            cutoff_point: 8,
            prediction_interval: 3,
            cache_dir: None,
            ..ForecastConfig::default()
        }
    }

    #[test]
    fn test_build_without_cache() {
        let (raw, labels) = data();
        let splitter = ForecastSplitter::new(strategy(), config()).unwrap();
        let out = splitter.build(raw.view(), labels.view()).unwrap();

        assert!(!out.cache_hit);
        assert_eq!(out.feature_keys.len(), 4);
        assert_eq!(out.split.y_test.len(), 12);
        // 12 * 12/60 = 2.4 positives, largest remainder goes to the negatives (9.6)
        assert_eq!(out.split.y_test.iter().filter(|&&l| l == 1).count(), 2);
        let train_pos = out.split.y_train.iter().filter(|&&l| l == 1).count();
        assert_eq!(train_pos * 2, out.split.y_train.len());
    }

    #[test]
    fn test_window_beyond_labels() {
        let (raw, labels) = data();
        let splitter = ForecastSplitter::new(
            strategy(),
            ForecastConfig {
                prediction_interval: 10,
                ..config()
            },
        )
        .unwrap();
        assert!(splitter.build(raw.view(), labels.view()).unwrap_err().is_config());
    }
}
