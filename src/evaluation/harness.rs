//! Cross-validated and cross-dataset evaluation of a pipeline.

use super::{MetricKind, MetricScores, StratifiedKFold};
use crate::error::{EvalError, Result};
use crate::features::FeatureStrategy;
use crate::pipeline::Pipeline;
use crate::report::{DataType, MetricRecord, RecordContext, ResultSink, ScorePlotter};
use ndarray::{ArrayView1, ArrayView3, Axis};

/// Runs a pipeline template through an evaluation protocol and reports the
/// scores.
pub struct EvaluationHarness<S> {
    pipeline: Pipeline<S>,
    folds: StratifiedKFold,
    metrics: Vec<MetricKind>,
    context: RecordContext,
}

impl<S: FeatureStrategy + Clone> EvaluationHarness<S> {
    pub fn new(
        pipeline: Pipeline<S>,
        folds: StratifiedKFold,
        metrics: Vec<MetricKind>,
        context: RecordContext,
    ) -> Self {
        Self {
            pipeline,
            folds,
            metrics,
            context,
        }
    }

    pub fn pipeline(&self) -> &Pipeline<S> {
        &self.pipeline
    }

    pub fn folds(&self) -> &StratifiedKFold {
        &self.folds
    }

    pub fn metrics(&self) -> &[MetricKind] {
        &self.metrics
    }

    pub fn context(&self) -> &RecordContext {
        &self.context
    }

    fn check_inputs(&self, raw: ArrayView3<f64>, labels: ArrayView1<u8>) -> Result<()> {
        if self.metrics.is_empty() {
            return Err(EvalError::config("at least one metric is required"));
        }
        if raw.dim().0 != labels.len() {
            return Err(EvalError::data(format!(
                "{} samples but {} labels",
                raw.dim().0,
                labels.len()
            )));
        }
        Ok(())
    }

    fn score_all(&self, y_true: ArrayView1<u8>, y_pred: ArrayView1<u8>) -> Result<Vec<f64>> {
        self.metrics
            .iter()
            .map(|m| m.score(y_true, y_pred))
            .collect()
    }

    /// Stratified k-fold cross-validation.
    ///
    /// A fresh pipeline is fitted on each training portion and scored on
    /// the held-out portion with every metric. When all folds succeed, the
    /// per-metric summaries are logged, optionally plotted, and one record
    /// per metric (carrying every fold's score) is written to `sink`.
    ///
    /// # Errors
    ///
    /// Fold construction errors (e.g. fewer positives than folds) are
    /// returned before any training; any error leaves `sink` untouched.
    pub fn evaluate_cross_validated(
        &self,
        raw: ArrayView3<f64>,
        labels: ArrayView1<u8>,
        sink: &mut dyn ResultSink,
        plotter: Option<&mut dyn ScorePlotter>,
    ) -> Result<MetricScores> {
        self.check_inputs(raw, labels)?;
        let folds = self.folds.split(labels)?;
        log::info!(
            "Cross-validating {} on {} samples ({} folds, {})",
            self.context.definition,
            labels.len(),
            folds.len(),
            self.pipeline.strategy().name()
        );

        let mut scores = MetricScores::new(&self.metrics);
        for (i, fold) in folds.iter().enumerate() {
            let raw_train = raw.select(Axis(0), &fold.train);
            let raw_test = raw.select(Axis(0), &fold.test);
            let y_train = labels.select(Axis(0), &fold.train);
            let y_test = labels.select(Axis(0), &fold.test);

            let mut pipeline = self.pipeline.fresh();
            pipeline.fit(raw_train.view(), y_train.view())?;
            let predicted = pipeline.predict(raw_test.view())?;

            let fold_scores = self.score_all(y_test.view(), predicted.view())?;
            log::debug!("fold {}/{}: {:?}", i + 1, folds.len(), fold_scores);
            scores.push_fold(&fold_scores);
        }

        let summaries = scores.summaries();
        for (metric, summary) in self.metrics.iter().zip(&summaries) {
            log::info!(
                "{} score (mean / std): {:.4} / {:.4}",
                metric.display_name(),
                summary.mean,
                summary.std
            );
        }

        if let Some(plotter) = plotter {
            let names: Vec<&str> = self.metrics.iter().map(|m| m.display_name()).collect();
            plotter.plot(
                &format!(
                    "Results {} ({})",
                    self.context.classifier, self.context.definition
                ),
                &names,
                &scores.means(),
                &scores.stds(),
            )?;
        }

        let records: Vec<MetricRecord> = self
            .metrics
            .iter()
            .zip(&scores.scores)
            .map(|(&metric, fold_scores)| self.context.record(metric, fold_scores.clone()))
            .collect();
        write_records(sink, &records)?;
        Ok(scores)
    }

    /// Fit once on the full training set, score once on a separate dataset.
    ///
    /// Writes one record per metric with a single score, tagged as real data.
    pub fn evaluate_cross_dataset(
        &self,
        raw_train: ArrayView3<f64>,
        labels_train: ArrayView1<u8>,
        raw_test: ArrayView3<f64>,
        labels_test: ArrayView1<u8>,
        sink: &mut dyn ResultSink,
    ) -> Result<Vec<f64>> {
        self.check_inputs(raw_train, labels_train)?;
        self.check_inputs(raw_test, labels_test)?;

        let mut pipeline = self.pipeline.fresh();
        pipeline.fit(raw_train, labels_train)?;
        log::info!(
            "Evaluating on held-out data ({} data points)...",
            labels_test.len()
        );
        let predicted = pipeline.predict(raw_test)?;
        let scores = self.score_all(labels_test, predicted.view())?;

        for (metric, score) in self.metrics.iter().zip(&scores) {
            log::info!("{} score: {:.4}", metric.display_name(), score);
        }

        let context = self.context.with_data_type(DataType::Real);
        let records: Vec<MetricRecord> = self
            .metrics
            .iter()
            .zip(&scores)
            .map(|(&metric, &score)| context.record(metric, vec![score]))
            .collect();
        write_records(sink, &records)?;
        Ok(scores)
    }
}

/// Write a finished batch of records.
pub(crate) fn write_records(sink: &mut dyn ResultSink, records: &[MetricRecord]) -> Result<()> {
    for record in records {
        sink.write(record)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Definition;
    use crate::features::{HistogramFeaturizer, HistogramStrategy};
    use crate::model::{ClassifierConfig, ClassifierKind};
    use crate::report::{MemorySink, TaskKind};
    use crate::trainer::ModelTrainer;
    use ndarray::{Array1, Array3};

    fn harness(folds: usize) -> EvaluationHarness<HistogramStrategy> {
        let pipeline = Pipeline::new(
            HistogramStrategy::new(HistogramFeaturizer::new(5).unwrap(), vec!["v".into()]),
            ModelTrainer::new(ClassifierConfig::random_forest().with_n_estimators(5), 0),
        );
        EvaluationHarness::new(
            pipeline,
            StratifiedKFold::new(folds, 0),
            MetricKind::CLASSIFICATION.to_vec(),
            RecordContext {
                classifier: ClassifierKind::RandomForest,
                task: TaskKind::Classification,
                data_type: DataType::Simulated,
                definition: Definition::U65,
            },
        )
    }

    fn data(n: usize) -> (Array3<f64>, Array1<u8>) {
        let labels: Array1<u8> = (0..n).map(|i| u8::from(i % 4 == 0)).collect();
        let raw = Array3::from_shape_fn((n, 1, 8), |(i, _, d)| {
            let base = if labels[i] == 1 { 20.0 } else { 0.0 };
            base + ((i * 7 + d * 3) % 10) as f64
        });
        (raw, labels)
    }

    #[test]
    fn test_cross_validated_records() {
        let (raw, labels) = data(40);
        let mut sink = MemorySink::new();
        let scores = harness(4)
            .evaluate_cross_validated(raw.view(), labels.view(), &mut sink, None)
            .unwrap();

        assert_eq!(scores.means().len(), 3);
        assert_eq!(sink.records.len(), 3);
        assert!(sink.records.iter().all(|r| r.scores.len() == 4));
        assert!(sink.records.iter().all(|r| r.data_type == DataType::Simulated));
    }

    #[test]
    fn test_failed_folding_writes_nothing() {
        let (raw, labels) = data(12); // 3 positives
        let mut sink = MemorySink::new();
        let err = harness(5)
            .evaluate_cross_validated(raw.view(), labels.view(), &mut sink, None)
            .unwrap_err();
        assert!(err.is_config());
        assert!(sink.records.is_empty());
    }

    #[test]
    fn test_cross_dataset_single_scores() {
        let (raw, labels) = data(40);
        let (raw_test, labels_test) = data(20);
        let mut sink = MemorySink::new();
        let scores = harness(5)
            .evaluate_cross_dataset(
                raw.view(),
                labels.view(),
                raw_test.view(),
                labels_test.view(),
                &mut sink,
            )
            .unwrap();

        assert_eq!(scores.len(), 3);
        assert_eq!(sink.records.len(), 3);
        for record in &sink.records {
            assert_eq!(record.scores.len(), 1);
            assert_eq!(record.data_type, DataType::Real);
        }
    }
}
