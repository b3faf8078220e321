//! Result records and where they go.
//!
//! Every finished evaluation emits one [`MetricRecord`] per metric. Records
//! are immutable once built and are handed to a [`ResultSink`]:
//!
//! - [`JsonLinesSink`]: appends one JSON object per line to a file
//! - [`MemorySink`]: collects records in a `Vec` (tests, embedding)
//!
//! # Record Format (JSON lines)
//!
//! ```text
//! {"classifier":"RandomForest","task":"classification","data_type":"simulated",
//!  "definition":"CP07","metric":"F1","scores":[0.71,0.69,0.74,0.70,0.72],
//!  "created_at":"2026-10-16T09:12:44.120871+00:00"}
//! ```

pub mod plot;

pub use plot::{ScorePlotter, TextBarChart};

use crate::data::Definition;
use crate::error::Result;
use crate::evaluation::MetricKind;
use crate::model::ClassifierKind;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// What the classifier was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Label the season the features come from
    Classification,
    /// Predict the label of days after the feature window
    Prediction,
}

/// Where the scored data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Simulated,
    Real,
}

/// Fields shared by every record of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordContext {
    pub classifier: ClassifierKind,
    pub task: TaskKind,
    pub data_type: DataType,
    pub definition: Definition,
}

impl RecordContext {
    /// Build the record for one metric.
    pub fn record(&self, metric: MetricKind, scores: Vec<f64>) -> MetricRecord {
        MetricRecord {
            classifier: self.classifier,
            task: self.task,
            data_type: self.data_type,
            definition: self.definition,
            metric,
            scores,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }
}

/// Scores of one metric from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub classifier: ClassifierKind,
    pub task: TaskKind,
    pub data_type: DataType,
    pub definition: Definition,
    pub metric: MetricKind,

    /// One score per fold, or a single score for held-out evaluation
    pub scores: Vec<f64>,

    /// RFC 3339 creation timestamp
    pub created_at: String,
}

/// Destination for finished records. Append-only.
pub trait ResultSink {
    fn write(&mut self, record: &MetricRecord) -> Result<()>;
}

/// Collects records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<MetricRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultSink for MemorySink {
    fn write(&mut self, record: &MetricRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Appends records as JSON lines to a file.
///
/// The file is opened in append mode for each record and closed again, so a
/// sink never holds the file between writes.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    /// Create a sink, creating the parent directory if needed.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back (diagnostics and tests).
    pub fn read_all(&self) -> Result<Vec<MetricRecord>> {
        let content = fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| Ok(serde_json::from_str(line)?))
            .collect()
    }
}

impl ResultSink for JsonLinesSink {
    fn write(&mut self, record: &MetricRecord) -> Result<()> {
        let file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        log::debug!(
            "Wrote {} {} record to {}",
            record.definition,
            record.metric,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context() -> RecordContext {
        RecordContext {
            classifier: ClassifierKind::RandomForest,
            task: TaskKind::Classification,
            data_type: DataType::Simulated,
            definition: Definition::Cp07,
        }
    }

    #[test]
    fn test_record_fields() {
        let record = context().record(MetricKind::Auroc, vec![0.5, 0.75]);
        assert_eq!(record.metric, MetricKind::Auroc);
        assert_eq!(record.scores, vec![0.5, 0.75]);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.created_at).is_ok());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["task"], "classification");
        assert_eq!(json["data_type"], "simulated");
        assert_eq!(json["definition"], "CP07");
        assert_eq!(json["metric"], "AUROC");
    }

    #[test]
    fn test_json_lines_append() {
        let dir = TempDir::new().unwrap();
        let mut sink = JsonLinesSink::new(dir.path().join("out/results.jsonl")).unwrap();

        let ctx = context();
        sink.write(&ctx.record(MetricKind::F1, vec![0.1])).unwrap();
        sink.write(&ctx.with_data_type(DataType::Real).record(MetricKind::Accuracy, vec![0.9]))
            .unwrap();

        let records = sink.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].metric, MetricKind::F1);
        assert_eq!(records[1].data_type, DataType::Real);
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        sink.write(&context().record(MetricKind::F1Macro, vec![1.0]))
            .unwrap();
        assert_eq!(sink.records.len(), 1);
    }
}
