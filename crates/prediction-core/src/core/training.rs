// prediction-core/src/core/training.rs
// ============================================================================
// Module: Training Entities
// Description: TrainingDataset and TrainingJob records (spec §3).
// Purpose: Define the immutable dataset snapshot and job tracking schema
//          shared by the training orchestrator and ingestion pipeline.
// Dependencies: crate::core::{identifiers, model, time}, serde
// ============================================================================

//! ## Overview
//! A [`TrainingDataset`] is an immutable snapshot (Invariant D1); its
//! `content_hash` is the deduplication key (Invariant D2). A [`TrainingJob`]
//! tracks one attempt to train a model from a dataset.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::Fingerprint;
use crate::core::identifiers::DatasetId;
use crate::core::identifiers::ModelId;
use crate::core::identifiers::TrainingJobId;
use crate::core::model::ModelType;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Training Dataset
// ============================================================================

/// An immutable training dataset snapshot (spec §3, Invariant D1/D2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDataset {
    /// Unique dataset identifier.
    pub id: DatasetId,
    /// The model type this dataset trains.
    pub model_type: ModelType,
    /// Number of records in the snapshot.
    pub record_count: u64,
    /// Start of the record time window (inclusive).
    pub date_range_start: Timestamp,
    /// End of the record time window (inclusive).
    pub date_range_end: Timestamp,
    /// Ordered feature column names.
    pub feature_columns: Vec<String>,
    /// Target column name.
    pub target_column: String,
    /// Data quality validation report produced when the snapshot was built.
    pub data_quality_report: DataQualityReport,
    /// Storage location of the dataset contents.
    pub storage_uri: String,
    /// Content hash uniquely identifying the dataset contents (dedup key).
    pub content_hash: Fingerprint,
    /// When the snapshot was created.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Data Quality Report
// ============================================================================

/// Severity of a single data quality validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlagSeverity {
    /// Informational; does not block training.
    Info,
    /// Warrants attention but does not block training.
    Warning,
    /// Blocks the training job from proceeding (spec §4.5 step 4).
    Critical,
}

/// A single data quality finding against one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFlag {
    /// Column the finding applies to.
    pub column: String,
    /// Severity of the finding.
    pub severity: QualityFlagSeverity,
    /// Human-readable description.
    pub description: String,
}

/// The result of data-quality validation over a dataset snapshot
/// (spec §4.5 step 3: null density ≤ 10%, 3σ outlier detection).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// Null density per column, in `[0, 1]`.
    pub null_density: Vec<(String, f64)>,
    /// Flags raised during validation.
    pub flags: Vec<QualityFlag>,
}

impl DataQualityReport {
    /// Returns `true` when any flag is [`QualityFlagSeverity::Critical`]
    /// (spec §4.5 step 4, `DataQualityFailure`).
    #[must_use]
    pub fn has_critical_flag(&self) -> bool {
        self.flags.iter().any(|flag| flag.severity == QualityFlagSeverity::Critical)
    }
}

// ============================================================================
// SECTION: Training Job
// ============================================================================

/// Status of a training job (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingJobStatus {
    /// Queued, not yet started.
    Pending,
    /// Currently running.
    Running,
    /// Completed successfully (a model was produced, though it may not have
    /// reached Active).
    Succeeded,
    /// Failed before producing a model (e.g. data quality gate).
    Failed,
}

/// What triggered a training job (spec §3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingTrigger {
    /// Cron-like scheduled trigger.
    Scheduled,
    /// Triggered by the drift monitor.
    Drift,
    /// Triggered manually by an admin.
    Manual,
    /// Triggered by ingestion crossing a dataset-size threshold.
    Event,
}

/// A structured error describing why a training job failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJobError {
    /// Machine-readable error kind.
    pub kind: String,
    /// Human-readable detail.
    pub detail: String,
    /// The data quality report, when the failure was a quality gate rejection.
    pub quality_report: Option<DataQualityReport>,
}

/// A training job record (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJob {
    /// Unique job identifier.
    pub id: TrainingJobId,
    /// The model type being trained.
    pub model_type: ModelType,
    /// Current status.
    pub status: TrainingJobStatus,
    /// When the job started running.
    pub started_at: Timestamp,
    /// When the job finished, if it has.
    pub ended_at: Option<Timestamp>,
    /// The dataset snapshot used for training.
    pub dataset_id: DatasetId,
    /// The resulting model, once one has been recorded.
    pub model_id: Option<ModelId>,
    /// What triggered this job.
    pub trigger: TrainingTrigger,
    /// Hyperparameters used, keyed by name.
    pub hyperparameters: Vec<(String, f64)>,
    /// Evaluation metrics recorded on completion.
    pub metrics: Option<crate::core::model::PerformanceMetrics>,
    /// Structured error, present only when `status` is `Failed`.
    pub error: Option<TrainingJobError>,
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        reason = "Test-only framing assertions."
    )]
    use super::*;

    #[test]
    fn critical_flag_detection() {
        let mut report = DataQualityReport::default();
        assert!(!report.has_critical_flag());
        report.flags.push(QualityFlag {
            column: "price".to_string(),
            severity: QualityFlagSeverity::Warning,
            description: "minor skew".to_string(),
        });
        assert!(!report.has_critical_flag());
        report.flags.push(QualityFlag {
            column: "price".to_string(),
            severity: QualityFlagSeverity::Critical,
            description: "null density 42%".to_string(),
        });
        assert!(report.has_critical_flag());
    }
}
