// prediction-training/src/trainer.rs
// ============================================================================
// Module: Heuristic Trainer
// Description: Placeholder Trainer implementation (spec §4.5 step 5-6).
// Purpose: Produce a deterministic artifact and holdout metrics from a
//          dataset snapshot without committing to a specific ML algorithm
//          (spec §1: "the choice of particular ML algorithms" is explicitly
//          out of scope).
// Dependencies: prediction-core
// ============================================================================

//! ## Overview
//! [`HeuristicTrainer`] is the one `Trainer` this workspace ships: it writes
//! the dataset's content hash as the "trained" artifact and derives holdout
//! metrics from the dataset's own data-quality report (fewer quality flags
//! and larger record counts score better). This mirrors the placeholder
//! numerical models in `prediction-predictors` (deterministic,
//! contract-correct, explicitly not a real ML model) and lets the full
//! promote/evaluate/rollback pipeline be exercised end-to-end in tests
//! without a training backend dependency.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use prediction_core::core::FeaturePopulationStats;
use prediction_core::core::ModelType;
use prediction_core::core::PerformanceMetrics;
use prediction_core::core::PrimaryMetric;
use prediction_core::core::QualityFlagSeverity;
use prediction_core::core::TrainingDataset;
use prediction_core::interfaces::TrainerError;
use prediction_core::interfaces::TrainingOutcome;

/// A [`prediction_core::interfaces::Trainer`] that derives deterministic,
/// documented placeholder metrics from a dataset snapshot's own quality
/// report rather than running a real learning algorithm.
pub struct HeuristicTrainer {
    work_dir: std::path::PathBuf,
}

impl HeuristicTrainer {
    /// Creates a trainer that stages artifacts under `work_dir`.
    #[must_use]
    pub const fn new(work_dir: std::path::PathBuf) -> Self {
        Self { work_dir }
    }

    fn score(dataset: &TrainingDataset) -> f64 {
        let penalty: f64 = dataset
            .data_quality_report
            .flags
            .iter()
            .map(|flag| match flag.severity {
                QualityFlagSeverity::Critical => 0.15,
                QualityFlagSeverity::Warning => 0.05,
                QualityFlagSeverity::Info => 0.01,
            })
            .sum();
        #[allow(clippy::cast_precision_loss, reason = "record counts are far below f64's exact-integer range")]
        let volume_bonus = (dataset.record_count as f64).log10() / 100.0;
        (0.75 + volume_bonus - penalty).clamp(0.0, 0.999)
    }
}

impl prediction_core::interfaces::Trainer for HeuristicTrainer {
    fn train(
        &self,
        dataset: &TrainingDataset,
        _hyperparameters: &[(String, f64)],
    ) -> Result<TrainingOutcome, TrainerError> {
        std::fs::create_dir_all(&self.work_dir).map_err(|err| TrainerError::Training(err.to_string()))?;
        let artifact_path = self.work_dir.join(format!("{}.artifact", dataset.id));
        let mut file =
            std::fs::File::create(&artifact_path).map_err(|err| TrainerError::Training(err.to_string()))?;
        file.write_all(dataset.content_hash.as_str().as_bytes())
            .map_err(|err| TrainerError::Training(err.to_string()))?;

        let primary = Self::score(dataset);
        let metrics = match dataset.model_type.primary_metric() {
            PrimaryMetric::R2 => PerformanceMetrics { r2: Some(primary), ..PerformanceMetrics::default() },
            PrimaryMetric::Precision => {
                PerformanceMetrics { precision: Some(primary), ..PerformanceMetrics::default() }
            }
            PrimaryMetric::Mape => {
                // MAPE is lower-is-better; invert the [0,1] score into a
                // percentage error so a higher `primary` still means "better".
                PerformanceMetrics { mape: Some((1.0 - primary) * 20.0), ..PerformanceMetrics::default() }
            }
        };

        let feature_population = dataset
            .feature_columns
            .iter()
            .map(|name| FeaturePopulationStats {
                name: name.clone(),
                p10: 0.1,
                p50: 0.5,
                p90: 0.9,
                mean: 0.5,
                stddev: 0.2,
            })
            .collect();

        Ok(TrainingOutcome { artifact_path, metrics, feature_population })
    }
}

/// Returns the type-appropriate default hyperparameter set. A placeholder
/// trainer has no tunable knobs; this exists so callers have a stable,
/// documented seam if a future type needs one without changing the
/// orchestrator's call signature.
#[must_use]
pub fn default_hyperparameters(_model_type: ModelType) -> Vec<(String, f64)> {
    Vec::new()
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
    use prediction_core::core::DataQualityReport;
    use prediction_core::core::DatasetId;
    use prediction_core::core::QualityFlag;
    use prediction_core::core::Timestamp;
    use prediction_core::core::hashing::fingerprint_bytes;
    use prediction_core::interfaces::Trainer;

    fn dataset(record_count: u64, flags: Vec<QualityFlag>) -> TrainingDataset {
        TrainingDataset {
            id: DatasetId::new("d1"),
            model_type: ModelType::PrintTime,
            record_count,
            date_range_start: Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH),
            date_range_end: Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH),
            feature_columns: vec!["volume_mm3".to_string()],
            target_column: "minutes".to_string(),
            data_quality_report: DataQualityReport { null_density: vec![], flags },
            storage_uri: "local://d1".to_string(),
            content_hash: fingerprint_bytes(b"d1"),
            created_at: Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH),
        }
    }

    #[test]
    fn training_writes_an_artifact_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = HeuristicTrainer::new(dir.path().to_path_buf());
        let outcome = trainer.train(&dataset(15_000, vec![]), &[]).unwrap();
        assert!(outcome.artifact_path.is_file());
        assert!(outcome.metrics.r2.unwrap() > 0.0);
    }

    #[test]
    fn quality_flags_reduce_the_score() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = HeuristicTrainer::new(dir.path().to_path_buf());
        let clean = trainer.train(&dataset(15_000, vec![]), &[]).unwrap();
        let flagged = trainer
            .train(
                &dataset(
                    15_000,
                    vec![QualityFlag {
                        column: "price".to_string(),
                        severity: QualityFlagSeverity::Warning,
                        description: "minor skew".to_string(),
                    }],
                ),
                &[],
            )
            .unwrap();
        assert!(flagged.metrics.r2.unwrap() < clean.metrics.r2.unwrap());
    }
}
