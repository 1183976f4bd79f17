// prediction-training/src/orchestrator.rs
// ============================================================================
// Module: Training Orchestrator
// Description: End-to-end training pipeline (spec §4.5).
// Purpose: Acquire the per-type lease, snapshot and validate a dataset,
//          train, record the job, and hand the resulting Draft model to the
//          lifecycle manager for promotion.
// Dependencies: prediction-core, crate::{dataset, quality, lease, ids, trainer}
// ============================================================================

//! ## Overview
//! [`TrainingOrchestrator`] wires together every step of spec §4.5's
//! pipeline: lease acquisition and trigger coalescing (step 1), dataset
//! snapshot/dedup (step 2), data-quality validation with fail-fast on a
//! `CRITICAL` flag (step 3-4), training and artifact upload (step 5),
//! recording the job and the resulting Draft model (step 6-7), and
//! promotion through [`LifecycleManager`] (step 8-9). It is generic over
//! the same storage/registry/artifact capability traits the rest of the
//! workspace is generic over, composed explicitly at construction rather
//! than through a DI container.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use prediction_core::CancellationToken;
use prediction_core::DatasetId;
use prediction_core::Model;
use prediction_core::ModelId;
use prediction_core::ModelMetadata;
use prediction_core::ModelStatus;
use prediction_core::ModelType;
use prediction_core::ModelVersion;
use prediction_core::MetricBundleV1;
use prediction_core::Timestamp;
use prediction_core::TrainingJob;
use prediction_core::TrainingJobId;
use prediction_core::TrainingJobError;
use prediction_core::TrainingJobStatus;
use prediction_core::TrainingTrigger;
use prediction_core::interfaces::ArtifactError;
use prediction_core::interfaces::ArtifactStore;
use prediction_core::interfaces::DatasetStoreError;
use prediction_core::interfaces::EventPublisher;
use prediction_core::interfaces::JobStoreError;
use prediction_core::interfaces::ModelRegistry;
use prediction_core::interfaces::RegistryError;
use prediction_core::interfaces::Trainer;
use prediction_core::interfaces::TrainerError;
use prediction_core::interfaces::TrainingDatasetStore;
use prediction_core::interfaces::TrainingJobStore;
use prediction_core::TrainingDataset;
use prediction_core::runtime::lifecycle::LifecycleManager;
use prediction_core::runtime::lifecycle::LifecycleError;
use prediction_core::core::ModelPromoted;
use prediction_core::core::OperationalEvent;

use crate::dataset;
use crate::dataset::DatasetBuildError;
use crate::dataset::RawRecord;
use crate::ids::IdGenerator;
use crate::lease::TrainingLease;
use crate::quality;
use crate::trainer;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Training orchestrator errors. Gate rejections raised by
/// [`LifecycleManager::promote`] are not represented here — they surface as
/// [`TrainingRunOutcome::RejectedAfterTraining`] because a model was still
/// produced and recorded.
#[derive(Debug, Error)]
pub enum TrainingOrchestratorError {
    /// The dataset snapshot could not be built.
    #[error(transparent)]
    Dataset(#[from] DatasetBuildError),
    /// The dataset store failed.
    #[error(transparent)]
    DatasetStore(#[from] DatasetStoreError),
    /// The job store failed.
    #[error(transparent)]
    JobStore(#[from] JobStoreError),
    /// The model registry failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The artifact store failed.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    /// Writing the dataset snapshot to local storage failed.
    #[error("dataset storage I/O error: {0}")]
    Storage(String),
}

// ============================================================================
// SECTION: Run Request and Outcome
// ============================================================================

/// Inputs for a single training run over one model type (spec §4.5 step 1).
pub struct TrainingRunRequest {
    /// The type being trained.
    pub model_type: ModelType,
    /// Raw record rows making up the candidate dataset.
    pub records: Vec<RawRecord>,
    /// Ordered feature column names present in each record's row.
    pub feature_columns: Vec<String>,
    /// Target column name.
    pub target_column: String,
    /// Start of the record time window (inclusive).
    pub date_range_start: Timestamp,
    /// End of the record time window (inclusive).
    pub date_range_end: Timestamp,
    /// What triggered this run.
    pub trigger: TrainingTrigger,
}

/// The result of one training run (spec §4.5 step 1, 8-9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingRunOutcome {
    /// A job was already running for this type; this trigger was coalesced
    /// (spec §5) and no new job was started.
    Coalesced,
    /// Training succeeded, the resulting model passed every promotion gate,
    /// and it is now the type's Active model.
    Promoted {
        /// The job that produced the promoted model.
        job_id: TrainingJobId,
        /// The promoted model's id.
        model_id: ModelId,
    },
    /// Training succeeded and a Draft/Testing model was recorded, but a
    /// promotion gate rejected it (spec §4.2 gates 1-3); it remains in
    /// Testing with a rejection reason recorded.
    RejectedAfterTraining {
        /// The job that produced the rejected model.
        job_id: TrainingJobId,
        /// The rejected model's id.
        model_id: ModelId,
        /// The gate's rejection reason.
        reason: String,
    },
    /// Training failed before a model could be produced (data-quality gate
    /// or a trainer error); the job is recorded as Failed.
    Failed {
        /// The failed job's id.
        job_id: TrainingJobId,
        /// Failure reason.
        reason: String,
    },
}

// ============================================================================
// SECTION: Training Orchestrator
// ============================================================================

/// Runs the end-to-end training pipeline for every model type, serialized
/// per type by an internal [`TrainingLease`] (spec §5).
pub struct TrainingOrchestrator<DS, JS, R, A, T> {
    dataset_store: DS,
    job_store: JS,
    lifecycle: LifecycleManager<R>,
    artifact_store: A,
    trainer: T,
    lease: TrainingLease,
    dataset_dir: PathBuf,
    dataset_ids: IdGenerator,
    job_ids: IdGenerator,
    model_ids: IdGenerator,
    improvement_threshold_percent: f64,
    holdout_fraction: f64,
    publisher: Option<Arc<dyn EventPublisher + Send + Sync>>,
}

impl<DS, JS, R, A, T> TrainingOrchestrator<DS, JS, R, A, T>
where
    DS: TrainingDatasetStore,
    JS: TrainingJobStore,
    R: ModelRegistry,
    A: ArtifactStore,
    T: Trainer,
{
    /// Composes an orchestrator from its backing stores and a trainer.
    /// `dataset_dir` is where raw train/holdout partitions are staged for
    /// traceability; `improvement_threshold_percent` and `holdout_fraction`
    /// are the configured `lifecycle.improvementThresholdPercent` and
    /// training holdout fraction (spec §6).
    #[must_use]
    pub fn new(
        dataset_store: DS,
        job_store: JS,
        lifecycle: LifecycleManager<R>,
        artifact_store: A,
        trainer: T,
        dataset_dir: PathBuf,
        improvement_threshold_percent: f64,
        holdout_fraction: f64,
    ) -> Self {
        Self {
            dataset_store,
            job_store,
            lifecycle,
            artifact_store,
            trainer,
            lease: TrainingLease::new(),
            dataset_dir,
            dataset_ids: IdGenerator::new("ds"),
            job_ids: IdGenerator::new("tj"),
            model_ids: IdGenerator::new("mdl"),
            improvement_threshold_percent,
            holdout_fraction,
            publisher: None,
        }
    }

    /// Attaches an [`EventPublisher`] that receives a [`ModelPromoted`]
    /// event (spec §6) whenever [`Self::run`] promotes a new Active model.
    /// Publication is best-effort: a publish failure is logged and never
    /// fails the training run.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher + Send + Sync>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Drains the set of model types whose trigger was coalesced into an
    /// already-running job (spec §5: "latest wins"), so a scheduler can
    /// queue exactly one follow-up run per type.
    #[must_use]
    pub fn drain_coalesced_types(&self) -> Vec<ModelType> {
        self.lease.drain_coalesced()
    }

    /// Runs one training attempt for `request.model_type`, with no
    /// cancellation signal (spec §5 treats cancellation as opt-in for
    /// callers that have one to offer — e.g. a one-shot CLI invocation has
    /// none). Equivalent to
    /// `run_cancellable(request, now, &CancellationToken::never())`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingOrchestratorError`] on a backing-store, artifact
    /// store, or dataset-build failure. Gate rejections and training
    /// failures are reported through the returned
    /// [`TrainingRunOutcome`], not as an `Err`.
    pub fn run(&self, request: TrainingRunRequest, now: Timestamp) -> Result<TrainingRunOutcome, TrainingOrchestratorError> {
        self.run_cancellable(request, now, &CancellationToken::never())
    }

    /// Runs one training attempt for `request.model_type`, checking
    /// `cancellation` at the checkpoints between steps 2-5 of spec §4.5
    /// (snapshot built, before training, after training) and failing the
    /// job cleanly (spec §5: "release resources ... on cancellation") if it
    /// has been cancelled by the time a checkpoint is reached. Cancellation
    /// is cooperative: training already in flight inside [`Trainer::train`]
    /// runs to completion before the post-training checkpoint can observe
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingOrchestratorError`] on a backing-store, artifact
    /// store, or dataset-build failure. Gate rejections, training
    /// failures, and cancellation are reported through the returned
    /// [`TrainingRunOutcome`], not as an `Err`.
    pub fn run_cancellable(
        &self,
        request: TrainingRunRequest,
        now: Timestamp,
        cancellation: &CancellationToken,
    ) -> Result<TrainingRunOutcome, TrainingOrchestratorError> {
        let Some(_guard) = self.lease.try_acquire(request.model_type) else {
            return Ok(TrainingRunOutcome::Coalesced);
        };

        let snapshot = self.snapshot_or_reuse(&request, now)?;

        let job_id = TrainingJobId::new(self.job_ids.issue());
        let mut job = TrainingJob {
            id: job_id.clone(),
            model_type: request.model_type,
            status: TrainingJobStatus::Running,
            started_at: now,
            ended_at: None,
            dataset_id: snapshot.id.clone(),
            model_id: None,
            trigger: request.trigger,
            hyperparameters: trainer::default_hyperparameters(request.model_type),
            metrics: None,
            error: None,
        };
        self.job_store.save(job.clone())?;

        if cancellation.is_cancelled() {
            return self.fail_job_cancelled(job, now);
        }

        if snapshot.data_quality_report.has_critical_flag() {
            job.status = TrainingJobStatus::Failed;
            job.ended_at = Some(now);
            job.error = Some(TrainingJobError {
                kind: "data_quality".to_string(),
                detail: "dataset snapshot carries a critical data quality flag".to_string(),
                quality_report: Some(snapshot.data_quality_report.clone()),
            });
            self.job_store.update(job)?;
            tracing::warn!(model_type = %request.model_type, dataset_id = %snapshot.id, "training job failed the data quality gate");
            return Ok(TrainingRunOutcome::Failed {
                job_id,
                reason: "critical data quality flag".to_string(),
            });
        }

        if cancellation.is_cancelled() {
            return self.fail_job_cancelled(job, now);
        }

        let outcome = match self.trainer.train(&snapshot, &job.hyperparameters) {
            Ok(outcome) => outcome,
            Err(TrainerError::Training(detail)) => {
                job.status = TrainingJobStatus::Failed;
                job.ended_at = Some(now);
                job.error = Some(TrainingJobError {
                    kind: "training".to_string(),
                    detail: detail.clone(),
                    quality_report: None,
                });
                self.job_store.update(job)?;
                tracing::error!(model_type = %request.model_type, %detail, "training job failed");
                return Ok(TrainingRunOutcome::Failed { job_id, reason: detail });
            }
        };

        let model_id = ModelId::new(self.model_ids.issue());
        let artifact_uri = self.artifact_store.upload(&outcome.artifact_path, &model_id, request.model_type)?;

        let model = Model {
            id: model_id.clone(),
            model_type: request.model_type,
            version: self.next_version(request.model_type)?,
            status: ModelStatus::Draft,
            artifact_uri,
            trained_at: now,
            deployed_at: None,
            deprecated_at: None,
            metrics: MetricBundleV1::new(outcome.metrics.clone()),
            training_job_id: Some(job_id.clone()),
            metadata: ModelMetadata { feature_population: outcome.feature_population, ..ModelMetadata::default() },
        };
        self.lifecycle.registry().save(model.clone())?;
        self.lifecycle.mark_testing(&model.id, now).map_err(Self::lifecycle_to_registry_error)?;

        job.status = TrainingJobStatus::Succeeded;
        job.ended_at = Some(now);
        job.model_id = Some(model.id.clone());
        job.metrics = Some(outcome.metrics);
        self.job_store.update(job)?;

        let previously_active = self.lifecycle.registry().get_active(request.model_type)?;

        match self.lifecycle.promote(
            &model.id,
            snapshot.record_count,
            &snapshot.data_quality_report,
            self.improvement_threshold_percent,
            now,
        ) {
            Ok(()) => {
                tracing::info!(model_type = %request.model_type, model_id = %model.id, "promoted new active model");
                self.publish_promoted(request.model_type, model.version, previously_active.map(|m| m.version), now);
                Ok(TrainingRunOutcome::Promoted { job_id, model_id: model.id })
            }
            Err(LifecycleError::Registry(err)) => Err(TrainingOrchestratorError::Registry(err)),
            Err(gate_failure) => {
                let reason = gate_failure.to_string();
                tracing::warn!(model_type = %request.model_type, model_id = %model.id, %reason, "candidate rejected by a promotion gate");
                Ok(TrainingRunOutcome::RejectedAfterTraining { job_id, model_id: model.id, reason })
            }
        }
    }

    fn fail_job_cancelled(&self, mut job: TrainingJob, now: Timestamp) -> Result<TrainingRunOutcome, TrainingOrchestratorError> {
        let job_id = job.id.clone();
        job.status = TrainingJobStatus::Failed;
        job.ended_at = Some(now);
        job.error = Some(TrainingJobError {
            kind: "cancelled".to_string(),
            detail: "training run cancelled by caller".to_string(),
            quality_report: None,
        });
        self.job_store.update(job)?;
        tracing::info!(job_id = %job_id, "training job cancelled");
        Ok(TrainingRunOutcome::Failed { job_id, reason: "cancelled".to_string() })
    }

    fn publish_promoted(
        &self,
        model_type: ModelType,
        new_version: ModelVersion,
        old_version: Option<ModelVersion>,
        now: Timestamp,
    ) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        let event = OperationalEvent::ModelPromoted(ModelPromoted { model_type, new_version, old_version, timestamp: now });
        if let Err(err) = publisher.publish(event) {
            tracing::warn!(%model_type, %err, "failed to publish model_promoted event");
        }
    }

    fn lifecycle_to_registry_error(err: LifecycleError) -> TrainingOrchestratorError {
        match err {
            LifecycleError::Registry(registry_err) => TrainingOrchestratorError::Registry(registry_err),
            other => TrainingOrchestratorError::Registry(RegistryError::Store(other.to_string())),
        }
    }

    fn snapshot_or_reuse(
        &self,
        request: &TrainingRunRequest,
        now: Timestamp,
    ) -> Result<prediction_core::core::TrainingDataset, TrainingOrchestratorError> {
        let hash = dataset::content_hash(&request.records)?;
        if let Some(existing) = self.dataset_store.find_by_content_hash(&hash)? {
            return Ok(existing);
        }

        let split = dataset::split(&request.records, self.holdout_fraction);
        let id = DatasetId::new(self.dataset_ids.issue());
        self.persist_split(&id, &split.train, &split.holdout)?;

        let stats: Vec<_> = request
            .feature_columns
            .iter()
            .map(|column| quality::column_stats(column, &Self::column_values(&split.train, column)))
            .collect();
        let report = quality::evaluate(&stats);

        let snapshot = dataset::build_snapshot(
            id.clone(),
            request.model_type,
            &request.records,
            request.feature_columns.clone(),
            request.target_column.clone(),
            report,
            format!("file://{}", self.dataset_dir.join(id.as_str()).display()),
            request.date_range_start,
            request.date_range_end,
            now,
        )?;
        self.dataset_store.save(snapshot.clone())?;
        Ok(snapshot)
    }

    fn persist_split(&self, id: &DatasetId, train: &[Value], holdout: &[Value]) -> Result<(), TrainingOrchestratorError> {
        let dir = self.dataset_dir.join(id.as_str());
        std::fs::create_dir_all(&dir).map_err(|err| TrainingOrchestratorError::Storage(err.to_string()))?;
        std::fs::write(dir.join("train.json"), serde_json::to_vec(train).unwrap_or_default())
            .map_err(|err| TrainingOrchestratorError::Storage(err.to_string()))?;
        std::fs::write(dir.join("holdout.json"), serde_json::to_vec(holdout).unwrap_or_default())
            .map_err(|err| TrainingOrchestratorError::Storage(err.to_string()))?;
        Ok(())
    }

    fn column_values(rows: &[Value], column: &str) -> Vec<Option<f64>> {
        rows.iter().map(|row| row.get(column).and_then(Value::as_f64)).collect()
    }

    fn next_version(&self, model_type: ModelType) -> Result<ModelVersion, RegistryError> {
        let existing = self.lifecycle.registry().list_versions(model_type, None)?;
        Ok(existing
            .into_iter()
            .map(|model| model.version)
            .max()
            .map_or_else(ModelVersion::initial, ModelVersion::next_minor))
    }
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
    use prediction_artifacts::local::LocalFsArtifactStore;
    use prediction_core::runtime::registry::InMemoryModelRegistry;
    use prediction_store_sqlite::training::SqliteTrainingDatasetStore;
    use prediction_store_sqlite::training::SqliteTrainingJobStore;
    use prediction_store_sqlite::SqliteStoreConfig;

    fn timestamp(seconds: i64) -> Timestamp {
        Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(seconds))
    }

    fn clean_records(n: usize) -> Vec<RawRecord> {
        (0..n)
            .map(|i| RawRecord {
                sort_key: format!("{i:05}"),
                row: serde_json::json!({ "volume_mm3": 100.0 + i as f64, "minutes": 12.0 }),
            })
            .collect()
    }

    fn make_orchestrator(
        tmp: &std::path::Path,
    ) -> TrainingOrchestrator<
        SqliteTrainingDatasetStore,
        SqliteTrainingJobStore,
        InMemoryModelRegistry,
        LocalFsArtifactStore,
        trainer::HeuristicTrainer,
    > {
        let config = SqliteStoreConfig {
            path: tmp.join("store.db"),
            busy_timeout_ms: 5_000,
            journal_mode: prediction_store_sqlite::SqliteStoreMode::Wal,
            sync_mode: prediction_store_sqlite::SqliteSyncMode::Full,
        };
        let dataset_store = SqliteTrainingDatasetStore::open(&config).unwrap();
        let job_store = SqliteTrainingJobStore::open(&config).unwrap();
        let registry = InMemoryModelRegistry::new();
        let lifecycle = LifecycleManager::new(registry);
        let artifacts = LocalFsArtifactStore::new(tmp.join("artifacts")).unwrap();
        let trainer = trainer::HeuristicTrainer::new(tmp.join("work"));

        TrainingOrchestrator::new(
            dataset_store,
            job_store,
            lifecycle,
            artifacts,
            trainer,
            tmp.join("datasets"),
            2.0,
            0.2,
        )
    }

    #[test]
    fn first_successful_run_promotes_the_model() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = make_orchestrator(tmp.path());

        let request = TrainingRunRequest {
            model_type: ModelType::PrintTime,
            records: clean_records(15_000),
            feature_columns: vec!["volume_mm3".to_string()],
            target_column: "minutes".to_string(),
            date_range_start: timestamp(0),
            date_range_end: timestamp(1_000_000),
            trigger: TrainingTrigger::Manual,
        };

        let outcome = orchestrator.run(request, timestamp(2_000_000)).unwrap();
        assert!(matches!(outcome, TrainingRunOutcome::Promoted { .. }));
    }

    #[test]
    fn second_trigger_while_running_would_coalesce() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = make_orchestrator(tmp.path());
        let guard = orchestrator.lease.try_acquire(ModelType::PrintTime).unwrap();

        let request = TrainingRunRequest {
            model_type: ModelType::PrintTime,
            records: clean_records(15_000),
            feature_columns: vec!["volume_mm3".to_string()],
            target_column: "minutes".to_string(),
            date_range_start: timestamp(0),
            date_range_end: timestamp(1_000_000),
            trigger: TrainingTrigger::Drift,
        };
        let outcome = orchestrator.run(request, timestamp(2_000_000)).unwrap();
        assert_eq!(outcome, TrainingRunOutcome::Coalesced);
        assert_eq!(orchestrator.drain_coalesced_types(), vec![ModelType::PrintTime]);
        drop(guard);
    }

    #[test]
    fn promotion_publishes_a_model_promoted_event() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = Arc::new(prediction_core::runtime::InMemoryEventPublisher::new());
        let orchestrator = make_orchestrator(tmp.path()).with_publisher(publisher.clone());

        let request = TrainingRunRequest {
            model_type: ModelType::PrintTime,
            records: clean_records(15_000),
            feature_columns: vec!["volume_mm3".to_string()],
            target_column: "minutes".to_string(),
            date_range_start: timestamp(0),
            date_range_end: timestamp(1_000_000),
            trigger: TrainingTrigger::Manual,
        };

        let outcome = orchestrator.run(request, timestamp(2_000_000)).unwrap();
        assert!(matches!(outcome, TrainingRunOutcome::Promoted { .. }));
        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], OperationalEvent::ModelPromoted(_)));
    }

    #[test]
    fn pre_cancelled_token_fails_the_job_before_training() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = make_orchestrator(tmp.path());
        let token = CancellationToken::new();
        token.cancel();

        let request = TrainingRunRequest {
            model_type: ModelType::PrintTime,
            records: clean_records(15_000),
            feature_columns: vec!["volume_mm3".to_string()],
            target_column: "minutes".to_string(),
            date_range_start: timestamp(0),
            date_range_end: timestamp(1_000_000),
            trigger: TrainingTrigger::Manual,
        };

        let outcome = orchestrator.run_cancellable(request, timestamp(2_000_000), &token).unwrap();
        match outcome {
            TrainingRunOutcome::Failed { reason, .. } => assert_eq!(reason, "cancelled"),
            other => panic!("expected Failed(cancelled), got {other:?}"),
        }
    }

    #[test]
    fn small_dataset_fails_the_job_without_erroring() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = make_orchestrator(tmp.path());

        let request = TrainingRunRequest {
            model_type: ModelType::PrintTime,
            records: clean_records(100),
            feature_columns: vec!["volume_mm3".to_string()],
            target_column: "minutes".to_string(),
            date_range_start: timestamp(0),
            date_range_end: timestamp(1_000_000),
            trigger: TrainingTrigger::Scheduled,
        };

        let outcome = orchestrator.run(request, timestamp(2_000_000)).unwrap();
        match outcome {
            TrainingRunOutcome::RejectedAfterTraining { reason, .. } => {
                assert!(reason.contains("below minimum"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
