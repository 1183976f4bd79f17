// prediction-core/src/interfaces/mod.rs
// ============================================================================
// Module: Prediction Service Interfaces
// Description: Backend-agnostic traits for storage, inference, and auditing.
// Purpose: Define the contract surfaces the orchestrator and training
//          pipeline are generic over, so concrete backends are selected by
//          constructor composition rather than a DI container.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the prediction core integrates with external
//! systems (SQLite, an artifact service, an in-memory cache) without
//! embedding backend-specific details into the orchestrator or training
//! logic. Implementations must fail closed: an I/O error is surfaced, never
//! silently treated as "no data" except where §7 explicitly allows it
//! (cache reads fail open to a miss).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::AuditLogId;
use crate::core::CacheKey;
use crate::core::CachePrefix;
use crate::core::DataQualityReport;
use crate::core::DatasetId;
use crate::core::FeatureContribution;
use crate::core::Fingerprint;
use crate::core::Model;
use crate::core::ModelId;
use crate::core::ModelMetadata;
use crate::core::ModelStatus;
use crate::core::ModelType;
use crate::core::ModelVersion;
use crate::core::PredictionAuditLog;
use crate::core::Timestamp;
use crate::core::TrainingDataset;
use crate::core::TrainingJob;
use crate::core::TrainingJobId;

// ============================================================================
// SECTION: Model Registry
// ============================================================================

/// Registry errors (spec §4.1 failure mode).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Backing store I/O error.
    #[error("registry store error: {0}")]
    Store(String),
    /// `(type, version)` already exists (Invariant M2).
    #[error("duplicate version for {0} {1}")]
    DuplicateVersion(ModelType, ModelVersion),
    /// The requested model id does not exist.
    #[error("model not found: {0}")]
    NotFound(ModelId),
    /// An invariant (M1/M2/M3) would be violated by this write; the write
    /// was aborted atomically.
    #[error("invariant violation {0}: {1}")]
    InvariantViolation(&'static str, String),
    /// A status transition is not permitted from the model's current state.
    #[error("lifecycle conflict: cannot transition from {0:?} to {1:?}")]
    LifecycleConflict(ModelStatus, ModelStatus),
}

/// Persists models and enforces invariants M1-M3 (spec §4.1).
///
/// Writes that touch a single `type`'s Active/Deprecated set are serialized
/// per `type` (spec §5); implementations provide that serialization (e.g. a
/// `type`-scoped mutex) internally so callers never have to coordinate it.
pub trait ModelRegistry {
    /// Returns the current Active model for a type, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on a backing-store failure.
    fn get_active(&self, model_type: ModelType) -> Result<Option<Model>, RegistryError>;

    /// Returns a model by id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the id is unknown, or
    /// another [`RegistryError`] on a backing-store failure.
    fn get_by_id(&self, id: &ModelId) -> Result<Model, RegistryError>;

    /// Lists versions of a type, optionally filtered by status, ordered by
    /// version descending.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on a backing-store failure.
    fn list_versions(
        &self,
        model_type: ModelType,
        status: Option<ModelStatus>,
    ) -> Result<Vec<Model>, RegistryError>;

    /// Inserts a new Draft model.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateVersion`] when `(type, version)`
    /// already exists, or another [`RegistryError`] on a backing-store
    /// failure.
    fn save(&self, model: Model) -> Result<(), RegistryError>;

    /// Atomically compare-and-sets a model's status.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LifecycleConflict`] when `from` does not
    /// match the model's current status, [`RegistryError::InvariantViolation`]
    /// when the transition would breach M1/M2/M3, or another
    /// [`RegistryError`] on a backing-store failure.
    fn transition(
        &self,
        id: &ModelId,
        from: ModelStatus,
        to: ModelStatus,
        now: Timestamp,
        reason: Option<&str>,
    ) -> Result<(), RegistryError>;

    /// Updates a model's metadata in place (used to record rollback
    /// provenance or quality-gate rejection reasons).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on a backing-store failure.
    fn update_metadata(&self, id: &ModelId, metadata: ModelMetadata) -> Result<(), RegistryError>;
}

// ============================================================================
// SECTION: Prediction Cache
// ============================================================================

/// Cache errors. Per spec §7, cache read failures are treated as misses by
/// the orchestrator rather than propagated; this variant exists so callers
/// that need to distinguish "true miss" from "errored" still can.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backing cache store error.
    #[error("cache error: {0}")]
    Backend(String),
    /// The stored value's format tag is not one this build understands
    /// (Invariant C2).
    #[error("unsupported cache entry format tag {0}")]
    UnsupportedFormat(u16),
}

/// An opaque, versioned cache value (Invariant C2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValue {
    /// Serialization format tag; bumped when the payload shape changes.
    pub format_tag: u16,
    /// Opaque serialized payload bytes.
    pub bytes: Vec<u8>,
}

/// Content-addressed prediction cache (spec §4.4).
pub trait PredictionCache {
    /// Looks up a cached value, treating an entry whose `expires_at <= now`
    /// as a miss (spec §4.4/§6 per-type TTL).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on a backend failure; callers should treat
    /// this the same as a miss (fail-open, spec §7).
    fn get(&self, key: &CacheKey, now: Timestamp) -> Result<Option<CacheValue>, CacheError>;

    /// Stores a value with a per-entry TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on a backend failure.
    fn put(&self, key: CacheKey, value: CacheValue, ttl_seconds: i64, now: Timestamp) -> Result<(), CacheError>;

    /// Invalidates every entry matching a prefix (spec §4.4, defensive —
    /// not required for correctness given Invariant C1).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on a backend failure.
    fn invalidate_prefix(&self, prefix: &CachePrefix) -> Result<u64, CacheError>;
}

// ============================================================================
// SECTION: Artifact Store
// ============================================================================

/// Artifact store errors (spec §4.8).
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Backend I/O or network error.
    #[error("artifact store error: {0}")]
    Io(String),
    /// The requested artifact does not exist.
    #[error("artifact not found for model {0}")]
    NotFound(ModelId),
    /// The backend rejected authentication.
    #[error("artifact store authentication failed: {0}")]
    Unauthorized(String),
    /// The caller's [`crate::core::CancellationToken`] was cancelled before
    /// the download completed.
    #[error("artifact download cancelled")]
    Cancelled,
}

/// Uploads, downloads, lists, and deletes serialized model artifacts
/// (spec §4.8). Both supported backends (local filesystem, remote service)
/// implement idempotent overwrite: re-uploading the same `(model_id, type)`
/// replaces the prior object rather than erroring, and authenticated
/// download is a uniform requirement (Open Question resolution).
pub trait ArtifactStore {
    /// Uploads the bytes at `local_path`, returning the artifact's URI.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] on I/O or authentication failure.
    fn upload(&self, local_path: &std::path::Path, model_id: &ModelId, model_type: ModelType) -> Result<String, ArtifactError>;

    /// Downloads an artifact to a local temporary path, returning that path.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::NotFound`] when no artifact is stored for
    /// the id, or another [`ArtifactError`] on I/O or authentication failure.
    fn download(&self, model_id: &ModelId, model_type: ModelType) -> Result<std::path::PathBuf, ArtifactError>;

    /// Downloads an artifact the same way as [`Self::download`], but checks
    /// `cancellation` first and fails fast with
    /// [`ArtifactError::Cancelled`] instead of starting the transfer
    /// (spec §5: artifact download accepts a cancellation signal). The
    /// default implementation is correct for any backend whose download is
    /// already cheap/local; [`crate`]'s remote backend overrides it to also
    /// check between retry attempts.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Cancelled`] if `cancellation` is already
    /// cancelled, or whatever [`Self::download`] returns otherwise.
    fn download_cancellable(
        &self,
        model_id: &ModelId,
        model_type: ModelType,
        cancellation: &crate::core::CancellationToken,
    ) -> Result<std::path::PathBuf, ArtifactError> {
        if cancellation.is_cancelled() {
            return Err(ArtifactError::Cancelled);
        }
        self.download(model_id, model_type)
    }

    /// Returns whether an artifact exists for the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] on I/O or authentication failure.
    fn exists(&self, model_id: &ModelId, model_type: ModelType) -> Result<bool, ArtifactError>;

    /// Deletes an artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] on I/O or authentication failure.
    fn delete(&self, model_id: &ModelId, model_type: ModelType) -> Result<(), ArtifactError>;

    /// Lists all model ids with stored artifacts for a type.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] on I/O or authentication failure.
    fn list(&self, model_type: ModelType) -> Result<Vec<ModelId>, ArtifactError>;
}

// ============================================================================
// SECTION: Predictor
// ============================================================================

/// Predictor errors (spec §4.3, §7 `InferenceError`).
#[derive(Debug, Error)]
pub enum PredictorError {
    /// The predictor raised an unexpected condition during inference.
    #[error("inference error: {0}")]
    Inference(String),
}

/// A confidence interval around a point estimate.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// The typed output of a single inference call, before explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// The primary predicted value, shaped per-type (spec §4.3 table).
    pub value: Value,
    /// Confidence interval around the primary value, when applicable.
    pub confidence_interval: Option<ConfidenceInterval>,
    /// A raw per-feature score vector consumable by the explainer.
    pub feature_scores: Vec<(String, f64)>,
}

/// A loaded, deserialized model ready to serve inference (spec §4.3 step
/// 5-7). Implementations hold no back-reference to the registry or
/// predictor registry that loaded them (Design Note "Cyclic references").
pub trait Predictor: Send + Sync {
    /// Runs inference over already-extracted features.
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError::Inference`] when the predictor cannot
    /// produce a prediction from the given features.
    fn predict(&self, features: &Value) -> Result<RawPrediction, PredictorError>;
}

// ============================================================================
// SECTION: Predictor Registry
// ============================================================================

/// Predictor registry errors.
#[derive(Debug, Error)]
pub enum PredictorRegistryError {
    /// The artifact could not be loaded or deserialized.
    #[error("predictor load error: {0}")]
    Load(String),
}

/// Maps `(model type, model id)` to a loaded, memoized predictor instance
/// (spec §4.3 step 5, §5). Lazily loads from the artifact store on first
/// use; on model id change for a type, the previous instance becomes
/// eligible for LRU eviction once in-flight inferences against it drain.
pub trait PredictorRegistry {
    /// Returns the predictor for `(model_type, model_id)`, loading and
    /// memoizing it if necessary. Concurrent misses on the same key must
    /// result in exactly one load (single-flight, spec §5).
    ///
    /// # Errors
    ///
    /// Returns [`PredictorRegistryError::Load`] when the artifact cannot be
    /// fetched or deserialized.
    fn get(
        &self,
        model_type: ModelType,
        model_id: &ModelId,
    ) -> Result<std::sync::Arc<dyn Predictor>, PredictorRegistryError>;
}

// ============================================================================
// SECTION: Feature Extractor
// ============================================================================

/// Feature extraction errors (spec §4.3 geometry invariants).
#[derive(Debug, Error)]
pub enum FeatureExtractorError {
    /// The input is empty or structurally invalid.
    #[error("malformed input: {0}")]
    Malformed(String),
    /// The input exceeds the documented size cap.
    #[error("input too large: {0} bytes (cap {1} bytes)")]
    TooLarge(u64, u64),
}

/// Extracts typed features from a raw, per-type request payload
/// (spec §4.3 per-type contract table). Implementations must be
/// deterministic: identical bytes and parameters always produce identical
/// features, since the orchestrator fingerprints the request, not the
/// extracted features.
pub trait FeatureExtractor: Send + Sync {
    /// Extracts features from a raw request payload.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureExtractorError`] when the input is malformed or
    /// exceeds the size cap.
    fn extract(&self, raw_input: &Value) -> Result<Value, FeatureExtractorError>;
}

// ============================================================================
// SECTION: Explainer
// ============================================================================

/// Explainer errors.
#[derive(Debug, Error)]
pub enum ExplainerError {
    /// Explanation could not be derived from the given feature scores.
    #[error("explanation error: {0}")]
    Explanation(String),
}

/// The output of explanation: top feature contributions and a
/// human-readable phrase (spec §4.7).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Explanation {
    /// Top 3-5 feature contributions, descending by weight.
    pub top_factors: Vec<FeatureContribution>,
    /// Template-generated human-readable explanation.
    pub human_readable: String,
}

/// Computes feature contributions and a human-readable explanation from a
/// predictor's raw score vector and the model's stored population
/// statistics (spec §4.7). Never fabricates statistics: every percentile
/// phrase it emits is derived from stored population quantiles.
pub trait Explainer {
    /// Explains a prediction.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainerError`] when contributions cannot be normalized
    /// (e.g. all scores are zero).
    fn explain(
        &self,
        feature_scores: &[(String, f64)],
        population: &[crate::core::FeaturePopulationStats],
        current_values: &Value,
    ) -> Result<Explanation, ExplainerError>;
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Audit sink errors. Per spec §7, audit write failures are non-fatal to
/// the request path; the orchestrator buffers locally on failure rather
/// than failing the response.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Backing store error.
    #[error("audit sink error: {0}")]
    Store(String),
}

/// Appends entries to the immutable prediction audit log (spec §3
/// Invariant A1, §4.3 step 10).
pub trait AuditSink {
    /// Appends a new audit entry. Implementations must preserve insertion
    /// order within a partition so replay reproduces the observed sequence
    /// of model versions used (property P6).
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] on a backing-store failure.
    fn append(&self, entry: PredictionAuditLog) -> Result<AuditLogId, AuditError>;

    /// Records feedback (ground truth) against an existing entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] on a backing-store failure.
    fn record_feedback(
        &self,
        id: &AuditLogId,
        actual_outcome: Value,
        received_at: Timestamp,
    ) -> Result<(), AuditError>;
}

// ============================================================================
// SECTION: Trainer
// ============================================================================

/// Trainer errors (spec §4.5).
#[derive(Debug, Error)]
pub enum TrainerError {
    /// Training failed for a reason other than the data quality gate.
    #[error("training error: {0}")]
    Training(String),
}

/// The result of running a type's trainer over a dataset (spec §4.5 step
/// 5-6): a serialized artifact on disk plus evaluation metrics computed on
/// the held-out split.
pub struct TrainingOutcome {
    /// Local path to the serialized, trained artifact, ready for upload.
    pub artifact_path: std::path::PathBuf,
    /// Metrics computed on the holdout split.
    pub metrics: crate::core::PerformanceMetrics,
    /// Population statistics per feature, to store in model metadata.
    pub feature_population: Vec<crate::core::FeaturePopulationStats>,
}

/// Trains and evaluates a model for one type (spec §4.5 step 5-6).
pub trait Trainer {
    /// Trains on `dataset` (already split into train/holdout by the
    /// caller) and returns the resulting artifact and holdout metrics.
    ///
    /// # Errors
    ///
    /// Returns [`TrainerError`] when training fails.
    fn train(
        &self,
        dataset: &crate::core::TrainingDataset,
        hyperparameters: &[(String, f64)],
    ) -> Result<TrainingOutcome, TrainerError>;
}

// ============================================================================
// SECTION: Quality Validator
// ============================================================================

/// Validates a dataset snapshot for the training data-quality gate
/// (spec §4.5 step 3). A pure function in spirit; modeled as a trait so
/// tests can substitute deterministic fixtures.
pub trait DataQualityValidator {
    /// Produces a [`DataQualityReport`] for a dataset snapshot.
    fn validate(&self, dataset: &crate::core::TrainingDataset) -> DataQualityReport;
}

// ============================================================================
// SECTION: Training Dataset Store
// ============================================================================

/// Dataset store errors (spec §3 Invariant D1/D2, §4.5 step 2).
#[derive(Debug, Error)]
pub enum DatasetStoreError {
    /// Backing store I/O error.
    #[error("dataset store error: {0}")]
    Store(String),
    /// The requested dataset id does not exist.
    #[error("dataset not found: {0}")]
    NotFound(DatasetId),
}

/// Persists immutable [`TrainingDataset`] snapshots (spec §3 Invariant D1,
/// owned by the Training Orchestrator per spec §3 Ownership).
pub trait TrainingDatasetStore {
    /// Returns the dataset already recorded under `content_hash`, if any
    /// (spec §4.5 step 2 dedup-by-hash, Invariant D2).
    ///
    /// # Errors
    ///
    /// Returns [`DatasetStoreError`] on a backing-store failure.
    fn find_by_content_hash(&self, content_hash: &Fingerprint) -> Result<Option<TrainingDataset>, DatasetStoreError>;

    /// Persists a new dataset snapshot. Callers must have already checked
    /// [`TrainingDatasetStore::find_by_content_hash`] for an existing
    /// snapshot with the same hash (Invariant D2 is a dedup key, not a
    /// uniqueness constraint this trait enforces itself).
    ///
    /// # Errors
    ///
    /// Returns [`DatasetStoreError`] on a backing-store failure.
    fn save(&self, dataset: TrainingDataset) -> Result<(), DatasetStoreError>;

    /// Returns a dataset by id.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetStoreError::NotFound`] when the id is unknown, or
    /// another [`DatasetStoreError`] on a backing-store failure.
    fn get(&self, id: &DatasetId) -> Result<TrainingDataset, DatasetStoreError>;
}

// ============================================================================
// SECTION: Training Job Store
// ============================================================================

/// Training job store errors.
#[derive(Debug, Error)]
pub enum JobStoreError {
    /// Backing store I/O error.
    #[error("training job store error: {0}")]
    Store(String),
    /// The requested job id does not exist.
    #[error("training job not found: {0}")]
    NotFound(TrainingJobId),
}

/// Persists [`TrainingJob`] records (spec §3, owned by the Registry per
/// spec §3 Ownership, written by the Training Orchestrator).
pub trait TrainingJobStore {
    /// Inserts a new job record.
    ///
    /// # Errors
    ///
    /// Returns [`JobStoreError`] on a backing-store failure.
    fn save(&self, job: TrainingJob) -> Result<(), JobStoreError>;

    /// Replaces an existing job record in place (status/metrics/error
    /// updates as a job progresses).
    ///
    /// # Errors
    ///
    /// Returns [`JobStoreError::NotFound`] when the id is unknown, or
    /// another [`JobStoreError`] on a backing-store failure.
    fn update(&self, job: TrainingJob) -> Result<(), JobStoreError>;

    /// Returns a job by id.
    ///
    /// # Errors
    ///
    /// Returns [`JobStoreError::NotFound`] when the id is unknown, or
    /// another [`JobStoreError`] on a backing-store failure.
    fn get(&self, id: &TrainingJobId) -> Result<TrainingJob, JobStoreError>;

    /// Lists jobs for a model type, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`JobStoreError`] on a backing-store failure.
    fn list_for_type(&self, model_type: ModelType) -> Result<Vec<TrainingJob>, JobStoreError>;
}

// ============================================================================
// SECTION: Event Publisher
// ============================================================================

/// Event publisher errors. These are logged by callers and never propagated
/// as the failure of the operation that produced the event (spec §6,
/// publication is fire-and-forget).
#[derive(Debug, Error)]
pub enum EventPublishError {
    /// The transport backing this publisher is unavailable.
    #[error("event publisher unavailable: {0}")]
    Unavailable(String),
}

/// Publishes [`crate::core::OperationalEvent`]s to whatever operational
/// transport a deployment wires in (log sink, message bus, webhook). A
/// failure here must never fail the caller's operation (spec §6).
pub trait EventPublisher {
    /// Publishes a single event. Implementations should treat this as
    /// best-effort: callers log a returned error and proceed.
    ///
    /// # Errors
    ///
    /// Returns [`EventPublishError`] when the event could not be delivered.
    fn publish(&self, event: crate::core::OperationalEvent) -> Result<(), EventPublishError>;
}
