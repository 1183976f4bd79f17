// prediction-core/src/core/mod.rs
// ============================================================================
// Module: Prediction Service Core Types
// Description: Canonical prediction service schema: models, datasets, jobs,
//              audit entries, identifiers, hashing, and error taxonomy.
// Purpose: Provide stable, serializable types that are the single source of
//          truth for every derived surface (orchestrator, training, CLI).
// Dependencies: serde, serde_json, serde_jcs, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Core types define the model registry schema, training entities, audit
//! log shape, cache key format, and shared error taxonomy. These types have
//! no I/O and no framework dependency; every other crate in the workspace
//! builds on top of them.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod cache_key;
pub mod cancellation;
pub mod errors;
pub mod events;
pub mod hashing;
pub mod identifiers;
pub mod model;
pub mod time;
pub mod training;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditedError;
pub use audit::CacheStatus;
pub use audit::PredictionAuditLog;
pub use cache_key::CacheKey;
pub use cache_key::CachePrefix;
pub use cancellation::Cancelled;
pub use cancellation::CancellationToken;
pub use errors::PredictionError;
pub use events::DriftDetected;
pub use events::ModelPromoted;
pub use events::ModelRolledBack;
pub use events::OperationalEvent;
pub use events::PredictionCompleted;
pub use hashing::Fingerprint;
pub use hashing::HashError;
pub use hashing::canonical_json_bytes;
pub use hashing::fingerprint_bytes;
pub use hashing::fingerprint_bytes_with_params;
pub use hashing::fingerprint_canonical_json;
pub use identifiers::AuditLogId;
pub use identifiers::CorrelationId;
pub use identifiers::CustomerId;
pub use identifiers::DatasetId;
pub use identifiers::FacilityId;
pub use identifiers::MaterialSku;
pub use identifiers::ModelId;
pub use identifiers::ProductId;
pub use identifiers::RequestId;
pub use identifiers::TenantId;
pub use identifiers::TrainingJobId;
pub use identifiers::UserId;
pub use model::FeatureContribution;
pub use model::FeaturePopulationStats;
pub use model::MetricBundleV1;
pub use model::MetricDirection;
pub use model::Model;
pub use model::ModelMetadata;
pub use model::ModelStatus;
pub use model::ModelType;
pub use model::ModelVersion;
pub use model::PerformanceMetrics;
pub use model::PrimaryMetric;
pub use model::RollbackMetadata;
pub use model::Trend;
pub use time::Timestamp;
pub use training::DataQualityReport;
pub use training::QualityFlag;
pub use training::QualityFlagSeverity;
pub use training::TrainingDataset;
pub use training::TrainingJob;
pub use training::TrainingJobError;
pub use training::TrainingJobStatus;
pub use training::TrainingTrigger;
