// prediction-training/src/lib.rs
// ============================================================================
// Module: Prediction Training Library
// Description: Public API surface for the training orchestration pipeline.
// Purpose: Expose dataset snapshotting, data-quality validation, the
//          per-type training lease, a placeholder trainer, and the
//          end-to-end training orchestrator (spec §4.5).
// Dependencies: prediction-core
// ============================================================================

//! ## Overview
//! This crate implements the training side of the prediction service: it
//! turns raw ingested records into immutable dataset snapshots, validates
//! them against the data-quality gate, trains and records a candidate
//! model, and hands promotion decisions to
//! [`prediction_core::runtime::LifecycleManager`]. Concurrency across
//! triggers for the same model type is serialized by [`TrainingLease`];
//! everything else is composed through the storage/registry/artifact
//! traits defined in `prediction-core`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dataset;
pub mod ids;
pub mod lease;
pub mod orchestrator;
pub mod quality;
pub mod retrain_queue;
pub mod trainer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dataset::DatasetBuildError;
pub use dataset::RawRecord;
pub use dataset::SplitDataset;
pub use lease::LeaseGuard;
pub use lease::TrainingLease;
pub use orchestrator::TrainingOrchestrator;
pub use orchestrator::TrainingOrchestratorError;
pub use orchestrator::TrainingRunOutcome;
pub use orchestrator::TrainingRunRequest;
pub use quality::ColumnStats;
pub use quality::ColumnStatsValidator;
pub use retrain_queue::RetrainQueue;
pub use retrain_queue::RetrainRequest;
pub use trainer::HeuristicTrainer;
