// prediction-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Prediction Store
// Description: Durable backends for the prediction service's four
//              SQLite-shaped schemas (models, datasets, jobs, audit log).
// Purpose: Provide production-grade persistence for the prediction core's
//          storage traits.
// Dependencies: prediction-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides `SQLite`-backed implementations of
//! [`prediction_core::interfaces::ModelRegistry`],
//! [`prediction_core::interfaces::TrainingDatasetStore`],
//! [`prediction_core::interfaces::TrainingJobStore`], and
//! [`prediction_core::interfaces::AuditSink`]. Each record is stored as a
//! canonical JSON blob alongside the narrow set of columns its store needs
//! to filter or order by, so schema evolution stays confined to the
//! structs in `prediction-core` rather than requiring a migration for every
//! new field. The prediction cache itself remains in-memory
//! ([`prediction_core::runtime::InMemoryPredictionCache`]); see `DESIGN.md`
//! for that scope decision.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod registry;
pub mod store;
pub mod training;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::SqliteAuditSink;
pub use registry::SqliteModelRegistry;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use training::SqliteTrainingDatasetStore;
pub use training::SqliteTrainingJobStore;
