// prediction-training/src/lease.rs
// ============================================================================
// Module: Per-Type Training Lease
// Description: At-most-one-running-job-per-type serialization (spec §4.5
//              step 1, §5 "Concurrency: at most one running job per type").
// Purpose: Let competing scheduled/drift/manual/event triggers coalesce into
//          a single pending job per model type, dropping superseded
//          intermediates with a log entry.
// Dependencies: prediction-core::core::ModelType, std::sync
// ============================================================================

//! ## Overview
//! [`TrainingLease`] is a try-lock keyed by [`ModelType`]: a trigger that
//! finds a type already leased does not block — it records that a retrain
//! was requested while one was in flight (spec §5: "latest wins,
//! intermediates dropped with a log entry") and returns immediately. The
//! orchestrator schedules at most one follow-up run per coalesced type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;

use prediction_core::core::ModelType;

// ============================================================================
// SECTION: Training Lease
// ============================================================================

/// Serializes training jobs per [`ModelType`] (spec §5).
#[derive(Default)]
pub struct TrainingLease {
    held: Mutex<BTreeMap<ModelType, ()>>,
    coalesced: Mutex<BTreeSet<ModelType>>,
}

/// A held lease; the type becomes available again when this guard drops.
pub struct LeaseGuard<'a> {
    lease: &'a TrainingLease,
    model_type: ModelType,
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut held) = self.lease.held.lock() {
            held.remove(&self.model_type);
        }
    }
}

impl TrainingLease {
    /// Creates an empty lease table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire the single-writer lease for `model_type`. Returns
    /// `None` and records a coalesced trigger (spec §5) when a job is
    /// already running for this type.
    #[must_use]
    pub fn try_acquire(&self, model_type: ModelType) -> Option<LeaseGuard<'_>> {
        let mut held = self.held.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if held.contains_key(&model_type) {
            if let Ok(mut coalesced) = self.coalesced.lock() {
                coalesced.insert(model_type);
                tracing::warn!(
                    model_type = %model_type,
                    "training trigger coalesced: a job for this type is already running"
                );
            }
            return None;
        }
        held.insert(model_type, ());
        Some(LeaseGuard { lease: self, model_type })
    }

    /// Drains and returns the set of types that had a trigger coalesced
    /// since the last drain, so the caller can schedule exactly one
    /// follow-up run per type (latest wins).
    #[must_use]
    pub fn drain_coalesced(&self) -> Vec<ModelType> {
        let mut coalesced = self.coalesced.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        coalesced.drain().collect()
    }
}
