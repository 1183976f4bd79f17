// prediction-training/src/retrain_queue.rs
// ============================================================================
// Module: Retrain Request Queue
// Description: Bounded in-memory queue bridging the drift monitor's retrain
//              seam to the training orchestrator (spec §4.9, §5).
// Purpose: Let `DriftMonitor` request a retrain without knowing how to
//          assemble a `TrainingRunRequest`; a scheduler drains this queue
//          and looks up the matching dataset window itself.
// Dependencies: prediction_core::core::{ModelType, TrainingTrigger}, prediction_drift::RetrainTrigger
// ============================================================================

//! ## Overview
//! [`RetrainQueue`] implements [`prediction_drift::RetrainTrigger`] as a
//! `Mutex<VecDeque<_>>` of `(model_type, trigger)` pairs, mirroring the
//! bounded in-memory batching spec §5 describes for ingestion consumers. It
//! carries no dataset or feature information — the scheduler draining it is
//! responsible for resolving the current ingested window for each type
//! before calling [`crate::orchestrator::TrainingOrchestrator::run`].

use std::collections::VecDeque;
use std::sync::Mutex;

use prediction_core::core::ModelType;
use prediction_core::core::TrainingTrigger;
use prediction_drift::RetrainTrigger;

/// A pending retrain request (spec §4.9: a breach "triggers ... a
/// retraining job").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrainRequest {
    /// The type to retrain.
    pub model_type: ModelType,
    /// What triggered the request.
    pub trigger: TrainingTrigger,
}

/// Bounded in-memory queue of pending retrain requests.
#[derive(Default)]
pub struct RetrainQueue {
    pending: Mutex<VecDeque<RetrainRequest>>,
}

impl RetrainQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains every pending request, most recently requested last.
    #[must_use]
    pub fn drain(&self) -> Vec<RetrainRequest> {
        let mut pending = self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.drain(..).collect()
    }
}

impl RetrainTrigger for RetrainQueue {
    fn request_retrain(&self, model_type: ModelType, trigger: TrainingTrigger) {
        let mut pending = self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.push_back(RetrainRequest { model_type, trigger });
    }
}
