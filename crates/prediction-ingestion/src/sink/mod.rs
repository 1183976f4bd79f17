// prediction-ingestion/src/sink/mod.rs
// ============================================================================
// Module: Training Record Sink Trait
// Description: Delivers appended training records to an observability or
//              fan-out destination once the ingestion pipeline has
//              committed them to a dataset bucket.
// Purpose: Mirror the teacher's log/channel/callback sink split, retargeted
//          from dispatch receipts to training records.
// Dependencies: prediction-core, prediction-training, thiserror
// ============================================================================

//! ## Overview
//! [`TrainingRecordSink`] delivers one appended record at a time. Delivery
//! failures are logged by [`crate::pipeline::IngestionPipeline`] but never
//! undo the bucket append — the sink is an observability fan-out, not the
//! system of record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use prediction_core::core::ModelType;
use prediction_training::RawRecord;

// ============================================================================
// SECTION: Sink Errors
// ============================================================================

/// Errors emitted by training record sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing a log record failed.
    #[error("log write failed: {0}")]
    LogWriteFailed(String),
    /// Delivery to the configured destination failed.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Delivers an appended training record to an observability destination.
pub trait TrainingRecordSink: Send + Sync {
    /// Delivers one record appended for `model_type`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when delivery fails.
    fn deliver(&self, model_type: ModelType, record: &RawRecord) -> Result<(), SinkError>;
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod callback;
pub mod channel;
pub mod log;

pub use callback::CallbackSink;
pub use channel::AppendedRecord;
pub use channel::ChannelSink;
pub use log::LogSink;
