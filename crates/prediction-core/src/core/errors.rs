// prediction-core/src/core/errors.rs
// ============================================================================
// Module: Prediction Error Taxonomy
// Description: The internal error kinds from spec §7, surfaced by the
//              orchestrator and mapped by the (external) transport layer to
//              HTTP statuses.
// Purpose: Give every failure mode a single, stable, matchable type.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! This is the taxonomy a transport layer maps to HTTP status codes (spec
//! §7); the mapping itself lives outside this crate's scope, but the
//! variant names here are chosen to make that mapping mechanical.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::model::ModelType;

// ============================================================================
// SECTION: Prediction Error
// ============================================================================

/// The error taxonomy for a single prediction attempt (spec §7).
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Malformed input, unsupported format, or out-of-range parameter.
    #[error("validation error: {0}")]
    Validation(String),

    /// Geometry or batch payload exceeds the configured cap.
    #[error("input too large: {0}")]
    InputTooLarge(String),

    /// No Active model exists for the type and no fallback is configured.
    #[error("no active model for type {0}")]
    NoActiveModel(ModelType),

    /// Artifact fetch or deserialization failed.
    #[error("predictor load error: {0}")]
    PredictorLoad(String),

    /// The predictor raised an unexpected condition during inference.
    #[error("inference error: {0}")]
    Inference(String),

    /// An invalid lifecycle state transition was requested.
    #[error("lifecycle conflict: {0}")]
    LifecycleConflict(String),

    /// The registry detected an M1/M2/M3 invariant breach; the write was
    /// aborted atomically and no user-visible state changed.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Training-only: the data quality gate failed.
    #[error("data quality failure: {0}")]
    DataQualityFailure(String),

    /// Cache, artifact store, registry, or broker transiently unavailable.
    #[error("transient infrastructure error: {0}")]
    TransientInfra(String),
}

impl PredictionError {
    /// Returns `true` for errors that are safe to retry unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, PredictionError::TransientInfra(_))
    }
}
