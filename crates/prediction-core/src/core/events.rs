// prediction-core/src/core/events.rs
// ============================================================================
// Module: Operational Event Types
// Description: Fire-and-forget events published for operational consumers
//              (spec §6 Event publication).
// Purpose: Give training, lifecycle, and drift callers a single typed
//          vocabulary for the events the out-of-scope transport/operational
//          layer subscribes to, without coupling this crate to a concrete
//          broker.
// Dependencies: crate::core::{identifiers, model, time}, serde
// ============================================================================

//! ## Overview
//! Four event kinds are published by the prediction service core:
//! [`PredictionCompleted`] (optional, emitted per request),
//! [`ModelPromoted`] and [`ModelRolledBack`] (emitted on lifecycle
//! transitions), and [`DriftDetected`] (emitted by the drift monitor).
//! Publication is best-effort: a publisher failure must never fail the
//! operation that produced the event (spec §7 propagation policy extends
//! naturally to event publication, which is explicitly "fire-and-forget"
//! for [`PredictionCompleted`] in spec §6).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RequestId;
use crate::core::model::ModelType;
use crate::core::model::ModelVersion;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Emitted after a prediction request completes, success or failure
/// (spec §6, "fire-and-forget").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionCompleted {
    /// The request this event reports on.
    pub request_id: RequestId,
    /// Model type targeted.
    pub model_type: ModelType,
    /// Model version that served the request, if one was resolved.
    pub model_version: Option<ModelVersion>,
    /// When the request completed.
    pub timestamp: Timestamp,
}

/// Emitted when a candidate model is promoted to Active (spec §4.5 step 9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPromoted {
    /// The type promoted.
    pub model_type: ModelType,
    /// The version now Active.
    pub new_version: ModelVersion,
    /// The version that was Active immediately prior, if any.
    pub old_version: Option<ModelVersion>,
    /// When the promotion occurred.
    pub timestamp: Timestamp,
}

/// Emitted when a rollback transitions a previously Deprecated model back
/// to Active (spec §4.2 scenario 4, §4.9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRolledBack {
    /// The type rolled back.
    pub model_type: ModelType,
    /// The version now Active again.
    pub restored_version: ModelVersion,
    /// The version that was Active immediately prior to the rollback.
    pub rolled_back_from_version: ModelVersion,
    /// Why the rollback was performed.
    pub reason: String,
    /// When the rollback occurred.
    pub timestamp: Timestamp,
}

/// Emitted by the drift monitor when a type's rolling primary metric
/// degrades beyond the configured threshold relative to its deployment
/// baseline (spec §4.9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftDetected {
    /// The type exhibiting drift.
    pub model_type: ModelType,
    /// The version currently Active when drift was detected.
    pub active_version: ModelVersion,
    /// Relative degradation of the rolling metric vs. the deployment
    /// baseline, e.g. `0.07` for a 7% degradation.
    pub relative_degradation: f64,
    /// Whether this breach was the second consecutive breaching window,
    /// making the type eligible for automatic rollback (spec §4.9).
    pub rollback_eligible: bool,
    /// When the breach was observed.
    pub timestamp: Timestamp,
}

/// The closed set of operational events published by this crate. A single
/// enum so one publisher implementation can fan out to every kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationalEvent {
    /// See [`PredictionCompleted`].
    PredictionCompleted(PredictionCompleted),
    /// See [`ModelPromoted`].
    ModelPromoted(ModelPromoted),
    /// See [`ModelRolledBack`].
    ModelRolledBack(ModelRolledBack),
    /// See [`DriftDetected`].
    DriftDetected(DriftDetected),
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

    #[test]
    fn operational_event_round_trips_through_json() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let event = OperationalEvent::DriftDetected(DriftDetected {
            model_type: ModelType::PrintTime,
            active_version: ModelVersion::initial(),
            relative_degradation: 0.07,
            rollback_eligible: true,
            timestamp: now,
        });
        let json = serde_json::to_string(&event).unwrap();
        let parsed: OperationalEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
