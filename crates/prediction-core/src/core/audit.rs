// prediction-core/src/core/audit.rs
// ============================================================================
// Module: Prediction Audit Log Entry
// Description: The append-only audit record for every prediction attempt.
// Purpose: Define the schema Invariant A1 is checked against.
// Dependencies: crate::core::{identifiers, model, time}, serde
// ============================================================================

//! ## Overview
//! Every request that reaches the orchestrator — success or failure —
//! produces exactly one [`PredictionAuditLog`] entry (property P6). Entries
//! are immutable except for the feedback fields (`actual_outcome`,
//! `outcome_received_at`), which the drift monitor populates once ground
//! truth becomes available.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::AuditLogId;
use crate::core::identifiers::RequestId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::model::ModelType;
use crate::core::model::ModelVersion;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Cache Status
// ============================================================================

/// How a prediction response was produced relative to the cache (spec §3,
/// §6 response envelope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// Served from the cache.
    Hit,
    /// Computed fresh and stored in the cache.
    Miss,
    /// Served without consulting the cache (e.g. rule-based fallback).
    Bypass,
}

impl CacheStatus {
    /// The `snake_case` wire representation used by the response envelope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Bypass => "bypass",
        }
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Audit Log Entry
// ============================================================================

/// A structured, machine-readable prediction error recorded on a failed
/// attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditedError {
    /// Machine-readable error kind (spec §7 taxonomy name).
    pub kind: String,
    /// Human-readable detail.
    pub detail: String,
}

/// An append-only prediction audit log entry (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionAuditLog {
    /// Unique entry identifier.
    pub id: AuditLogId,
    /// The request this entry records.
    pub request_id: RequestId,
    /// Model type targeted by the request.
    pub model_type: ModelType,
    /// Model version actually used, when one was resolved.
    pub model_version: Option<ModelVersion>,
    /// Normalized input features (post-canonicalization).
    pub input_features: Value,
    /// Output prediction payload, when the request succeeded.
    pub output_prediction: Option<Value>,
    /// Model confidence, when provided.
    pub confidence: Option<f64>,
    /// Response time in milliseconds.
    pub response_ms: u64,
    /// Cache status for this attempt.
    pub cache_status: CacheStatus,
    /// Authenticated user, if present.
    pub user_id: Option<UserId>,
    /// Tenant, if present.
    pub tenant_id: Option<TenantId>,
    /// When the entry was written.
    pub timestamp: Timestamp,
    /// Ground truth outcome, populated later via feedback.
    pub actual_outcome: Option<Value>,
    /// When feedback was received.
    pub outcome_received_at: Option<Timestamp>,
    /// Structured error, present only on failed attempts.
    pub error: Option<AuditedError>,
}
