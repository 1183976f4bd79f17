// prediction-core/src/core/identifiers.rs
// ============================================================================
// Module: Prediction Service Identifiers
// Description: Canonical opaque identifiers used across the prediction core.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque and serialize as plain strings. Validation of
//! identifier *contents* is a non-goal: the owning component (registry,
//! orchestrator, ingestion consumer) is responsible for constructing them;
//! these wrappers only prevent accidental cross-type mixing at compile time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Macro
// ============================================================================

macro_rules! opaque_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

opaque_id!(TenantId, "Tenant identifier scoped to a prediction request.");
opaque_id!(UserId, "Authenticated user identifier attached to a request.");
opaque_id!(ModelId, "Opaque, unique identifier for a single trained model artifact.");
opaque_id!(DatasetId, "Identifier for an immutable training dataset snapshot.");
opaque_id!(TrainingJobId, "Identifier for a training job instance.");
opaque_id!(RequestId, "Identifier for a single prediction request.");
opaque_id!(CorrelationId, "Caller-supplied correlation identifier propagated through logs.");
opaque_id!(AuditLogId, "Identifier for an append-only audit log entry.");
opaque_id!(CustomerId, "Identifier for a customer entity referenced by predictors.");
opaque_id!(ProductId, "Identifier for a product entity referenced by forecasting predictors.");
opaque_id!(MaterialSku, "Stock keeping unit identifier for a material.");
opaque_id!(FacilityId, "Identifier for a manufacturing facility.");
