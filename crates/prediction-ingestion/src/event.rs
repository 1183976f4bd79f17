// prediction-ingestion/src/event.rs
// ============================================================================
// Module: Domain Event Envelope
// Description: Closed set of recognized upstream event kinds and the
//              envelope wrapping each one (spec §4.6).
// Purpose: Model inbound events as an exhaustively matched enum, rather than
//          an open string tag, so routing to target datasets can never
//          silently drop a kind.
// Dependencies: prediction-core, serde_json, time
// ============================================================================

//! ## Overview
//! [`DomainEvent`] is the closed set of upstream event kinds this service
//! ingests: order lifecycle, customer profile updates, material
//! transactions, invoices, manufacturing job completions, and employee
//! events. Each variant names the entity the event concerns (for per-key
//! ordering and dedup, spec §4.6/§5) plus an opaque `payload` carrying the
//! remaining fields a transform needs. [`EventEnvelope`] pairs one event with
//! the event id used for deduplication and the time it occurred.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

use prediction_core::core::CustomerId;
use prediction_core::core::FacilityId;
use prediction_core::core::MaterialSku;
use prediction_core::core::ModelType;
use prediction_core::core::Timestamp;

// ============================================================================
// SECTION: Domain Event
// ============================================================================

/// A recognized upstream event kind (spec §4.6: "for each recognized
/// upstream event kind").
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// A customer order was placed.
    OrderCreated {
        /// The order's own identifier, used for per-key ordering.
        order_id: String,
        /// The customer that placed the order.
        customer_id: CustomerId,
        /// Remaining order fields (line items, requested quantities, etc.).
        payload: Value,
    },
    /// A previously created order finished fulfillment.
    OrderCompleted {
        /// The order's identifier.
        order_id: String,
        /// Remaining completion fields (fulfillment duration, final total).
        payload: Value,
    },
    /// A customer profile attribute changed.
    CustomerUpdated {
        /// The customer whose profile changed.
        customer_id: CustomerId,
        /// Remaining profile fields.
        payload: Value,
    },
    /// Material stock moved in or out.
    MaterialTransaction {
        /// The material affected.
        material_sku: MaterialSku,
        /// Remaining transaction fields (quantity delta, reason).
        payload: Value,
    },
    /// An invoice was issued to a customer.
    InvoiceIssued {
        /// The invoice's own identifier.
        invoice_id: String,
        /// Remaining invoice fields (amount, line items).
        payload: Value,
    },
    /// A manufacturing job finished on the shop floor.
    ManufacturingJobCompleted {
        /// The job's own identifier.
        job_id: String,
        /// The facility that ran the job.
        facility_id: FacilityId,
        /// Remaining job fields (duration, geometry features).
        payload: Value,
    },
    /// An employee-related event (shift change, certification, absence).
    EmployeeEvent {
        /// The employee's own identifier.
        employee_id: String,
        /// Remaining event fields.
        payload: Value,
    },
}

impl DomainEvent {
    /// The key this event should be ordered and deduplicated against
    /// (spec §4.6/§5: "per-key (e.g., per-entity) ordering is preserved").
    #[must_use]
    pub fn entity_key(&self) -> String {
        match self {
            Self::OrderCreated {
                order_id, ..
            }
            | Self::OrderCompleted {
                order_id, ..
            } => format!("order:{order_id}"),
            Self::CustomerUpdated {
                customer_id, ..
            } => format!("customer:{customer_id}"),
            Self::MaterialTransaction {
                material_sku, ..
            } => format!("material:{material_sku}"),
            Self::InvoiceIssued {
                invoice_id, ..
            } => format!("invoice:{invoice_id}"),
            Self::ManufacturingJobCompleted {
                job_id, ..
            } => format!("job:{job_id}"),
            Self::EmployeeEvent {
                employee_id, ..
            } => format!("employee:{employee_id}"),
        }
    }

    /// The model types whose training datasets this event feeds (spec §4.6:
    /// "one event may feed multiple datasets"). Exhaustively matched so a new
    /// variant cannot silently go unrouted.
    #[must_use]
    pub fn target_model_types(&self) -> &'static [ModelType] {
        match self {
            Self::OrderCreated { .. } | Self::OrderCompleted { .. } => {
                &[ModelType::DemandForecast]
            }
            Self::CustomerUpdated { .. } => &[ModelType::ChurnPrediction],
            Self::MaterialTransaction { .. } => &[ModelType::MaterialDemand],
            Self::InvoiceIssued { .. } => &[ModelType::PriceOptimization],
            Self::ManufacturingJobCompleted { .. } => {
                &[ModelType::PrintTime, ModelType::BottleneckDetection]
            }
            Self::EmployeeEvent { .. } => &[ModelType::BottleneckDetection],
        }
    }

    /// The free-form payload fields carried alongside the identifying
    /// fields, used by [`crate::transform`] to build a training record row.
    #[must_use]
    pub fn payload(&self) -> &Value {
        match self {
            Self::OrderCreated {
                payload, ..
            }
            | Self::OrderCompleted {
                payload, ..
            }
            | Self::CustomerUpdated {
                payload, ..
            }
            | Self::MaterialTransaction {
                payload, ..
            }
            | Self::InvoiceIssued {
                payload, ..
            }
            | Self::ManufacturingJobCompleted {
                payload, ..
            }
            | Self::EmployeeEvent {
                payload, ..
            } => payload,
        }
    }
}

// ============================================================================
// SECTION: Event Envelope
// ============================================================================

/// An inbound event paired with the metadata needed to deduplicate and order
/// it (spec §4.6 step 1).
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    /// Upstream-assigned event id, or a derived idempotency key. Delivering
    /// the same id twice must be a no-op (spec.md scenario 5).
    pub event_id: String,
    /// When the upstream system recorded the event.
    pub occurred_at: Timestamp,
    /// The event itself.
    pub event: DomainEvent,
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
    fn manufacturing_job_completion_feeds_two_datasets() {
        let event = DomainEvent::ManufacturingJobCompleted {
            job_id: "job-1".to_string(),
            facility_id: FacilityId::new("fac-1"),
            payload: serde_json::json!({}),
        };
        assert_eq!(
            event.target_model_types(),
            &[ModelType::PrintTime, ModelType::BottleneckDetection]
        );
    }

    #[test]
    fn entity_key_is_stable_for_the_same_order() {
        let a = DomainEvent::OrderCreated {
            order_id: "o-1".to_string(),
            customer_id: CustomerId::new("c-1"),
            payload: serde_json::json!({}),
        };
        let b = DomainEvent::OrderCompleted {
            order_id: "o-1".to_string(),
            payload: serde_json::json!({}),
        };
        assert_eq!(a.entity_key(), b.entity_key());
    }
}
