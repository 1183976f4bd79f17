// prediction-ingestion/src/transform.rs
// ============================================================================
// Module: Event-to-Training-Record Transform
// Description: Turns a validated event into one training record per target
//              model type (spec §4.6 step 3).
// Purpose: Produce prediction_training::RawRecord rows ready to append to a
//          dataset bucket.
// Dependencies: prediction-core, prediction-training, serde_json
// ============================================================================

//! ## Overview
//! [`transform`] merges an event's identifying fields into its payload
//! object and pairs the result with a [`prediction_training::RawRecord`] per
//! target model type (spec §4.6: "one event may feed multiple datasets"; the
//! row itself does not vary by target, since the trainer for each type picks
//! its own feature/target columns out of the same row).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use prediction_core::core::ModelType;
use prediction_training::RawRecord;

use crate::event::DomainEvent;
use crate::event::EventEnvelope;

/// Builds one training record per model type the event targets.
///
/// The caller is expected to have already run [`crate::schema::validate`],
/// so `envelope.event.payload()` is known to be a JSON object.
#[must_use]
pub fn transform(envelope: &EventEnvelope) -> Vec<(ModelType, RawRecord)> {
    let row = merged_row(envelope);
    let sort_key = format!("{}:{}", envelope.occurred_at, envelope.event_id);
    envelope
        .event
        .target_model_types()
        .iter()
        .map(|model_type| {
            (
                *model_type,
                RawRecord {
                    sort_key: sort_key.clone(),
                    row: row.clone(),
                },
            )
        })
        .collect()
}

/// Merges the event's identifying fields into its payload object.
fn merged_row(envelope: &EventEnvelope) -> Value {
    let mut fields = match envelope.event.payload() {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    fields.insert("event_id".to_string(), Value::String(envelope.event_id.clone()));
    fields.insert("occurred_at".to_string(), Value::String(envelope.occurred_at.to_string()));
    fields.insert("entity_key".to_string(), Value::String(envelope.event.entity_key()));
    if let Some(kind) = event_kind(&envelope.event) {
        fields.insert("event_kind".to_string(), Value::String(kind.to_string()));
    }
    Value::Object(fields)
}

/// A stable, human-readable label for the event's kind.
fn event_kind(event: &DomainEvent) -> Option<&'static str> {
    Some(match event {
        DomainEvent::OrderCreated { .. } => "order_created",
        DomainEvent::OrderCompleted { .. } => "order_completed",
        DomainEvent::CustomerUpdated { .. } => "customer_updated",
        DomainEvent::MaterialTransaction { .. } => "material_transaction",
        DomainEvent::InvoiceIssued { .. } => "invoice_issued",
        DomainEvent::ManufacturingJobCompleted { .. } => "manufacturing_job_completed",
        DomainEvent::EmployeeEvent { .. } => "employee_event",
    })
}
