// prediction-ingestion/src/schema.rs
// ============================================================================
// Module: Event Schema Validation and Dead Letters
// Description: Rejects malformed envelopes into a dead-letter collection
//              with a reason (spec §4.6 step 2).
// Purpose: Keep schema validation separate from transform so a rejected
//          record never reaches the dataset bucket.
// Dependencies: prediction-core
// ============================================================================

//! ## Overview
//! [`validate`] rejects envelopes whose identifying fields are empty or
//! whose payload is not a JSON object (every transform in
//! [`crate::transform`] expects object fields). Rejections are recorded as
//! [`DeadLetter`] entries rather than discarded silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;

use crate::event::DomainEvent;
use crate::event::EventEnvelope;

/// Default number of dead letters retained before the oldest is evicted.
pub const DEFAULT_DEAD_LETTER_CAPACITY: usize = 1024;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Why an envelope was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The event's identifying field (order id, invoice id, etc.) was empty.
    #[error("identifying field is empty")]
    EmptyIdentifier,
    /// The event's payload was not a JSON object.
    #[error("payload is not a json object")]
    PayloadNotAnObject,
}

/// Validates an envelope against the expected schema for its event kind
/// (spec §4.6 step 2).
///
/// # Errors
///
/// Returns [`ValidationError`] when the envelope fails validation.
pub fn validate(envelope: &EventEnvelope) -> Result<(), ValidationError> {
    if envelope.event_id.trim().is_empty() {
        return Err(ValidationError::EmptyIdentifier);
    }
    if identifying_field_is_empty(&envelope.event) {
        return Err(ValidationError::EmptyIdentifier);
    }
    if !envelope.event.payload().is_object() {
        return Err(ValidationError::PayloadNotAnObject);
    }
    Ok(())
}

/// Returns true when the event's own identifying field is blank.
fn identifying_field_is_empty(event: &DomainEvent) -> bool {
    match event {
        DomainEvent::OrderCreated {
            order_id, ..
        }
        | DomainEvent::OrderCompleted {
            order_id, ..
        } => order_id.trim().is_empty(),
        DomainEvent::CustomerUpdated {
            customer_id, ..
        } => customer_id.as_str().trim().is_empty(),
        DomainEvent::MaterialTransaction {
            material_sku, ..
        } => material_sku.as_str().trim().is_empty(),
        DomainEvent::InvoiceIssued {
            invoice_id, ..
        } => invoice_id.trim().is_empty(),
        DomainEvent::ManufacturingJobCompleted {
            job_id, ..
        } => job_id.trim().is_empty(),
        DomainEvent::EmployeeEvent {
            employee_id, ..
        } => employee_id.trim().is_empty(),
    }
}

// ============================================================================
// SECTION: Dead Letters
// ============================================================================

/// A rejected envelope paired with the reason it was rejected.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    /// The envelope that failed validation.
    pub envelope: EventEnvelope,
    /// Why it was rejected.
    pub reason: ValidationError,
}

/// Bounded collection of dead-lettered envelopes.
#[derive(Debug)]
pub struct DeadLetterQueue {
    capacity: usize,
    entries: VecDeque<DeadLetter>,
}

impl DeadLetterQueue {
    /// Creates an empty queue bounded to `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    /// Records a rejection, evicting the oldest entry once over capacity.
    pub fn push(&mut self, envelope: EventEnvelope, reason: ValidationError) {
        self.entries.push_back(DeadLetter {
            envelope,
            reason,
        });
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Returns the currently retained dead letters, oldest first.
    #[must_use]
    pub fn entries(&self) -> &VecDeque<DeadLetter> {
        &self.entries
    }

    /// Returns the number of dead letters currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no dead letters are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DeadLetterQueue {
    fn default() -> Self {
        Self::new(DEFAULT_DEAD_LETTER_CAPACITY)
    }
}
