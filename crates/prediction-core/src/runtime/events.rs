// prediction-core/src/runtime/events.rs
// ============================================================================
// Module: Reference Event Publishers
// Description: Ready-to-use EventPublisher implementations for single-process
//              deployments, demos, and tests.
// Purpose: Give callers a default publisher that logs structured events, and
//          a recording publisher for assertions in test suites.
// Dependencies: crate::core::OperationalEvent, crate::interfaces::EventPublisher, tracing
// ============================================================================

//! ## Overview
//! Neither implementation here talks to an external broker: [`LoggingEventPublisher`]
//! emits a structured `tracing` event per [`OperationalEvent`], and
//! [`InMemoryEventPublisher`] records events in a `Vec` for assertions. A
//! production deployment wires a crate-specific publisher (message bus,
//! webhook) behind the same [`EventPublisher`] trait.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::OperationalEvent;
use crate::interfaces::EventPublishError;
use crate::interfaces::EventPublisher;

// ============================================================================
// SECTION: Logging Publisher
// ============================================================================

/// Publishes every event as a structured `tracing::info!` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    /// Creates a new logging publisher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventPublisher for LoggingEventPublisher {
    fn publish(&self, event: OperationalEvent) -> Result<(), EventPublishError> {
        match &event {
            OperationalEvent::PredictionCompleted(inner) => {
                tracing::info!(
                    event = "prediction_completed",
                    request_id = %inner.request_id,
                    model_type = %inner.model_type,
                    "prediction completed"
                );
            }
            OperationalEvent::ModelPromoted(inner) => {
                tracing::info!(
                    event = "model_promoted",
                    model_type = %inner.model_type,
                    new_version = %inner.new_version,
                    "model promoted"
                );
            }
            OperationalEvent::ModelRolledBack(inner) => {
                tracing::warn!(
                    event = "model_rolled_back",
                    model_type = %inner.model_type,
                    restored_version = %inner.restored_version,
                    reason = %inner.reason,
                    "model rolled back"
                );
            }
            OperationalEvent::DriftDetected(inner) => {
                tracing::warn!(
                    event = "drift_detected",
                    model_type = %inner.model_type,
                    relative_degradation = inner.relative_degradation,
                    rollback_eligible = inner.rollback_eligible,
                    "drift detected"
                );
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: In-Memory Publisher
// ============================================================================

/// Records every published event for later inspection. Intended for tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventPublisher {
    events: Arc<Mutex<Vec<OperationalEvent>>>,
}

impl InMemoryEventPublisher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every event published so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<OperationalEvent> {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl EventPublisher for InMemoryEventPublisher {
    fn publish(&self, event: OperationalEvent) -> Result<(), EventPublishError> {
        self.events.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(event);
        Ok(())
    }
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
    use crate::core::ModelPromoted;
    use crate::core::ModelType;
    use crate::core::ModelVersion;
    use crate::core::Timestamp;

    #[test]
    fn in_memory_publisher_records_events_in_order() {
        let publisher = InMemoryEventPublisher::new();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        publisher
            .publish(OperationalEvent::ModelPromoted(ModelPromoted {
                model_type: ModelType::PrintTime,
                new_version: ModelVersion::initial(),
                old_version: None,
                timestamp: now,
            }))
            .unwrap();
        assert_eq!(publisher.events().len(), 1);
    }

    #[test]
    fn logging_publisher_never_errors() {
        let publisher = LoggingEventPublisher::new();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let result = publisher.publish(OperationalEvent::ModelPromoted(ModelPromoted {
            model_type: ModelType::PrintTime,
            new_version: ModelVersion::initial(),
            old_version: None,
            timestamp: now,
        }));
        assert!(result.is_ok());
    }
}
