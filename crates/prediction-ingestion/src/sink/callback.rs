// prediction-ingestion/src/sink/callback.rs
// ============================================================================
// Module: Callback Training Record Sink
// Description: Callback-based sink for synchronous, in-process delivery.
// Purpose: Let tests and small embedders observe appended records without
//          standing up a channel.
// Dependencies: prediction-core, prediction-training, std
// ============================================================================

//! ## Overview
//! [`CallbackSink`] invokes a user-supplied function for every delivered
//! record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use prediction_core::core::ModelType;
use prediction_training::RawRecord;

use crate::sink::SinkError;
use crate::sink::TrainingRecordSink;

// ============================================================================
// SECTION: Callback Sink
// ============================================================================

/// Callback handler signature used by [`CallbackSink`].
type CallbackHandler = dyn Fn(ModelType, &RawRecord) -> Result<(), SinkError> + Send + Sync;

/// Callback-based training record sink.
#[derive(Clone)]
pub struct CallbackSink {
    handler: Arc<CallbackHandler>,
}

impl CallbackSink {
    /// Creates a callback sink from a handler function.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(ModelType, &RawRecord) -> Result<(), SinkError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl TrainingRecordSink for CallbackSink {
    fn deliver(&self, model_type: ModelType, record: &RawRecord) -> Result<(), SinkError> {
        (self.handler)(model_type, record)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn invokes_the_handler_with_the_delivered_record() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sink = CallbackSink::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        sink.deliver(
            ModelType::ChurnPrediction,
            &RawRecord {
                sort_key: "1".to_string(),
                row: serde_json::json!({}),
            },
        )
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
