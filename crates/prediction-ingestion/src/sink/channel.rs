// prediction-ingestion/src/sink/channel.rs
// ============================================================================
// Module: Channel Training Record Sink
// Description: Channel-based sink for asynchronous fan-out consumers.
// Purpose: Send appended records through a Tokio mpsc channel.
// Dependencies: prediction-core, prediction-training, tokio
// ============================================================================

//! ## Overview
//! [`ChannelSink`] delivers records by sending them into a
//! `tokio::sync::mpsc` channel, so an async consumer (a metrics exporter, a
//! downstream queue publisher) can read appended records without blocking
//! the ingestion pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tokio::sync::mpsc::Sender;

use prediction_core::core::ModelType;
use prediction_training::RawRecord;

use crate::sink::SinkError;
use crate::sink::TrainingRecordSink;

// ============================================================================
// SECTION: Channel Sink
// ============================================================================

/// One record delivered through a [`ChannelSink`].
#[derive(Debug, Clone)]
pub struct AppendedRecord {
    /// The model type the record was appended for.
    pub model_type: ModelType,
    /// The appended record.
    pub record: RawRecord,
}

/// Channel-based training record sink.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Sender<AppendedRecord>,
}

impl ChannelSink {
    /// Creates a channel sink delivering through `sender`.
    #[must_use]
    pub fn new(sender: Sender<AppendedRecord>) -> Self {
        Self {
            sender,
        }
    }
}

impl TrainingRecordSink for ChannelSink {
    fn deliver(&self, model_type: ModelType, record: &RawRecord) -> Result<(), SinkError> {
        let message = AppendedRecord {
            model_type,
            record: record.clone(),
        };
        self.sender.try_send(message).map_err(|err| SinkError::DeliveryFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
    use super::*;

    #[test]
    fn delivers_a_record_into_the_channel() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let sink = ChannelSink::new(tx);
        sink.deliver(
            ModelType::MaterialDemand,
            &RawRecord {
                sort_key: "1".to_string(),
                row: serde_json::json!({}),
            },
        )
        .unwrap();
        let received = rx.try_recv().unwrap();
        assert_eq!(received.model_type, ModelType::MaterialDemand);
    }

    #[test]
    fn reports_delivery_failure_once_the_channel_is_full() {
        let (tx, _rx) = tokio::sync::mpsc::channel(1);
        let sink = ChannelSink::new(tx);
        let record = RawRecord {
            sort_key: "1".to_string(),
            row: serde_json::json!({}),
        };
        sink.deliver(ModelType::MaterialDemand, &record).unwrap();
        let err = sink.deliver(ModelType::MaterialDemand, &record).unwrap_err();
        assert!(matches!(err, SinkError::DeliveryFailed(_)));
    }
}
