// prediction-ingestion/src/sink/log.rs
// ============================================================================
// Module: Log Training Record Sink
// Description: Log-only sink writing one JSON line per appended record.
// Purpose: Observability fan-out with no external dependency.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! [`LogSink`] writes a JSON record for each appended training record and
//! never fails delivery downstream of this crate; it is the default sink
//! for development and tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use serde_json::json;

use prediction_core::core::ModelType;
use prediction_training::RawRecord;

use crate::sink::SinkError;
use crate::sink::TrainingRecordSink;

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// Log-only training record sink.
pub struct LogSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> LogSink<W> {
    /// Creates a log sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> TrainingRecordSink for LogSink<W> {
    fn deliver(&self, model_type: ModelType, record: &RawRecord) -> Result<(), SinkError> {
        let line = json!({
            "model_type": model_type.to_string(),
            "sort_key": record.sort_key,
            "row": record.row,
        });
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| SinkError::LogWriteFailed("log writer mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, &line)
            .map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| SinkError::LogWriteFailed(err.to_string()))?;
        Ok(())
    }
}
