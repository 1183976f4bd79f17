// prediction-store-sqlite/src/audit.rs
// ============================================================================
// Module: SQLite Audit Sink
// Description: Durable AuditSink backed by SQLite.
// Purpose: Persist one immutable entry per prediction attempt (Invariant
//          A1, property P6) and allow later feedback attachment.
// Dependencies: prediction-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Mirrors [`crate::registry::SqliteModelRegistry`]'s storage shape: one
//! row per entry, `model_type`/`timestamp` duplicated into real columns for
//! ordering, the full [`PredictionAuditLog`] kept as a canonical JSON blob.
//! `record_feedback` is the only mutation this store performs; every other
//! write is append-only, matching the audit log's immutability contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::OptionalExtension;
use rusqlite::params;
use serde_json::Value;

use prediction_core::core::AuditLogId;
use prediction_core::core::PredictionAuditLog;
use prediction_core::core::Timestamp;
use prediction_core::interfaces::AuditError;
use prediction_core::interfaces::AuditSink;

use crate::store::SqliteStoreConfig;
use crate::store::SqliteStoreError;
use crate::store::open_store;

// ============================================================================
// SECTION: Error Conversion
// ============================================================================

impl From<SqliteStoreError> for AuditError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message)
            | SqliteStoreError::Db(message)
            | SqliteStoreError::Corrupt(message)
            | SqliteStoreError::Invalid(message)
            | SqliteStoreError::NotFound(message)
            | SqliteStoreError::Conflict(message) => Self::Store(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed [`AuditSink`].
#[derive(Clone)]
pub struct SqliteAuditSink {
    connection: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteAuditSink {
    /// Opens (and, if needed, creates) an audit sink backed by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// its schema initialized.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = open_store(config)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>, AuditError> {
        self.connection
            .lock()
            .map_err(|_| AuditError::Store("audit sink connection mutex poisoned".to_string()))
    }
}

impl AuditSink for SqliteAuditSink {
    fn append(&self, entry: PredictionAuditLog) -> Result<AuditLogId, AuditError> {
        let guard = self.lock()?;
        let id = entry.id.clone();
        let record_json =
            serde_json::to_vec(&entry).map_err(|err| AuditError::Store(err.to_string()))?;
        guard
            .execute(
                "INSERT INTO prediction_audit_log (id, model_type, timestamp, record_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id.as_str(),
                    entry.model_type.to_string(),
                    entry.timestamp.to_string(),
                    record_json,
                ],
            )
            .map_err(|err| AuditError::Store(err.to_string()))?;
        Ok(id)
    }

    fn record_feedback(
        &self,
        id: &AuditLogId,
        actual_outcome: Value,
        received_at: Timestamp,
    ) -> Result<(), AuditError> {
        let guard = self.lock()?;
        let bytes: Option<Vec<u8>> = guard
            .query_row(
                "SELECT record_json FROM prediction_audit_log WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| AuditError::Store(err.to_string()))?;
        let bytes = bytes
            .ok_or_else(|| AuditError::Store(format!("audit log entry not found: {id}")))?;
        let mut entry: PredictionAuditLog = serde_json::from_slice(&bytes)
            .map_err(|err| AuditError::Store(format!("corrupt audit log record: {err}")))?;
        entry.actual_outcome = Some(actual_outcome);
        entry.outcome_received_at = Some(received_at);
        let record_json =
            serde_json::to_vec(&entry).map_err(|err| AuditError::Store(err.to_string()))?;
        guard
            .execute(
                "UPDATE prediction_audit_log SET record_json = ?1 WHERE id = ?2",
                params![record_json, id.as_str()],
            )
            .map_err(|err| AuditError::Store(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

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
    use prediction_core::core::CacheStatus;
    use prediction_core::core::ModelType;
    use prediction_core::core::RequestId;

    fn open_temp() -> (tempfile::TempDir, SqliteAuditSink) {
        let dir = tempfile::tempdir().unwrap();
        let config = SqliteStoreConfig {
            path: dir.path().join("audit.db"),
            busy_timeout_ms: 5_000,
            journal_mode: crate::store::SqliteStoreMode::Wal,
            sync_mode: crate::store::SqliteSyncMode::Full,
        };
        let sink = SqliteAuditSink::open(&config).unwrap();
        (dir, sink)
    }

    fn entry(now: Timestamp) -> PredictionAuditLog {
        PredictionAuditLog {
            id: AuditLogId::new("a1"),
            request_id: RequestId::new("r1"),
            model_type: ModelType::PrintTime,
            model_version: None,
            input_features: Value::Null,
            output_prediction: None,
            confidence: None,
            response_ms: 12,
            cache_status: CacheStatus::Miss,
            user_id: None,
            tenant_id: None,
            timestamp: now,
            actual_outcome: None,
            outcome_received_at: None,
            error: None,
        }
    }

    #[test]
    fn append_then_feedback_round_trips() {
        let (_dir, sink) = open_temp();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let id = sink.append(entry(now)).unwrap();
        sink.record_feedback(&id, Value::Bool(true), now).unwrap();
    }

    #[test]
    fn feedback_on_unknown_id_errors() {
        let (_dir, sink) = open_temp();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let err = sink.record_feedback(&AuditLogId::new("missing"), Value::Null, now).unwrap_err();
        assert!(matches!(err, AuditError::Store(_)));
    }
}
