// prediction-store-sqlite/src/registry.rs
// ============================================================================
// Module: SQLite Model Registry
// Description: Durable ModelRegistry backed by SQLite.
// Purpose: Persist model records and enforce invariants M1-M3 (spec §4.1)
//          inside a single transaction per write.
// Dependencies: prediction-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Mirrors [`prediction_core::runtime::InMemoryModelRegistry`]'s semantics
//! over a durable backend: one row per model, a `UNIQUE(model_type,
//! version_major, version_minor, version_patch)` constraint enforcing
//! Invariant M2, and a transaction-scoped re-check of the Active count
//! enforcing Invariant M1 on every transition into `Active`. The full
//! [`prediction_core::core::Model`] is stored as a canonical JSON blob;
//! `model_type`/`version`/`status`/`trained_at` are duplicated into real
//! columns so lookups and ordering don't require deserializing every row.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::OptionalExtension;
use rusqlite::params;

use prediction_core::core::Model;
use prediction_core::core::ModelId;
use prediction_core::core::ModelMetadata;
use prediction_core::core::ModelStatus;
use prediction_core::core::ModelType;
use prediction_core::core::ModelVersion;
use prediction_core::core::Timestamp;
use prediction_core::interfaces::ModelRegistry;
use prediction_core::interfaces::RegistryError;

use crate::store::SqliteStoreConfig;
use crate::store::SqliteStoreError;
use crate::store::open_store;

// ============================================================================
// SECTION: Error Conversion
// ============================================================================

impl From<SqliteStoreError> for RegistryError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Store(format!("corrupt row: {message}")),
            SqliteStoreError::Invalid(message) => Self::Store(format!("invalid: {message}")),
            SqliteStoreError::NotFound(message) => Self::NotFound(ModelId::new(message)),
            SqliteStoreError::Conflict(message) => Self::Store(format!("conflict: {message}")),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed [`ModelRegistry`].
#[derive(Clone)]
pub struct SqliteModelRegistry {
    connection: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteModelRegistry {
    /// Opens (and, if needed, creates) a registry backed by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// its schema initialized.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = open_store(config)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>, RegistryError> {
        self.connection.lock().map_err(|_| Self::poisoned())
    }

    fn poisoned() -> RegistryError {
        RegistryError::Store("model registry connection mutex poisoned".to_string())
    }
}

impl ModelRegistry for SqliteModelRegistry {
    fn get_active(&self, model_type: ModelType) -> Result<Option<Model>, RegistryError> {
        let guard = self.lock()?;
        let mut rows = Vec::new();
        {
            let mut statement = guard
                .prepare(
                    "SELECT record_json FROM models WHERE model_type = ?1 AND status = 'active'",
                )
                .map_err(|err| RegistryError::Store(err.to_string()))?;
            let mapped = statement
                .query_map(params![model_type.to_string()], |row| {
                    let bytes: Vec<u8> = row.get(0)?;
                    Ok(bytes)
                })
                .map_err(|err| RegistryError::Store(err.to_string()))?;
            for row in mapped {
                rows.push(row.map_err(|err| RegistryError::Store(err.to_string()))?);
            }
        }
        match rows.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(decode_model(single)?)),
            _ => Err(RegistryError::InvariantViolation(
                "M1",
                format!("more than one Active model for {model_type}"),
            )),
        }
    }

    fn get_by_id(&self, id: &ModelId) -> Result<Model, RegistryError> {
        let guard = self.lock()?;
        let bytes: Option<Vec<u8>> = guard
            .query_row(
                "SELECT record_json FROM models WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| RegistryError::Store(err.to_string()))?;
        let bytes = bytes.ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        decode_model(&bytes)
    }

    fn list_versions(
        &self,
        model_type: ModelType,
        status: Option<ModelStatus>,
    ) -> Result<Vec<Model>, RegistryError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT record_json FROM models WHERE model_type = ?1
                 ORDER BY version_major DESC, version_minor DESC, version_patch DESC",
            )
            .map_err(|err| RegistryError::Store(err.to_string()))?;
        let mapped = statement
            .query_map(params![model_type.to_string()], |row| {
                let bytes: Vec<u8> = row.get(0)?;
                Ok(bytes)
            })
            .map_err(|err| RegistryError::Store(err.to_string()))?;
        let mut models = Vec::new();
        for row in mapped {
            let bytes = row.map_err(|err| RegistryError::Store(err.to_string()))?;
            let model = decode_model(&bytes)?;
            if status.is_none_or(|s| model.status == s) {
                models.push(model);
            }
        }
        Ok(models)
    }

    fn save(&self, model: Model) -> Result<(), RegistryError> {
        let guard = self.lock()?;
        let record_json =
            serde_json::to_vec(&model).map_err(|err| RegistryError::Store(err.to_string()))?;
        let result = guard.execute(
            "INSERT INTO models (
                id, model_type, version_major, version_minor, version_patch,
                status, trained_at, record_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                model.id.as_str(),
                model.model_type.to_string(),
                model.version.major,
                model.version.minor,
                model.version.patch,
                status_label(model.status),
                model.trained_at.to_string(),
                record_json,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(RegistryError::DuplicateVersion(model.model_type, model.version))
            }
            Err(err) => Err(RegistryError::Store(err.to_string())),
        }
    }

    fn transition(
        &self,
        id: &ModelId,
        from: ModelStatus,
        to: ModelStatus,
        now: Timestamp,
        _reason: Option<&str>,
    ) -> Result<(), RegistryError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| RegistryError::Store(err.to_string()))?;
        let bytes: Option<Vec<u8>> = tx
            .query_row(
                "SELECT record_json FROM models WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| RegistryError::Store(err.to_string()))?;
        let bytes = bytes.ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let mut model = decode_model(&bytes)?;

        if model.status != from {
            return Err(RegistryError::LifecycleConflict(model.status, to));
        }

        if to == ModelStatus::Active {
            let active_count: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM models WHERE model_type = ?1 AND status = 'active' \
                     AND id != ?2",
                    params![model.model_type.to_string(), id.as_str()],
                    |row| row.get(0),
                )
                .map_err(|err| RegistryError::Store(err.to_string()))?;
            if active_count > 0 {
                return Err(RegistryError::InvariantViolation(
                    "M1",
                    format!("{} already has an Active model", model.model_type),
                ));
            }

            let max_existing: Option<(u32, u32, u32)> = tx
                .query_row(
                    "SELECT version_major, version_minor, version_patch FROM models \
                     WHERE model_type = ?1 AND id != ?2 \
                     ORDER BY version_major DESC, version_minor DESC, version_patch DESC LIMIT 1",
                    params![model.model_type.to_string(), id.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
                .map_err(|err| RegistryError::Store(err.to_string()))?;
            if let Some((major, minor, patch)) = max_existing {
                let max_existing = ModelVersion::new(major, minor, patch);
                if model.version < max_existing {
                    return Err(RegistryError::InvariantViolation(
                        "M3",
                        format!("candidate version {} is below existing version {max_existing} for {}", model.version, model.model_type),
                    ));
                }
            }
        }

        model.status = to;
        match to {
            ModelStatus::Active => model.deployed_at = Some(now),
            ModelStatus::Deprecated => model.deprecated_at = Some(now),
            ModelStatus::Archived | ModelStatus::Draft | ModelStatus::Testing => {}
        }
        if to == ModelStatus::Testing && from == ModelStatus::Draft {
            model.metadata.quality_gate_rejection_reason = None;
        }

        let record_json =
            serde_json::to_vec(&model).map_err(|err| RegistryError::Store(err.to_string()))?;
        tx.execute(
            "UPDATE models SET status = ?1, record_json = ?2 WHERE id = ?3",
            params![status_label(to), record_json, id.as_str()],
        )
        .map_err(|err| RegistryError::Store(err.to_string()))?;
        tx.commit().map_err(|err| RegistryError::Store(err.to_string()))
    }

    fn update_metadata(&self, id: &ModelId, metadata: ModelMetadata) -> Result<(), RegistryError> {
        let guard = self.lock()?;
        let bytes: Option<Vec<u8>> = guard
            .query_row(
                "SELECT record_json FROM models WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| RegistryError::Store(err.to_string()))?;
        let bytes = bytes.ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        let mut model = decode_model(&bytes)?;
        model.metadata = metadata;
        let record_json =
            serde_json::to_vec(&model).map_err(|err| RegistryError::Store(err.to_string()))?;
        guard
            .execute(
                "UPDATE models SET record_json = ?1 WHERE id = ?2",
                params![record_json, id.as_str()],
            )
            .map_err(|err| RegistryError::Store(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn status_label(status: ModelStatus) -> &'static str {
    match status {
        ModelStatus::Draft => "draft",
        ModelStatus::Testing => "testing",
        ModelStatus::Active => "active",
        ModelStatus::Deprecated => "deprecated",
        ModelStatus::Archived => "archived",
    }
}

fn decode_model(bytes: &[u8]) -> Result<Model, RegistryError> {
    serde_json::from_slice(bytes)
        .map_err(|err| RegistryError::Store(format!("corrupt model record: {err}")))
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
    use prediction_core::core::MetricBundleV1;
    use prediction_core::core::ModelVersion;
    use prediction_core::core::PerformanceMetrics;

    fn open_temp() -> (tempfile::TempDir, SqliteModelRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let config = SqliteStoreConfig {
            path: dir.path().join("models.db"),
            busy_timeout_ms: 5_000,
            journal_mode: crate::store::SqliteStoreMode::Wal,
            sync_mode: crate::store::SqliteSyncMode::Full,
        };
        let registry = SqliteModelRegistry::open(&config).unwrap();
        (dir, registry)
    }

    fn model(id: &str, model_type: ModelType, version: ModelVersion, now: Timestamp) -> Model {
        Model {
            id: ModelId::new(id),
            model_type,
            version,
            status: ModelStatus::Draft,
            artifact_uri: format!("local://{id}"),
            trained_at: now,
            deployed_at: None,
            deprecated_at: None,
            metrics: MetricBundleV1::new(PerformanceMetrics::default()),
            training_job_id: None,
            metadata: ModelMetadata::default(),
        }
    }

    #[test]
    fn duplicate_version_rejected() {
        let (_dir, registry) = open_temp();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        registry.save(model("m1", ModelType::PrintTime, ModelVersion::initial(), now)).unwrap();
        let err = registry
            .save(model("m2", ModelType::PrintTime, ModelVersion::initial(), now))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateVersion(_, _)));
    }

    #[test]
    fn transition_requires_matching_from_state() {
        let (_dir, registry) = open_temp();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let m1 = model("m1", ModelType::PrintTime, ModelVersion::initial(), now);
        registry.save(m1.clone()).unwrap();
        let err = registry
            .transition(&m1.id, ModelStatus::Active, ModelStatus::Deprecated, now, None)
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::LifecycleConflict(ModelStatus::Draft, ModelStatus::Deprecated)
        ));
    }

    #[test]
    fn only_one_active_model_per_type() {
        let (_dir, registry) = open_temp();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let m1 = model("m1", ModelType::PrintTime, ModelVersion::initial(), now);
        let m2 = model("m2", ModelType::PrintTime, ModelVersion::new(1, 1, 0), now);
        registry.save(m1.clone()).unwrap();
        registry.save(m2.clone()).unwrap();
        registry.transition(&m1.id, ModelStatus::Draft, ModelStatus::Testing, now, None).unwrap();
        registry.transition(&m1.id, ModelStatus::Testing, ModelStatus::Active, now, None).unwrap();
        registry.transition(&m2.id, ModelStatus::Draft, ModelStatus::Testing, now, None).unwrap();
        let err = registry
            .transition(&m2.id, ModelStatus::Testing, ModelStatus::Active, now, None)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvariantViolation("M1", _)));

        registry.transition(&m1.id, ModelStatus::Active, ModelStatus::Deprecated, now, None).unwrap();
        registry.transition(&m2.id, ModelStatus::Testing, ModelStatus::Active, now, None).unwrap();
        let active = registry.get_active(ModelType::PrintTime).unwrap().unwrap();
        assert_eq!(active.id, m2.id);
    }

    #[test]
    fn transition_to_active_rejects_a_non_monotonic_version() {
        let (_dir, registry) = open_temp();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let newer = model("m1", ModelType::PrintTime, ModelVersion::new(2, 0, 0), now);
        registry.save(newer.clone()).unwrap();
        registry.transition(&newer.id, ModelStatus::Draft, ModelStatus::Testing, now, None).unwrap();
        registry.transition(&newer.id, ModelStatus::Testing, ModelStatus::Active, now, None).unwrap();
        registry.transition(&newer.id, ModelStatus::Active, ModelStatus::Deprecated, now, None).unwrap();

        let older = model("m2", ModelType::PrintTime, ModelVersion::new(1, 0, 0), now);
        registry.save(older.clone()).unwrap();
        registry.transition(&older.id, ModelStatus::Draft, ModelStatus::Testing, now, None).unwrap();
        let err = registry
            .transition(&older.id, ModelStatus::Testing, ModelStatus::Active, now, None)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvariantViolation("M3", _)));
    }

    #[test]
    fn list_versions_orders_descending() {
        let (_dir, registry) = open_temp();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        registry
            .save(model("m1", ModelType::DemandForecast, ModelVersion::new(1, 0, 0), now))
            .unwrap();
        registry
            .save(model("m2", ModelType::DemandForecast, ModelVersion::new(2, 0, 0), now))
            .unwrap();
        let versions = registry.list_versions(ModelType::DemandForecast, None).unwrap();
        assert_eq!(versions[0].id.as_str(), "m2");
        assert_eq!(versions[1].id.as_str(), "m1");
    }
}
