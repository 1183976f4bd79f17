// prediction-store-sqlite/src/training.rs
// ============================================================================
// Module: SQLite Training Dataset and Job Stores
// Description: Durable TrainingDatasetStore and TrainingJobStore backed by
//              SQLite.
// Purpose: Persist immutable dataset snapshots (Invariant D1/D2) and job
//          progress records for the training orchestrator.
// Dependencies: prediction-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Two independent stores sharing one schema file, following
//! [`crate::registry::SqliteModelRegistry`]'s JSON-blob-plus-indexed-columns
//! pattern. [`SqliteTrainingDatasetStore::find_by_content_hash`] is the
//! dedup lookup the training orchestrator consults before building a new
//! snapshot (spec §4.5 step 2, Invariant D2).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use rusqlite::OptionalExtension;
use rusqlite::params;

use prediction_core::core::DatasetId;
use prediction_core::core::Fingerprint;
use prediction_core::core::ModelType;
use prediction_core::core::TrainingDataset;
use prediction_core::core::TrainingJob;
use prediction_core::core::TrainingJobId;
use prediction_core::interfaces::DatasetStoreError;
use prediction_core::interfaces::JobStoreError;
use prediction_core::interfaces::TrainingDatasetStore;
use prediction_core::interfaces::TrainingJobStore;

use crate::store::SqliteStoreConfig;
use crate::store::SqliteStoreError;
use crate::store::open_store;

// ============================================================================
// SECTION: Error Conversion
// ============================================================================

impl From<SqliteStoreError> for DatasetStoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::NotFound(message) => Self::NotFound(DatasetId::new(message)),
            SqliteStoreError::Io(message)
            | SqliteStoreError::Db(message)
            | SqliteStoreError::Corrupt(message)
            | SqliteStoreError::Invalid(message)
            | SqliteStoreError::Conflict(message) => Self::Store(message),
        }
    }
}

impl From<SqliteStoreError> for JobStoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::NotFound(message) => Self::NotFound(TrainingJobId::new(message)),
            SqliteStoreError::Io(message)
            | SqliteStoreError::Db(message)
            | SqliteStoreError::Corrupt(message)
            | SqliteStoreError::Invalid(message)
            | SqliteStoreError::Conflict(message) => Self::Store(message),
        }
    }
}

// ============================================================================
// SECTION: Training Dataset Store
// ============================================================================

/// `SQLite`-backed [`TrainingDatasetStore`].
#[derive(Clone)]
pub struct SqliteTrainingDatasetStore {
    connection: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteTrainingDatasetStore {
    /// Opens (and, if needed, creates) a dataset store backed by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// its schema initialized.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = open_store(config)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>, DatasetStoreError> {
        self.connection
            .lock()
            .map_err(|_| DatasetStoreError::Store("dataset store connection mutex poisoned".to_string()))
    }
}

impl TrainingDatasetStore for SqliteTrainingDatasetStore {
    fn find_by_content_hash(
        &self,
        content_hash: &Fingerprint,
    ) -> Result<Option<TrainingDataset>, DatasetStoreError> {
        let guard = self.lock()?;
        let bytes: Option<Vec<u8>> = guard
            .query_row(
                "SELECT record_json FROM training_datasets WHERE content_hash = ?1",
                params![content_hash.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| DatasetStoreError::Store(err.to_string()))?;
        bytes.map(|bytes| decode_dataset(&bytes)).transpose()
    }

    fn save(&self, dataset: TrainingDataset) -> Result<(), DatasetStoreError> {
        let guard = self.lock()?;
        let record_json = serde_json::to_vec(&dataset)
            .map_err(|err| DatasetStoreError::Store(err.to_string()))?;
        guard
            .execute(
                "INSERT INTO training_datasets (
                    id, model_type, content_hash, created_at, record_json
                 ) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    dataset.id.as_str(),
                    dataset.model_type.to_string(),
                    dataset.content_hash.as_str(),
                    dataset.created_at.to_string(),
                    record_json,
                ],
            )
            .map_err(|err| DatasetStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn get(&self, id: &DatasetId) -> Result<TrainingDataset, DatasetStoreError> {
        let guard = self.lock()?;
        let bytes: Option<Vec<u8>> = guard
            .query_row(
                "SELECT record_json FROM training_datasets WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| DatasetStoreError::Store(err.to_string()))?;
        let bytes = bytes.ok_or_else(|| DatasetStoreError::NotFound(id.clone()))?;
        decode_dataset(&bytes)
    }
}

fn decode_dataset(bytes: &[u8]) -> Result<TrainingDataset, DatasetStoreError> {
    serde_json::from_slice(bytes)
        .map_err(|err| DatasetStoreError::Store(format!("corrupt dataset record: {err}")))
}

// ============================================================================
// SECTION: Training Job Store
// ============================================================================

/// `SQLite`-backed [`TrainingJobStore`].
#[derive(Clone)]
pub struct SqliteTrainingJobStore {
    connection: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteTrainingJobStore {
    /// Opens (and, if needed, creates) a job store backed by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// its schema initialized.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = open_store(config)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>, JobStoreError> {
        self.connection
            .lock()
            .map_err(|_| JobStoreError::Store("training job store connection mutex poisoned".to_string()))
    }
}

impl TrainingJobStore for SqliteTrainingJobStore {
    fn save(&self, job: TrainingJob) -> Result<(), JobStoreError> {
        let guard = self.lock()?;
        let record_json =
            serde_json::to_vec(&job).map_err(|err| JobStoreError::Store(err.to_string()))?;
        guard
            .execute(
                "INSERT INTO training_jobs (
                    id, model_type, started_at, record_json
                 ) VALUES (?1, ?2, ?3, ?4)",
                params![
                    job.id.as_str(),
                    job.model_type.to_string(),
                    job.started_at.to_string(),
                    record_json,
                ],
            )
            .map_err(|err| JobStoreError::Store(err.to_string()))?;
        Ok(())
    }

    fn update(&self, job: TrainingJob) -> Result<(), JobStoreError> {
        let guard = self.lock()?;
        let record_json =
            serde_json::to_vec(&job).map_err(|err| JobStoreError::Store(err.to_string()))?;
        let rows = guard
            .execute(
                "UPDATE training_jobs SET record_json = ?1 WHERE id = ?2",
                params![record_json, job.id.as_str()],
            )
            .map_err(|err| JobStoreError::Store(err.to_string()))?;
        if rows == 0 {
            return Err(JobStoreError::NotFound(job.id));
        }
        Ok(())
    }

    fn get(&self, id: &TrainingJobId) -> Result<TrainingJob, JobStoreError> {
        let guard = self.lock()?;
        let bytes: Option<Vec<u8>> = guard
            .query_row(
                "SELECT record_json FROM training_jobs WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| JobStoreError::Store(err.to_string()))?;
        let bytes = bytes.ok_or_else(|| JobStoreError::NotFound(id.clone()))?;
        decode_job(&bytes)
    }

    fn list_for_type(&self, model_type: ModelType) -> Result<Vec<TrainingJob>, JobStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT record_json FROM training_jobs WHERE model_type = ?1
                 ORDER BY started_at DESC",
            )
            .map_err(|err| JobStoreError::Store(err.to_string()))?;
        let mapped = statement
            .query_map(params![model_type.to_string()], |row| {
                let bytes: Vec<u8> = row.get(0)?;
                Ok(bytes)
            })
            .map_err(|err| JobStoreError::Store(err.to_string()))?;
        let mut jobs = Vec::new();
        for row in mapped {
            let bytes = row.map_err(|err| JobStoreError::Store(err.to_string()))?;
            jobs.push(decode_job(&bytes)?);
        }
        Ok(jobs)
    }
}

fn decode_job(bytes: &[u8]) -> Result<TrainingJob, JobStoreError> {
    serde_json::from_slice(bytes)
        .map_err(|err| JobStoreError::Store(format!("corrupt training job record: {err}")))
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
    use prediction_core::core::DataQualityReport;
    use prediction_core::core::Timestamp;
    use prediction_core::core::TrainingJobStatus;
    use prediction_core::core::TrainingTrigger;

    fn temp_config(name: &str) -> (tempfile::TempDir, SqliteStoreConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = SqliteStoreConfig {
            path: dir.path().join(name),
            busy_timeout_ms: 5_000,
            journal_mode: crate::store::SqliteStoreMode::Wal,
            sync_mode: crate::store::SqliteSyncMode::Full,
        };
        (dir, config)
    }

    fn dataset(id: &str, hash: &Fingerprint, now: Timestamp) -> TrainingDataset {
        TrainingDataset {
            id: DatasetId::new(id),
            model_type: ModelType::PrintTime,
            record_count: 10_000,
            date_range_start: now,
            date_range_end: now,
            feature_columns: vec!["volume_mm3".to_string()],
            target_column: "minutes".to_string(),
            data_quality_report: DataQualityReport::default(),
            storage_uri: format!("local://datasets/{id}"),
            content_hash: hash.clone(),
            created_at: now,
        }
    }

    #[test]
    fn find_by_content_hash_dedups() {
        let (_dir, config) = temp_config("datasets.db");
        let store = SqliteTrainingDatasetStore::open(&config).unwrap();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let hash = prediction_core::core::fingerprint_bytes(b"dataset-one");
        store.save(dataset("d1", &hash, now)).unwrap();
        let found = store.find_by_content_hash(&hash).unwrap().unwrap();
        assert_eq!(found.id.as_str(), "d1");
        let other_hash = prediction_core::core::fingerprint_bytes(b"dataset-two");
        let missing = store.find_by_content_hash(&other_hash).unwrap();
        assert!(missing.is_none());
    }

    fn job(id: &str, now: Timestamp) -> TrainingJob {
        TrainingJob {
            id: TrainingJobId::new(id),
            model_type: ModelType::PrintTime,
            status: TrainingJobStatus::Running,
            started_at: now,
            ended_at: None,
            dataset_id: DatasetId::new("d1"),
            model_id: None,
            trigger: TrainingTrigger::Manual,
            hyperparameters: Vec::new(),
            metrics: None,
            error: None,
        }
    }

    #[test]
    fn update_unknown_job_errors() {
        let (_dir, config) = temp_config("jobs.db");
        let store = SqliteTrainingJobStore::open(&config).unwrap();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let err = store.update(job("missing", now)).unwrap_err();
        assert!(matches!(err, JobStoreError::NotFound(_)));
    }

    #[test]
    fn save_then_list_orders_newest_first() {
        let (_dir, config) = temp_config("jobs2.db");
        let store = SqliteTrainingJobStore::open(&config).unwrap();
        let t0 = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let t1 = t0.plus_seconds(60);
        store.save(job("j1", t0)).unwrap();
        store.save(job("j2", t1)).unwrap();
        let jobs = store.list_for_type(ModelType::PrintTime).unwrap();
        assert_eq!(jobs[0].id.as_str(), "j2");
        assert_eq!(jobs[1].id.as_str(), "j1");
    }
}
