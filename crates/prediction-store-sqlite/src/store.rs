// prediction-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Connection and Schema
// Description: Shared configuration, connection setup, and schema creation
//              for the model registry, training, and audit stores.
// Purpose: Give every store in this crate the same durability posture
//          (WAL, busy timeout, foreign keys) and one idempotent schema
//          initializer so construction order between stores never matters.
// Dependencies: rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! All four stores in this crate ([`crate::registry::SqliteModelRegistry`],
//! [`crate::training::SqliteTrainingDatasetStore`],
//! [`crate::training::SqliteTrainingJobStore`],
//! [`crate::audit::SqliteAuditSink`]) may share one database file or each
//! use their own; [`initialize_schema`] creates every table with
//! `CREATE TABLE IF NOT EXISTS`, so opening any store against a fresh file
//! always leaves the whole schema present regardless of which store opens
//! first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for this crate's tables.
pub(crate) const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended; allows concurrent readers).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced; safe under WAL).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration shared by every store in this crate.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors, shared by every store implementation in this
/// crate and converted into each interface's own error enum at the trait
/// boundary.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// A row could not be decoded back into its typed record.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Invalid store configuration or input.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// The requested record does not exist.
    #[error("sqlite store record not found: {0}")]
    NotFound(String),
    /// A uniqueness or invariant constraint was violated.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Opens an `SQLite` connection with secure, durable defaults and ensures
/// this crate's schema exists.
///
/// # Errors
///
/// Returns [`SqliteStoreError`] when the path is invalid, the database
/// cannot be opened, or the schema cannot be created.
pub(crate) fn open_store(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    validate_store_path(&config.path)?;
    ensure_parent_dir(&config.path)?;
    let connection = open_connection(config)?;
    initialize_schema(&connection)?;
    Ok(connection)
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Opens an `SQLite` connection with the configured pragmas applied.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Creates every table this crate owns, if not already present.
fn initialize_schema(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);

             CREATE TABLE IF NOT EXISTS models (
                id TEXT PRIMARY KEY,
                model_type TEXT NOT NULL,
                version_major INTEGER NOT NULL,
                version_minor INTEGER NOT NULL,
                version_patch INTEGER NOT NULL,
                status TEXT NOT NULL,
                trained_at TEXT NOT NULL,
                record_json BLOB NOT NULL,
                UNIQUE (model_type, version_major, version_minor, version_patch)
             );
             CREATE INDEX IF NOT EXISTS idx_models_type_status
                ON models (model_type, status);

             CREATE TABLE IF NOT EXISTS training_datasets (
                id TEXT PRIMARY KEY,
                model_type TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                record_json BLOB NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_training_datasets_hash
                ON training_datasets (content_hash);

             CREATE TABLE IF NOT EXISTS training_jobs (
                id TEXT PRIMARY KEY,
                model_type TEXT NOT NULL,
                started_at TEXT NOT NULL,
                record_json BLOB NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_training_jobs_type
                ON training_jobs (model_type, started_at);

             CREATE TABLE IF NOT EXISTS prediction_audit_log (
                id TEXT PRIMARY KEY,
                model_type TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                record_json BLOB NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_audit_log_type_time
                ON prediction_audit_log (model_type, timestamp);",
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;

    let version: Option<i64> = connection
        .query_row("SELECT version FROM store_meta LIMIT 1", [], |row| row.get(0))
        .ok();
    if version.is_none() {
        connection
            .execute("INSERT INTO store_meta (version) VALUES (?1)", [SCHEMA_VERSION])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    }
    Ok(())
}
