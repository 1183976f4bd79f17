// prediction-config/src/config.rs
// ============================================================================
// Module: Prediction Service Configuration
// Description: Configuration loading and validation for the prediction
//              service (spec §6 "Configuration").
// Purpose: Provide strict, fail-closed config parsing with hard limits,
//          following decision-gate-config's layered validation style.
// Dependencies: prediction-core, prediction-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file, with per-model-type overrides
//! expressed as nested tables (`[cache.ttl]`, `[training.min_dataset]`)
//! matching the dotted keys spec §6 names (`cache.ttl.<type>`,
//! `training.minDataset.<type>`). Missing or invalid configuration fails
//! closed: [`PredictionServiceConfig::load`] never returns a config that
//! has not passed [`PredictionServiceConfig::validate`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use prediction_core::ModelType;
use prediction_core::runtime::DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT;
use prediction_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::policy::FallbackPolicyConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "prediction-service.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "PREDICTION_SERVICE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Default maximum geometry payload size in bytes (spec §4.3, §6).
pub const DEFAULT_MAX_GEOMETRY_BYTES: u64 = 50 * 1024 * 1024;
/// Hard ceiling on the configurable geometry cap, to bound memory use.
pub const MAX_MAX_GEOMETRY_BYTES: u64 = 500 * 1024 * 1024;
/// Default batch submission size cap (spec §6).
pub const DEFAULT_BATCH_SIZE_CAP: usize = 100;
/// Hard ceiling on the configurable batch size cap.
pub const MAX_BATCH_SIZE_CAP: usize = 10_000;
/// Default external I/O call timeout in milliseconds (spec §5).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;
/// Minimum allowed external I/O call timeout in milliseconds.
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 10;
/// Maximum allowed external I/O call timeout in milliseconds.
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;
/// Default number of retry attempts for idempotent operations (spec §5).
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
/// Maximum configurable retry attempts.
pub const MAX_MAX_RETRY_ATTEMPTS: u32 = 10;
/// Default predictor memo capacity (spec §6 `predictor.cache.capacity`).
pub const DEFAULT_PREDICTOR_CACHE_CAPACITY: usize = 32;
/// Default drift relative degradation threshold (spec §6).
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.05;
/// Default drift evaluation window, in hours (spec §6).
pub const DEFAULT_DRIFT_WINDOW_HOURS: i64 = 24;
/// Default rate-limit budget: requests allowed per window.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 1_000;
/// Default rate-limit window, in milliseconds.
pub const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;

// ============================================================================
// SECTION: Top-Level Configuration
// ============================================================================

/// Root configuration for the prediction service (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionServiceConfig {
    /// Prediction cache configuration (spec §4.4, §6 `cache.ttl.<type>`).
    #[serde(default)]
    pub cache: CacheConfig,
    /// Training trigger and dataset configuration (spec §4.5, §6
    /// `training.minDataset.<type>`).
    #[serde(default)]
    pub training: TrainingConfig,
    /// Lifecycle quality-gate configuration (spec §4.2, §6
    /// `lifecycle.improvementThresholdPercent`).
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Drift monitor configuration (spec §4.9, §6 `drift.*`).
    #[serde(default)]
    pub drift: DriftConfig,
    /// Artifact store backend selection (spec §4.8, §6 `artifact.*`).
    #[serde(default)]
    pub artifact: ArtifactConfig,
    /// Predictor registry memo configuration (spec §6
    /// `predictor.cache.capacity`).
    #[serde(default)]
    pub predictor: PredictorConfig,
    /// Request size and timeout limits (spec §6).
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Rate-limit budgets (spec §6 "rate-limit budgets").
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Persistence configuration (spec §6 "Persisted state").
    #[serde(default)]
    pub storage: StorageConfig,
    /// Structured logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-type rule-based fallback policy (spec §7 `NoActiveModel`).
    #[serde(default)]
    pub fallback: FallbackPolicyConfig,
    /// Optional config source metadata (not serialized, set by `load`).
    #[serde(skip)]
    pub source_modified_at: Option<SystemTime>,
}

impl Default for PredictionServiceConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            training: TrainingConfig::default(),
            lifecycle: LifecycleConfig::default(),
            drift: DriftConfig::default(),
            artifact: ArtifactConfig::default(),
            predictor: PredictorConfig::default(),
            limits: LimitsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            fallback: FallbackPolicyConfig::default(),
            source_modified_at: None,
        }
    }
}

impl PredictionServiceConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// an explicit `path`, else `PREDICTION_SERVICE_CONFIG`, else
    /// `./prediction-service.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes).map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.source_modified_at = fs::metadata(&resolved).and_then(|meta| meta.modified()).ok();
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency, failing
    /// closed on the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when any field is out of range or
    /// internally inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        self.training.validate()?;
        self.lifecycle.validate()?;
        self.drift.validate()?;
        self.artifact.validate()?;
        self.predictor.validate()?;
        self.limits.validate()?;
        self.rate_limit.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        self.fallback.validate()?;
        Ok(())
    }

    /// Returns the effective cache TTL for `model_type`: the configured
    /// override if present, otherwise the type's spec §4.4 default.
    #[must_use]
    pub fn cache_ttl_seconds(&self, model_type: ModelType) -> u64 {
        self.cache
            .ttl
            .get(model_type.as_str())
            .copied()
            .unwrap_or_else(|| u64::try_from(model_type.cache_ttl_seconds()).unwrap_or(u64::MAX))
    }

    /// Returns the effective training-trigger dataset-size threshold for
    /// `model_type`: the configured override if present, otherwise the
    /// type's lifecycle-gate minimum (spec §4.2).
    #[must_use]
    pub fn min_dataset_size(&self, model_type: ModelType) -> u64 {
        self.training
            .min_dataset
            .get(model_type.as_str())
            .copied()
            .unwrap_or_else(|| model_type.min_dataset_size())
    }
}

// ============================================================================
// SECTION: Cache Configuration
// ============================================================================

/// Prediction cache configuration (spec §4.4).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Per-type TTL overrides, in seconds, keyed by [`ModelType::as_str`]
    /// (spec §6 `cache.ttl.<type>`). Types without an entry use
    /// [`ModelType::cache_ttl_seconds`].
    #[serde(default)]
    pub ttl: BTreeMap<String, u64>,
}

impl CacheConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (key, ttl) in &self.ttl {
            key.parse::<ModelType>()
                .map_err(|_| ConfigError::Invalid(format!("cache.ttl has unknown model type {key}")))?;
            if *ttl == 0 {
                return Err(ConfigError::Invalid(format!("cache.ttl.{key} must be greater than zero")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Training Configuration
// ============================================================================

/// Training trigger configuration (spec §4.5, §4.6 ingestion threshold).
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Per-type ingestion dataset-size trigger overrides, keyed by
    /// [`ModelType::as_str`] (spec §6 `training.minDataset.<type>`).
    /// Types without an entry use [`ModelType::min_dataset_size`].
    #[serde(default)]
    pub min_dataset: BTreeMap<String, u64>,
    /// Fraction of each dataset snapshot withheld for holdout evaluation
    /// (spec §4.5 step 6; default 20%).
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,
}

const fn default_holdout_fraction() -> f64 {
    0.2
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            min_dataset: BTreeMap::new(),
            holdout_fraction: default_holdout_fraction(),
        }
    }
}

impl TrainingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (key, minimum) in &self.min_dataset {
            key.parse::<ModelType>()
                .map_err(|_| ConfigError::Invalid(format!("training.min_dataset has unknown model type {key}")))?;
            if *minimum == 0 {
                return Err(ConfigError::Invalid(format!("training.min_dataset.{key} must be greater than zero")));
            }
        }
        if !(0.0..1.0).contains(&self.holdout_fraction) {
            return Err(ConfigError::Invalid("training.holdout_fraction must be in [0, 1)".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Lifecycle Configuration
// ============================================================================

/// Lifecycle quality-gate configuration (spec §4.2).
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Minimum accuracy-improvement percent required for a candidate to
    /// reach Active over the current Active (spec §6
    /// `lifecycle.improvementThresholdPercent`, default 2.0).
    #[serde(default = "default_improvement_threshold_percent")]
    pub improvement_threshold_percent: f64,
}

const fn default_improvement_threshold_percent() -> f64 {
    DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            improvement_threshold_percent: default_improvement_threshold_percent(),
        }
    }
}

impl LifecycleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.improvement_threshold_percent) {
            return Err(ConfigError::Invalid(
                "lifecycle.improvement_threshold_percent must be in [0, 100]".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Drift Configuration
// ============================================================================

/// Drift monitor configuration (spec §4.9).
#[derive(Debug, Clone, Deserialize)]
pub struct DriftConfig {
    /// Relative degradation of the primary metric, versus its deployment
    /// baseline, that triggers a [`DriftDetected`](prediction_core) event
    /// (spec §6 `drift.relativeDegradationThreshold`, default 0.05).
    #[serde(default = "default_drift_threshold")]
    pub relative_degradation_threshold: f64,
    /// Rolling evaluation window, in hours (spec §6 `drift.windowHours`,
    /// default 24).
    #[serde(default = "default_drift_window_hours")]
    pub window_hours: i64,
}

const fn default_drift_threshold() -> f64 {
    DEFAULT_DRIFT_THRESHOLD
}

const fn default_drift_window_hours() -> i64 {
    DEFAULT_DRIFT_WINDOW_HOURS
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            relative_degradation_threshold: default_drift_threshold(),
            window_hours: default_drift_window_hours(),
        }
    }
}

impl DriftConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.relative_degradation_threshold) {
            return Err(ConfigError::Invalid(
                "drift.relative_degradation_threshold must be in [0, 1]".to_string(),
            ));
        }
        if self.window_hours <= 0 {
            return Err(ConfigError::Invalid("drift.window_hours must be greater than zero".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Artifact Store Configuration
// ============================================================================

/// Artifact store backend selection (spec §4.8, Open Question #1: one
/// uniform contract, idempotent overwrite and authenticated download
/// required of both backends).
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    /// Selected backend (spec §6 `artifact.backend`).
    #[serde(default)]
    pub backend: ArtifactBackend,
    /// Local filesystem backend configuration, used when
    /// `backend = "local"`.
    #[serde(default)]
    pub local: LocalArtifactConfig,
    /// Remote service backend configuration, required when
    /// `backend = "remote"`.
    pub remote: Option<RemoteArtifactConfig>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            backend: ArtifactBackend::default(),
            local: LocalArtifactConfig::default(),
            remote: None,
        }
    }
}

impl ArtifactConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            ArtifactBackend::Local => {}
            ArtifactBackend::Remote => {
                let remote = self
                    .remote
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("artifact.remote is required when artifact.backend = \"remote\"".to_string()))?;
                remote.validate()?;
            }
        }
        Ok(())
    }
}

/// Artifact store backend kind (spec §6 `artifact.backend`:
/// `local`|`remote`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactBackend {
    /// Local filesystem backend, for development and tests.
    #[default]
    Local,
    /// Bearer-token-authenticated remote service backend.
    Remote,
}

impl ArtifactBackend {
    /// The `snake_case` wire representation used in config and CLI output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactBackend::Local => "local",
            ArtifactBackend::Remote => "remote",
        }
    }
}

impl std::fmt::Display for ArtifactBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local filesystem artifact store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalArtifactConfig {
    /// Directory artifacts are stored under.
    #[serde(default = "default_local_artifact_dir")]
    pub base_dir: PathBuf,
}

fn default_local_artifact_dir() -> PathBuf {
    PathBuf::from("./data/artifacts")
}

impl Default for LocalArtifactConfig {
    fn default() -> Self {
        Self {
            base_dir: default_local_artifact_dir(),
        }
    }
}

/// Remote artifact store backend configuration (spec §6
/// `artifact.remote.baseUrl`).
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteArtifactConfig {
    /// Base URL of the remote artifact service.
    pub base_url: String,
    /// Name of the environment variable holding the bearer token; the
    /// token itself is never stored in the config file.
    pub bearer_token_env: String,
    /// Local directory staged downloads (via signed, time-limited URLs)
    /// are written to before the caller reads them.
    #[serde(default = "default_download_staging_dir")]
    pub download_staging_dir: PathBuf,
}

fn default_download_staging_dir() -> PathBuf {
    std::env::temp_dir().join("prediction-service-artifacts")
}

impl RemoteArtifactConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("artifact.remote.base_url must not be empty".to_string()));
        }
        if self.bearer_token_env.trim().is_empty() {
            return Err(ConfigError::Invalid("artifact.remote.bearer_token_env must not be empty".to_string()));
        }
        Ok(())
    }

    /// Reads the bearer token out of the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the variable is unset.
    pub fn bearer_token(&self) -> Result<String, ConfigError> {
        env::var(&self.bearer_token_env)
            .map_err(|_| ConfigError::Invalid(format!("environment variable {} is not set", self.bearer_token_env)))
    }
}

// ============================================================================
// SECTION: Predictor Registry Configuration
// ============================================================================

/// Predictor registry memo configuration (spec §4.3 step 5, §5).
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    /// Maximum number of loaded predictor instances kept in the memo
    /// before LRU eviction (spec §6 `predictor.cache.capacity`).
    #[serde(default = "default_predictor_cache_capacity")]
    pub cache_capacity: usize,
}

const fn default_predictor_cache_capacity() -> usize {
    DEFAULT_PREDICTOR_CACHE_CAPACITY
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_predictor_cache_capacity(),
        }
    }
}

impl PredictorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid("predictor.cache_capacity must be greater than zero".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Request Limits Configuration
// ============================================================================

/// Request size and timeout limits (spec §5, §6).
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted geometry payload size, in bytes (spec §4.3, §6
    /// "maximum geometry size", default 50 MB).
    #[serde(default = "default_max_geometry_bytes")]
    pub max_geometry_bytes: u64,
    /// Maximum number of items accepted in one batch submission (spec §6
    /// "batch size cap", default 100).
    #[serde(default = "default_batch_size_cap")]
    pub batch_size_cap: usize,
    /// Timeout applied to each external I/O call (artifact store, cache,
    /// metadata store, message broker), in milliseconds (spec §5).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum retry attempts for idempotent operations, with exponential
    /// backoff and jitter (spec §5).
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
}

const fn default_max_geometry_bytes() -> u64 {
    DEFAULT_MAX_GEOMETRY_BYTES
}

const fn default_batch_size_cap() -> usize {
    DEFAULT_BATCH_SIZE_CAP
}

const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

const fn default_max_retry_attempts() -> u32 {
    DEFAULT_MAX_RETRY_ATTEMPTS
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_geometry_bytes: default_max_geometry_bytes(),
            batch_size_cap: default_batch_size_cap(),
            request_timeout_ms: default_request_timeout_ms(),
            max_retry_attempts: default_max_retry_attempts(),
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_geometry_bytes == 0 || self.max_geometry_bytes > MAX_MAX_GEOMETRY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "limits.max_geometry_bytes must be in (0, {MAX_MAX_GEOMETRY_BYTES}]"
            )));
        }
        if self.batch_size_cap == 0 || self.batch_size_cap > MAX_BATCH_SIZE_CAP {
            return Err(ConfigError::Invalid(format!("limits.batch_size_cap must be in (0, {MAX_BATCH_SIZE_CAP}]")));
        }
        if !(MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "limits.request_timeout_ms must be in [{MIN_REQUEST_TIMEOUT_MS}, {MAX_REQUEST_TIMEOUT_MS}]"
            )));
        }
        if self.max_retry_attempts > MAX_MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::Invalid(format!("limits.max_retry_attempts must be at most {MAX_MAX_RETRY_ATTEMPTS}")));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Rate Limit Configuration
// ============================================================================

/// Rate-limit budgets (spec §6 "rate-limit budgets"). Enforcement itself is
/// out of scope (spec §1); this is the declarative budget a transport
/// layer's limiter would read.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is configured as enabled for the transport
    /// layer to enforce.
    #[serde(default)]
    pub enabled: bool,
    /// Maximum requests allowed per window.
    #[serde(default = "default_rate_limit_max_requests")]
    pub max_requests: u32,
    /// Window length, in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub window_ms: u64,
}

const fn default_rate_limit_max_requests() -> u32 {
    DEFAULT_RATE_LIMIT_MAX_REQUESTS
}

const fn default_rate_limit_window_ms() -> u64 {
    DEFAULT_RATE_LIMIT_WINDOW_MS
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: default_rate_limit_max_requests(),
            window_ms: default_rate_limit_window_ms(),
        }
    }
}

impl RateLimitConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 {
            return Err(ConfigError::Invalid("rate_limit.max_requests must be greater than zero".to_string()));
        }
        if self.window_ms == 0 {
            return Err(ConfigError::Invalid("rate_limit.window_ms must be greater than zero".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Storage Configuration
// ============================================================================

/// Persistence configuration (spec §6 "Persisted state"): the four logical
/// schemas (models, training, predictions, audit) share one `SQLite`
/// database file by default.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` connection configuration shared by the registry, training,
    /// and audit stores.
    #[serde(default = "default_sqlite_config")]
    pub sqlite: SqliteStoreConfig,
    /// Directory staged dataset snapshots (spec §4.5 step 2) are written
    /// to for traceability.
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: PathBuf,
}

fn default_sqlite_config() -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: PathBuf::from("prediction-service.db"),
        busy_timeout_ms: default_busy_timeout_ms(),
        journal_mode: prediction_store_sqlite::SqliteStoreMode::default(),
        sync_mode: prediction_store_sqlite::SqliteSyncMode::default(),
    }
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_dataset_dir() -> PathBuf {
    PathBuf::from("./data/datasets")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite: default_sqlite_config(),
            dataset_dir: default_dataset_dir(),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sqlite.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid("storage.sqlite.busy_timeout_ms must be greater than zero".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging Configuration
// ============================================================================

/// Structured logging configuration. Only the CLI binary initializes a
/// subscriber from these values; the core crates remain log-sink agnostic.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive (e.g. `info`,
    /// `prediction_core=debug,warn`).
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit structured JSON log lines instead of the compact human format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must not be empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
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

    #[test]
    fn default_config_validates() {
        PredictionServiceConfig::default().validate().unwrap();
    }

    #[test]
    fn cache_ttl_falls_back_to_model_type_default_when_unconfigured() {
        let config = PredictionServiceConfig::default();
        assert_eq!(config.cache_ttl_seconds(ModelType::PrintTime), 24 * 3600);
        assert_eq!(config.cache_ttl_seconds(ModelType::PriceOptimization), 3600);
    }

    #[test]
    fn cache_ttl_override_takes_precedence() {
        let mut config = PredictionServiceConfig::default();
        config.cache.ttl.insert("print_time".to_string(), 60);
        assert_eq!(config.cache_ttl_seconds(ModelType::PrintTime), 60);
    }

    #[test]
    fn min_dataset_size_falls_back_to_lifecycle_gate_minimum() {
        let config = PredictionServiceConfig::default();
        assert_eq!(config.min_dataset_size(ModelType::PrintTime), 10_000);
    }

    #[test]
    fn unknown_model_type_key_in_cache_ttl_is_rejected() {
        let mut config = PredictionServiceConfig::default();
        config.cache.ttl.insert("not_a_type".to_string(), 60);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_ttl_override_is_rejected() {
        let mut config = PredictionServiceConfig::default();
        config.cache.ttl.insert("print_time".to_string(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn remote_artifact_backend_requires_remote_section() {
        let mut config = PredictionServiceConfig::default();
        config.artifact.backend = ArtifactBackend::Remote;
        assert!(config.validate().is_err());

        config.artifact.remote = Some(RemoteArtifactConfig {
            base_url: "https://artifacts.example.com".to_string(),
            bearer_token_env: "ARTIFACT_TOKEN".to_string(),
            download_staging_dir: PathBuf::from("/tmp/staging"),
        });
        config.validate().unwrap();
    }

    #[test]
    fn out_of_range_improvement_threshold_is_rejected() {
        let mut config = PredictionServiceConfig::default();
        config.lifecycle.improvement_threshold_percent = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_geometry_cap_is_rejected() {
        let mut config = PredictionServiceConfig::default();
        config.limits.max_geometry_bytes = MAX_MAX_GEOMETRY_BYTES + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loading_missing_file_surfaces_io_error() {
        let result = PredictionServiceConfig::load(Some(Path::new("/nonexistent/prediction-service.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn loading_oversized_path_is_rejected() {
        let giant = "a".repeat(MAX_TOTAL_PATH_LENGTH + 1);
        let result = PredictionServiceConfig::load(Some(Path::new(&giant)));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn round_trips_through_toml() {
        let toml_text = crate::examples::config_toml_example();
        let config: PredictionServiceConfig = toml::from_str(&toml_text).unwrap();
        config.validate().unwrap();
    }
}
