// prediction-cli/src/main.rs
// ============================================================================
// Module: Prediction Service CLI Entry Point
// Description: Command dispatcher for predictions, training runs, model
//              lifecycle administration, and configuration tooling.
// Purpose: Give operators a single binary that exercises exactly the same
//          `Orchestrator`/`TrainingOrchestrator`/`LifecycleManager` paths a
//          production transport layer would call.
// Dependencies: clap, prediction-core, prediction-config, prediction-training,
//               prediction-store-sqlite, prediction-artifacts,
//               prediction-predictors, tracing, tracing-subscriber, time.
// ============================================================================

//! ## Overview
//! Every subcommand composes the prediction core's generic runtime types
//! from the same concrete backends (SQLite-backed registry/audit/dataset/job
//! stores, an in-memory prediction cache, and the local-or-remote artifact
//! store selected by `[artifact].backend`), so this binary exercises
//! exactly the path any other caller would.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Read as _;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use prediction_cli::wiring::StaticExplainerResolver;
use prediction_cli::wiring::StaticExtractorResolver;
use prediction_cli::wiring::build_artifact_store;
use prediction_config::ConfigError;
use prediction_config::PredictionServiceConfig;
use prediction_core::ModelId;
use prediction_core::ModelStatus;
use prediction_core::ModelType;
use prediction_core::RequestId;
use prediction_core::TenantId;
use prediction_core::Timestamp;
use prediction_core::TrainingTrigger;
use prediction_core::UserId;
use prediction_core::runtime::InMemoryPredictionCache;
use prediction_core::runtime::LifecycleManager;
use prediction_core::runtime::Orchestrator;
use prediction_core::runtime::PredictionRequest;
use prediction_predictors::registry::ArtifactBackedPredictorRegistry;
use prediction_store_sqlite::SqliteAuditSink;
use prediction_store_sqlite::SqliteModelRegistry;
use prediction_store_sqlite::SqliteTrainingDatasetStore;
use prediction_store_sqlite::SqliteTrainingJobStore;
use prediction_training::RawRecord;
use prediction_training::TrainingOrchestrator;
use prediction_training::TrainingRunRequest;
use prediction_training::ids::IdGenerator;
use prediction_training::trainer::HeuristicTrainer;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "prediction-service", disable_help_subcommand = true, arg_required_else_help = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve a single prediction request through the full orchestrator path.
    Predict(PredictCommand),
    /// Run the training pipeline once for a model type.
    Train(TrainCommand),
    /// Model lifecycle administration.
    Lifecycle {
        /// Selected lifecycle subcommand.
        #[command(subcommand)]
        command: LifecycleCommand,
    },
    /// Configuration tooling.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Checks that every configured backend can be reached and reports the
    /// Active model per type.
    Health(HealthCommand),
}

/// Arguments shared by every command that loads `prediction-service.toml`.
#[derive(Args, Debug, Clone)]
struct ConfigArg {
    /// Path to `prediction-service.toml` (defaults to the
    /// `PREDICTION_SERVICE_CONFIG` env var, then `./prediction-service.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `predict` command.
#[derive(Args, Debug)]
struct PredictCommand {
    #[command(flatten)]
    config: ConfigArg,
    /// Model type to serve (e.g. `print_time`).
    #[arg(long, value_name = "TYPE")]
    model_type: String,
    /// Path to a JSON file holding the raw request payload, or `-` for stdin.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Authenticated user id to attribute the request to.
    #[arg(long, value_name = "ID")]
    user_id: Option<String>,
    /// Tenant id to attribute the request to.
    #[arg(long, value_name = "ID")]
    tenant_id: Option<String>,
    /// Skip the prediction cache for this request.
    #[arg(long)]
    bypass_cache: bool,
}

/// Arguments for the `train` command.
#[derive(Args, Debug)]
struct TrainCommand {
    #[command(flatten)]
    config: ConfigArg,
    /// Model type to train.
    #[arg(long, value_name = "TYPE")]
    model_type: String,
    /// Path to a JSON file holding an array of `{"sort_key", "row"}` records.
    #[arg(long, value_name = "PATH")]
    records: PathBuf,
    /// Ordered, comma-separated feature column names.
    #[arg(long, value_name = "COLUMNS", value_delimiter = ',')]
    feature_columns: Vec<String>,
    /// Target column name.
    #[arg(long, value_name = "COLUMN")]
    target_column: String,
    /// Start of the record time window (RFC 3339).
    #[arg(long, value_name = "TIMESTAMP")]
    date_range_start: String,
    /// End of the record time window (RFC 3339).
    #[arg(long, value_name = "TIMESTAMP")]
    date_range_end: String,
    /// What triggered this run: `manual`, `scheduled`, `drift`, or `event`.
    #[arg(long, value_name = "TRIGGER", default_value = "manual")]
    trigger: String,
}

/// Model lifecycle subcommands.
#[derive(Subcommand, Debug)]
enum LifecycleCommand {
    /// Lists versions of a model type, most recent first.
    Versions(VersionsCommand),
    /// Rolls back to a previously Deprecated model of the same type.
    Rollback(RollbackCommand),
    /// Archives Deprecated versions beyond the retention window.
    Archive(ArchiveCommand),
}

/// Arguments for `lifecycle versions`.
#[derive(Args, Debug)]
struct VersionsCommand {
    #[command(flatten)]
    config: ConfigArg,
    /// Model type to list.
    #[arg(long, value_name = "TYPE")]
    model_type: String,
    /// Restrict to a single status: `draft`, `testing`, `active`,
    /// `deprecated`, or `archived`.
    #[arg(long, value_name = "STATUS")]
    status: Option<String>,
}

/// Arguments for `lifecycle rollback`.
#[derive(Args, Debug)]
struct RollbackCommand {
    #[command(flatten)]
    config: ConfigArg,
    /// Id of the Deprecated model to roll back to.
    #[arg(long, value_name = "MODEL_ID")]
    target_model_id: String,
    /// Human-readable rollback reason, recorded on the model.
    #[arg(long, value_name = "REASON")]
    reason: String,
}

/// Arguments for `lifecycle archive`.
#[derive(Args, Debug)]
struct ArchiveCommand {
    #[command(flatten)]
    config: ConfigArg,
    /// Model type to archive eligible versions for.
    #[arg(long, value_name = "TYPE")]
    model_type: String,
}

/// Configuration tooling subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Loads and validates a configuration file.
    Validate(ConfigArg),
    /// Prints the canonical example `prediction-service.toml`.
    Example,
    /// Writes the generated configuration reference documentation.
    Docs {
        /// Output path (defaults to
        /// `Docs/configuration/prediction-service.toml.md`).
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Prints the configuration JSON schema.
    Schema,
}

/// Arguments for the `health` command.
#[derive(Args, Debug)]
struct HealthCommand {
    #[command(flatten)]
    config: ConfigArg,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::new(err.to_string())
    }
}

/// CLI result alias.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Predict(command) => command_predict(&command),
        Commands::Train(command) => command_train(&command),
        Commands::Lifecycle { command } => command_lifecycle(command),
        Commands::Config { command } => command_config(command),
        Commands::Health(command) => command_health(&command),
    }
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Initializes the global tracing subscriber from the loaded configuration.
/// This is the only place in the workspace that installs a subscriber.
fn init_tracing(logging: &prediction_config::config::LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(&logging.filter).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = if logging.json { subscriber.json().try_init() } else { subscriber.try_init() };
}

/// Loads and validates configuration, then initializes tracing from it.
fn load_config(arg: &ConfigArg) -> CliResult<PredictionServiceConfig> {
    let config = PredictionServiceConfig::load(arg.config.as_deref())?;
    init_tracing(&config.logging);
    Ok(config)
}

/// Returns the current wall-clock time as a [`Timestamp`].
fn wall_clock_now() -> Timestamp {
    Timestamp::from_offset_date_time(time::OffsetDateTime::now_utc())
}

fn parse_model_type(value: &str) -> CliResult<ModelType> {
    value.parse::<ModelType>().map_err(|err| CliError::new(format!("unknown model type {err}")))
}

fn parse_trigger(value: &str) -> CliResult<TrainingTrigger> {
    match value {
        "manual" => Ok(TrainingTrigger::Manual),
        "scheduled" => Ok(TrainingTrigger::Scheduled),
        "drift" => Ok(TrainingTrigger::Drift),
        "event" => Ok(TrainingTrigger::Event),
        other => Err(CliError::new(format!("unknown trigger '{other}' (expected manual, scheduled, drift, or event)"))),
    }
}

fn parse_status(value: &str) -> CliResult<ModelStatus> {
    match value {
        "draft" => Ok(ModelStatus::Draft),
        "testing" => Ok(ModelStatus::Testing),
        "active" => Ok(ModelStatus::Active),
        "deprecated" => Ok(ModelStatus::Deprecated),
        "archived" => Ok(ModelStatus::Archived),
        other => Err(CliError::new(format!("unknown status '{other}'"))),
    }
}

fn parse_timestamp(value: &str) -> CliResult<Timestamp> {
    Timestamp::try_from(value.to_string()).map_err(|err| CliError::new(format!("invalid RFC 3339 timestamp '{value}': {err}")))
}

/// Reads JSON from a file path, or from stdin when `path` is `-`.
fn read_json_input(path: &Path) -> CliResult<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).map_err(|err| CliError::new(format!("reading stdin: {err}")))?;
        Ok(buf)
    } else {
        fs::read(path).map_err(|err| CliError::new(format!("reading {}: {err}", path.display())))
    }
}

fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

fn print_json(value: &impl serde::Serialize) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(|err| CliError::new(format!("serializing output: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(format!("writing stdout: {err}")))
}

// ============================================================================
// SECTION: Predict Command
// ============================================================================

fn command_predict(command: &PredictCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let model_type = parse_model_type(&command.model_type)?;
    let raw_bytes = read_json_input(&command.input)?;
    let raw_input: Value =
        serde_json::from_slice(&raw_bytes).map_err(|err| CliError::new(format!("input is not valid JSON: {err}")))?;

    let registry = SqliteModelRegistry::open(&config.storage.sqlite).map_err(|err| CliError::new(err.to_string()))?;
    let cache = InMemoryPredictionCache::new();
    let artifact_store = build_artifact_store(&config.artifact).map_err(|err| CliError::new(err.to_string()))?;
    let predictors = ArtifactBackedPredictorRegistry::with_capacity(artifact_store, config.predictor.cache_capacity);
    let audit = SqliteAuditSink::open(&config.storage.sqlite).map_err(|err| CliError::new(err.to_string()))?;
    let cache_ttl_seconds = ModelType::ALL
        .into_iter()
        .map(|model_type| (model_type, i64::try_from(config.cache_ttl_seconds(model_type)).unwrap_or(i64::MAX)))
        .collect();
    let orchestrator =
        Orchestrator::new(registry, cache, predictors, StaticExtractorResolver::new(), StaticExplainerResolver::new(), audit)
            .with_cache_ttl_seconds(cache_ttl_seconds);

    let ids = IdGenerator::new("req");
    let request = PredictionRequest {
        request_id: RequestId::new(ids.issue()),
        model_type,
        input_byte_len: u64::try_from(raw_bytes.len()).unwrap_or(u64::MAX),
        raw_input,
        user_id: command.user_id.as_deref().map(UserId::new),
        tenant_id: command.tenant_id.as_deref().map(TenantId::new),
        bypass_cache: command.bypass_cache,
    };

    let start = Instant::now();
    let now = wall_clock_now();
    tracing::info!(%model_type, request_id = %request.request_id, "serving prediction request");
    let response = orchestrator
        .predict(request, now, || u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX))
        .map_err(|err| {
            tracing::warn!(%model_type, %err, "prediction request failed");
            CliError::new(err.into_prediction_error().to_string())
        })?;

    print_json(&PredictResponseView {
        audit_log_id: response.audit_log_id.as_str().to_string(),
        model_version: response.model_version.to_string(),
        prediction: response.prediction,
        confidence_interval: response.confidence_interval,
        explanation: response.explanation,
        cache_status: response.cache_status.to_string(),
        response_ms: response.response_ms,
    })?;
    Ok(ExitCode::SUCCESS)
}

/// JSON-friendly view of a [`prediction_core::runtime::PredictionResponse`].
#[derive(serde::Serialize)]
struct PredictResponseView {
    audit_log_id: String,
    model_version: String,
    prediction: Value,
    confidence_interval: Option<prediction_core::interfaces::ConfidenceInterval>,
    explanation: Option<prediction_core::interfaces::Explanation>,
    cache_status: String,
    response_ms: u64,
}

// ============================================================================
// SECTION: Train Command
// ============================================================================

/// One record of the `train --records` input file.
#[derive(Debug, Deserialize)]
struct RawRecordInput {
    sort_key: String,
    row: Value,
}

fn command_train(command: &TrainCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let model_type = parse_model_type(&command.model_type)?;
    let trigger = parse_trigger(&command.trigger)?;
    let date_range_start = parse_timestamp(&command.date_range_start)?;
    let date_range_end = parse_timestamp(&command.date_range_end)?;

    let records_bytes = fs::read(&command.records)
        .map_err(|err| CliError::new(format!("reading {}: {err}", command.records.display())))?;
    let records: Vec<RawRecordInput> =
        serde_json::from_slice(&records_bytes).map_err(|err| CliError::new(format!("records file is not a valid JSON array: {err}")))?;
    let records: Vec<RawRecord> = records.into_iter().map(|r| RawRecord { sort_key: r.sort_key, row: r.row }).collect();

    let dataset_store = SqliteTrainingDatasetStore::open(&config.storage.sqlite).map_err(|err| CliError::new(err.to_string()))?;
    let job_store = SqliteTrainingJobStore::open(&config.storage.sqlite).map_err(|err| CliError::new(err.to_string()))?;
    let registry = SqliteModelRegistry::open(&config.storage.sqlite).map_err(|err| CliError::new(err.to_string()))?;
    let lifecycle = LifecycleManager::new(registry);
    let artifact_store = build_artifact_store(&config.artifact).map_err(|err| CliError::new(err.to_string()))?;
    let trainer = HeuristicTrainer::new(config.storage.dataset_dir.join("_work"));

    let orchestrator = TrainingOrchestrator::new(
        dataset_store,
        job_store,
        lifecycle,
        artifact_store,
        trainer,
        config.storage.dataset_dir.clone(),
        config.lifecycle.improvement_threshold_percent,
        config.training.holdout_fraction,
    );

    let request = TrainingRunRequest {
        model_type,
        records,
        feature_columns: command.feature_columns.clone(),
        target_column: command.target_column.clone(),
        date_range_start,
        date_range_end,
        trigger,
    };

    tracing::info!(%model_type, trigger = ?trigger, "starting training run");
    let outcome = orchestrator.run(request, wall_clock_now()).map_err(|err| {
        tracing::error!(%model_type, %err, "training run failed");
        CliError::new(err.to_string())
    })?;
    print_json(&TrainOutcomeView::from(outcome))?;
    Ok(ExitCode::SUCCESS)
}

/// JSON-friendly view of a [`prediction_training::TrainingRunOutcome`].
#[derive(serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum TrainOutcomeView {
    Coalesced,
    Promoted { job_id: String, model_id: String },
    RejectedAfterTraining { job_id: String, model_id: String, reason: String },
    Failed { job_id: String, reason: String },
}

impl From<prediction_training::TrainingRunOutcome> for TrainOutcomeView {
    fn from(outcome: prediction_training::TrainingRunOutcome) -> Self {
        use prediction_training::TrainingRunOutcome;
        match outcome {
            TrainingRunOutcome::Coalesced => Self::Coalesced,
            TrainingRunOutcome::Promoted { job_id, model_id } => {
                Self::Promoted { job_id: job_id.as_str().to_string(), model_id: model_id.as_str().to_string() }
            }
            TrainingRunOutcome::RejectedAfterTraining { job_id, model_id, reason } => {
                Self::RejectedAfterTraining { job_id: job_id.as_str().to_string(), model_id: model_id.as_str().to_string(), reason }
            }
            TrainingRunOutcome::Failed { job_id, reason } => Self::Failed { job_id: job_id.as_str().to_string(), reason },
        }
    }
}

// ============================================================================
// SECTION: Lifecycle Commands
// ============================================================================

fn command_lifecycle(command: LifecycleCommand) -> CliResult<ExitCode> {
    match command {
        LifecycleCommand::Versions(command) => command_lifecycle_versions(&command),
        LifecycleCommand::Rollback(command) => command_lifecycle_rollback(&command),
        LifecycleCommand::Archive(command) => command_lifecycle_archive(&command),
    }
}

fn command_lifecycle_versions(command: &VersionsCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let model_type = parse_model_type(&command.model_type)?;
    let status = command.status.as_deref().map(parse_status).transpose()?;

    let registry = SqliteModelRegistry::open(&config.storage.sqlite).map_err(|err| CliError::new(err.to_string()))?;
    let versions = prediction_core::interfaces::ModelRegistry::list_versions(&registry, model_type, status)
        .map_err(|err| CliError::new(err.to_string()))?;

    print_json(&versions)?;
    Ok(ExitCode::SUCCESS)
}

fn command_lifecycle_rollback(command: &RollbackCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let registry = SqliteModelRegistry::open(&config.storage.sqlite).map_err(|err| CliError::new(err.to_string()))?;
    let lifecycle = LifecycleManager::new(registry);

    lifecycle
        .rollback(&ModelId::new(command.target_model_id.clone()), &command.reason, wall_clock_now())
        .map_err(|err| CliError::new(err.to_string()))?;

    write_stdout_line(&format!("rolled back to {}", command.target_model_id))
        .map_err(|err| CliError::new(format!("writing stdout: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

fn command_lifecycle_archive(command: &ArchiveCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let model_type = parse_model_type(&command.model_type)?;
    let registry = SqliteModelRegistry::open(&config.storage.sqlite).map_err(|err| CliError::new(err.to_string()))?;
    let lifecycle = LifecycleManager::new(registry);

    lifecycle.archive_eligible(model_type, wall_clock_now()).map_err(|err| CliError::new(err.to_string()))?;

    write_stdout_line(&format!("archived eligible {model_type} versions"))
        .map_err(|err| CliError::new(format!("writing stdout: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(arg) => {
            let config = PredictionServiceConfig::load(arg.config.as_deref())?;
            print_json(&ConfigSummaryView::from(&config))?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Example => {
            write_stdout_line(&prediction_config::config_toml_example()).map_err(|err| CliError::new(format!("writing stdout: {err}")))?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Docs { output } => {
            prediction_config::write_config_docs(output.as_deref()).map_err(|err| CliError::new(err.to_string()))?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Schema => {
            print_json(&prediction_config::config_schema())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// A condensed view of a loaded, validated configuration.
#[derive(serde::Serialize)]
struct ConfigSummaryView {
    valid: bool,
    artifact_backend: String,
    predictor_cache_capacity: usize,
    batch_size_cap: usize,
}

impl From<&PredictionServiceConfig> for ConfigSummaryView {
    fn from(config: &PredictionServiceConfig) -> Self {
        Self {
            valid: true,
            artifact_backend: config.artifact.backend.to_string(),
            predictor_cache_capacity: config.predictor.cache_capacity,
            batch_size_cap: config.limits.batch_size_cap,
        }
    }
}

// ============================================================================
// SECTION: Health Command
// ============================================================================

fn command_health(command: &HealthCommand) -> CliResult<ExitCode> {
    let config = load_config(&command.config)?;
    let registry = SqliteModelRegistry::open(&config.storage.sqlite).map_err(|err| CliError::new(err.to_string()))?;
    let _artifact_store = build_artifact_store(&config.artifact).map_err(|err| CliError::new(err.to_string()))?;

    let mut statuses = Vec::with_capacity(ModelType::ALL.len());
    for model_type in ModelType::ALL {
        let active = prediction_core::interfaces::ModelRegistry::get_active(&registry, model_type)
            .map_err(|err| CliError::new(err.to_string()))?;
        statuses.push(HealthTypeView {
            model_type: model_type.to_string(),
            active_version: active.map(|model| model.version.to_string()),
        });
    }

    print_json(&HealthView { storage_reachable: true, artifact_store_reachable: true, types: statuses })?;
    Ok(ExitCode::SUCCESS)
}

#[derive(serde::Serialize)]
struct HealthTypeView {
    model_type: String,
    active_version: Option<String>,
}

#[derive(serde::Serialize)]
struct HealthView {
    storage_reachable: bool,
    artifact_store_reachable: bool,
    types: Vec<HealthTypeView>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod main_tests;
