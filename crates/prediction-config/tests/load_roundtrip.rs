// prediction-config/tests/load_roundtrip.rs
// ============================================================================
// Integration tests: loading `prediction-service.toml` from disk, including
// the environment-variable path override and the fail-closed error paths
// (spec §6).
// ============================================================================

use std::fs;
use std::path::PathBuf;

use prediction_config::ConfigError;
use prediction_config::PredictionServiceConfig;
use prediction_config::config_toml_example;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_example(dir: &tempfile::TempDir) -> Result<PathBuf, std::io::Error> {
    let path = dir.path().join("prediction-service.toml");
    fs::write(&path, config_toml_example())?;
    Ok(path)
}

fn assert_is_error<T>(result: Result<T, ConfigError>, matches: impl FnOnce(&ConfigError) -> bool) -> TestResult {
    match result {
        Ok(_) => Err("expected an error, got Ok".into()),
        Err(err) if matches(&err) => Ok(()),
        Err(err) => Err(format!("error did not match expected kind: {err}").into()),
    }
}

#[test]
fn loads_and_validates_the_canonical_example() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = write_example(&dir)?;

    let config = PredictionServiceConfig::load(Some(&path))?;

    if config.predictor.cache_capacity != 32 {
        return Err(format!("expected cache_capacity 32, got {}", config.predictor.cache_capacity).into());
    }
    if config.limits.batch_size_cap != 100 {
        return Err(format!("expected batch_size_cap 100, got {}", config.limits.batch_size_cap).into());
    }
    if !config.fallback.is_enabled_for(prediction_core::ModelType::PrintTime) {
        return Err("expected PrintTime fallback to be enabled in the canonical example".into());
    }
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("does-not-exist.toml");

    assert_is_error(PredictionServiceConfig::load(Some(&path)), |err| matches!(err, ConfigError::Io(_)))
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("prediction-service.toml");
    fs::write(&path, "this is not valid toml [[[")?;

    assert_is_error(PredictionServiceConfig::load(Some(&path)), |err| matches!(err, ConfigError::Parse(_)))
}

#[test]
fn invalid_values_fail_validation_on_load() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("prediction-service.toml");
    fs::write(
        &path,
        r#"
[lifecycle]
improvement_threshold_percent = 500.0
"#,
    )?;

    assert_is_error(PredictionServiceConfig::load(Some(&path)), |err| matches!(err, ConfigError::Invalid(_)))
}

#[test]
fn docs_render_from_the_same_schema_the_example_parses_against() -> TestResult {
    let markdown = prediction_config::config_docs_markdown();
    if !markdown.contains("cache") {
        return Err("expected rendered docs to mention \"cache\"".into());
    }
    let schema = prediction_config::config_schema();
    if schema.get("properties").is_none() {
        return Err("expected schema to have a properties object".into());
    }
    Ok(())
}
