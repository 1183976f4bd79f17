// prediction-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Give operators a working `prediction-service.toml` starting
//          point that round-trips through `PredictionServiceConfig`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The returned TOML is deterministic and is exercised in this crate's
//! tests to stay in sync with [`crate::config::PredictionServiceConfig`].

/// Returns a canonical example `prediction-service.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[cache.ttl]
print_time = 86400
demand_forecast = 21600
price_optimization = 3600
churn_prediction = 86400
material_demand = 43200
bottleneck_detection = 21600

[training]
holdout_fraction = 0.2

[training.min_dataset]
print_time = 10000
demand_forecast = 1000
price_optimization = 5000
churn_prediction = 2000
material_demand = 1000
bottleneck_detection = 1000

[lifecycle]
improvement_threshold_percent = 2.0

[drift]
relative_degradation_threshold = 0.05
window_hours = 24

[artifact]
backend = "local"

[artifact.local]
base_dir = "./data/artifacts"

[predictor]
cache_capacity = 32

[limits]
max_geometry_bytes = 52428800
batch_size_cap = 100
request_timeout_ms = 2000
max_retry_attempts = 3

[rate_limit]
enabled = true
max_requests = 1000
window_ms = 60000

[storage]
dataset_dir = "./data/datasets"

[storage.sqlite]
path = "prediction-service.db"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[logging]
filter = "info"
json = false

[fallback.rules.print_time]
enabled = true
estimate = 4.5
explanation = "median historical print time for this material class"
"#,
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================
