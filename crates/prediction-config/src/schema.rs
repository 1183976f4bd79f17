// prediction-config/src/schema.rs
// ============================================================================
// Module: Config Schema
// Description: JSON schema builder for `prediction-service.toml`.
// Purpose: Give tooling and docs one canonical description of the
//          configuration shape, generated from the constants in
//          `crate::config` rather than duplicated by hand.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The schema mirrors [`crate::config::PredictionServiceConfig`] field for
//! field. It is advisory (used by [`crate::docs`] and external tooling),
//! not enforced at load time; [`crate::config::PredictionServiceConfig::validate`]
//! is the authoritative check.

use serde_json::Value;
use serde_json::json;

use crate::config::DEFAULT_BATCH_SIZE_CAP;
use crate::config::DEFAULT_DRIFT_THRESHOLD;
use crate::config::DEFAULT_DRIFT_WINDOW_HOURS;
use crate::config::DEFAULT_MAX_GEOMETRY_BYTES;
use crate::config::DEFAULT_MAX_RETRY_ATTEMPTS;
use crate::config::DEFAULT_PREDICTOR_CACHE_CAPACITY;
use crate::config::DEFAULT_RATE_LIMIT_MAX_REQUESTS;
use crate::config::DEFAULT_RATE_LIMIT_WINDOW_MS;
use crate::config::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::config::MAX_BATCH_SIZE_CAP;
use crate::config::MAX_MAX_GEOMETRY_BYTES;
use crate::config::MAX_MAX_RETRY_ATTEMPTS;
use crate::config::MAX_REQUEST_TIMEOUT_MS;
use crate::config::MIN_REQUEST_TIMEOUT_MS;

/// The six recognized model type keys (spec §2 GLOSSARY), used to document
/// valid keys for the per-type override tables.
const MODEL_TYPE_KEYS: [&str; 6] = [
    "print_time",
    "demand_forecast",
    "price_optimization",
    "churn_prediction",
    "material_demand",
    "bottleneck_detection",
];

/// Returns the JSON Schema describing `prediction-service.toml`.
#[must_use]
pub fn config_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "PredictionServiceConfig",
        "type": "object",
        "properties": {
            "cache": {
                "type": "object",
                "properties": {
                    "ttl": {
                        "type": "object",
                        "description": "Per-model-type cache TTL overrides in seconds, keyed by model type.",
                        "propertyNames": { "enum": MODEL_TYPE_KEYS },
                        "additionalProperties": { "type": "integer", "minimum": 1 }
                    }
                }
            },
            "training": {
                "type": "object",
                "properties": {
                    "min_dataset": {
                        "type": "object",
                        "description": "Per-model-type ingestion dataset-size trigger overrides.",
                        "propertyNames": { "enum": MODEL_TYPE_KEYS },
                        "additionalProperties": { "type": "integer", "minimum": 1 }
                    },
                    "holdout_fraction": {
                        "type": "number",
                        "minimum": 0.0,
                        "exclusiveMaximum": 1.0,
                        "default": 0.2
                    }
                }
            },
            "lifecycle": {
                "type": "object",
                "properties": {
                    "improvement_threshold_percent": {
                        "type": "number",
                        "minimum": 0.0,
                        "maximum": 100.0,
                        "default": 2.0
                    }
                }
            },
            "drift": {
                "type": "object",
                "properties": {
                    "relative_degradation_threshold": {
                        "type": "number",
                        "minimum": 0.0,
                        "maximum": 1.0,
                        "default": DEFAULT_DRIFT_THRESHOLD
                    },
                    "window_hours": {
                        "type": "integer",
                        "minimum": 1,
                        "default": DEFAULT_DRIFT_WINDOW_HOURS
                    }
                }
            },
            "artifact": {
                "type": "object",
                "properties": {
                    "backend": { "type": "string", "enum": ["local", "remote"], "default": "local" },
                    "local": {
                        "type": "object",
                        "properties": {
                            "base_dir": { "type": "string" }
                        }
                    },
                    "remote": {
                        "type": ["object", "null"],
                        "properties": {
                            "base_url": { "type": "string" },
                            "bearer_token_env": { "type": "string" },
                            "download_staging_dir": { "type": "string" }
                        },
                        "required": ["base_url", "bearer_token_env"]
                    }
                }
            },
            "predictor": {
                "type": "object",
                "properties": {
                    "cache_capacity": {
                        "type": "integer",
                        "minimum": 1,
                        "default": DEFAULT_PREDICTOR_CACHE_CAPACITY
                    }
                }
            },
            "limits": {
                "type": "object",
                "properties": {
                    "max_geometry_bytes": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_MAX_GEOMETRY_BYTES,
                        "default": DEFAULT_MAX_GEOMETRY_BYTES
                    },
                    "batch_size_cap": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_BATCH_SIZE_CAP,
                        "default": DEFAULT_BATCH_SIZE_CAP
                    },
                    "request_timeout_ms": {
                        "type": "integer",
                        "minimum": MIN_REQUEST_TIMEOUT_MS,
                        "maximum": MAX_REQUEST_TIMEOUT_MS,
                        "default": DEFAULT_REQUEST_TIMEOUT_MS
                    },
                    "max_retry_attempts": {
                        "type": "integer",
                        "minimum": 0,
                        "maximum": MAX_MAX_RETRY_ATTEMPTS,
                        "default": DEFAULT_MAX_RETRY_ATTEMPTS
                    }
                }
            },
            "rate_limit": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "boolean", "default": false },
                    "max_requests": { "type": "integer", "minimum": 1, "default": DEFAULT_RATE_LIMIT_MAX_REQUESTS },
                    "window_ms": { "type": "integer", "minimum": 1, "default": DEFAULT_RATE_LIMIT_WINDOW_MS }
                }
            },
            "storage": {
                "type": "object",
                "properties": {
                    "sqlite": {
                        "type": "object",
                        "properties": {
                            "path": { "type": "string" },
                            "busy_timeout_ms": { "type": "integer", "minimum": 1 },
                            "journal_mode": { "type": "string", "enum": ["wal", "delete"] },
                            "sync_mode": { "type": "string", "enum": ["full", "normal"] }
                        },
                        "required": ["path"]
                    },
                    "dataset_dir": { "type": "string" }
                }
            },
            "logging": {
                "type": "object",
                "properties": {
                    "filter": { "type": "string", "default": "info" },
                    "json": { "type": "boolean", "default": false }
                }
            },
            "fallback": {
                "type": "object",
                "properties": {
                    "rules": {
                        "type": "object",
                        "description": "Per-model-type rule-based fallback configuration for NoActiveModel.",
                        "propertyNames": { "enum": MODEL_TYPE_KEYS },
                        "additionalProperties": {
                            "type": "object",
                            "properties": {
                                "enabled": { "type": "boolean", "default": true },
                                "estimate": { "type": "number" },
                                "explanation": { "type": "string" }
                            },
                            "required": ["estimate"]
                        }
                    }
                }
            }
        }
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
