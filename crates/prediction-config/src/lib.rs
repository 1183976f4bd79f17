// prediction-config/src/lib.rs
// ============================================================================
// Module: Prediction Config Library
// Description: Canonical config model, validation, and artifact generation.
// Purpose: Single source of truth for prediction-service.toml semantics.
// Dependencies: prediction-core, prediction-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `prediction-config` defines the canonical configuration model for the
//! prediction service (spec §6 "Configuration"). It provides strict,
//! fail-closed validation and deterministic generators for config schema,
//! examples, and docs, following `decision-gate-config`'s layered
//! `config.rs`/`schema.rs`/`policy.rs` split.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod docs;
pub mod examples;
pub mod policy;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ArtifactBackend;
pub use config::ArtifactConfig;
pub use config::ConfigError;
pub use config::LocalArtifactConfig;
pub use config::PredictionServiceConfig;
pub use config::RemoteArtifactConfig;
pub use docs::config_docs_markdown;
pub use docs::write_config_docs;
pub use examples::config_toml_example;
pub use policy::FallbackPolicyConfig;
pub use schema::config_schema;
