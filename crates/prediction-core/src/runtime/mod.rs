// prediction-core/src/runtime/mod.rs
// ============================================================================
// Module: Prediction Runtime
// Description: In-memory reference backends and the orchestration engine.
// Purpose: Provide ready-to-use implementations for tests and single-process
//          deployments, and the generic engines production backends plug
//          into via constructor composition.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! `runtime` holds two kinds of code: backend-agnostic engines
//! ([`LifecycleManager`], [`Orchestrator`]) generic over the traits in
//! [`crate::interfaces`], and in-memory reference implementations of those
//! traits ([`InMemoryModelRegistry`], [`InMemoryPredictionCache`]) suitable
//! for tests, demos, and single-process deployments. Persisted backends
//! (SQLite, a remote artifact service) live in their own crates.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cache;
pub mod events;
pub mod lifecycle;
pub mod orchestrator;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::InMemoryPredictionCache;
pub use events::InMemoryEventPublisher;
pub use events::LoggingEventPublisher;
pub use lifecycle::DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT;
pub use lifecycle::DEPRECATED_RETENTION_COUNT;
pub use lifecycle::LifecycleError;
pub use lifecycle::LifecycleManager;
pub use orchestrator::ExplainerResolver;
pub use orchestrator::FeatureExtractorResolver;
pub use orchestrator::MAX_INPUT_BYTES;
pub use orchestrator::Orchestrator;
pub use orchestrator::OrchestratorError;
pub use orchestrator::PredictionRequest;
pub use orchestrator::PredictionResponse;
pub use registry::InMemoryModelRegistry;
