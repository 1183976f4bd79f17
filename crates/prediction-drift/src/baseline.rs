// prediction-drift/src/baseline.rs
// ============================================================================
// Module: Deployment Baseline
// Description: The per-type reference quality score a model was promoted
//              with, against which rolling accuracy is compared (spec §4.9).
// Purpose: Record what "normal" looked like at promotion time so later
//          degradation can be expressed as a relative delta.
// Dependencies: prediction_core::core::{ModelType, ModelVersion}
// ============================================================================

//! ## Overview
//! The deployment baseline is captured once, when a model becomes Active
//! (the training orchestrator's promotion step), and held until the next
//! promotion or rollback replaces it. It anchors
//! [`crate::monitor::DriftMonitor::evaluate`]'s relative-degradation check.

use prediction_core::core::ModelType;
use prediction_core::core::ModelVersion;
use prediction_core::core::Timestamp;

/// The quality score a model type's Active model was promoted with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeploymentBaseline {
    /// The type this baseline applies to.
    pub model_type: ModelType,
    /// The Active version this baseline was captured for.
    pub version: ModelVersion,
    /// Quality score (spec §4.9, same scale as [`crate::sample::DriftSample::quality_score`]).
    pub quality_score: f64,
    /// When this baseline was recorded.
    pub recorded_at: Timestamp,
}

impl DeploymentBaseline {
    /// Records a new baseline at promotion or rollback time.
    #[must_use]
    pub fn new(model_type: ModelType, version: ModelVersion, quality_score: f64, recorded_at: Timestamp) -> Self {
        Self { model_type, version, quality_score, recorded_at }
    }
}
