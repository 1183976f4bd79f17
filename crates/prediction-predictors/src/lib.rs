// prediction-predictors/src/lib.rs
// ============================================================================
// Module: Prediction Predictors Library
// Description: Per-type feature extractors and predictors (spec §4.3).
// Purpose: Provide the six per-model-type extractor/predictor pairs and an
//          in-memory, artifact-backed PredictorRegistry.
// Dependencies: prediction-core, base64, serde_json
// ============================================================================

//! ## Overview
//! Each model type in [`prediction_core::ModelType`] has a matching
//! [`prediction_core::interfaces::FeatureExtractor`] and
//! [`prediction_core::interfaces::Predictor`] pair in this crate. The
//! numerical model behind each predictor is a documented placeholder (spec
//! §1: choice of ML algorithm is out of scope) built on
//! [`heuristics::unit_interval_from_bytes`], so every prediction is
//! deterministic given identical input bytes while the per-type contract
//! (inputs validated, outputs shaped per spec §4.3's table) is fully
//! satisfied. [`registry::ArtifactBackedPredictorRegistry`] is the
//! [`prediction_core::interfaces::PredictorRegistry`] implementation that
//! lazy-loads and memoizes predictor instances from an
//! [`prediction_core::interfaces::ArtifactStore`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bottleneck_detection;
pub mod churn_prediction;
pub mod demand_forecast;
pub mod explainer;
pub mod heuristics;
pub mod material_demand;
pub mod price_optimization;
pub mod print_time;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bottleneck_detection::BottleneckDetectionExtractor;
pub use bottleneck_detection::BottleneckDetectionPredictor;
pub use churn_prediction::ChurnPredictionExtractor;
pub use churn_prediction::ChurnPredictionPredictor;
pub use demand_forecast::DemandForecastExtractor;
pub use demand_forecast::DemandForecastPredictor;
pub use explainer::PercentileBandExplainer;
pub use material_demand::MaterialDemandExtractor;
pub use material_demand::MaterialDemandPredictor;
pub use price_optimization::PriceOptimizationExtractor;
pub use price_optimization::PriceOptimizationPredictor;
pub use print_time::PrintTimeExtractor;
pub use print_time::PrintTimePredictor;
pub use registry::ArtifactBackedPredictorRegistry;

/// Returns the [`prediction_core::interfaces::FeatureExtractor`] for a
/// model type.
#[must_use]
pub fn extractor_for(model_type: prediction_core::ModelType) -> std::sync::Arc<dyn prediction_core::interfaces::FeatureExtractor> {
    use prediction_core::ModelType;
    match model_type {
        ModelType::PrintTime => std::sync::Arc::new(PrintTimeExtractor),
        ModelType::DemandForecast => std::sync::Arc::new(DemandForecastExtractor),
        ModelType::PriceOptimization => std::sync::Arc::new(PriceOptimizationExtractor),
        ModelType::ChurnPrediction => std::sync::Arc::new(ChurnPredictionExtractor),
        ModelType::MaterialDemand => std::sync::Arc::new(MaterialDemandExtractor),
        ModelType::BottleneckDetection => std::sync::Arc::new(BottleneckDetectionExtractor),
    }
}

/// Returns the shared [`prediction_core::interfaces::Explainer`]. Every
/// model type uses the same [`PercentileBandExplainer`]; only the feature
/// scores and stored population statistics it is given vary per type.
#[must_use]
pub fn explainer() -> PercentileBandExplainer {
    PercentileBandExplainer
}
