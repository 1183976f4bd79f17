// prediction-cli/src/wiring.rs
// ============================================================================
// Module: CLI Backend Wiring
// Description: Concrete resolver and artifact-store implementations used to
//              compose the prediction core's generic runtime types for the
//              command-line binary.
// Purpose: Keep `main.rs` focused on argument parsing and command dispatch
//          by giving it a small set of ready-to-compose backends.
// Dependencies: prediction-core, prediction-predictors, prediction-artifacts,
//               prediction-config
// ============================================================================

//! ## Overview
//! The prediction core is generic over storage, predictor-loading, feature
//! extraction, and explanation backends (constructor composition, not a DI
//! container). This module supplies the one production-shaped
//! implementation of each seam the CLI needs: [`StaticExtractorResolver`]
//! and [`StaticExplainerResolver`] wrap the per-type extractors and the
//! shared explainer from `prediction-predictors`, and [`AnyArtifactStore`]
//! lets a single type stand in for either the local or the remote artifact
//! backend depending on `[artifact].backend`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use prediction_artifacts::LocalFsArtifactStore;
use prediction_artifacts::RemoteArtifactStore;
use prediction_artifacts::RemoteArtifactStoreConfig;
use prediction_config::ArtifactBackend;
use prediction_config::ArtifactConfig;
use prediction_config::ConfigError;
use prediction_core::ModelId;
use prediction_core::ModelType;
use prediction_core::interfaces::ArtifactError;
use prediction_core::interfaces::ArtifactStore;
use prediction_core::interfaces::Explainer;
use prediction_core::interfaces::FeatureExtractor;
use prediction_core::runtime::orchestrator::ExplainerResolver;
use prediction_core::runtime::orchestrator::FeatureExtractorResolver;
use prediction_predictors::PercentileBandExplainer;

// ============================================================================
// SECTION: Feature Extractor Resolver
// ============================================================================

/// Resolves each [`ModelType`]'s fixed feature extractor, built once at
/// startup (spec §4.3 per-type contract table).
pub struct StaticExtractorResolver {
    print_time: Arc<dyn FeatureExtractor>,
    demand_forecast: Arc<dyn FeatureExtractor>,
    price_optimization: Arc<dyn FeatureExtractor>,
    churn_prediction: Arc<dyn FeatureExtractor>,
    material_demand: Arc<dyn FeatureExtractor>,
    bottleneck_detection: Arc<dyn FeatureExtractor>,
}

impl StaticExtractorResolver {
    /// Builds a resolver covering every [`ModelType`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            print_time: prediction_predictors::extractor_for(ModelType::PrintTime),
            demand_forecast: prediction_predictors::extractor_for(ModelType::DemandForecast),
            price_optimization: prediction_predictors::extractor_for(ModelType::PriceOptimization),
            churn_prediction: prediction_predictors::extractor_for(ModelType::ChurnPrediction),
            material_demand: prediction_predictors::extractor_for(ModelType::MaterialDemand),
            bottleneck_detection: prediction_predictors::extractor_for(ModelType::BottleneckDetection),
        }
    }
}

impl Default for StaticExtractorResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractorResolver for StaticExtractorResolver {
    fn resolve(&self, model_type: ModelType) -> &dyn FeatureExtractor {
        match model_type {
            ModelType::PrintTime => self.print_time.as_ref(),
            ModelType::DemandForecast => self.demand_forecast.as_ref(),
            ModelType::PriceOptimization => self.price_optimization.as_ref(),
            ModelType::ChurnPrediction => self.churn_prediction.as_ref(),
            ModelType::MaterialDemand => self.material_demand.as_ref(),
            ModelType::BottleneckDetection => self.bottleneck_detection.as_ref(),
        }
    }
}

// ============================================================================
// SECTION: Explainer Resolver
// ============================================================================

/// Resolves the single, shared [`PercentileBandExplainer`] for every model
/// type (spec §4.7).
#[derive(Default)]
pub struct StaticExplainerResolver {
    explainer: PercentileBandExplainer,
}

impl StaticExplainerResolver {
    /// Builds the shared explainer resolver.
    #[must_use]
    pub fn new() -> Self {
        Self { explainer: prediction_predictors::explainer() }
    }
}

impl ExplainerResolver for StaticExplainerResolver {
    fn resolve(&self, _model_type: ModelType) -> Option<&dyn Explainer> {
        Some(&self.explainer)
    }
}

// ============================================================================
// SECTION: Backend-Selectable Artifact Store
// ============================================================================

/// An [`ArtifactStore`] that is either the local filesystem backend or the
/// remote bearer-token backend, selected once at startup by
/// `[artifact].backend` (spec §6) so the rest of the CLI stays generic over
/// a single concrete type.
pub enum AnyArtifactStore {
    /// Development/single-node backend rooted at a local directory.
    Local(LocalFsArtifactStore),
    /// Bearer-token-authenticated remote artifact service.
    Remote(RemoteArtifactStore),
}

impl ArtifactStore for AnyArtifactStore {
    fn upload(&self, local_path: &Path, model_id: &ModelId, model_type: ModelType) -> Result<String, ArtifactError> {
        match self {
            Self::Local(store) => store.upload(local_path, model_id, model_type),
            Self::Remote(store) => store.upload(local_path, model_id, model_type),
        }
    }

    fn download(&self, model_id: &ModelId, model_type: ModelType) -> Result<std::path::PathBuf, ArtifactError> {
        match self {
            Self::Local(store) => store.download(model_id, model_type),
            Self::Remote(store) => store.download(model_id, model_type),
        }
    }

    fn download_cancellable(
        &self,
        model_id: &ModelId,
        model_type: ModelType,
        cancellation: &prediction_core::core::CancellationToken,
    ) -> Result<std::path::PathBuf, ArtifactError> {
        match self {
            Self::Local(store) => store.download_cancellable(model_id, model_type, cancellation),
            Self::Remote(store) => store.download_cancellable(model_id, model_type, cancellation),
        }
    }

    fn exists(&self, model_id: &ModelId, model_type: ModelType) -> Result<bool, ArtifactError> {
        match self {
            Self::Local(store) => store.exists(model_id, model_type),
            Self::Remote(store) => store.exists(model_id, model_type),
        }
    }

    fn delete(&self, model_id: &ModelId, model_type: ModelType) -> Result<(), ArtifactError> {
        match self {
            Self::Local(store) => store.delete(model_id, model_type),
            Self::Remote(store) => store.delete(model_id, model_type),
        }
    }

    fn list(&self, model_type: ModelType) -> Result<Vec<ModelId>, ArtifactError> {
        match self {
            Self::Local(store) => store.list(model_type),
            Self::Remote(store) => store.list(model_type),
        }
    }
}

/// Errors building an [`AnyArtifactStore`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactStoreBuildError {
    /// The local or remote backend could not be initialized.
    #[error("artifact store init error: {0}")]
    Init(#[from] ArtifactError),
    /// The remote backend's bearer token could not be read from its
    /// configured environment variable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builds the artifact store selected by `config.backend`.
///
/// # Errors
///
/// Returns [`ArtifactStoreBuildError`] when the selected backend cannot be
/// initialized (directory creation failure, HTTP client construction
/// failure, or a missing bearer-token environment variable).
pub fn build_artifact_store(config: &ArtifactConfig) -> Result<AnyArtifactStore, ArtifactStoreBuildError> {
    match config.backend {
        ArtifactBackend::Local => {
            let store = LocalFsArtifactStore::new(config.local.base_dir.clone())?;
            Ok(AnyArtifactStore::Local(store))
        }
        ArtifactBackend::Remote => {
            // `PredictionServiceConfig::validate` already requires `remote`
            // to be present when `backend` is `Remote`.
            let remote = config.remote.as_ref().ok_or_else(|| {
                ArtifactStoreBuildError::Config(ConfigError::Invalid("artifact.remote is required when artifact.backend is remote".to_string()))
            })?;
            let bearer_token = remote.bearer_token()?;
            let remote_config =
                RemoteArtifactStoreConfig::new(remote.base_url.clone(), bearer_token, remote.download_staging_dir.clone());
            let store = RemoteArtifactStore::new(remote_config)?;
            Ok(AnyArtifactStore::Remote(store))
        }
    }
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
    fn extractor_resolver_covers_every_model_type() {
        let resolver = StaticExtractorResolver::new();
        for model_type in ModelType::ALL {
            let _ = resolver.resolve(model_type);
        }
    }

    #[test]
    fn explainer_resolver_always_returns_an_explainer() {
        let resolver = StaticExplainerResolver::new();
        for model_type in ModelType::ALL {
            assert!(resolver.resolve(model_type).is_some());
        }
    }

    #[test]
    fn local_backend_builds_a_store_rooted_at_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ArtifactConfig {
            backend: ArtifactBackend::Local,
            local: prediction_config::LocalArtifactConfig { base_dir: dir.path().join("artifacts") },
            remote: None,
        };
        let store = build_artifact_store(&config).unwrap();
        assert!(matches!(store, AnyArtifactStore::Local(_)));
    }

    #[test]
    fn remote_backend_without_remote_section_is_rejected() {
        let config = ArtifactConfig { backend: ArtifactBackend::Remote, local: prediction_config::LocalArtifactConfig::default(), remote: None };
        let err = build_artifact_store(&config).unwrap_err();
        assert!(matches!(err, ArtifactStoreBuildError::Config(_)));
    }
}
