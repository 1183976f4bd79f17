// prediction-predictors/src/registry.rs
// ============================================================================
// Module: Artifact-Backed Predictor Registry
// Description: Lazy-loading, memoized PredictorRegistry (spec §4.3 step 5).
// Purpose: Map (model type, model id) to a loaded predictor instance,
//          downloading and deserializing from the artifact store on first
//          use, without the predictor holding a back-reference to this
//          registry (Design Note "Cyclic references").
// Dependencies: prediction-core
// ============================================================================

//! ## Overview
//! [`ArtifactBackedPredictorRegistry`] wraps any
//! [`prediction_core::interfaces::ArtifactStore`] and satisfies
//! [`prediction_core::interfaces::PredictorRegistry`]. A single mutex
//! guards the memo table; the download-and-deserialize step runs while the
//! lock is held, which gives the single-flight guarantee required by spec
//! §5 at the cost of serializing loads across different keys too (loads are
//! expected to be rare relative to cache hits, so this is an acceptable
//! trade-off for a reference implementation). Eviction beyond
//! [`ArtifactBackedPredictorRegistry::capacity`] drops the registry's
//! `Arc`; in-flight inferences hold their own clone and complete
//! unaffected (spec §5 "eviction must wait for in-flight inferences").

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use prediction_core::ModelId;
use prediction_core::ModelType;
use prediction_core::interfaces::ArtifactStore;
use prediction_core::interfaces::Predictor;
use prediction_core::interfaces::PredictorRegistry;
use prediction_core::interfaces::PredictorRegistryError;

use crate::bottleneck_detection::BottleneckDetectionPredictor;
use crate::churn_prediction::ChurnPredictionPredictor;
use crate::demand_forecast::DemandForecastPredictor;
use crate::material_demand::MaterialDemandPredictor;
use crate::price_optimization::PriceOptimizationPredictor;
use crate::print_time::PrintTimePredictor;

/// Default memo capacity when none is configured (spec §6
/// `predictor.cache.capacity`).
pub const DEFAULT_CAPACITY: usize = 32;

type MemoKey = (ModelType, ModelId);

/// Deserializes artifact bytes into the predictor for `model_type`.
///
/// # Errors
///
/// Returns an error string when `bytes` is not a valid artifact for the
/// type (only [`ModelType::PrintTime`] currently has structured
/// coefficients to validate; the other placeholder predictors accept any
/// bytes).
fn load_predictor(model_type: ModelType, bytes: &[u8]) -> Result<Arc<dyn Predictor>, String> {
    match model_type {
        ModelType::PrintTime => {
            let predictor = PrintTimePredictor::from_artifact_bytes(bytes)?;
            Ok(Arc::new(predictor))
        }
        ModelType::DemandForecast => Ok(Arc::new(DemandForecastPredictor)),
        ModelType::PriceOptimization => Ok(Arc::new(PriceOptimizationPredictor)),
        ModelType::ChurnPrediction => Ok(Arc::new(ChurnPredictionPredictor)),
        ModelType::MaterialDemand => Ok(Arc::new(MaterialDemandPredictor)),
        ModelType::BottleneckDetection => Ok(Arc::new(BottleneckDetectionPredictor)),
    }
}

struct Memo {
    predictors: std::collections::BTreeMap<MemoKey, Arc<dyn Predictor>>,
    order: VecDeque<MemoKey>,
}

/// A [`PredictorRegistry`] backed by an [`ArtifactStore`], with a bounded
/// LRU memo (spec §4.3 step 5, §5, §9 "Cyclic references").
pub struct ArtifactBackedPredictorRegistry<S> {
    artifact_store: S,
    capacity: usize,
    memo: Mutex<Memo>,
}

impl<S> ArtifactBackedPredictorRegistry<S>
where
    S: ArtifactStore,
{
    /// Creates a registry over `artifact_store` with the default capacity.
    #[must_use]
    pub fn new(artifact_store: S) -> Self {
        Self::with_capacity(artifact_store, DEFAULT_CAPACITY)
    }

    /// Creates a registry with an explicit memo capacity
    /// (`predictor.cache.capacity`, spec §6).
    #[must_use]
    pub fn with_capacity(artifact_store: S, capacity: usize) -> Self {
        Self {
            artifact_store,
            capacity: capacity.max(1),
            memo: Mutex::new(Memo {
                predictors: std::collections::BTreeMap::new(),
                order: VecDeque::new(),
            }),
        }
    }
}

impl<S> PredictorRegistry for ArtifactBackedPredictorRegistry<S>
where
    S: ArtifactStore,
{
    fn get(
        &self,
        model_type: ModelType,
        model_id: &ModelId,
    ) -> Result<Arc<dyn Predictor>, PredictorRegistryError> {
        let key: MemoKey = (model_type, model_id.clone());

        let mut guard = self
            .memo
            .lock()
            .map_err(|_| PredictorRegistryError::Load("predictor memo mutex poisoned".to_string()))?;

        if let Some(predictor) = guard.predictors.get(&key) {
            return Ok(Arc::clone(predictor));
        }

        let local_path = self
            .artifact_store
            .download(model_id, model_type)
            .map_err(|err| PredictorRegistryError::Load(err.to_string()))?;
        let bytes = std::fs::read(&local_path)
            .map_err(|err| PredictorRegistryError::Load(format!("reading downloaded artifact: {err}")))?;
        let predictor = load_predictor(model_type, &bytes).map_err(PredictorRegistryError::Load)?;

        guard.predictors.insert(key.clone(), Arc::clone(&predictor));
        guard.order.push_back(key);
        while guard.order.len() > self.capacity {
            if let Some(stale_key) = guard.order.pop_front() {
                guard.predictors.remove(&stale_key);
            }
        }

        Ok(predictor)
    }
}

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
    use prediction_core::interfaces::ArtifactError;

    /// An in-memory stand-in for an artifact store: every model id maps to
    /// the same fixed bytes, written to a fresh temp file per download.
    struct FixedArtifactStore {
        bytes: Vec<u8>,
        dir: tempfile::TempDir,
        downloads: Mutex<u64>,
    }

    impl FixedArtifactStore {
        fn new(bytes: Vec<u8>) -> Self {
            Self {
                bytes,
                dir: tempfile::tempdir().expect("tempdir"),
                downloads: Mutex::new(0),
            }
        }
    }

    impl ArtifactStore for FixedArtifactStore {
        fn upload(&self, _local_path: &std::path::Path, _model_id: &ModelId, _model_type: ModelType) -> Result<String, ArtifactError> {
            Ok("fixed://artifact".to_string())
        }

        fn download(&self, model_id: &ModelId, _model_type: ModelType) -> Result<std::path::PathBuf, ArtifactError> {
            let mut count = self.downloads.lock().expect("mutex");
            *count += 1;
            let path = self.dir.path().join(format!("{}.bin", model_id.as_str()));
            std::fs::write(&path, &self.bytes).map_err(|err| ArtifactError::Io(err.to_string()))?;
            Ok(path)
        }

        fn exists(&self, _model_id: &ModelId, _model_type: ModelType) -> Result<bool, ArtifactError> {
            Ok(true)
        }

        fn delete(&self, _model_id: &ModelId, _model_type: ModelType) -> Result<(), ArtifactError> {
            Ok(())
        }

        fn list(&self, _model_type: ModelType) -> Result<Vec<ModelId>, ArtifactError> {
            Ok(vec![])
        }
    }

    fn demand_forecast_bytes() -> Vec<u8> {
        b"placeholder-artifact".to_vec()
    }

    #[test]
    fn second_get_for_same_key_does_not_redownload() {
        let store = FixedArtifactStore::new(demand_forecast_bytes());
        let registry = ArtifactBackedPredictorRegistry::new(store);
        let model_id = ModelId::new("m1");

        let first = registry.get(ModelType::DemandForecast, &model_id).unwrap();
        let second = registry.get(ModelType::DemandForecast, &model_id).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn capacity_evicts_oldest_entry() {
        let store = FixedArtifactStore::new(demand_forecast_bytes());
        let registry = ArtifactBackedPredictorRegistry::with_capacity(store, 1);

        let first_id = ModelId::new("m1");
        let second_id = ModelId::new("m2");
        let first = registry.get(ModelType::DemandForecast, &first_id).unwrap();
        let _second = registry.get(ModelType::DemandForecast, &second_id).unwrap();

        // m1 was evicted; re-fetching it downloads again rather than reusing `first`.
        let refetched = registry.get(ModelType::DemandForecast, &first_id).unwrap();
        assert!(!Arc::ptr_eq(&first, &refetched));
    }

    #[test]
    fn malformed_print_time_artifact_surfaces_load_error() {
        let store = FixedArtifactStore::new(b"not valid json".to_vec());
        let registry = ArtifactBackedPredictorRegistry::new(store);
        let err = registry.get(ModelType::PrintTime, &ModelId::new("m1")).unwrap_err();
        assert!(matches!(err, PredictorRegistryError::Load(_)));
    }
}
