// prediction-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Prediction Orchestrator
// Description: The canonical prediction request pipeline (spec §4.3).
// Purpose: Execute the eleven-step request path so every caller (an external
//          transport layer, the CLI, tests) observes identical behavior.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The orchestrator is the single execution path for serving a prediction:
//! validate input, resolve the Active model, check the cache, extract
//! features, load the predictor, infer, explain, audit, and respond. All
//! API surfaces (an external HTTP layer, the CLI `predict` subcommand,
//! integration tests) must call into [`Orchestrator::predict`] to preserve
//! the cache and audit invariants.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::AuditedError;
use crate::core::CacheKey;
use crate::core::CacheStatus;
use crate::core::CancellationToken;
use crate::core::PredictionAuditLog;
use crate::core::PredictionError;
use crate::core::RequestId;
use crate::core::TenantId;
use crate::core::Timestamp;
use crate::core::UserId;
use crate::core::hashing::fingerprint_canonical_json;
use crate::core::model::ModelType;
use crate::core::model::ModelVersion;
use crate::interfaces::AuditSink;
use crate::interfaces::CacheValue;
use crate::interfaces::ConfidenceInterval;
use crate::interfaces::Explainer;
use crate::interfaces::FeatureExtractor;
use crate::interfaces::ModelRegistry;
use crate::interfaces::PredictionCache;
use crate::interfaces::PredictorRegistry;

// ============================================================================
// SECTION: Orchestrator Error
// ============================================================================

/// Orchestrator errors; every variant maps 1:1 onto [`PredictionError`]
/// (spec §7) via [`OrchestratorError::into_prediction_error`].
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Input validation failed.
    #[error("validation error: {0}")]
    Validation(String),
    /// Input exceeds the size cap.
    #[error("input too large: {0}")]
    InputTooLarge(String),
    /// No Active model exists for the requested type.
    #[error("no active model for type {0}")]
    NoActiveModel(ModelType),
    /// The predictor could not be loaded.
    #[error("predictor load error: {0}")]
    PredictorLoad(String),
    /// Inference failed.
    #[error("inference error: {0}")]
    Inference(String),
    /// A dependency returned a transient failure.
    #[error("transient infrastructure error: {0}")]
    TransientInfra(String),
}

impl OrchestratorError {
    /// Maps this error onto the public [`PredictionError`] taxonomy.
    #[must_use]
    pub fn into_prediction_error(self) -> PredictionError {
        match self {
            OrchestratorError::Validation(detail) => PredictionError::Validation(detail),
            OrchestratorError::InputTooLarge(detail) => PredictionError::InputTooLarge(detail),
            OrchestratorError::NoActiveModel(model_type) => PredictionError::NoActiveModel(model_type),
            OrchestratorError::PredictorLoad(detail) => PredictionError::PredictorLoad(detail),
            OrchestratorError::Inference(detail) => PredictionError::Inference(detail),
            OrchestratorError::TransientInfra(detail) => PredictionError::TransientInfra(detail),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::Validation(_) => "validation_error",
            OrchestratorError::InputTooLarge(_) => "input_too_large",
            OrchestratorError::NoActiveModel(_) => "no_active_model",
            OrchestratorError::PredictorLoad(_) => "predictor_load_error",
            OrchestratorError::Inference(_) => "inference_error",
            OrchestratorError::TransientInfra(_) => "transient_infra_error",
        }
    }
}

/// Maximum raw input payload size, in bytes (spec §4.3 geometry invariant).
pub const MAX_INPUT_BYTES: u64 = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Request / Response
// ============================================================================

/// A prediction request (spec §4.3 step 0).
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    /// Unique request identifier, generated by the caller.
    pub request_id: RequestId,
    /// The model type to serve.
    pub model_type: ModelType,
    /// Raw, untyped input payload.
    pub raw_input: Value,
    /// Approximate size of `raw_input` in bytes, for the size cap.
    pub input_byte_len: u64,
    /// Authenticated user, if present.
    pub user_id: Option<UserId>,
    /// Tenant, if present.
    pub tenant_id: Option<TenantId>,
    /// Whether to bypass the cache for this request (admin diagnostics).
    pub bypass_cache: bool,
}

/// A prediction response (spec §4.3 step 11, §6 response envelope).
#[derive(Debug, Clone)]
pub struct PredictionResponse {
    /// Audit log entry id this response was recorded under.
    pub audit_log_id: crate::core::AuditLogId,
    /// Model version that served the request.
    pub model_version: ModelVersion,
    /// The prediction payload.
    pub prediction: Value,
    /// Confidence interval, when the predictor supplied one.
    pub confidence_interval: Option<ConfidenceInterval>,
    /// Top feature contributions and human-readable explanation.
    pub explanation: Option<crate::interfaces::Explanation>,
    /// Whether the response was served from cache.
    pub cache_status: CacheStatus,
    /// Response latency in milliseconds.
    pub response_ms: u64,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Executes the prediction request pipeline over pluggable backends.
///
/// Generic over the registry (`R`), cache (`C`), predictor registry (`Pr`),
/// feature extractor resolver (`X`), and audit sink (`Au`) so tests and
/// production wiring both construct the same type with different
/// implementations, composed explicitly rather than through a container.
pub struct Orchestrator<R, C, Pr, X, Ex, Au> {
    registry: R,
    cache: C,
    predictors: Pr,
    feature_extractors: X,
    explainers: Ex,
    audit: Au,
    cache_ttl_seconds: std::collections::BTreeMap<ModelType, i64>,
}

/// Resolves a [`FeatureExtractor`] for a model type. A trait rather than a
/// bare map so production wiring can route to per-type extractor crates.
pub trait FeatureExtractorResolver {
    /// Returns the extractor for a model type.
    fn resolve(&self, model_type: ModelType) -> &dyn FeatureExtractor;
}

/// Resolves an [`Explainer`] for a model type. Optional: types without a
/// registered explainer skip step 8 (spec §4.3) and return `explanation:
/// None`.
pub trait ExplainerResolver {
    /// Returns the explainer for a model type, if one is registered.
    fn resolve(&self, model_type: ModelType) -> Option<&dyn Explainer>;
}

impl<R, C, Pr, X, Ex, Au> Orchestrator<R, C, Pr, X, Ex, Au>
where
    R: ModelRegistry,
    C: PredictionCache,
    Pr: PredictorRegistry,
    X: FeatureExtractorResolver,
    Ex: ExplainerResolver,
    Au: AuditSink,
{
    /// Composes an orchestrator from its backends. Cache writes use each
    /// model type's built-in default TTL ([`ModelType::cache_ttl_seconds`])
    /// unless overridden via [`Orchestrator::with_cache_ttl_seconds`].
    #[must_use]
    pub fn new(registry: R, cache: C, predictors: Pr, feature_extractors: X, explainers: Ex, audit: Au) -> Self {
        Self {
            registry,
            cache,
            predictors,
            feature_extractors,
            explainers,
            audit,
            cache_ttl_seconds: std::collections::BTreeMap::new(),
        }
    }

    /// Overrides the per-type cache TTL used on cache writes, e.g. from a
    /// loaded `cache.ttl.<type>` config section (spec §6). A type absent
    /// from `overrides` keeps using [`ModelType::cache_ttl_seconds`].
    #[must_use]
    pub fn with_cache_ttl_seconds(mut self, overrides: std::collections::BTreeMap<ModelType, i64>) -> Self {
        self.cache_ttl_seconds = overrides;
        self
    }

    fn cache_ttl_seconds_for(&self, model_type: ModelType) -> i64 {
        self.cache_ttl_seconds
            .get(&model_type)
            .copied()
            .unwrap_or_else(|| model_type.cache_ttl_seconds())
    }

    /// Runs the full prediction pipeline (spec §4.3 steps 1-11), with no
    /// cancellation signal. Equivalent to
    /// `predict_cancellable(request, now, elapsed_ms, &CancellationToken::never())`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] for every documented failure mode;
    /// callers convert it to [`PredictionError`] via
    /// [`OrchestratorError::into_prediction_error`].
    pub fn predict(
        &self,
        request: PredictionRequest,
        now: Timestamp,
        elapsed_ms: impl FnOnce() -> u64,
    ) -> Result<PredictionResponse, OrchestratorError> {
        self.predict_cancellable(request, now, elapsed_ms, &CancellationToken::never())
    }

    /// Runs the full prediction pipeline (spec §4.3 steps 1-11), checking
    /// `cancellation` once after the cache lookup and before feature
    /// extraction — the boundary past which a large input payload drives
    /// real extraction/inference work (spec §5: "large-input inference"
    /// checks cancellation). A cache hit never checks it: that path does no
    /// extraction or inference work worth aborting.
    ///
    /// Always writes exactly one audit entry, on both success and failure
    /// paths (property P6), except when validation fails before a request
    /// id can be attributed to a resolvable model type — even then an entry
    /// is written with `model_version: None`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] for every documented failure mode;
    /// callers convert it to [`PredictionError`] via
    /// [`OrchestratorError::into_prediction_error`].
    pub fn predict_cancellable(
        &self,
        request: PredictionRequest,
        now: Timestamp,
        elapsed_ms: impl FnOnce() -> u64,
        cancellation: &CancellationToken,
    ) -> Result<PredictionResponse, OrchestratorError> {
        let result = self.predict_inner(&request, now, cancellation);
        let response_ms = elapsed_ms();

        match &result {
            Ok(response) => {
                let entry = PredictionAuditLog {
                    id: crate::core::AuditLogId::new(response.audit_log_id.as_str()),
                    request_id: request.request_id.clone(),
                    model_type: request.model_type,
                    model_version: Some(response.model_version),
                    input_features: request.raw_input.clone(),
                    output_prediction: Some(response.prediction.clone()),
                    confidence: response.confidence_interval.map(|ci| (ci.lower + ci.upper) / 2.0),
                    response_ms,
                    cache_status: response.cache_status,
                    user_id: request.user_id.clone(),
                    tenant_id: request.tenant_id.clone(),
                    timestamp: now,
                    actual_outcome: None,
                    outcome_received_at: None,
                    error: None,
                };
                let _ = self.audit.append(entry);
            }
            Err(err) => {
                let entry = PredictionAuditLog {
                    id: crate::core::AuditLogId::new(request.request_id.as_str()),
                    request_id: request.request_id.clone(),
                    model_type: request.model_type,
                    model_version: None,
                    input_features: request.raw_input.clone(),
                    output_prediction: None,
                    confidence: None,
                    response_ms,
                    cache_status: CacheStatus::Bypass,
                    user_id: request.user_id.clone(),
                    tenant_id: request.tenant_id.clone(),
                    timestamp: now,
                    actual_outcome: None,
                    outcome_received_at: None,
                    error: Some(AuditedError {
                        kind: err.kind().to_string(),
                        detail: err.to_string(),
                    }),
                };
                let _ = self.audit.append(entry);
            }
        }

        result
    }

    fn predict_inner(
        &self,
        request: &PredictionRequest,
        now: Timestamp,
        cancellation: &CancellationToken,
    ) -> Result<PredictionResponse, OrchestratorError> {
        // Step 1: validate input size and shape.
        if request.input_byte_len > MAX_INPUT_BYTES {
            return Err(OrchestratorError::InputTooLarge(format!(
                "{} bytes exceeds cap of {} bytes",
                request.input_byte_len, MAX_INPUT_BYTES
            )));
        }
        if request.raw_input.is_null() {
            return Err(OrchestratorError::Validation("raw_input must not be null".to_string()));
        }

        // Step 2: resolve the Active model for the type.
        let active = self
            .registry
            .get_active(request.model_type)
            .map_err(|err| OrchestratorError::TransientInfra(err.to_string()))?
            .ok_or(OrchestratorError::NoActiveModel(request.model_type))?;

        // Step 3: fingerprint the request for cache addressing.
        let fingerprint = fingerprint_canonical_json(&request.raw_input)
            .map_err(|err| OrchestratorError::Validation(err.to_string()))?;
        let cache_key = CacheKey::new(request.model_type, &fingerprint, active.version);

        // Step 4: consult the cache unless bypassed. Cache errors fail open
        // to a miss (spec §7) rather than failing the request.
        if !request.bypass_cache {
            if let Ok(Some(cached)) = self.cache.get(&cache_key, now) {
                if let Ok(cached) = serde_json::from_slice::<CachedPrediction>(&cached.bytes) {
                    return Ok(PredictionResponse {
                        audit_log_id: crate::core::AuditLogId::new(request.request_id.as_str()),
                        model_version: active.version,
                        prediction: cached.prediction,
                        confidence_interval: cached.confidence_interval,
                        explanation: cached.explanation,
                        cache_status: CacheStatus::Hit,
                        response_ms: 0,
                    });
                }
            }
        }

        if cancellation.is_cancelled() {
            return Err(OrchestratorError::TransientInfra("prediction cancelled".to_string()));
        }

        // Step 5: extract typed features for this model type.
        let extractor = self.feature_extractors.resolve(request.model_type);
        let features = extractor
            .extract(&request.raw_input)
            .map_err(|err| match err {
                crate::interfaces::FeatureExtractorError::Malformed(detail) => {
                    OrchestratorError::Validation(detail)
                }
                crate::interfaces::FeatureExtractorError::TooLarge(actual, cap) => {
                    OrchestratorError::InputTooLarge(format!("{actual} bytes exceeds cap of {cap} bytes"))
                }
            })?;

        // Step 6: load the memoized predictor for the Active model.
        let predictor = self
            .predictors
            .get(request.model_type, &active.id)
            .map_err(|err| OrchestratorError::PredictorLoad(err.to_string()))?;

        // Step 7: run inference.
        let raw = predictor
            .predict(&features)
            .map_err(|err| OrchestratorError::Inference(err.to_string()))?;

        // Step 8: explain, when the type has a registered explainer. A
        // missing explainer, or one that declines (e.g. all-zero scores),
        // leaves `explanation: None` rather than failing the request.
        let explanation = self.explainers.resolve(request.model_type).and_then(|explainer| {
            explainer
                .explain(&raw.feature_scores, &active.metadata.feature_population, &features)
                .ok()
        });

        // Step 9: cache the fresh result before returning.
        let cached = CachedPrediction {
            prediction: raw.value.clone(),
            confidence_interval: raw.confidence_interval,
            explanation: explanation.clone(),
        };
        if let Ok(bytes) = serde_json::to_vec(&cached) {
            let _ = self.cache.put(
                cache_key,
                CacheValue { format_tag: 1, bytes },
                self.cache_ttl_seconds_for(request.model_type),
                now,
            );
        }

        Ok(PredictionResponse {
            audit_log_id: crate::core::AuditLogId::new(request.request_id.as_str()),
            model_version: active.version,
            prediction: raw.value,
            confidence_interval: raw.confidence_interval,
            explanation,
            cache_status: CacheStatus::Miss,
            response_ms: 0,
        })
    }
}

/// The serialized cache payload (Invariant C2: tagged with
/// [`CacheValue::format_tag`] so a future shape change can be detected).
#[derive(serde::Serialize, serde::Deserialize)]
struct CachedPrediction {
    prediction: Value,
    confidence_interval: Option<ConfidenceInterval>,
    explanation: Option<crate::interfaces::Explanation>,
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
    use crate::core::MetricBundleV1;
    use crate::core::Model;
    use crate::core::ModelId;
    use crate::core::ModelMetadata;
    use crate::core::ModelStatus;
    use crate::core::PerformanceMetrics;
    use crate::interfaces::Predictor;
    use crate::interfaces::PredictorError;
    use crate::interfaces::PredictorRegistryError;
    use crate::interfaces::RawPrediction;
    use crate::runtime::cache::InMemoryPredictionCache;
    use crate::runtime::registry::InMemoryModelRegistry;
    use std::sync::Arc;

    struct EchoPredictor;

    impl Predictor for EchoPredictor {
        fn predict(&self, features: &Value) -> Result<RawPrediction, PredictorError> {
            Ok(RawPrediction {
                value: serde_json::json!({ "echo": features }),
                confidence_interval: None,
                feature_scores: vec![],
            })
        }
    }

    struct FixedPredictorRegistry;

    impl PredictorRegistry for FixedPredictorRegistry {
        fn get(
            &self,
            _model_type: ModelType,
            _model_id: &ModelId,
        ) -> Result<Arc<dyn Predictor>, PredictorRegistryError> {
            Ok(Arc::new(EchoPredictor))
        }
    }

    struct IdentityExtractor;

    impl FeatureExtractor for IdentityExtractor {
        fn extract(&self, raw_input: &Value) -> Result<Value, crate::interfaces::FeatureExtractorError> {
            Ok(raw_input.clone())
        }
    }

    struct SingleExtractorResolver(IdentityExtractor);

    impl FeatureExtractorResolver for SingleExtractorResolver {
        fn resolve(&self, _model_type: ModelType) -> &dyn FeatureExtractor {
            &self.0
        }
    }

    struct NoExplainerResolver;

    impl ExplainerResolver for NoExplainerResolver {
        fn resolve(&self, _model_type: ModelType) -> Option<&dyn Explainer> {
            None
        }
    }

    struct NullAuditSink;

    impl AuditSink for NullAuditSink {
        fn append(&self, entry: PredictionAuditLog) -> Result<crate::core::AuditLogId, crate::interfaces::AuditError> {
            Ok(entry.id)
        }

        fn record_feedback(
            &self,
            _id: &crate::core::AuditLogId,
            _actual_outcome: Value,
            _received_at: Timestamp,
        ) -> Result<(), crate::interfaces::AuditError> {
            Ok(())
        }
    }

    fn seeded_registry(now: Timestamp) -> InMemoryModelRegistry {
        let registry = InMemoryModelRegistry::new();
        let model = Model {
            id: ModelId::new("m1"),
            model_type: ModelType::PrintTime,
            version: ModelVersion::initial(),
            status: ModelStatus::Draft,
            artifact_uri: "local://m1".to_string(),
            trained_at: now,
            deployed_at: None,
            deprecated_at: None,
            metrics: MetricBundleV1::new(PerformanceMetrics { r2: Some(0.9), ..PerformanceMetrics::default() }),
            training_job_id: None,
            metadata: ModelMetadata::default(),
        };
        registry.save(model.clone()).unwrap();
        registry.transition(&model.id, ModelStatus::Draft, ModelStatus::Testing, now, None).unwrap();
        registry.transition(&model.id, ModelStatus::Testing, ModelStatus::Active, now, None).unwrap();
        registry
    }

    fn build_orchestrator(
        now: Timestamp,
    ) -> Orchestrator<
        InMemoryModelRegistry,
        InMemoryPredictionCache,
        FixedPredictorRegistry,
        SingleExtractorResolver,
        NoExplainerResolver,
        NullAuditSink,
    > {
        Orchestrator::new(
            seeded_registry(now),
            InMemoryPredictionCache::new(),
            FixedPredictorRegistry,
            SingleExtractorResolver(IdentityExtractor),
            NoExplainerResolver,
            NullAuditSink,
        )
    }

    #[test]
    fn no_active_model_returns_no_active_model_error() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let orchestrator = Orchestrator::new(
            InMemoryModelRegistry::new(),
            InMemoryPredictionCache::new(),
            FixedPredictorRegistry,
            SingleExtractorResolver(IdentityExtractor),
            NoExplainerResolver,
            NullAuditSink,
        );
        let request = PredictionRequest {
            request_id: RequestId::new("r1"),
            model_type: ModelType::PrintTime,
            raw_input: serde_json::json!({"volume_cm3": 12.0}),
            input_byte_len: 32,
            user_id: None,
            tenant_id: None,
            bypass_cache: false,
        };
        let err = orchestrator.predict(request, now, || 1).unwrap_err();
        assert!(matches!(err, OrchestratorError::NoActiveModel(ModelType::PrintTime)));
    }

    #[test]
    fn identical_requests_are_cache_hits_on_second_call() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let orchestrator = build_orchestrator(now);
        let request = || PredictionRequest {
            request_id: RequestId::new("r1"),
            model_type: ModelType::PrintTime,
            raw_input: serde_json::json!({"volume_cm3": 12.0}),
            input_byte_len: 32,
            user_id: None,
            tenant_id: None,
            bypass_cache: false,
        };

        let first = orchestrator.predict(request(), now, || 5).unwrap();
        assert_eq!(first.cache_status, CacheStatus::Miss);

        let second = orchestrator.predict(request(), now, || 1).unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(first.prediction, second.prediction);
    }

    #[test]
    fn cancelled_token_aborts_before_feature_extraction() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let orchestrator = build_orchestrator(now);
        let token = CancellationToken::new();
        token.cancel();
        let request = PredictionRequest {
            request_id: RequestId::new("r1"),
            model_type: ModelType::PrintTime,
            raw_input: serde_json::json!({"volume_cm3": 12.0}),
            input_byte_len: 32,
            user_id: None,
            tenant_id: None,
            bypass_cache: false,
        };
        let err = orchestrator.predict_cancellable(request, now, || 1, &token).unwrap_err();
        assert!(matches!(err, OrchestratorError::TransientInfra(_)));
    }

    #[test]
    fn oversized_input_is_rejected_before_touching_registry() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let orchestrator = build_orchestrator(now);
        let request = PredictionRequest {
            request_id: RequestId::new("r1"),
            model_type: ModelType::PrintTime,
            raw_input: serde_json::json!({"volume_cm3": 12.0}),
            input_byte_len: MAX_INPUT_BYTES + 1,
            user_id: None,
            tenant_id: None,
            bypass_cache: false,
        };
        let err = orchestrator.predict(request, now, || 1).unwrap_err();
        assert!(matches!(err, OrchestratorError::InputTooLarge(_)));
    }

    struct ScoredPredictor;

    impl Predictor for ScoredPredictor {
        fn predict(&self, features: &Value) -> Result<RawPrediction, PredictorError> {
            Ok(RawPrediction {
                value: serde_json::json!({ "echo": features }),
                confidence_interval: Some(crate::interfaces::ConfidenceInterval { lower: 1.0, upper: 2.0 }),
                feature_scores: vec![("volume_cm3".to_string(), 0.9), ("infill".to_string(), 0.4)],
            })
        }
    }

    struct FixedScoredPredictorRegistry;

    impl PredictorRegistry for FixedScoredPredictorRegistry {
        fn get(
            &self,
            _model_type: ModelType,
            _model_id: &ModelId,
        ) -> Result<Arc<dyn Predictor>, PredictorRegistryError> {
            Ok(Arc::new(ScoredPredictor))
        }
    }

    #[test]
    fn explanation_is_populated_on_miss_and_preserved_on_hit() {
        use crate::interfaces::Explanation;

        struct FixedExplainer;
        impl Explainer for FixedExplainer {
            fn explain(
                &self,
                feature_scores: &[(String, f64)],
                _population: &[crate::core::FeaturePopulationStats],
                _current_values: &Value,
            ) -> Result<Explanation, crate::interfaces::ExplainerError> {
                Ok(Explanation {
                    top_factors: feature_scores
                        .iter()
                        .map(|(name, weight)| crate::core::FeatureContribution {
                            name: name.clone(),
                            weight: *weight,
                            trend: None,
                        })
                        .collect(),
                    human_readable: "volume_cm3 is the dominant factor".to_string(),
                })
            }
        }

        struct FixedExplainerResolver(FixedExplainer);
        impl ExplainerResolver for FixedExplainerResolver {
            fn resolve(&self, _model_type: ModelType) -> Option<&dyn Explainer> {
                Some(&self.0)
            }
        }

        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let orchestrator = Orchestrator::new(
            seeded_registry(now),
            InMemoryPredictionCache::new(),
            FixedScoredPredictorRegistry,
            SingleExtractorResolver(IdentityExtractor),
            FixedExplainerResolver(FixedExplainer),
            NullAuditSink,
        );
        let request = || PredictionRequest {
            request_id: RequestId::new("r1"),
            model_type: ModelType::PrintTime,
            raw_input: serde_json::json!({"volume_cm3": 12.0}),
            input_byte_len: 32,
            user_id: None,
            tenant_id: None,
            bypass_cache: false,
        };

        let first = orchestrator.predict(request(), now, || 5).unwrap();
        assert_eq!(first.cache_status, CacheStatus::Miss);
        let explanation = first.explanation.expect("explanation on miss");
        assert_eq!(explanation.top_factors[0].name, "volume_cm3");
        assert!(first.confidence_interval.is_some());

        let second = orchestrator.predict(request(), now, || 1).unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.explanation, first.explanation);
        assert_eq!(second.confidence_interval, first.confidence_interval);
    }
}
