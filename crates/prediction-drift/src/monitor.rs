// prediction-drift/src/monitor.rs
// ============================================================================
// Module: Drift Monitor
// Description: Background degradation detector for Active models (spec
//              §4.9).
// Purpose: Track a trailing-window rolling quality score per model type
//          from ground-truth feedback, detect relative degradation against
//          the deployment baseline, trigger retraining, and roll back when
//          two adjacent windows breach in a row.
// Dependencies: prediction_core::{core, interfaces, runtime::LifecycleManager}
// ============================================================================

//! ## Overview
//! [`DriftMonitor`] owns one ring buffer of [`DriftSample`]s per
//! [`ModelType`] (spec §4.9: "trailing-window ring buffer of
//! `(timestamp, correct: bool | squared_error: f64)` samples per active
//! model"). [`DriftMonitor::evaluate`] partitions the buffer into the
//! current trailing window and the one immediately before it — two
//! adjacent, non-overlapping windows, resolving spec.md's ambiguous
//! "two consecutive evaluation windows" the same way `SPEC_FULL.md` §4.9
//! does. A breach in the current window always requests a retrain; a
//! breach in both windows back to back makes the type eligible for
//! automatic rollback, which this monitor performs itself through
//! [`LifecycleManager::rollback`] when a prior Deprecated version exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;

use prediction_core::core::DriftDetected;
use prediction_core::core::ModelStatus;
use prediction_core::core::ModelType;
use prediction_core::core::OperationalEvent;
use prediction_core::core::Timestamp;
use prediction_core::core::TrainingTrigger;
use prediction_core::interfaces::EventPublisher;
use prediction_core::interfaces::ModelRegistry;
use prediction_core::interfaces::RegistryError;
use prediction_core::runtime::lifecycle::LifecycleError;
use prediction_core::runtime::lifecycle::LifecycleManager;

use crate::baseline::DeploymentBaseline;
use crate::sample::DriftSample;

/// Default trailing window size (spec §4.9: "trailing 24 h").
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Default relative degradation threshold (spec §4.9: "degrades by ≥ 5%").
pub const DEFAULT_RELATIVE_DEGRADATION_THRESHOLD: f64 = 0.05;

/// Minimum samples a window must hold before it is evaluated. Below this,
/// a rolling score is too noisy to act on; the window is treated as
/// healthy rather than breaching.
pub const MIN_WINDOW_SAMPLES: usize = 30;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Drift monitor errors.
#[derive(Debug, Error)]
pub enum DriftMonitorError {
    /// The registry failed while resolving a rollback target.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A rollback attempt failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

// ============================================================================
// SECTION: Retrain Trigger Seam
// ============================================================================

/// A seam the drift monitor calls into to request a retrain without being
/// generic over the training orchestrator's full backend parameter set.
pub trait RetrainTrigger {
    /// Requests that `model_type` be retrained with the given trigger
    /// (spec §4.9: a breach "triggers ... a retraining job"). Best-effort:
    /// implementations should enqueue or log, never block the monitor.
    fn request_retrain(&self, model_type: ModelType, trigger: TrainingTrigger);
}

/// A [`RetrainTrigger`] that does nothing, for monitors run without a
/// training pipeline attached (tests, dry-run CLI invocations).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpRetrainTrigger;

impl RetrainTrigger for NoOpRetrainTrigger {
    fn request_retrain(&self, _model_type: ModelType, _trigger: TrainingTrigger) {}
}

// ============================================================================
// SECTION: Evaluation Result
// ============================================================================

/// The outcome of evaluating one model type's windows (spec §4.9).
#[derive(Debug, Clone, PartialEq)]
pub enum DriftEvaluation {
    /// No baseline has been recorded yet for this type (no model ever
    /// promoted), or the current window does not yet hold
    /// [`MIN_WINDOW_SAMPLES`].
    InsufficientData,
    /// The current window's rolling quality score is within threshold of
    /// the deployment baseline.
    Healthy {
        /// Current window's rolling quality score.
        rolling_score: f64,
    },
    /// The current window breached the relative degradation threshold.
    Breach {
        /// Relative degradation vs. the deployment baseline, e.g. `0.07`.
        relative_degradation: f64,
        /// Whether the immediately preceding window also breached.
        rollback_eligible: bool,
        /// Whether this evaluation performed a rollback (only possible
        /// when `rollback_eligible` and a prior Deprecated version exists).
        rollback_performed: bool,
    },
}

// ============================================================================
// SECTION: Drift Monitor
// ============================================================================

struct TypeState {
    samples: VecDeque<(Timestamp, DriftSample)>,
    baseline: Option<DeploymentBaseline>,
}

impl Default for TypeState {
    fn default() -> Self {
        Self { samples: VecDeque::new(), baseline: None }
    }
}

/// Tracks rolling accuracy per model type and acts on sustained degradation
/// (spec §4.9).
pub struct DriftMonitor<R> {
    lifecycle: LifecycleManager<R>,
    state: Mutex<BTreeMap<ModelType, TypeState>>,
    window_hours: i64,
    relative_degradation_threshold: f64,
    publisher: Option<Arc<dyn EventPublisher + Send + Sync>>,
}

impl<R: ModelRegistry> DriftMonitor<R> {
    /// Composes a drift monitor over an existing lifecycle manager.
    #[must_use]
    pub fn new(lifecycle: LifecycleManager<R>, window_hours: i64, relative_degradation_threshold: f64) -> Self {
        Self {
            lifecycle,
            state: Mutex::new(BTreeMap::new()),
            window_hours,
            relative_degradation_threshold,
            publisher: None,
        }
    }

    /// Attaches an [`EventPublisher`] that receives [`DriftDetected`] events
    /// on every breach (spec §6).
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher + Send + Sync>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Records the quality score a model type was promoted (or rolled
    /// back) with, and clears prior samples so the next evaluation
    /// compares against the new deployment rather than stale history.
    pub fn set_baseline(&self, baseline: DeploymentBaseline) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = state.entry(baseline.model_type).or_default();
        entry.baseline = Some(baseline);
        entry.samples.clear();
    }

    /// Records a single ground-truth observation for `model_type` and
    /// prunes samples older than two trailing windows.
    pub fn observe(&self, model_type: ModelType, sample: DriftSample, at: Timestamp) {
        let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = state.entry(model_type).or_default();
        entry.samples.push_back((at, sample));
        let cutoff = at.plus_seconds(-2 * self.window_hours * 3600);
        while entry.samples.front().is_some_and(|(ts, _)| *ts < cutoff) {
            entry.samples.pop_front();
        }
    }

    /// Evaluates `model_type`'s current and previous trailing windows as of
    /// `now`, publishing a [`DriftDetected`] event and performing a
    /// rollback when both windows breach.
    ///
    /// # Errors
    ///
    /// Returns [`DriftMonitorError`] on a registry failure while resolving
    /// or performing a rollback.
    pub fn evaluate(&self, model_type: ModelType, now: Timestamp) -> Result<DriftEvaluation, DriftMonitorError> {
        let (baseline, current_scores, previous_scores) = {
            let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let Some(entry) = state.get(&model_type) else {
                return Ok(DriftEvaluation::InsufficientData);
            };
            let Some(baseline) = entry.baseline else {
                return Ok(DriftEvaluation::InsufficientData);
            };
            let current_start = now.plus_seconds(-self.window_hours * 3600);
            let previous_start = now.plus_seconds(-2 * self.window_hours * 3600);
            let current: Vec<f64> = entry
                .samples
                .iter()
                .filter(|(ts, _)| *ts >= current_start && *ts <= now)
                .map(|(_, sample)| sample.quality_score())
                .collect();
            let previous: Vec<f64> = entry
                .samples
                .iter()
                .filter(|(ts, _)| *ts >= previous_start && *ts < current_start)
                .map(|(_, sample)| sample.quality_score())
                .collect();
            (baseline, current, previous)
        };

        if current_scores.len() < MIN_WINDOW_SAMPLES {
            return Ok(DriftEvaluation::InsufficientData);
        }

        let rolling_score = mean(&current_scores);
        let relative_degradation = (baseline.quality_score - rolling_score) / baseline.quality_score;
        if relative_degradation < self.relative_degradation_threshold {
            return Ok(DriftEvaluation::Healthy { rolling_score });
        }

        let previous_breached = previous_scores.len() >= MIN_WINDOW_SAMPLES && {
            let previous_score = mean(&previous_scores);
            (baseline.quality_score - previous_score) / baseline.quality_score >= self.relative_degradation_threshold
        };

        tracing::warn!(
            %model_type,
            relative_degradation,
            rollback_eligible = previous_breached,
            "drift monitor detected degradation against deployment baseline"
        );

        self.publish_drift_detected(model_type, baseline, relative_degradation, previous_breached, now);

        let rollback_performed = previous_breached && self.attempt_rollback(model_type, now)?;

        Ok(DriftEvaluation::Breach {
            relative_degradation,
            rollback_eligible: previous_breached,
            rollback_performed,
        })
    }

    fn attempt_rollback(&self, model_type: ModelType, now: Timestamp) -> Result<bool, DriftMonitorError> {
        let mut deprecated = self.lifecycle.registry().list_versions(model_type, Some(ModelStatus::Deprecated))?;
        deprecated.sort_by(|a, b| b.version.cmp(&a.version));
        let Some(target) = deprecated.into_iter().next() else {
            return Ok(false);
        };
        self.lifecycle.rollback(&target.id, "automatic rollback after sustained drift", now)?;
        tracing::warn!(%model_type, restored_version = %target.version, "drift monitor rolled back to prior version");
        Ok(true)
    }

    fn publish_drift_detected(
        &self,
        model_type: ModelType,
        baseline: DeploymentBaseline,
        relative_degradation: f64,
        rollback_eligible: bool,
        now: Timestamp,
    ) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        let event = OperationalEvent::DriftDetected(DriftDetected {
            model_type,
            active_version: baseline.version,
            relative_degradation,
            rollback_eligible,
            timestamp: now,
        });
        if let Err(err) = publisher.publish(event) {
            tracing::warn!(%model_type, %err, "failed to publish drift_detected event");
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    #[allow(clippy::cast_precision_loss, reason = "sample window sizes are far below f64's exact-integer range")]
    let len = values.len() as f64;
    values.iter().sum::<f64>() / len
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
    use prediction_core::core::Model;
    use prediction_core::core::ModelId;
    use prediction_core::core::ModelMetadata;
    use prediction_core::core::ModelVersion;
    use prediction_core::core::PerformanceMetrics;
    use prediction_core::core::model::MetricBundleV1;
    use prediction_core::runtime::registry::InMemoryModelRegistry;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(seconds))
    }

    fn active_model(id: &str, version: ModelVersion, now: Timestamp) -> Model {
        Model {
            id: ModelId::new(id),
            model_type: ModelType::ChurnPrediction,
            version,
            status: ModelStatus::Active,
            artifact_uri: format!("local://{id}"),
            trained_at: now,
            deployed_at: Some(now),
            deprecated_at: None,
            metrics: MetricBundleV1::new(PerformanceMetrics::default()),
            training_job_id: None,
            metadata: ModelMetadata::default(),
        }
    }

    fn monitor_with_active_model() -> (DriftMonitor<InMemoryModelRegistry>, ModelId, Timestamp) {
        let now = ts(0);
        let registry = InMemoryModelRegistry::new();
        let model = active_model("m1", ModelVersion::initial(), now);
        registry.save(model.clone()).unwrap();
        let lifecycle = LifecycleManager::new(registry);
        let monitor = DriftMonitor::new(lifecycle, DEFAULT_WINDOW_HOURS, DEFAULT_RELATIVE_DEGRADATION_THRESHOLD);
        monitor.set_baseline(DeploymentBaseline::new(ModelType::ChurnPrediction, model.version, 1.0, now));
        (monitor, model.id, now)
    }

    #[test]
    fn insufficient_samples_reports_insufficient_data() {
        let (monitor, _id, now) = monitor_with_active_model();
        for i in 0..5 {
            monitor.observe(ModelType::ChurnPrediction, DriftSample::Correct(true), now.plus_seconds(i));
        }
        let evaluation = monitor.evaluate(ModelType::ChurnPrediction, now.plus_seconds(10)).unwrap();
        assert_eq!(evaluation, DriftEvaluation::InsufficientData);
    }

    #[test]
    fn healthy_window_reports_healthy() {
        let (monitor, _id, now) = monitor_with_active_model();
        for i in 0..50 {
            monitor.observe(ModelType::ChurnPrediction, DriftSample::Correct(true), now.plus_seconds(i));
        }
        let evaluation = monitor.evaluate(ModelType::ChurnPrediction, now.plus_seconds(50)).unwrap();
        assert!(matches!(evaluation, DriftEvaluation::Healthy { .. }));
    }

    #[test]
    fn single_breaching_window_is_not_yet_rollback_eligible() {
        let (monitor, _id, now) = monitor_with_active_model();
        for i in 0..50 {
            monitor.observe(ModelType::ChurnPrediction, DriftSample::Correct(false), now.plus_seconds(i));
        }
        let evaluation = monitor
            .evaluate(ModelType::ChurnPrediction, now.plus_seconds(DEFAULT_WINDOW_HOURS * 3600))
            .unwrap();
        match evaluation {
            DriftEvaluation::Breach { rollback_eligible, rollback_performed, .. } => {
                assert!(!rollback_eligible);
                assert!(!rollback_performed);
            }
            other => panic!("expected a breach, got {other:?}"),
        }
    }

    #[test]
    fn two_consecutive_breaching_windows_roll_back_when_a_prior_version_exists() {
        let (monitor, active_id, now) = monitor_with_active_model();
        let registry = monitor.lifecycle.registry();
        let mut previous = active_model("m0", ModelVersion::new(0, 9, 0), now);
        previous.status = ModelStatus::Deprecated;
        previous.deprecated_at = Some(now);
        registry.save(previous.clone()).unwrap();

        let window_seconds = DEFAULT_WINDOW_HOURS * 3600;
        for i in 0..50 {
            monitor.observe(ModelType::ChurnPrediction, DriftSample::Correct(false), now.plus_seconds(i));
        }
        for i in 0..50 {
            monitor.observe(
                ModelType::ChurnPrediction,
                DriftSample::Correct(false),
                now.plus_seconds(window_seconds + i),
            );
        }

        let evaluation = monitor
            .evaluate(ModelType::ChurnPrediction, now.plus_seconds(2 * window_seconds))
            .unwrap();
        match evaluation {
            DriftEvaluation::Breach { rollback_eligible, rollback_performed, .. } => {
                assert!(rollback_eligible);
                assert!(rollback_performed);
            }
            other => panic!("expected a breach, got {other:?}"),
        }

        let active = registry.get_active(ModelType::ChurnPrediction).unwrap().unwrap();
        assert_eq!(active.id, previous.id);
        let superseded = registry.get_by_id(&active_id).unwrap();
        assert_eq!(superseded.status, ModelStatus::Deprecated);
    }
}
