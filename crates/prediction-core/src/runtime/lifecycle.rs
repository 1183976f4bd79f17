// prediction-core/src/runtime/lifecycle.rs
// ============================================================================
// Module: Model Lifecycle Manager
// Description: Promotion, rejection, rollback, and archival gates (spec §4.2).
// Purpose: Centralize every state transition so invariants M1-M3 are checked
//          in exactly one place, regardless of caller (training, CLI, admin).
// Dependencies: crate::core, crate::interfaces::ModelRegistry
// ============================================================================

//! ## Overview
//! The lifecycle manager is a pure orchestration layer over
//! [`ModelRegistry`]: it decides whether a transition is allowed and, if so,
//! delegates the atomic compare-and-set to the registry. It never mutates
//! registry state directly outside of `transition`/`update_metadata` calls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::DataQualityReport;
use crate::core::ModelId;
use crate::core::ModelMetadata;
use crate::core::ModelStatus;
use crate::core::ModelType;
use crate::core::RollbackMetadata;
use crate::core::Timestamp;
use crate::interfaces::ModelRegistry;
use crate::interfaces::RegistryError;

/// Default accuracy-improvement gate threshold, in percent (spec §4.2 gate
/// 2, §6 `lifecycle.improvementThresholdPercent`).
pub const DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT: f64 = 2.0;

// ============================================================================
// SECTION: Lifecycle Error
// ============================================================================

/// Lifecycle manager errors (spec §4.2).
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The registry rejected the transition.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The candidate's training dataset did not meet the type's minimum
    /// size gate.
    #[error("dataset size {actual} below minimum {minimum} for {model_type}")]
    DatasetTooSmall {
        /// The type being promoted.
        model_type: ModelType,
        /// Required minimum record count.
        minimum: u64,
        /// Actual record count.
        actual: u64,
    },

    /// The candidate's primary metric did not improve over the current
    /// Active model by at least the configured threshold (spec §4.2 gate
    /// 2, property P7).
    #[error(
        "candidate metric {candidate:.6} improves {improvement_percent:.3}% over active \
         {active:.6}, below the {threshold_percent:.3}% threshold"
    )]
    InsufficientMetricImprovement {
        /// Candidate's primary metric value.
        candidate: f64,
        /// Current Active model's primary metric value.
        active: f64,
        /// Improvement percent actually achieved, signed in the metric's
        /// improving direction.
        improvement_percent: f64,
        /// Required minimum improvement percent.
        threshold_percent: f64,
    },

    /// The candidate's metric bundle is missing the type's primary metric.
    #[error("candidate is missing its primary metric")]
    MissingPrimaryMetric,

    /// The training report backing this candidate carries a `CRITICAL`
    /// data-quality flag (spec §4.2 gate 3).
    #[error("candidate training report has a critical data quality flag")]
    CriticalDataQuality,

    /// No model exists at `id` to roll back to, or it is not eligible.
    #[error("rollback target {0} is not a Deprecated model of the same type")]
    InvalidRollbackTarget(ModelId),

    /// The candidate's version is lower than an existing version of the
    /// same type (Invariant M3); promotion is refused regardless of
    /// backend, since a registry implementation is not required to enforce
    /// this itself.
    #[error("candidate version {candidate} is below existing version {existing} for {model_type}")]
    VersionNotMonotonic {
        /// The type being promoted.
        model_type: ModelType,
        /// The candidate's version.
        candidate: crate::core::ModelVersion,
        /// The highest existing version for the type.
        existing: crate::core::ModelVersion,
    },
}

// ============================================================================
// SECTION: Lifecycle Manager
// ============================================================================

/// Number of most-recently-deprecated versions per type kept out of
/// [`ModelStatus::Archived`] regardless of age (spec §4.2 archival policy).
pub const DEPRECATED_RETENTION_COUNT: usize = 5;

/// Minimum time a model must have spent Deprecated before it becomes
/// archival-eligible, in seconds (spec §3/§4.2: "retention window ...
/// currently 90 days").
pub const ARCHIVE_MIN_AGE_SECONDS: i64 = 90 * 24 * 60 * 60;

/// Enforces model promotion, rejection, rollback, and archival gates.
pub struct LifecycleManager<R> {
    registry: R,
}

impl<R> LifecycleManager<R>
where
    R: ModelRegistry,
{
    /// Wraps a registry with lifecycle gate enforcement.
    #[must_use]
    pub const fn new(registry: R) -> Self {
        Self { registry }
    }

    /// Returns the wrapped registry.
    #[must_use]
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    /// Advances a Draft candidate to Testing after structural validation
    /// (spec §4.2 step 1-2). Structural validation (schema shape, artifact
    /// readability) is the caller's responsibility before invoking this;
    /// this method only performs the state transition.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Registry`] on a backing-store failure or
    /// lifecycle conflict.
    pub fn mark_testing(&self, id: &ModelId, now: Timestamp) -> Result<(), LifecycleError> {
        self.registry
            .transition(id, ModelStatus::Draft, ModelStatus::Testing, now, None)
            .map_err(LifecycleError::from)
    }

    /// Evaluates the dataset-size, accuracy-improvement, and data-quality
    /// gates for a Testing candidate and, if all three pass, promotes it to
    /// Active while atomically deprecating the previous Active model of the
    /// same type (spec §4.2 step 1-3, Invariant M1).
    ///
    /// `improvement_threshold_percent` is the configured
    /// `lifecycle.improvementThresholdPercent` (spec §6, default
    /// [`DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT`]); it is skipped when no
    /// Active model exists yet. `quality_report` is the training report
    /// backing this candidate (spec §4.2 gate 3).
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::DatasetTooSmall`],
    /// [`LifecycleError::InsufficientMetricImprovement`], or
    /// [`LifecycleError::CriticalDataQuality`] when a gate fails (the
    /// candidate is left in Testing with a rejection reason recorded), or
    /// [`LifecycleError::Registry`] on a backing-store failure.
    pub fn promote(
        &self,
        candidate_id: &ModelId,
        dataset_record_count: u64,
        quality_report: &DataQualityReport,
        improvement_threshold_percent: f64,
        now: Timestamp,
    ) -> Result<(), LifecycleError> {
        let candidate = self.registry.get_by_id(candidate_id)?;
        let minimum = candidate.model_type.min_dataset_size();
        if dataset_record_count < minimum {
            self.reject(candidate_id, &format!(
                "dataset size {dataset_record_count} below minimum {minimum}"
            ))?;
            return Err(LifecycleError::DatasetTooSmall {
                model_type: candidate.model_type,
                minimum,
                actual: dataset_record_count,
            });
        }

        if quality_report.has_critical_flag() {
            self.reject(candidate_id, "training report has a critical data quality flag")?;
            return Err(LifecycleError::CriticalDataQuality);
        }

        let primary_metric = candidate.model_type.primary_metric();
        let candidate_value = primary_metric
            .read(&candidate.metrics.metrics)
            .ok_or(LifecycleError::MissingPrimaryMetric)?;

        if let Some(active) = self.registry.get_active(candidate.model_type)? {
            let active_value = primary_metric
                .read(&active.metrics.metrics)
                .ok_or(LifecycleError::MissingPrimaryMetric)?;
            let improvement_percent = match primary_metric.direction() {
                crate::core::MetricDirection::HigherIsBetter => {
                    (candidate_value - active_value) / active_value.abs() * 100.0
                }
                crate::core::MetricDirection::LowerIsBetter => {
                    (active_value - candidate_value) / active_value.abs() * 100.0
                }
            };
            if improvement_percent < improvement_threshold_percent {
                self.reject(candidate_id, &format!(
                    "candidate {primary_metric:?} {candidate_value:.6} improves {improvement_percent:.3}% \
                     over active {active_value:.6}, below the {improvement_threshold_percent:.3}% threshold"
                ))?;
                return Err(LifecycleError::InsufficientMetricImprovement {
                    candidate: candidate_value,
                    active: active_value,
                    improvement_percent,
                    threshold_percent: improvement_threshold_percent,
                });
            }

            self.registry.transition(
                &active.id,
                ModelStatus::Active,
                ModelStatus::Deprecated,
                now,
                Some("superseded by newer promotion"),
            )?;
        }

        let max_existing = self
            .registry
            .list_versions(candidate.model_type, None)?
            .into_iter()
            .filter(|model| model.id != *candidate_id)
            .map(|model| model.version)
            .max();
        if let Some(max_existing) = max_existing {
            if candidate.version < max_existing {
                return Err(LifecycleError::VersionNotMonotonic {
                    model_type: candidate.model_type,
                    candidate: candidate.version,
                    existing: max_existing,
                });
            }
        }

        self.registry
            .transition(candidate_id, ModelStatus::Testing, ModelStatus::Active, now, None)?;
        self.archive_eligible(candidate.model_type, now)
    }

    /// Records a Testing candidate's rejection reason without transitioning
    /// its status; it remains Testing for inspection.
    fn reject(&self, id: &ModelId, reason: &str) -> Result<(), LifecycleError> {
        let mut model = self.registry.get_by_id(id)?;
        model.metadata.quality_gate_rejection_reason = Some(reason.to_string());
        self.registry.update_metadata(id, model.metadata)?;
        Ok(())
    }

    /// Rolls back to a previously Deprecated model of the same type,
    /// recording rollback provenance and deprecating the model that was
    /// Active immediately prior (spec §4.2 scenario 4).
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidRollbackTarget`] when `target_id`
    /// is not a Deprecated model, or [`LifecycleError::Registry`] on a
    /// backing-store failure.
    pub fn rollback(&self, target_id: &ModelId, reason: &str, now: Timestamp) -> Result<(), LifecycleError> {
        let target = self.registry.get_by_id(target_id)?;
        if target.status != ModelStatus::Deprecated {
            return Err(LifecycleError::InvalidRollbackTarget(target_id.clone()));
        }

        if let Some(current_active) = self.registry.get_active(target.model_type)? {
            self.registry.transition(
                &current_active.id,
                ModelStatus::Active,
                ModelStatus::Deprecated,
                now,
                Some("superseded by rollback"),
            )?;

            self.registry.transition(
                target_id,
                ModelStatus::Deprecated,
                ModelStatus::Active,
                now,
                Some(reason),
            )?;

            let mut metadata = target.metadata;
            metadata.rollback = Some(RollbackMetadata {
                reason: reason.to_string(),
                rolled_back_at: now,
                rolled_back_from_version: current_active.version,
            });
            self.registry.update_metadata(target_id, metadata)?;
        }

        Ok(())
    }

    /// Archives Deprecated models past both halves of the retention policy
    /// for a type (spec §4.2/§3: archive only a model that is *both* older
    /// than [`ARCHIVE_MIN_AGE_SECONDS`] *and* not one of the
    /// [`DEPRECATED_RETENTION_COUNT`] most recent Deprecated versions).
    /// A model with no recorded `deprecated_at` is never archived — its age
    /// cannot be established.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Registry`] on a backing-store failure.
    pub fn archive_eligible(&self, model_type: ModelType, now: Timestamp) -> Result<(), LifecycleError> {
        let mut deprecated = self.registry.list_versions(model_type, Some(ModelStatus::Deprecated))?;
        deprecated.sort_by(|a, b| b.version.cmp(&a.version));

        for stale in deprecated.into_iter().skip(DEPRECATED_RETENTION_COUNT) {
            let Some(deprecated_at) = stale.deprecated_at else {
                continue;
            };
            if deprecated_at.seconds_until(now) < ARCHIVE_MIN_AGE_SECONDS {
                continue;
            }
            self.registry.transition(
                &stale.id,
                ModelStatus::Deprecated,
                ModelStatus::Archived,
                now,
                Some("retention window exceeded"),
            )?;
        }
        Ok(())
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
    use crate::core::Fingerprint;
    use crate::core::MetricBundleV1;
    use crate::core::PerformanceMetrics;
    use crate::core::model::Model;
    use crate::core::model::ModelVersion;
    use crate::runtime::registry::InMemoryModelRegistry;
    use crate::core::identifiers::ModelId;
    use crate::core::time::Timestamp;

    fn draft(id: &str, version: ModelVersion, r2: f64, now: Timestamp) -> Model {
        Model {
            id: ModelId::new(id),
            model_type: ModelType::PrintTime,
            version,
            status: ModelStatus::Draft,
            artifact_uri: format!("local://{id}"),
            trained_at: now,
            deployed_at: None,
            deprecated_at: None,
            metrics: MetricBundleV1::new(PerformanceMetrics {
                r2: Some(r2),
                ..PerformanceMetrics::default()
            }),
            training_job_id: None,
            metadata: ModelMetadata::default(),
        }
    }

    fn fp_unused() -> Fingerprint {
        crate::core::hashing::fingerprint_bytes(b"unused")
    }

    #[test]
    fn first_promotion_requires_no_prior_active() {
        let _ = fp_unused();
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let manager = LifecycleManager::new(registry);

        let model = draft("m1", ModelVersion::initial(), 0.9, now);
        manager.registry().save(model.clone()).unwrap();
        manager.mark_testing(&model.id, now).unwrap();
        manager
            .promote(&model.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now)
            .unwrap();

        let active = manager.registry().get_active(ModelType::PrintTime).unwrap().unwrap();
        assert_eq!(active.id, model.id);
        assert_eq!(active.status, ModelStatus::Active);
    }

    #[test]
    fn promotion_rejected_below_dataset_minimum() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let manager = LifecycleManager::new(registry);

        let model = draft("m1", ModelVersion::initial(), 0.9, now);
        manager.registry().save(model.clone()).unwrap();
        manager.mark_testing(&model.id, now).unwrap();

        let err = manager
            .promote(&model.id, 500, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::DatasetTooSmall { .. }));
    }

    #[test]
    fn promotion_rejected_without_sufficient_metric_improvement() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let manager = LifecycleManager::new(registry);

        let first = draft("m1", ModelVersion::initial(), 0.9, now);
        manager.registry().save(first.clone()).unwrap();
        manager.mark_testing(&first.id, now).unwrap();
        manager
            .promote(&first.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now)
            .unwrap();

        // R2 0.9 -> 0.905 is a 0.56% improvement, below the 2% threshold.
        let second = draft("m2", ModelVersion::initial().next_minor(), 0.905, now);
        manager.registry().save(second.clone()).unwrap();
        manager.mark_testing(&second.id, now).unwrap();

        let err = manager
            .promote(&second.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InsufficientMetricImprovement { .. }));

        // Unchanged: still Active.
        let active = manager.registry().get_active(ModelType::PrintTime).unwrap().unwrap();
        assert_eq!(active.id, first.id);
    }

    #[test]
    fn promotion_rejected_on_critical_data_quality_flag() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let manager = LifecycleManager::new(registry);

        let model = draft("m1", ModelVersion::initial(), 0.9, now);
        manager.registry().save(model.clone()).unwrap();
        manager.mark_testing(&model.id, now).unwrap();

        let report = DataQualityReport {
            null_density: vec![],
            flags: vec![crate::core::QualityFlag {
                column: "price".to_string(),
                severity: crate::core::QualityFlagSeverity::Critical,
                description: "null density 42%".to_string(),
            }],
        };
        let err = manager
            .promote(&model.id, 15_000, &report, DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::CriticalDataQuality));
    }

    #[test]
    fn promotion_rejected_when_candidate_version_is_not_monotonic() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let manager = LifecycleManager::new(registry);

        let first = draft("m1", ModelVersion::new(2, 0, 0), 0.80, now);
        manager.registry().save(first.clone()).unwrap();
        manager.mark_testing(&first.id, now).unwrap();
        manager
            .promote(&first.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now)
            .unwrap();
        manager
            .registry()
            .transition(&first.id, ModelStatus::Active, ModelStatus::Deprecated, now, Some("test setup"))
            .unwrap();

        // A candidate versioned below the highest existing version must be rejected even
        // though there is no current Active model to compare its metric against.
        let second = draft("m2", ModelVersion::new(1, 0, 0), 0.95, now);
        manager.registry().save(second.clone()).unwrap();
        manager.mark_testing(&second.id, now).unwrap();

        let err = manager
            .promote(&second.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::VersionNotMonotonic { .. }));
    }

    #[test]
    fn promotion_accepted_when_improvement_meets_threshold() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let manager = LifecycleManager::new(registry);

        let first = draft("m1", ModelVersion::initial(), 0.80, now);
        manager.registry().save(first.clone()).unwrap();
        manager.mark_testing(&first.id, now).unwrap();
        manager
            .promote(&first.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now)
            .unwrap();

        // 0.80 -> 0.82 is a 2.5% improvement, above the 2% threshold.
        let second = draft("m2", ModelVersion::initial().next_minor(), 0.82, now);
        manager.registry().save(second.clone()).unwrap();
        manager.mark_testing(&second.id, now).unwrap();
        manager
            .promote(&second.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now)
            .unwrap();

        let active = manager.registry().get_active(ModelType::PrintTime).unwrap().unwrap();
        assert_eq!(active.id, second.id);
        let deprecated = manager.registry().get_by_id(&first.id).unwrap();
        assert_eq!(deprecated.status, ModelStatus::Deprecated);
    }

    fn deprecated(id: &str, version: ModelVersion, deprecated_at: Timestamp, now: Timestamp) -> Model {
        Model {
            id: ModelId::new(id),
            model_type: ModelType::PrintTime,
            version,
            status: ModelStatus::Deprecated,
            artifact_uri: format!("local://{id}"),
            trained_at: now,
            deployed_at: None,
            deprecated_at: Some(deprecated_at),
            metrics: MetricBundleV1::new(PerformanceMetrics::default()),
            training_job_id: None,
            metadata: ModelMetadata::default(),
        }
    }

    #[test]
    fn archive_eligible_skips_models_within_the_retention_count_regardless_of_age() {
        let epoch = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let now = epoch.plus_seconds(10 * ARCHIVE_MIN_AGE_SECONDS);
        let registry = InMemoryModelRegistry::new();
        let manager = LifecycleManager::new(registry);

        for i in 0..DEPRECATED_RETENTION_COUNT {
            let model = deprecated(&format!("m{i}"), ModelVersion::new(1, 0, u32::try_from(i).unwrap()), epoch, now);
            manager.registry().save(model).unwrap();
        }
        manager.archive_eligible(ModelType::PrintTime, now).unwrap();

        for i in 0..DEPRECATED_RETENTION_COUNT {
            let id = ModelId::new(format!("m{i}"));
            let model = manager.registry().get_by_id(&id).unwrap();
            assert_eq!(model.status, ModelStatus::Deprecated, "rank-protected model {i} must stay Deprecated");
        }
    }

    #[test]
    fn archive_eligible_keeps_a_stale_ranked_model_that_is_not_yet_old_enough() {
        let epoch = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let now = epoch.plus_seconds(ARCHIVE_MIN_AGE_SECONDS - 1);
        let registry = InMemoryModelRegistry::new();
        let manager = LifecycleManager::new(registry);

        for i in 0..=DEPRECATED_RETENTION_COUNT {
            let model = deprecated(&format!("m{i}"), ModelVersion::new(1, 0, u32::try_from(i).unwrap()), epoch, now);
            manager.registry().save(model).unwrap();
        }
        manager.archive_eligible(ModelType::PrintTime, now).unwrap();

        // m0 is the lowest version, so it ranks beyond the retention count, but it has not
        // yet been Deprecated for the full retention window and must remain Deprecated.
        let stale = manager.registry().get_by_id(&ModelId::new("m0")).unwrap();
        assert_eq!(stale.status, ModelStatus::Deprecated);
    }

    #[test]
    fn archive_eligible_archives_a_stale_ranked_model_once_old_enough() {
        let epoch = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let now = epoch.plus_seconds(ARCHIVE_MIN_AGE_SECONDS);
        let registry = InMemoryModelRegistry::new();
        let manager = LifecycleManager::new(registry);

        for i in 0..=DEPRECATED_RETENTION_COUNT {
            let model = deprecated(&format!("m{i}"), ModelVersion::new(1, 0, u32::try_from(i).unwrap()), epoch, now);
            manager.registry().save(model).unwrap();
        }
        manager.archive_eligible(ModelType::PrintTime, now).unwrap();

        let stale = manager.registry().get_by_id(&ModelId::new("m0")).unwrap();
        assert_eq!(stale.status, ModelStatus::Archived);
        for i in 1..=DEPRECATED_RETENTION_COUNT {
            let model = manager.registry().get_by_id(&ModelId::new(format!("m{i}"))).unwrap();
            assert_eq!(model.status, ModelStatus::Deprecated, "rank-protected model {i} must stay Deprecated");
        }
    }
}
