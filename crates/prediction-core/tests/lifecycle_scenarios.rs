// prediction-core/tests/lifecycle_scenarios.rs
// ============================================================================
// Test: Model Lifecycle Scenarios
// Description: End-to-end coverage of promotion, rollback, and archival
//              scenarios from the prediction service specification §8.
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use prediction_core::DataQualityReport;
use prediction_core::LifecycleManager;
use prediction_core::MetricBundleV1;
use prediction_core::Model;
use prediction_core::ModelId;
use prediction_core::ModelMetadata;
use prediction_core::ModelRegistry;
use prediction_core::ModelStatus;
use prediction_core::ModelType;
use prediction_core::ModelVersion;
use prediction_core::PerformanceMetrics;
use prediction_core::Timestamp;
use prediction_core::runtime::DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT;
use prediction_core::runtime::InMemoryModelRegistry;

fn now() -> Timestamp {
    Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH)
}

fn candidate(id: &str, version: ModelVersion, r2: f64) -> Model {
    Model {
        id: ModelId::new(id),
        model_type: ModelType::PrintTime,
        version,
        status: ModelStatus::Draft,
        artifact_uri: format!("local://{id}"),
        trained_at: now(),
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

#[test]
fn scenario_rollback_restores_previous_active_version() {
    let manager = LifecycleManager::new(InMemoryModelRegistry::new());

    let v1 = candidate("m1", ModelVersion::initial(), 0.80);
    manager.registry().save(v1.clone()).unwrap();
    manager.mark_testing(&v1.id, now()).unwrap();
    manager
        .promote(&v1.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now())
        .unwrap();

    let v2 = candidate("m2", ModelVersion::initial().next_minor(), 0.90);
    manager.registry().save(v2.clone()).unwrap();
    manager.mark_testing(&v2.id, now()).unwrap();
    manager
        .promote(&v2.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now())
        .unwrap();

    let active = manager.registry().get_active(ModelType::PrintTime).unwrap().unwrap();
    assert_eq!(active.id, v2.id);

    manager.rollback(&v1.id, "regression detected in production", now()).unwrap();

    let active_after_rollback = manager.registry().get_active(ModelType::PrintTime).unwrap().unwrap();
    assert_eq!(active_after_rollback.id, v1.id);

    let deprecated_v2 = manager.registry().get_by_id(&v2.id).unwrap();
    assert_eq!(deprecated_v2.status, ModelStatus::Deprecated);

    let rolled_back = manager.registry().get_by_id(&v1.id).unwrap();
    let rollback_meta = rolled_back.metadata.rollback.expect("rollback metadata recorded");
    assert_eq!(rollback_meta.rolled_back_from_version, v2.version);
}

#[test]
fn scenario_archival_retains_only_five_most_recent_deprecated_versions() {
    let manager = LifecycleManager::new(InMemoryModelRegistry::new());

    let mut version = ModelVersion::initial();
    let mut previous_id: Option<ModelId> = None;

    for generation in 0..7 {
        let id = format!("m{generation}");
        // Each generation improves R2 by 3%, clearing the 2% gate.
        let r2 = 0.5 * 1.03_f64.powi(generation);
        let model = candidate(&id, version, r2);
        manager.registry().save(model.clone()).unwrap();
        manager.mark_testing(&model.id, now()).unwrap();
        manager
            .promote(&model.id, 15_000, &DataQualityReport::default(), DEFAULT_IMPROVEMENT_THRESHOLD_PERCENT, now())
            .unwrap();
        previous_id = Some(model.id);
        version = version.next_minor();
    }
    let _ = previous_id;

    let archived = manager
        .registry()
        .list_versions(ModelType::PrintTime, Some(ModelStatus::Archived))
        .unwrap();
    let deprecated = manager
        .registry()
        .list_versions(ModelType::PrintTime, Some(ModelStatus::Deprecated))
        .unwrap();

    assert_eq!(deprecated.len(), 5);
    assert_eq!(archived.len(), 1);
}
