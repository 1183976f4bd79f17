// prediction-core/src/runtime/registry.rs
// ============================================================================
// Module: In-Memory Model Registry
// Description: Reference ModelRegistry implementation for tests and demos.
// Purpose: Provide a deterministic registry without a SQLite dependency.
// Dependencies: crate::core, crate::interfaces::ModelRegistry
// ============================================================================

//! ## Overview
//! Mirrors the reference in-memory store pattern used elsewhere in this
//! workspace: a `BTreeMap` behind a single mutex, keyed by model id, with a
//! secondary index recomputed on read. Not for production use; the SQLite
//! backend is the persisted implementation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::Model;
use crate::core::ModelId;
use crate::core::ModelMetadata;
use crate::core::ModelStatus;
use crate::core::ModelType;
use crate::core::Timestamp;
use crate::interfaces::ModelRegistry;
use crate::interfaces::RegistryError;

// ============================================================================
// SECTION: In-Memory Registry
// ============================================================================

/// In-memory [`ModelRegistry`] enforcing invariants M1-M3 (spec §4.1).
#[derive(Debug, Default, Clone)]
pub struct InMemoryModelRegistry {
    models: Arc<Mutex<BTreeMap<String, Model>>>,
}

impl InMemoryModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            models: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Model>>, RegistryError> {
        self.models
            .lock()
            .map_err(|_| RegistryError::Store("model registry mutex poisoned".to_string()))
    }
}

impl ModelRegistry for InMemoryModelRegistry {
    fn get_active(&self, model_type: ModelType) -> Result<Option<Model>, RegistryError> {
        let guard = self.lock()?;
        let actives: Vec<&Model> = guard
            .values()
            .filter(|m| m.model_type == model_type && m.status == ModelStatus::Active)
            .collect();
        match actives.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some((*single).clone())),
            _ => Err(RegistryError::InvariantViolation(
                "M1",
                format!("more than one Active model for {model_type}"),
            )),
        }
    }

    fn get_by_id(&self, id: &ModelId) -> Result<Model, RegistryError> {
        let guard = self.lock()?;
        guard
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    fn list_versions(
        &self,
        model_type: ModelType,
        status: Option<ModelStatus>,
    ) -> Result<Vec<Model>, RegistryError> {
        let guard = self.lock()?;
        let mut models: Vec<Model> = guard
            .values()
            .filter(|m| m.model_type == model_type)
            .filter(|m| status.is_none_or(|s| m.status == s))
            .cloned()
            .collect();
        models.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(models)
    }

    fn save(&self, model: Model) -> Result<(), RegistryError> {
        let mut guard = self.lock()?;
        let duplicate = guard.values().any(|m| {
            m.model_type == model.model_type && m.version == model.version
        });
        if duplicate {
            return Err(RegistryError::DuplicateVersion(model.model_type, model.version));
        }
        guard.insert(model.id.as_str().to_string(), model);
        Ok(())
    }

    fn transition(
        &self,
        id: &ModelId,
        from: ModelStatus,
        to: ModelStatus,
        now: Timestamp,
        _reason: Option<&str>,
    ) -> Result<(), RegistryError> {
        let mut guard = self.lock()?;
        let (model_type, version, status) = {
            let model = guard.get(id.as_str()).ok_or_else(|| RegistryError::NotFound(id.clone()))?;
            (model.model_type, model.version, model.status)
        };

        if status != from {
            return Err(RegistryError::LifecycleConflict(status, to));
        }

        if to == ModelStatus::Active {
            let active_count = guard
                .values()
                .filter(|m| m.model_type == model_type && m.status == ModelStatus::Active && m.id != *id)
                .count();
            if active_count > 0 {
                return Err(RegistryError::InvariantViolation("M1", format!("{model_type} already has an Active model")));
            }

            let max_existing = guard
                .values()
                .filter(|m| m.model_type == model_type && m.id != *id)
                .map(|m| m.version)
                .max();
            if let Some(max_existing) = max_existing {
                if version < max_existing {
                    return Err(RegistryError::InvariantViolation(
                        "M3",
                        format!("candidate version {version} is below existing version {max_existing}"),
                    ));
                }
            }
        }

        let model = guard.get_mut(id.as_str()).ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        model.status = to;
        match to {
            ModelStatus::Active => model.deployed_at = Some(now),
            ModelStatus::Deprecated => model.deprecated_at = Some(now),
            ModelStatus::Archived | ModelStatus::Draft | ModelStatus::Testing => {}
        }
        if to == ModelStatus::Testing && from == ModelStatus::Draft {
            model.metadata.quality_gate_rejection_reason = None;
        }
        Ok(())
    }

    fn update_metadata(&self, id: &ModelId, metadata: ModelMetadata) -> Result<(), RegistryError> {
        let mut guard = self.lock()?;
        let model = guard
            .get_mut(id.as_str())
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        model.metadata = metadata;
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
    use crate::core::MetricBundleV1;
    use crate::core::PerformanceMetrics;

    fn model(id: &str, model_type: ModelType, version: crate::core::ModelVersion, now: Timestamp) -> Model {
        Model {
            id: ModelId::new(id),
            model_type,
            version,
            status: ModelStatus::Draft,
            artifact_uri: format!("local://{id}"),
            trained_at: now,
            deployed_at: None,
            deprecated_at: None,
            metrics: MetricBundleV1::new(PerformanceMetrics::default()),
            training_job_id: None,
            metadata: ModelMetadata::default(),
        }
    }

    #[test]
    fn duplicate_version_rejected() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let m1 = model("m1", ModelType::PrintTime, crate::core::ModelVersion::initial(), now);
        registry.save(m1).unwrap();
        let m2 = model("m2", ModelType::PrintTime, crate::core::ModelVersion::initial(), now);
        let err = registry.save(m2).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateVersion(_, _)));
    }

    #[test]
    fn transition_requires_matching_from_state() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let m1 = model("m1", ModelType::PrintTime, crate::core::ModelVersion::initial(), now);
        registry.save(m1.clone()).unwrap();
        let err = registry
            .transition(&m1.id, ModelStatus::Active, ModelStatus::Deprecated, now, None)
            .unwrap_err();
        assert!(matches!(err, RegistryError::LifecycleConflict(ModelStatus::Draft, ModelStatus::Deprecated)));
    }

    #[test]
    fn transition_to_active_rejects_a_second_active_model() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let m1 = model("m1", ModelType::PrintTime, crate::core::ModelVersion::initial(), now);
        registry.save(m1.clone()).unwrap();
        registry.transition(&m1.id, ModelStatus::Draft, ModelStatus::Testing, now, None).unwrap();
        registry.transition(&m1.id, ModelStatus::Testing, ModelStatus::Active, now, None).unwrap();

        let m2 = model("m2", ModelType::PrintTime, crate::core::ModelVersion::initial().next_minor(), now);
        registry.save(m2.clone()).unwrap();
        registry.transition(&m2.id, ModelStatus::Draft, ModelStatus::Testing, now, None).unwrap();
        let err = registry
            .transition(&m2.id, ModelStatus::Testing, ModelStatus::Active, now, None)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvariantViolation("M1", _)));
    }

    #[test]
    fn transition_to_active_rejects_a_non_monotonic_version() {
        let now = Timestamp::from_offset_date_time(time::OffsetDateTime::UNIX_EPOCH);
        let registry = InMemoryModelRegistry::new();
        let newer = model("m1", ModelType::PrintTime, crate::core::ModelVersion::new(2, 0, 0), now);
        registry.save(newer.clone()).unwrap();
        registry.transition(&newer.id, ModelStatus::Draft, ModelStatus::Testing, now, None).unwrap();
        registry.transition(&newer.id, ModelStatus::Testing, ModelStatus::Active, now, None).unwrap();
        registry.transition(&newer.id, ModelStatus::Active, ModelStatus::Deprecated, now, None).unwrap();

        let older = model("m2", ModelType::PrintTime, crate::core::ModelVersion::new(1, 0, 0), now);
        registry.save(older.clone()).unwrap();
        registry.transition(&older.id, ModelStatus::Draft, ModelStatus::Testing, now, None).unwrap();
        let err = registry
            .transition(&older.id, ModelStatus::Testing, ModelStatus::Active, now, None)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvariantViolation("M3", _)));
    }
}
