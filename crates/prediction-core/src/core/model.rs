// prediction-core/src/core/model.rs
// ============================================================================
// Module: Model Entity
// Description: Model type enum, lifecycle status, semantic version, and the
//              canonical Model record persisted by the registry.
// Purpose: Define the schema that invariants M1-M3 are checked against.
// Dependencies: crate::core::identifiers, crate::core::time, serde
// ============================================================================

//! ## Overview
//! A [`Model`] is one trained artifact's metadata: its type, semantic
//! version, lifecycle status, and performance metrics. The registry is the
//! only writer of `status`; all transitions go through
//! [`crate::runtime::LifecycleManager`] or [`crate::interfaces::ModelRegistry::transition`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ModelId;
use crate::core::identifiers::TrainingJobId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Model Type
// ============================================================================

/// The family of prediction endpoint a model serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Manufacturing time estimation from 3D geometry.
    PrintTime,
    /// Product demand forecasting.
    DemandForecast,
    /// Price optimization and quoting.
    PriceOptimization,
    /// Customer churn risk classification.
    ChurnPrediction,
    /// Material consumption forecasting.
    MaterialDemand,
    /// Production bottleneck detection.
    BottleneckDetection,
}

impl ModelType {
    /// All recognized model types, in a stable order.
    pub const ALL: [ModelType; 6] = [
        ModelType::PrintTime,
        ModelType::DemandForecast,
        ModelType::PriceOptimization,
        ModelType::ChurnPrediction,
        ModelType::MaterialDemand,
        ModelType::BottleneckDetection,
    ];

    /// Returns the primary metric used by the lifecycle manager's
    /// accuracy-improvement gate for this model type (spec §4.2).
    ///
    /// This mapping is colocated with the enum definition so that adding a
    /// new [`ModelType`] variant forces an update here (Open Question
    /// resolution in `SPEC_FULL.md` §9).
    #[must_use]
    pub const fn primary_metric(self) -> PrimaryMetric {
        match self {
            ModelType::PrintTime | ModelType::PriceOptimization | ModelType::BottleneckDetection => {
                PrimaryMetric::R2
            }
            ModelType::DemandForecast | ModelType::MaterialDemand => PrimaryMetric::Mape,
            ModelType::ChurnPrediction => PrimaryMetric::Precision,
        }
    }

    /// Returns the minimum training dataset size gate for this model type
    /// (spec §4.2 dataset-size gate).
    #[must_use]
    pub const fn min_dataset_size(self) -> u64 {
        match self {
            ModelType::PrintTime => 10_000,
            ModelType::PriceOptimization => 5_000,
            ModelType::ChurnPrediction => 2_000,
            ModelType::DemandForecast | ModelType::MaterialDemand | ModelType::BottleneckDetection => 1_000,
        }
    }

    /// Returns the prediction cache TTL, in seconds, for this model type
    /// (spec §4.4).
    #[must_use]
    pub const fn cache_ttl_seconds(self) -> i64 {
        match self {
            ModelType::PrintTime | ModelType::ChurnPrediction => 24 * 3600,
            ModelType::PriceOptimization => 3600,
            ModelType::DemandForecast | ModelType::BottleneckDetection => 6 * 3600,
            ModelType::MaterialDemand => 12 * 3600,
        }
    }

    /// Returns a short, stable identifier used in cache keys and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ModelType::PrintTime => "print_time",
            ModelType::DemandForecast => "demand_forecast",
            ModelType::PriceOptimization => "price_optimization",
            ModelType::ChurnPrediction => "churn_prediction",
            ModelType::MaterialDemand => "material_demand",
            ModelType::BottleneckDetection => "bottleneck_detection",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a recognized [`ModelType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModelType(pub String);

impl fmt::Display for UnknownModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model type: {}", self.0)
    }
}

impl std::error::Error for UnknownModelType {}

impl std::str::FromStr for ModelType {
    type Err = UnknownModelType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|model_type| model_type.as_str() == value)
            .ok_or_else(|| UnknownModelType(value.to_string()))
    }
}

/// The metric a model type is promoted or rejected on (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryMetric {
    /// Coefficient of determination; higher is better.
    R2,
    /// Mean absolute percentage error; lower is better.
    Mape,
    /// Classification precision; higher is better.
    Precision,
}

impl PrimaryMetric {
    /// Returns the direction of improvement for this metric.
    #[must_use]
    pub const fn direction(self) -> MetricDirection {
        match self {
            PrimaryMetric::R2 | PrimaryMetric::Precision => MetricDirection::HigherIsBetter,
            PrimaryMetric::Mape => MetricDirection::LowerIsBetter,
        }
    }

    /// Reads this metric's value out of a [`PerformanceMetrics`] bundle.
    #[must_use]
    pub const fn read(self, metrics: &PerformanceMetrics) -> Option<f64> {
        match self {
            PrimaryMetric::R2 => metrics.r2,
            PrimaryMetric::Mape => metrics.mape,
            PrimaryMetric::Precision => metrics.precision,
        }
    }
}

/// Whether higher or lower values are an improvement for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    /// Higher values are better (R², Precision).
    HigherIsBetter,
    /// Lower values are better (MAPE).
    LowerIsBetter,
}

// ============================================================================
// SECTION: Model Version
// ============================================================================

/// A `major.minor.patch` semantic version, ordered for invariant M3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl ModelVersion {
    /// Constructs a version from its three components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// The initial version issued to the first model of a type.
    #[must_use]
    pub const fn initial() -> Self {
        Self::new(1, 0, 0)
    }

    /// Returns the next minor version (patch reset to zero), the version
    /// bump used after a scheduled or drift-triggered retrain (spec §4.5).
    #[must_use]
    pub const fn next_minor(self) -> Self {
        Self::new(self.major, self.minor + 1, 0)
    }
}

impl Ord for ModelVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for ModelVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error returned when a string is not a well-formed `major.minor.patch` version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidModelVersion(pub String);

impl fmt::Display for InvalidModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid model version (expected major.minor.patch): {}", self.0)
    }
}

impl std::error::Error for InvalidModelVersion {}

impl std::str::FromStr for ModelVersion {
    type Err = InvalidModelVersion;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.split('.');
        let (Some(major), Some(minor), Some(patch), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(InvalidModelVersion(value.to_string()));
        };
        let parse = |component: &str| component.parse::<u32>().map_err(|_| InvalidModelVersion(value.to_string()));
        Ok(Self::new(parse(major)?, parse(minor)?, parse(patch)?))
    }
}

// ============================================================================
// SECTION: Model Status
// ============================================================================

/// Lifecycle status of a model (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    /// Trained, not yet structurally validated.
    Draft,
    /// Structurally validated, awaiting the quality gate.
    Testing,
    /// Currently serving predictions for its type.
    Active,
    /// Replaced by a newer Active model.
    Deprecated,
    /// Past the retention window and not one of the five most recent
    /// deprecated versions.
    Archived,
}

// ============================================================================
// SECTION: Performance Metrics
// ============================================================================

/// Per-type metric bundle (spec §3). Fields not meaningful for a given
/// model type are `None`. Encoded with an explicit schema version so future
/// fields are backward compatible on deserialize (Design Note
/// "JSONB-as-bag metadata").
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Coefficient of determination.
    pub r2: Option<f64>,
    /// Mean absolute error.
    pub mae: Option<f64>,
    /// Root mean squared error.
    pub rmse: Option<f64>,
    /// Mean absolute percentage error.
    pub mape: Option<f64>,
    /// Classification precision.
    pub precision: Option<f64>,
    /// Classification recall.
    pub recall: Option<f64>,
    /// F1 score.
    pub f1: Option<f64>,
    /// Area under the ROC curve.
    pub auc: Option<f64>,
}

/// Schema version wrapper for [`PerformanceMetrics`] as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBundleV1 {
    /// Schema version tag; currently always `1`.
    pub schema_version: u16,
    /// The metric bundle itself.
    pub metrics: PerformanceMetrics,
}

impl MetricBundleV1 {
    /// Wraps a metric bundle at the current schema version.
    #[must_use]
    pub const fn new(metrics: PerformanceMetrics) -> Self {
        Self { schema_version: 1, metrics }
    }
}

// ============================================================================
// SECTION: Feature Contribution
// ============================================================================

/// Direction a feature's contribution is trending, per the explainer
/// (spec §3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Trending toward a more favorable value.
    Improving,
    /// Within a typical range.
    Stable,
    /// Trending toward a less favorable value.
    Worsening,
}

/// A single explained feature contribution, produced in descending weight
/// order (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    /// Feature name.
    pub name: String,
    /// Normalized contribution weight in `[0, 1]`.
    pub weight: f64,
    /// Trend direction, when trailing population statistics are available.
    pub trend: Option<Trend>,
}

// ============================================================================
// SECTION: Model Metadata
// ============================================================================

/// Rollback provenance recorded on a model promoted via rollback
/// (spec §4.2, scenario 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackMetadata {
    /// Human-readable rollback reason.
    pub reason: String,
    /// When the rollback occurred.
    pub rolled_back_at: Timestamp,
    /// The version that was Active immediately before this rollback.
    pub rolled_back_from_version: ModelVersion,
}

/// Free-form metadata carried on a model record. Deliberately a small typed
/// struct (not an open JSON bag) per Design Note "JSONB-as-bag metadata".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Population statistics per feature, used by the explainer to derive
    /// percentile bands (spec §4.7).
    pub feature_population: Vec<FeaturePopulationStats>,
    /// Rollback provenance, present only on models reached via rollback.
    pub rollback: Option<RollbackMetadata>,
    /// Reason a Testing model failed the quality gate, if applicable.
    pub quality_gate_rejection_reason: Option<String>,
}

/// Trailing population statistics for one feature of one model type,
/// used to classify [`Trend`] and generate percentile-band explanations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePopulationStats {
    /// Feature name.
    pub name: String,
    /// 10th percentile.
    pub p10: f64,
    /// Median.
    pub p50: f64,
    /// 90th percentile.
    pub p90: f64,
    /// Mean.
    pub mean: f64,
    /// Standard deviation.
    pub stddev: f64,
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// A single model record (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Opaque unique identifier.
    pub id: ModelId,
    /// Model type.
    pub model_type: ModelType,
    /// Semantic version.
    pub version: ModelVersion,
    /// Lifecycle status.
    pub status: ModelStatus,
    /// Artifact store URI for the serialized model.
    pub artifact_uri: String,
    /// When training completed.
    pub trained_at: Timestamp,
    /// When the model was promoted to Active, if ever.
    pub deployed_at: Option<Timestamp>,
    /// When the model was deprecated, if ever.
    pub deprecated_at: Option<Timestamp>,
    /// Per-type metric bundle.
    pub metrics: MetricBundleV1,
    /// The training job that produced this model, if known.
    pub training_job_id: Option<TrainingJobId>,
    /// Additional typed metadata.
    pub metadata: ModelMetadata,
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

    #[test]
    fn primary_metric_mapping_is_exhaustive_and_stable() {
        for model_type in ModelType::ALL {
            let metric = model_type.primary_metric();
            match model_type {
                ModelType::PrintTime | ModelType::PriceOptimization | ModelType::BottleneckDetection => {
                    assert_eq!(metric, PrimaryMetric::R2);
                }
                ModelType::DemandForecast | ModelType::MaterialDemand => {
                    assert_eq!(metric, PrimaryMetric::Mape);
                }
                ModelType::ChurnPrediction => assert_eq!(metric, PrimaryMetric::Precision),
            }
        }
    }

    #[test]
    fn version_ordering_is_lexicographic() {
        assert!(ModelVersion::new(1, 0, 0) < ModelVersion::new(1, 1, 0));
        assert!(ModelVersion::new(1, 9, 9) < ModelVersion::new(2, 0, 0));
        assert!(ModelVersion::new(1, 1, 0) < ModelVersion::new(1, 1, 1));
    }

    #[test]
    fn next_minor_resets_patch() {
        assert_eq!(ModelVersion::new(1, 2, 5).next_minor(), ModelVersion::new(1, 3, 0));
    }

    #[test]
    fn model_type_round_trips_through_its_string_form() {
        for model_type in ModelType::ALL {
            let parsed: ModelType = model_type.as_str().parse().unwrap();
            assert_eq!(parsed, model_type);
        }
    }

    #[test]
    fn model_type_rejects_unknown_strings() {
        let err = "not_a_model_type".parse::<ModelType>().unwrap_err();
        assert_eq!(err.0, "not_a_model_type");
    }

    #[test]
    fn model_version_parses_and_round_trips() {
        let version: ModelVersion = "1.2.3".parse().unwrap();
        assert_eq!(version, ModelVersion::new(1, 2, 3));
        assert_eq!(version.to_string(), "1.2.3");
    }

    #[test]
    fn model_version_rejects_malformed_strings() {
        assert!("1.2".parse::<ModelVersion>().is_err());
        assert!("1.2.3.4".parse::<ModelVersion>().is_err());
        assert!("a.b.c".parse::<ModelVersion>().is_err());
    }
}
