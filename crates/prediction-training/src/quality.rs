// prediction-training/src/quality.rs
// ============================================================================
// Module: Data Quality Validator
// Description: Null-density and outlier gate over a dataset snapshot
//              (spec §4.5 step 3).
// Purpose: Pure, deterministic validation producing a DataQualityReport the
//          Lifecycle Manager's quality gate consults (spec §4.2 gate 3).
// Dependencies: prediction-core
// ============================================================================

//! ## Overview
//! [`ColumnStatsValidator`] implements
//! [`prediction_core::interfaces::DataQualityValidator`] as a pure function
//! over per-column statistics computed from the dataset's feature columns:
//! null density must not exceed 10% per column, and values more than three
//! standard deviations from the column mean are flagged as outliers (spec
//! §4.5 step 3). Either condition exceeding the configured severity raises
//! a `CRITICAL` flag, which blocks promotion (spec §4.2 gate 3).

// ============================================================================
// SECTION: Imports
// ============================================================================

use prediction_core::core::DataQualityReport;
use prediction_core::core::QualityFlag;
use prediction_core::core::QualityFlagSeverity;
use prediction_core::core::TrainingDataset;
use prediction_core::interfaces::DataQualityValidator;

/// Maximum tolerated null density per column before it is flagged `CRITICAL`
/// (spec §4.5 step 3).
pub const MAX_NULL_DENSITY: f64 = 0.10;

/// Standard-deviation threshold beyond which a value is an outlier
/// (spec §4.5 step 3).
pub const OUTLIER_SIGMA: f64 = 3.0;

/// Per-column numeric statistics computed over a dataset snapshot's feature
/// values, ahead of validation. Callers compute this outside the training
/// orchestrator (the raw rows themselves are not part of
/// [`TrainingDataset`], which is metadata-only per spec §3) and pass it
/// alongside the snapshot.
#[derive(Debug, Clone)]
pub struct ColumnStats {
    /// Column name.
    pub column: String,
    /// Fraction of rows with a null/missing value in this column, in `[0,1]`.
    pub null_density: f64,
    /// Count of values more than [`OUTLIER_SIGMA`] standard deviations from
    /// the column mean.
    pub outlier_count: u64,
    /// Total row count considered for this column.
    pub total_count: u64,
}

/// Validates a dataset against the null-density and outlier gates.
pub struct ColumnStatsValidator {
    stats: Vec<ColumnStats>,
}

impl ColumnStatsValidator {
    /// Wraps precomputed per-column statistics for validation.
    #[must_use]
    pub const fn new(stats: Vec<ColumnStats>) -> Self {
        Self { stats }
    }
}

impl DataQualityValidator for ColumnStatsValidator {
    fn validate(&self, _dataset: &TrainingDataset) -> DataQualityReport {
        evaluate(&self.stats)
    }
}

/// Computes a [`DataQualityReport`] from precomputed per-column statistics,
/// without requiring a [`TrainingDataset`] to already exist (the dataset
/// snapshot builder needs this report *before* it can construct one).
#[must_use]
pub fn evaluate(stats: &[ColumnStats]) -> DataQualityReport {
    let mut null_density = Vec::with_capacity(stats.len());
    let mut flags = Vec::new();

    for column in stats {
        null_density.push((column.column.clone(), column.null_density));

        if column.null_density > MAX_NULL_DENSITY {
            flags.push(QualityFlag {
                column: column.column.clone(),
                severity: QualityFlagSeverity::Critical,
                description: format!(
                    "null density {:.1}% exceeds the {:.0}% maximum",
                    column.null_density * 100.0,
                    MAX_NULL_DENSITY * 100.0
                ),
            });
            continue;
        }
        if column.null_density > MAX_NULL_DENSITY / 2.0 {
            flags.push(QualityFlag {
                column: column.column.clone(),
                severity: QualityFlagSeverity::Warning,
                description: format!("null density {:.1}% is elevated", column.null_density * 100.0),
            });
        }

        if column.total_count > 0 {
            #[allow(clippy::cast_precision_loss, reason = "outlier counts are far below f64's exact-integer range")]
            let outlier_fraction = column.outlier_count as f64 / column.total_count as f64;
            if outlier_fraction > MAX_NULL_DENSITY {
                flags.push(QualityFlag {
                    column: column.column.clone(),
                    severity: QualityFlagSeverity::Critical,
                    description: format!(
                        "{} of {} values ({:.1}%) are beyond {OUTLIER_SIGMA}σ",
                        column.outlier_count,
                        column.total_count,
                        outlier_fraction * 100.0
                    ),
                });
            } else if column.outlier_count > 0 {
                flags.push(QualityFlag {
                    column: column.column.clone(),
                    severity: QualityFlagSeverity::Info,
                    description: format!("{} values are beyond {OUTLIER_SIGMA}σ", column.outlier_count),
                });
            }
        }
    }

    DataQualityReport { null_density, flags }
}

/// Computes [`ColumnStats`] for a numeric column from raw values (`None`
/// entries count as nulls).
#[must_use]
pub fn column_stats(column: &str, values: &[Option<f64>]) -> ColumnStats {
    let total_count = u64::try_from(values.len()).unwrap_or(u64::MAX);
    let nulls = values.iter().filter(|v| v.is_none()).count();
    #[allow(clippy::cast_precision_loss, reason = "row counts are far below f64's exact-integer range")]
    let null_density = if values.is_empty() { 0.0 } else { nulls as f64 / values.len() as f64 };

    let present: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    let outlier_count = if present.len() < 2 {
        0
    } else {
        #[allow(clippy::cast_precision_loss, reason = "row counts are far below f64's exact-integer range")]
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        #[allow(clippy::cast_precision_loss, reason = "row counts are far below f64's exact-integer range")]
        let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / present.len() as f64;
        let stddev = variance.sqrt();
        if stddev <= f64::EPSILON {
            0
        } else {
            u64::try_from(present.iter().filter(|v| ((*v - mean) / stddev).abs() > OUTLIER_SIGMA).count())
                .unwrap_or(u64::MAX)
        }
    };

    ColumnStats {
        column: column.to_string(),
        null_density,
        outlier_count,
        total_count,
    }
}
