// prediction-training/src/dataset.rs
// ============================================================================
// Module: Dataset Snapshot Builder
// Description: Builds immutable TrainingDataset snapshots from raw records
//              (spec §4.5 step 2, Invariant D1/D2).
// Purpose: Compute a stable content hash for dedup and split records into a
//          deterministic train/holdout partition.
// Dependencies: prediction-core
// ============================================================================

//! ## Overview
//! A snapshot is built from an ordered set of raw record rows (each an
//! opaque JSON object). The content hash is computed over the canonical
//! JSON encoding of the full row set, so byte-identical record sets always
//! dedup to the same [`prediction_core::core::DatasetId`] (Invariant D2).
//! The holdout split is deterministic — the last `holdout_fraction` of rows
//! by a stable sort key — rather than randomly sampled, so replaying the
//! same dataset always evaluates against the same holdout (spec.md is
//! silent on this; `SPEC_FULL.md` §4.5 fixes it for reproducibility).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use prediction_core::core::DataQualityReport;
use prediction_core::core::DatasetId;
use prediction_core::core::Fingerprint;
use prediction_core::core::ModelType;
use prediction_core::core::Timestamp;
use prediction_core::core::TrainingDataset;
use prediction_core::core::hashing::fingerprint_canonical_json;

/// Default fraction of a dataset held back for evaluation (spec §4.5 step 6).
pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;

/// Dataset snapshot construction errors.
#[derive(Debug, Error)]
pub enum DatasetBuildError {
    /// The record set is empty; no snapshot can be built.
    #[error("cannot build a dataset snapshot from zero records")]
    Empty,
    /// A record could not be canonicalized for hashing.
    #[error("record canonicalization failed: {0}")]
    Canonicalization(String),
}

/// A raw record row prior to snapshotting: a JSON object plus a stable sort
/// key used for the deterministic holdout split (spec §4.5: "the last
/// `holdout_fraction` of records by a stable sort key").
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Stable key used to order records before splitting (e.g. a record id
    /// or an ingestion sequence number).
    pub sort_key: String,
    /// The record's feature/target row.
    pub row: Value,
}

/// A dataset split into a training partition and a held-out evaluation
/// partition (spec §4.5 step 6).
#[derive(Debug, Clone)]
pub struct SplitDataset {
    /// Rows used for training.
    pub train: Vec<Value>,
    /// Rows withheld for holdout evaluation.
    pub holdout: Vec<Value>,
}

/// Computes the content hash of a record set (Invariant D2's dedup key)
/// without building a full snapshot, so callers can check
/// [`prediction_core::interfaces::TrainingDatasetStore::find_by_content_hash`]
/// before doing the (potentially expensive) snapshot construction.
///
/// # Errors
///
/// Returns [`DatasetBuildError::Empty`] when `records` is empty, or
/// [`DatasetBuildError::Canonicalization`] when a row cannot be
/// canonicalized.
pub fn content_hash(records: &[RawRecord]) -> Result<Fingerprint, DatasetBuildError> {
    if records.is_empty() {
        return Err(DatasetBuildError::Empty);
    }
    let mut sorted: Vec<&RawRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    let rows: Vec<&Value> = sorted.iter().map(|r| &r.row).collect();
    let combined = Value::Array(rows.into_iter().cloned().collect());
    fingerprint_canonical_json(&combined).map_err(|err| DatasetBuildError::Canonicalization(err.to_string()))
}

/// Splits a record set deterministically into train/holdout partitions by
/// `sort_key` ascending, holding back the trailing `holdout_fraction` of
/// rows (spec §4.5 step 6).
#[must_use]
pub fn split(records: &[RawRecord], holdout_fraction: f64) -> SplitDataset {
    let mut sorted: Vec<&RawRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    let holdout_fraction = holdout_fraction.clamp(0.0, 1.0);
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "record counts are far below f64's exact-integer range and holdout_fraction is clamped to [0, 1]"
    )]
    let holdout_count = (sorted.len() as f64 * holdout_fraction).round() as usize;
    let holdout_count = holdout_count.min(sorted.len());
    let split_at = sorted.len() - holdout_count;
    SplitDataset {
        train: sorted[..split_at].iter().map(|r| r.row.clone()).collect(),
        holdout: sorted[split_at..].iter().map(|r| r.row.clone()).collect(),
    }
}

/// Builds an immutable [`TrainingDataset`] snapshot from a record set
/// already known not to be a duplicate of an existing snapshot (callers
/// check [`content_hash`] against
/// [`prediction_core::interfaces::TrainingDatasetStore::find_by_content_hash`]
/// first, per Invariant D2).
///
/// # Errors
///
/// Returns [`DatasetBuildError::Empty`] when `records` is empty, or
/// [`DatasetBuildError::Canonicalization`] when a row cannot be
/// canonicalized.
#[allow(clippy::too_many_arguments, reason = "each argument is a distinct required snapshot field")]
pub fn build_snapshot(
    id: DatasetId,
    model_type: ModelType,
    records: &[RawRecord],
    feature_columns: Vec<String>,
    target_column: String,
    quality_report: DataQualityReport,
    storage_uri: String,
    date_range_start: Timestamp,
    date_range_end: Timestamp,
    created_at: Timestamp,
) -> Result<TrainingDataset, DatasetBuildError> {
    let hash = content_hash(records)?;
    Ok(TrainingDataset {
        id,
        model_type,
        record_count: u64::try_from(records.len()).unwrap_or(u64::MAX),
        date_range_start,
        date_range_end,
        feature_columns,
        target_column,
        data_quality_report: quality_report,
        storage_uri,
        content_hash: hash,
        created_at,
    })
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

    fn rec(key: &str, value: i64) -> RawRecord {
        RawRecord {
            sort_key: key.to_string(),
            row: serde_json::json!({ "v": value }),
        }
    }

    #[test]
    fn content_hash_is_stable_under_input_reordering() {
        let a = vec![rec("1", 10), rec("2", 20), rec("3", 30)];
        let b = vec![rec("3", 30), rec("1", 10), rec("2", 20)];
        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn content_hash_changes_with_different_rows() {
        let a = vec![rec("1", 10)];
        let b = vec![rec("1", 11)];
        assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn empty_record_set_is_rejected() {
        assert!(matches!(content_hash(&[]).unwrap_err(), DatasetBuildError::Empty));
    }

    #[test]
    fn split_holds_back_trailing_fraction_by_sort_key() {
        let records: Vec<RawRecord> = (0..10).map(|i| rec(&format!("{i:02}"), i)).collect();
        let split = split(&records, 0.2);
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.holdout.len(), 2);
        assert_eq!(split.holdout[0], serde_json::json!({ "v": 8 }));
        assert_eq!(split.holdout[1], serde_json::json!({ "v": 9 }));
    }

    #[test]
    fn split_is_deterministic_across_calls() {
        let records: Vec<RawRecord> = (0..7).map(|i| rec(&format!("{i:02}"), i)).collect();
        let first = split(&records, 0.3);
        let second = split(&records, 0.3);
        assert_eq!(first.holdout, second.holdout);
        assert_eq!(first.train, second.train);
    }
}
