// prediction-predictors/src/heuristics.rs
// ============================================================================
// Module: Deterministic Heuristic Helpers
// Description: Shared helpers for the placeholder per-type predictors.
// Purpose: Give every predictor a deterministic, bytes-in-bytes-out way to
//          turn opaque input into a reproducible signal, since the choice
//          of ML algorithm is explicitly out of scope (spec §1).
// Dependencies: prediction-core::core::hashing
// ============================================================================

//! ## Overview
//! Every predictor in this crate is a documented placeholder: a
//! deterministic heuristic standing in for a trained model, satisfying the
//! per-type contract (inputs validated, outputs shaped correctly,
//! deterministic given identical bytes) while leaving the actual numerical
//! model out of scope. [`unit_interval_from_bytes`] is the shared primitive
//! every predictor uses to turn a fingerprint into a reproducible `[0, 1)`
//! signal instead of reaching for a nondeterministic random source.

// ============================================================================
// SECTION: Imports
// ============================================================================

use prediction_core::core::hashing::fingerprint_bytes;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Deterministically maps arbitrary bytes to a value in `[0, 1)`.
///
/// The same input always yields the same output (required by
/// [`prediction_core::interfaces::FeatureExtractor`]'s determinism
/// contract); different inputs yield different outputs with high
/// probability since the mapping goes through a SHA-256 digest.
#[must_use]
pub fn unit_interval_from_bytes(bytes: &[u8]) -> f64 {
    let fingerprint = fingerprint_bytes(bytes);
    let prefix = &fingerprint.as_str()[0..8];
    let value = u32::from_str_radix(prefix, 16).unwrap_or(0);
    f64::from(value) / f64::from(u32::MAX)
}

/// Maps `unit` (expected in `[0, 1)`) linearly onto `[low, high]`.
#[must_use]
pub fn scale(unit: f64, low: f64, high: f64) -> f64 {
    low + unit.clamp(0.0, 1.0) * (high - low)
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
    fn same_bytes_yield_same_value() {
        let a = unit_interval_from_bytes(b"alpha");
        let b = unit_interval_from_bytes(b"alpha");
        assert!((a - b).abs() < f64::EPSILON);
    }

    #[test]
    fn different_bytes_usually_differ() {
        let a = unit_interval_from_bytes(b"alpha");
        let b = unit_interval_from_bytes(b"beta");
        assert!((a - b).abs() > f64::EPSILON);
    }

    #[test]
    fn value_is_within_unit_interval() {
        for seed in ["a", "b", "c", "longer-input-string"] {
            let v = unit_interval_from_bytes(seed.as_bytes());
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn scale_respects_bounds() {
        assert!((scale(0.0, 10.0, 20.0) - 10.0).abs() < f64::EPSILON);
        assert!((scale(1.0, 10.0, 20.0) - 20.0).abs() < f64::EPSILON);
    }
}
