// prediction-drift/src/sample.rs
// ============================================================================
// Module: Drift Samples
// Description: A single ground-truth observation fed to the drift monitor.
// Purpose: Normalize classification and regression feedback into one
//          comparable quality score without assuming a predictor's output
//          shape (spec §4.9).
// Dependencies: none
// ============================================================================

//! ## Overview
//! A sample is either a classification outcome (`Correct`) or a regression
//! residual (`SquaredError`), matching the two feedback shapes audit
//! reconciliation can produce once `actual_outcome` is known. Both reduce to
//! a `quality_score` in `(0.0, 1.0]`, where `1.0` is perfect, so the monitor
//! can compare windows across model types without re-deriving R²/MAPE/
//! precision from raw residuals (those require the full evaluation set, not
//! a rolling sample window).

// ============================================================================
// SECTION: Drift Sample
// ============================================================================

/// One ground-truth observation for a model type's active version.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriftSample {
    /// A classification outcome: whether the prediction matched ground
    /// truth (e.g. churn prediction).
    Correct(bool),
    /// A regression residual: the squared error between the predicted and
    /// actual value (e.g. print time, demand forecast).
    SquaredError(f64),
}

impl DriftSample {
    /// Reduces this sample to a quality score in `(0.0, 1.0]`, higher is
    /// better. `Correct` samples score `1.0`/`0.0`; `SquaredError` samples
    /// score `1.0 / (1.0 + squared_error)`, so a perfect prediction scores
    /// `1.0` and arbitrarily large error asymptotically approaches `0.0`.
    #[must_use]
    pub fn quality_score(self) -> f64 {
        match self {
            DriftSample::Correct(true) => 1.0,
            DriftSample::Correct(false) => 0.0,
            DriftSample::SquaredError(squared_error) => 1.0 / (1.0 + squared_error.max(0.0)),
        }
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

    #[test]
    fn correct_sample_scores_are_binary() {
        assert_eq!(DriftSample::Correct(true).quality_score(), 1.0);
        assert_eq!(DriftSample::Correct(false).quality_score(), 0.0);
    }

    #[test]
    fn squared_error_sample_score_decreases_with_error() {
        let perfect = DriftSample::SquaredError(0.0).quality_score();
        let small_error = DriftSample::SquaredError(1.0).quality_score();
        let large_error = DriftSample::SquaredError(100.0).quality_score();
        assert_eq!(perfect, 1.0);
        assert!(small_error < perfect);
        assert!(large_error < small_error);
        assert!(large_error > 0.0);
    }

    #[test]
    fn negative_squared_error_is_clamped_to_zero() {
        assert_eq!(DriftSample::SquaredError(-5.0).quality_score(), 1.0);
    }
}
