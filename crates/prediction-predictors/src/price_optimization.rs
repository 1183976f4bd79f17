// prediction-predictors/src/price_optimization.rs
// ============================================================================
// Module: Price Optimization Predictor
// Description: Quote-price recommendation (spec §4.3).
// Purpose: Extract cost/complexity/competitor features and produce an
//          optimal price, price range, win-probability curve, and
//          elasticity estimate.
// Dependencies: prediction-core, serde_json
// ============================================================================

//! ## Overview
//! Input is material cost, a complexity score, a customer id, and
//! competitor benchmark prices. The placeholder model marks up cost by a
//! deterministic, customer-derived margin and derives a monotonically
//! decreasing win-probability curve over a price sweep (spec §1: ML
//! algorithm choice out of scope).

use prediction_core::interfaces::ConfidenceInterval;
use prediction_core::interfaces::FeatureExtractor;
use prediction_core::interfaces::FeatureExtractorError;
use prediction_core::interfaces::Predictor;
use prediction_core::interfaces::PredictorError;
use prediction_core::interfaces::RawPrediction;
use serde_json::Value;
use serde_json::json;

use crate::heuristics::scale;
use crate::heuristics::unit_interval_from_bytes;

/// Extracts price-optimization features from cost, complexity, and
/// competitor benchmark inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriceOptimizationExtractor;

impl FeatureExtractor for PriceOptimizationExtractor {
    fn extract(&self, raw_input: &Value) -> Result<Value, FeatureExtractorError> {
        let material_cost = raw_input
            .get("material_cost")
            .and_then(Value::as_f64)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing material_cost".to_string()))?;
        if material_cost < 0.0 {
            return Err(FeatureExtractorError::Malformed("material_cost must be non-negative".to_string()));
        }

        let complexity_score = raw_input
            .get("complexity_score")
            .and_then(Value::as_f64)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing complexity_score".to_string()))?;
        if !(0.0..=1.0).contains(&complexity_score) {
            return Err(FeatureExtractorError::Malformed("complexity_score must be in [0, 1]".to_string()));
        }

        let customer_id = raw_input
            .get("customer_id")
            .and_then(Value::as_str)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing customer_id".to_string()))?;

        let competitor_benchmarks: Vec<f64> = raw_input
            .get("competitor_benchmarks")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default();

        let competitor_median = if competitor_benchmarks.is_empty() {
            None
        } else {
            let mut sorted = competitor_benchmarks.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            Some(sorted[sorted.len() / 2])
        };

        let customer_signal = unit_interval_from_bytes(customer_id.as_bytes());

        Ok(json!({
            "material_cost": material_cost,
            "complexity_score": complexity_score,
            "customer_signal": customer_signal,
            "competitor_median": competitor_median,
            "competitor_count": competitor_benchmarks.len(),
        }))
    }
}

/// A loaded price-optimization predictor (spec §4.3 table).
#[derive(Debug, Default, Clone, Copy)]
pub struct PriceOptimizationPredictor;

impl Predictor for PriceOptimizationPredictor {
    fn predict(&self, features: &Value) -> Result<RawPrediction, PredictorError> {
        let material_cost = features
            .get("material_cost")
            .and_then(Value::as_f64)
            .ok_or_else(|| PredictorError::Inference("missing material_cost feature".to_string()))?;
        let complexity_score = features.get("complexity_score").and_then(Value::as_f64).unwrap_or(0.0);
        let customer_signal = features.get("customer_signal").and_then(Value::as_f64).unwrap_or(0.5);
        let competitor_median = features.get("competitor_median").and_then(Value::as_f64);

        let margin = scale(customer_signal, 0.15, 0.45) + complexity_score * 0.1;
        let mut optimal_price = material_cost * (1.0 + margin);
        if let Some(competitor_median) = competitor_median {
            optimal_price = optimal_price * 0.7 + competitor_median * 0.3;
        }

        let range_width = optimal_price * 0.1;
        let elasticity = -(scale(customer_signal, 0.5, 2.5));

        let mut win_probability_curve = Vec::with_capacity(5);
        for step in 0..5 {
            let candidate_price = optimal_price * (0.85 + 0.075 * step as f64);
            let delta = (candidate_price - optimal_price) / optimal_price.max(1.0);
            let win_probability = (0.5 - delta * 1.5).clamp(0.01, 0.99);
            win_probability_curve.push(json!({ "price": candidate_price, "win_probability": win_probability }));
        }

        Ok(RawPrediction {
            value: json!({
                "optimal_price": optimal_price,
                "price_range": { "low": optimal_price - range_width, "high": optimal_price + range_width },
                "win_probability_curve": win_probability_curve,
                "elasticity": elasticity,
            }),
            confidence_interval: Some(ConfidenceInterval {
                lower: optimal_price - range_width,
                upper: optimal_price + range_width,
            }),
            feature_scores: vec![
                ("material_cost".to_string(), material_cost),
                ("complexity_score".to_string(), complexity_score),
                ("customer_signal".to_string(), customer_signal),
            ],
        })
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

    fn sample_request() -> Value {
        json!({
            "material_cost": 40.0,
            "complexity_score": 0.4,
            "customer_id": "cust-1",
            "competitor_benchmarks": [55.0, 60.0, 58.0],
        })
    }

    #[test]
    fn negative_cost_is_rejected() {
        let extractor = PriceOptimizationExtractor;
        let mut request = sample_request();
        request["material_cost"] = json!(-1.0);
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::Malformed(_)));
    }

    #[test]
    fn complexity_out_of_range_is_rejected() {
        let extractor = PriceOptimizationExtractor;
        let mut request = sample_request();
        request["complexity_score"] = json!(1.5);
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::Malformed(_)));
    }

    #[test]
    fn win_probability_curve_is_monotonically_decreasing() {
        let extractor = PriceOptimizationExtractor;
        let predictor = PriceOptimizationPredictor;
        let features = extractor.extract(&sample_request()).unwrap();
        let prediction = predictor.predict(&features).unwrap();
        let curve = prediction.value["win_probability_curve"].as_array().unwrap();
        let probabilities: Vec<f64> = curve.iter().map(|step| step["win_probability"].as_f64().unwrap()).collect();
        for window in probabilities.windows(2) {
            assert!(window[0] >= window[1]);
        }
    }

    #[test]
    fn price_range_brackets_optimal_price() {
        let extractor = PriceOptimizationExtractor;
        let predictor = PriceOptimizationPredictor;
        let features = extractor.extract(&sample_request()).unwrap();
        let prediction = predictor.predict(&features).unwrap();
        let optimal = prediction.value["optimal_price"].as_f64().unwrap();
        let low = prediction.value["price_range"]["low"].as_f64().unwrap();
        let high = prediction.value["price_range"]["high"].as_f64().unwrap();
        assert!(low <= optimal && optimal <= high);
    }
}
