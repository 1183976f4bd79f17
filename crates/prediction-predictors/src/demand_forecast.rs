// prediction-predictors/src/demand_forecast.rs
// ============================================================================
// Module: Demand Forecast Predictor
// Description: Product/SKU demand forecasting (spec §4.3).
// Purpose: Extract time-series and catalog features for a forecast horizon
//          and produce a per-period demand forecast with intervals.
// Dependencies: prediction-core, serde_json
// ============================================================================

//! ## Overview
//! Input is a product/SKU identifier, a forecast horizon (in periods) and
//! granularity, plus recent historical order counts. The placeholder model
//! extrapolates a deterministic trend component derived from the historical
//! series and a bytes-derived seasonality signal (spec §1: ML algorithm
//! choice out of scope).

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

/// Maximum accepted forecast horizon, in periods.
pub const MAX_HORIZON_PERIODS: u64 = 52;

/// Extracts demand-forecast features from product id, horizon, and history.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemandForecastExtractor;

impl FeatureExtractor for DemandForecastExtractor {
    fn extract(&self, raw_input: &Value) -> Result<Value, FeatureExtractorError> {
        let product_id = raw_input
            .get("product_id")
            .and_then(Value::as_str)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing product_id".to_string()))?;

        let horizon_periods = raw_input
            .get("horizon_periods")
            .and_then(Value::as_u64)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing horizon_periods".to_string()))?;
        if horizon_periods == 0 {
            return Err(FeatureExtractorError::Malformed("horizon_periods must be positive".to_string()));
        }
        if horizon_periods > MAX_HORIZON_PERIODS {
            return Err(FeatureExtractorError::TooLarge(horizon_periods, MAX_HORIZON_PERIODS));
        }

        let granularity = raw_input.get("granularity").and_then(Value::as_str).unwrap_or("daily");
        if !matches!(granularity, "daily" | "weekly") {
            return Err(FeatureExtractorError::Malformed(format!("unsupported granularity: {granularity}")));
        }
        if !matches!(horizon_periods, 7 | 30 | 90) {
            return Err(FeatureExtractorError::Malformed(format!(
                "unsupported horizon_periods: {horizon_periods} (expected 7, 30, or 90)"
            )));
        }

        let history: Vec<f64> = raw_input
            .get("historical_demand")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default();
        if history.is_empty() {
            return Err(FeatureExtractorError::Malformed("historical_demand must not be empty".to_string()));
        }

        let mean = history.iter().sum::<f64>() / history.len() as f64;
        let trend = if history.len() >= 2 {
            (history[history.len() - 1] - history[0]) / history.len() as f64
        } else {
            0.0
        };
        let volatility = {
            let variance = history.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / history.len() as f64;
            variance.sqrt()
        };

        let seasonality_signal = unit_interval_from_bytes(product_id.as_bytes());

        Ok(json!({
            "product_id": product_id,
            "horizon_periods": horizon_periods,
            "granularity": granularity,
            "mean_demand": mean,
            "trend_per_period": trend,
            "volatility": volatility,
            "seasonality_signal": seasonality_signal,
            "history_length": history.len(),
        }))
    }
}

/// A loaded demand-forecast predictor (spec §4.3 table).
#[derive(Debug, Default, Clone, Copy)]
pub struct DemandForecastPredictor;

impl Predictor for DemandForecastPredictor {
    fn predict(&self, features: &Value) -> Result<RawPrediction, PredictorError> {
        let mean_demand = features
            .get("mean_demand")
            .and_then(Value::as_f64)
            .ok_or_else(|| PredictorError::Inference("missing mean_demand feature".to_string()))?;
        let trend_per_period = features.get("trend_per_period").and_then(Value::as_f64).unwrap_or(0.0);
        let volatility = features.get("volatility").and_then(Value::as_f64).unwrap_or(0.0);
        let seasonality_signal = features.get("seasonality_signal").and_then(Value::as_f64).unwrap_or(0.5);
        let horizon_periods = features.get("horizon_periods").and_then(Value::as_u64).unwrap_or(1);

        let seasonal_multiplier = scale(seasonality_signal, 0.85, 1.15);
        let mut forecast = Vec::with_capacity(horizon_periods as usize);
        let mut anomaly_flags = Vec::with_capacity(horizon_periods as usize);
        for period in 1..=horizon_periods {
            let point = (mean_demand + trend_per_period * period as f64) * seasonal_multiplier;
            let point = point.max(0.0);
            let step_spread_80 = (volatility * 1.28).max(0.5);
            let step_spread_95 = (volatility * 1.96).max(0.5);
            anomaly_flags.push(point > mean_demand + volatility * 3.0);
            forecast.push(json!({
                "period": period,
                "point": point,
                "lower_80": (point - step_spread_80).max(0.0),
                "upper_80": point + step_spread_80,
                "lower_95": (point - step_spread_95).max(0.0),
                "upper_95": point + step_spread_95,
            }));
        }
        let total: f64 = forecast
            .iter()
            .filter_map(|step| step.get("point").and_then(Value::as_f64))
            .sum();
        let spread = (volatility * (horizon_periods as f64).sqrt()).max(1.0);

        Ok(RawPrediction {
            value: json!({
                "forecast_by_period": forecast,
                "total_forecast": total,
                "anomaly_flags": anomaly_flags,
                "unit": "units",
            }),
            confidence_interval: Some(ConfidenceInterval {
                lower: (total - spread).max(0.0),
                upper: total + spread,
            }),
            feature_scores: vec![
                ("trend_per_period".to_string(), trend_per_period),
                ("volatility".to_string(), volatility),
                ("seasonality_signal".to_string(), seasonality_signal),
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
            "product_id": "sku-123",
            "horizon_periods": 7,
            "granularity": "daily",
            "historical_demand": [10.0, 12.0, 11.0, 15.0],
        })
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let extractor = DemandForecastExtractor;
        let mut request = sample_request();
        request["horizon_periods"] = json!(0);
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::Malformed(_)));
    }

    #[test]
    fn horizon_over_cap_is_rejected() {
        let extractor = DemandForecastExtractor;
        let mut request = sample_request();
        request["horizon_periods"] = json!(MAX_HORIZON_PERIODS + 1);
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::TooLarge(_, _)));
    }

    #[test]
    fn unsupported_granularity_is_rejected() {
        let extractor = DemandForecastExtractor;
        let mut request = sample_request();
        request["granularity"] = json!("fortnight");
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::Malformed(_)));
    }

    #[test]
    fn forecast_has_one_value_per_period() {
        let extractor = DemandForecastExtractor;
        let predictor = DemandForecastPredictor;
        let features = extractor.extract(&sample_request()).unwrap();
        let prediction = predictor.predict(&features).unwrap();
        let periods = prediction.value["forecast_by_period"].as_array().unwrap();
        assert_eq!(periods.len(), 7);
        for step in periods {
            let lower = step["lower_80"].as_f64().unwrap();
            let point = step["point"].as_f64().unwrap();
            let upper = step["upper_80"].as_f64().unwrap();
            assert!(lower <= point && point <= upper);
            assert!(lower >= 0.0);
        }
    }
}
