// prediction-predictors/src/material_demand.rs
// ============================================================================
// Module: Material Demand Predictor
// Description: Material consumption forecasting and reorder alerting
//              (spec §4.3).
// Purpose: Extract consumption-history and supply-chain features for a
//          material SKU and produce a per-period consumption forecast,
//          stockout alert, and reorder suggestion.
// Dependencies: prediction-core, serde_json
// ============================================================================

//! ## Overview
//! Input is a material SKU, a forecast horizon (in periods), current stock
//! on hand, supplier lead time, and recent consumption history. The
//! placeholder model extrapolates a deterministic trend from the
//! consumption series (spec §1: ML algorithm choice out of scope) and flags
//! a stockout whenever projected consumption over the lead-time window would
//! exceed current stock.

use prediction_core::interfaces::ConfidenceInterval;
use prediction_core::interfaces::FeatureExtractor;
use prediction_core::interfaces::FeatureExtractorError;
use prediction_core::interfaces::Predictor;
use prediction_core::interfaces::PredictorError;
use prediction_core::interfaces::RawPrediction;
use serde_json::Value;
use serde_json::json;

use crate::heuristics::unit_interval_from_bytes;

/// Maximum accepted forecast horizon, in periods.
pub const MAX_HORIZON_PERIODS: u64 = 52;

/// Maximum accepted supplier lead time, in days.
pub const MAX_LEAD_TIME_DAYS: u64 = 365;

/// Extracts material-demand features from SKU, horizon, stock, and history.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaterialDemandExtractor;

impl FeatureExtractor for MaterialDemandExtractor {
    fn extract(&self, raw_input: &Value) -> Result<Value, FeatureExtractorError> {
        let material_sku = raw_input
            .get("material_sku")
            .and_then(Value::as_str)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing material_sku".to_string()))?;
        if material_sku.is_empty() {
            return Err(FeatureExtractorError::Malformed("material_sku must not be empty".to_string()));
        }

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

        let lead_time_days = raw_input.get("lead_time_days").and_then(Value::as_u64).unwrap_or(7);
        if lead_time_days > MAX_LEAD_TIME_DAYS {
            return Err(FeatureExtractorError::TooLarge(lead_time_days, MAX_LEAD_TIME_DAYS));
        }

        let stock_on_hand = raw_input
            .get("stock_on_hand")
            .and_then(Value::as_f64)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing stock_on_hand".to_string()))?;
        if stock_on_hand < 0.0 {
            return Err(FeatureExtractorError::Malformed("stock_on_hand must not be negative".to_string()));
        }

        let history: Vec<f64> = raw_input
            .get("consumption_history")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default();
        if history.is_empty() {
            return Err(FeatureExtractorError::Malformed("consumption_history must not be empty".to_string()));
        }

        let mean_consumption = history.iter().sum::<f64>() / history.len() as f64;
        let trend = if history.len() >= 2 {
            (history[history.len() - 1] - history[0]) / history.len() as f64
        } else {
            0.0
        };
        let variance = history.iter().map(|value| (value - mean_consumption).powi(2)).sum::<f64>() / history.len() as f64;
        let volatility = variance.sqrt();
        let supply_signal = unit_interval_from_bytes(material_sku.as_bytes());

        Ok(json!({
            "material_sku": material_sku,
            "horizon_periods": horizon_periods,
            "lead_time_days": lead_time_days,
            "stock_on_hand": stock_on_hand,
            "mean_consumption": mean_consumption,
            "trend_per_period": trend,
            "volatility": volatility,
            "supply_signal": supply_signal,
        }))
    }
}

/// A loaded material-demand predictor (spec §4.3 table).
#[derive(Debug, Default, Clone, Copy)]
pub struct MaterialDemandPredictor;

impl Predictor for MaterialDemandPredictor {
    fn predict(&self, features: &Value) -> Result<RawPrediction, PredictorError> {
        let mean_consumption = features
            .get("mean_consumption")
            .and_then(Value::as_f64)
            .ok_or_else(|| PredictorError::Inference("missing mean_consumption feature".to_string()))?;
        let trend_per_period = features.get("trend_per_period").and_then(Value::as_f64).unwrap_or(0.0);
        let volatility = features.get("volatility").and_then(Value::as_f64).unwrap_or(0.0);
        let horizon_periods = features.get("horizon_periods").and_then(Value::as_u64).unwrap_or(1);
        let lead_time_days = features.get("lead_time_days").and_then(Value::as_u64).unwrap_or(7);
        let stock_on_hand = features.get("stock_on_hand").and_then(Value::as_f64).unwrap_or(0.0);

        let mut forecast = Vec::with_capacity(horizon_periods as usize);
        for period in 1..=horizon_periods {
            let point = (mean_consumption + trend_per_period * period as f64).max(0.0);
            let spread = (volatility * 1.28).max(0.1);
            forecast.push(json!({
                "period": period,
                "point": point,
                "lower_80": (point - spread).max(0.0),
                "upper_80": point + spread,
            }));
        }

        let daily_rate = mean_consumption.max(0.0) + trend_per_period.max(0.0);
        let projected_lead_time_consumption = daily_rate * lead_time_days as f64;
        let stockout_risk = projected_lead_time_consumption > stock_on_hand;

        let reorder_quantity = if stockout_risk {
            (projected_lead_time_consumption - stock_on_hand + volatility * 2.0).max(0.0)
        } else {
            0.0
        };

        let total: f64 = forecast.iter().filter_map(|step| step.get("point").and_then(Value::as_f64)).sum();
        let spread = (volatility * (horizon_periods as f64).sqrt()).max(0.1);

        Ok(RawPrediction {
            value: json!({
                "forecast_by_period": forecast,
                "total_forecast": total,
                "stockout_within_lead_time": stockout_risk,
                "projected_lead_time_consumption": projected_lead_time_consumption,
                "reorder_suggestion": {
                    "recommended": stockout_risk,
                    "quantity": reorder_quantity,
                },
            }),
            confidence_interval: Some(ConfidenceInterval {
                lower: (total - spread).max(0.0),
                upper: total + spread,
            }),
            feature_scores: vec![
                ("trend_per_period".to_string(), trend_per_period),
                ("volatility".to_string(), volatility),
                ("stock_on_hand".to_string(), stock_on_hand),
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
            "material_sku": "resin-abs-1kg",
            "horizon_periods": 7,
            "lead_time_days": 10,
            "stock_on_hand": 5.0,
            "consumption_history": [2.0, 3.0, 2.5, 4.0],
        })
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let extractor = MaterialDemandExtractor;
        let mut request = sample_request();
        request["horizon_periods"] = json!(0);
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::Malformed(_)));
    }

    #[test]
    fn negative_stock_on_hand_is_rejected() {
        let extractor = MaterialDemandExtractor;
        let mut request = sample_request();
        request["stock_on_hand"] = json!(-1.0);
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::Malformed(_)));
    }

    #[test]
    fn low_stock_triggers_stockout_alert_and_reorder() {
        let extractor = MaterialDemandExtractor;
        let predictor = MaterialDemandPredictor;
        let mut request = sample_request();
        request["stock_on_hand"] = json!(0.5);
        let features = extractor.extract(&request).unwrap();
        let prediction = predictor.predict(&features).unwrap();
        assert_eq!(prediction.value["stockout_within_lead_time"], json!(true));
        assert!(prediction.value["reorder_suggestion"]["quantity"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn ample_stock_does_not_trigger_alert() {
        let extractor = MaterialDemandExtractor;
        let predictor = MaterialDemandPredictor;
        let mut request = sample_request();
        request["stock_on_hand"] = json!(10_000.0);
        let features = extractor.extract(&request).unwrap();
        let prediction = predictor.predict(&features).unwrap();
        assert_eq!(prediction.value["stockout_within_lead_time"], json!(false));
        assert_eq!(prediction.value["reorder_suggestion"]["quantity"].as_f64().unwrap(), 0.0);
    }

    #[test]
    fn forecast_has_one_value_per_period() {
        let extractor = MaterialDemandExtractor;
        let predictor = MaterialDemandPredictor;
        let features = extractor.extract(&sample_request()).unwrap();
        let prediction = predictor.predict(&features).unwrap();
        assert_eq!(prediction.value["forecast_by_period"].as_array().unwrap().len(), 7);
    }
}
