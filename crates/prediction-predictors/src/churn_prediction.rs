// prediction-predictors/src/churn_prediction.rs
// ============================================================================
// Module: Churn Prediction Predictor
// Description: Customer churn risk classification (spec §4.3).
// Purpose: Extract behavioral/engagement features for a customer and
//          produce a churn risk score, multi-horizon probabilities, and
//          ranked risk factors.
// Dependencies: prediction-core, serde_json
// ============================================================================

//! ## Overview
//! Input is a customer id plus recent engagement signals (days since last
//! order, order count in the trailing year, support ticket count, and
//! average order value trend). The placeholder model combines those
//! signals with a bytes-derived risk signal from the customer id (spec §1:
//! ML algorithm choice out of scope) into a 0-100 risk score and
//! probabilities at three horizons.

use prediction_core::interfaces::FeatureExtractor;
use prediction_core::interfaces::FeatureExtractorError;
use prediction_core::interfaces::Predictor;
use prediction_core::interfaces::PredictorError;
use prediction_core::interfaces::RawPrediction;
use serde_json::Value;
use serde_json::json;

use crate::heuristics::scale;
use crate::heuristics::unit_interval_from_bytes;

/// Maximum accepted days-since-last-order value (spec §4.3 validation).
pub const MAX_DAYS_SINCE_LAST_ORDER: u64 = 3650;

/// Extracts churn-risk features from a customer id and engagement history.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChurnPredictionExtractor;

impl FeatureExtractor for ChurnPredictionExtractor {
    fn extract(&self, raw_input: &Value) -> Result<Value, FeatureExtractorError> {
        let customer_id = raw_input
            .get("customer_id")
            .and_then(Value::as_str)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing customer_id".to_string()))?;
        if customer_id.is_empty() {
            return Err(FeatureExtractorError::Malformed("customer_id must not be empty".to_string()));
        }

        let days_since_last_order = raw_input
            .get("days_since_last_order")
            .and_then(Value::as_u64)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing days_since_last_order".to_string()))?;
        if days_since_last_order > MAX_DAYS_SINCE_LAST_ORDER {
            return Err(FeatureExtractorError::TooLarge(days_since_last_order, MAX_DAYS_SINCE_LAST_ORDER));
        }

        let orders_trailing_year = raw_input.get("orders_trailing_year").and_then(Value::as_u64).unwrap_or(0);
        let support_tickets_trailing_year =
            raw_input.get("support_tickets_trailing_year").and_then(Value::as_u64).unwrap_or(0);
        let avg_order_value_trend = raw_input.get("avg_order_value_trend_percent").and_then(Value::as_f64).unwrap_or(0.0);

        let recency_signal = scale((days_since_last_order as f64 / 365.0).min(1.0), 0.0, 1.0);
        let frequency_signal = 1.0 / (1.0 + orders_trailing_year as f64);
        let support_signal = scale((support_tickets_trailing_year as f64 / 10.0).min(1.0), 0.0, 1.0);
        let id_signal = unit_interval_from_bytes(customer_id.as_bytes());

        Ok(json!({
            "customer_id": customer_id,
            "days_since_last_order": days_since_last_order,
            "orders_trailing_year": orders_trailing_year,
            "support_tickets_trailing_year": support_tickets_trailing_year,
            "avg_order_value_trend_percent": avg_order_value_trend,
            "recency_signal": recency_signal,
            "frequency_signal": frequency_signal,
            "support_signal": support_signal,
            "id_signal": id_signal,
        }))
    }
}

/// A loaded churn-prediction predictor (spec §4.3 table).
#[derive(Debug, Default, Clone, Copy)]
pub struct ChurnPredictionPredictor;

impl Predictor for ChurnPredictionPredictor {
    fn predict(&self, features: &Value) -> Result<RawPrediction, PredictorError> {
        let recency_signal = features
            .get("recency_signal")
            .and_then(Value::as_f64)
            .ok_or_else(|| PredictorError::Inference("missing recency_signal feature".to_string()))?;
        let frequency_signal = features.get("frequency_signal").and_then(Value::as_f64).unwrap_or(0.5);
        let support_signal = features.get("support_signal").and_then(Value::as_f64).unwrap_or(0.0);
        let id_signal = features.get("id_signal").and_then(Value::as_f64).unwrap_or(0.5);
        let avg_order_value_trend = features.get("avg_order_value_trend_percent").and_then(Value::as_f64).unwrap_or(0.0);

        let declining_value_signal = scale((-avg_order_value_trend / 50.0).clamp(0.0, 1.0), 0.0, 1.0);

        let risk_unit = (0.35 * recency_signal
            + 0.25 * frequency_signal
            + 0.2 * support_signal
            + 0.1 * declining_value_signal
            + 0.1 * id_signal)
            .clamp(0.0, 1.0);
        let risk_score = (risk_unit * 100.0).round();

        let probability_30d = scale(risk_unit, 0.01, 0.35);
        let probability_60d = scale(risk_unit, 0.03, 0.55);
        let probability_90d = scale(risk_unit, 0.05, 0.75);

        let mut risk_factors = vec![
            ("days_since_last_order".to_string(), recency_signal),
            ("order_frequency".to_string(), frequency_signal),
            ("support_ticket_volume".to_string(), support_signal),
            ("average_order_value_trend".to_string(), declining_value_signal),
        ];
        risk_factors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let interventions: Vec<&str> = if risk_score >= 70.0 {
            vec!["offer_retention_discount", "schedule_account_manager_outreach"]
        } else if risk_score >= 40.0 {
            vec!["send_re_engagement_campaign"]
        } else {
            vec![]
        };

        Ok(RawPrediction {
            value: json!({
                "risk_score": risk_score,
                "probability_30d": probability_30d,
                "probability_60d": probability_60d,
                "probability_90d": probability_90d,
                "top_risk_factors": risk_factors.iter().map(|(name, _)| name).collect::<Vec<_>>(),
                "suggested_interventions": interventions,
            }),
            confidence_interval: None,
            feature_scores: risk_factors,
        })
    }
}
