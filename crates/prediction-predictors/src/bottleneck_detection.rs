// prediction-predictors/src/bottleneck_detection.rs
// ============================================================================
// Module: Bottleneck Detection Predictor
// Description: Production bottleneck detection for a facility (spec §4.3).
// Purpose: Extract per-workstation queue and throughput features for a
//          facility over a date range and produce predicted wait times,
//          a constraint severity tier, and reallocation suggestions.
// Dependencies: prediction-core, serde_json
// ============================================================================

//! ## Overview
//! Input is a facility id, a date range, and per-workstation throughput and
//! queue-depth observations. The placeholder model combines queue depth
//! relative to throughput with a bytes-derived facility signal (spec §1: ML
//! algorithm choice out of scope) into a predicted wait time per
//! workstation, then ranks workstations into severity tiers and proposes
//! reallocating load away from the most constrained ones.

use prediction_core::interfaces::FeatureExtractor;
use prediction_core::interfaces::FeatureExtractorError;
use prediction_core::interfaces::Predictor;
use prediction_core::interfaces::PredictorError;
use prediction_core::interfaces::RawPrediction;
use serde_json::Value;
use serde_json::json;

use crate::heuristics::unit_interval_from_bytes;

/// Maximum accepted number of workstations in a single request
/// (spec §4.3 geometry-equivalent size cap for this type).
pub const MAX_WORKSTATIONS: usize = 500;

/// Extracts per-workstation queue/throughput features for a facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct BottleneckDetectionExtractor;

impl FeatureExtractor for BottleneckDetectionExtractor {
    fn extract(&self, raw_input: &Value) -> Result<Value, FeatureExtractorError> {
        let facility_id = raw_input
            .get("facility_id")
            .and_then(Value::as_str)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing facility_id".to_string()))?;
        if facility_id.is_empty() {
            return Err(FeatureExtractorError::Malformed("facility_id must not be empty".to_string()));
        }

        let workstations = raw_input
            .get("workstations")
            .and_then(Value::as_array)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing workstations array".to_string()))?;
        if workstations.is_empty() {
            return Err(FeatureExtractorError::Malformed("workstations must not be empty".to_string()));
        }
        if workstations.len() > MAX_WORKSTATIONS {
            return Err(FeatureExtractorError::TooLarge(workstations.len() as u64, MAX_WORKSTATIONS as u64));
        }

        let mut extracted = Vec::with_capacity(workstations.len());
        for (index, workstation) in workstations.iter().enumerate() {
            let workstation_id = workstation
                .get("workstation_id")
                .and_then(Value::as_str)
                .ok_or_else(|| FeatureExtractorError::Malformed(format!("workstation {index} missing workstation_id")))?;
            let queue_depth = workstation
                .get("queue_depth")
                .and_then(Value::as_f64)
                .ok_or_else(|| FeatureExtractorError::Malformed(format!("workstation {index} missing queue_depth")))?;
            let throughput_per_hour = workstation.get("throughput_per_hour").and_then(Value::as_f64).unwrap_or(1.0);
            if throughput_per_hour <= 0.0 {
                return Err(FeatureExtractorError::Malformed(format!(
                    "workstation {index} throughput_per_hour must be positive"
                )));
            }
            let utilization_percent = workstation.get("utilization_percent").and_then(Value::as_f64).unwrap_or(0.0);

            extracted.push(json!({
                "workstation_id": workstation_id,
                "queue_depth": queue_depth,
                "throughput_per_hour": throughput_per_hour,
                "utilization_percent": utilization_percent,
            }));
        }

        let facility_signal = unit_interval_from_bytes(facility_id.as_bytes());

        Ok(json!({
            "facility_id": facility_id,
            "workstations": extracted,
            "facility_signal": facility_signal,
        }))
    }
}

/// A loaded bottleneck-detection predictor (spec §4.3 table).
#[derive(Debug, Default, Clone, Copy)]
pub struct BottleneckDetectionPredictor;

impl BottleneckDetectionPredictor {
    fn severity_tier(predicted_wait_minutes: f64) -> &'static str {
        if predicted_wait_minutes >= 120.0 {
            "critical"
        } else if predicted_wait_minutes >= 45.0 {
            "elevated"
        } else {
            "normal"
        }
    }
}

impl Predictor for BottleneckDetectionPredictor {
    fn predict(&self, features: &Value) -> Result<RawPrediction, PredictorError> {
        let workstations = features
            .get("workstations")
            .and_then(Value::as_array)
            .ok_or_else(|| PredictorError::Inference("missing workstations feature".to_string()))?;
        let facility_signal = features.get("facility_signal").and_then(Value::as_f64).unwrap_or(0.5);

        let mut predictions = Vec::with_capacity(workstations.len());
        let mut feature_scores = Vec::with_capacity(workstations.len());

        for workstation in workstations {
            let workstation_id = workstation.get("workstation_id").and_then(Value::as_str).unwrap_or("unknown");
            let queue_depth = workstation.get("queue_depth").and_then(Value::as_f64).unwrap_or(0.0);
            let throughput_per_hour = workstation.get("throughput_per_hour").and_then(Value::as_f64).unwrap_or(1.0);
            let utilization_percent = workstation.get("utilization_percent").and_then(Value::as_f64).unwrap_or(0.0);

            let base_wait_minutes = (queue_depth / throughput_per_hour) * 60.0;
            let utilization_multiplier = 1.0 + (utilization_percent / 100.0).clamp(0.0, 1.0) * facility_signal;
            let predicted_wait_minutes = base_wait_minutes * utilization_multiplier;
            let severity = Self::severity_tier(predicted_wait_minutes);

            predictions.push(json!({
                "workstation_id": workstation_id,
                "predicted_wait_minutes": predicted_wait_minutes,
                "severity": severity,
            }));
            feature_scores.push((workstation_id.to_string(), predicted_wait_minutes));
        }

        feature_scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let reallocation_suggestions: Vec<&str> = feature_scores
            .iter()
            .take(3)
            .filter(|(_, wait)| *wait >= 45.0)
            .map(|(workstation_id, _)| workstation_id.as_str())
            .collect();

        Ok(RawPrediction {
            value: json!({
                "workstations": predictions,
                "reallocation_suggestions": reallocation_suggestions,
            }),
            confidence_interval: None,
            feature_scores,
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
            "facility_id": "facility-east-1",
            "workstations": [
                { "workstation_id": "ws-1", "queue_depth": 20.0, "throughput_per_hour": 10.0, "utilization_percent": 90.0 },
                { "workstation_id": "ws-2", "queue_depth": 2.0, "throughput_per_hour": 10.0, "utilization_percent": 30.0 },
            ],
        })
    }

    #[test]
    fn empty_workstations_is_malformed() {
        let extractor = BottleneckDetectionExtractor;
        let request = json!({ "facility_id": "f1", "workstations": [] });
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::Malformed(_)));
    }

    #[test]
    fn too_many_workstations_is_rejected() {
        let extractor = BottleneckDetectionExtractor;
        let workstations: Vec<Value> = (0..MAX_WORKSTATIONS + 1)
            .map(|i| json!({ "workstation_id": format!("ws-{i}"), "queue_depth": 1.0, "throughput_per_hour": 10.0 }))
            .collect();
        let request = json!({ "facility_id": "f1", "workstations": workstations });
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::TooLarge(_, _)));
    }

    #[test]
    fn zero_throughput_is_rejected() {
        let extractor = BottleneckDetectionExtractor;
        let request = json!({
            "facility_id": "f1",
            "workstations": [{ "workstation_id": "ws-1", "queue_depth": 1.0, "throughput_per_hour": 0.0 }],
        });
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::Malformed(_)));
    }

    #[test]
    fn higher_queue_depth_yields_higher_severity() {
        let extractor = BottleneckDetectionExtractor;
        let predictor = BottleneckDetectionPredictor;
        let features = extractor.extract(&sample_request()).unwrap();
        let prediction = predictor.predict(&features).unwrap();
        let workstations = prediction.value["workstations"].as_array().unwrap();
        let ws1_wait = workstations[0]["predicted_wait_minutes"].as_f64().unwrap();
        let ws2_wait = workstations[1]["predicted_wait_minutes"].as_f64().unwrap();
        assert!(ws1_wait > ws2_wait);
    }

    #[test]
    fn reallocation_suggestions_are_bounded_to_three() {
        let extractor = BottleneckDetectionExtractor;
        let predictor = BottleneckDetectionPredictor;
        let workstations: Vec<Value> = (0..10)
            .map(|i| {
                json!({
                    "workstation_id": format!("ws-{i}"),
                    "queue_depth": 500.0,
                    "throughput_per_hour": 1.0,
                    "utilization_percent": 95.0,
                })
            })
            .collect();
        let request = json!({ "facility_id": "f1", "workstations": workstations });
        let features = extractor.extract(&request).unwrap();
        let prediction = predictor.predict(&features).unwrap();
        assert!(prediction.value["reallocation_suggestions"].as_array().unwrap().len() <= 3);
    }
}
