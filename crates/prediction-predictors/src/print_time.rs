// prediction-predictors/src/print_time.rs
// ============================================================================
// Module: Print Time Predictor
// Description: Geometry-driven manufacturing time estimation (spec §4.3).
// Purpose: Extract geometry features from an opaque mesh payload and
//          produce an estimated print duration with a breakdown and
//          confidence interval.
// Dependencies: prediction-core, base64, serde_json
// ============================================================================

//! ## Overview
//! Real STL/OBJ/3MF parsing is out of scope for this crate (spec §1: the
//! choice of ML algorithm, and feature engineering for specific input
//! modalities, are specified only at the contract level). [`PrintTimeExtractor`]
//! derives the geometry feature set (volume, surface area, bounding box,
//! layer count, support percentage, complexity score) deterministically
//! from the mesh bytes via [`crate::heuristics::unit_interval_from_bytes`],
//! satisfying the documented invariants (fails on empty/oversized input,
//! deterministic given the same bytes) without implementing a real mesh
//! parser.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use prediction_core::interfaces::ConfidenceInterval;
use prediction_core::interfaces::FeatureExtractor;
use prediction_core::interfaces::FeatureExtractorError;
use prediction_core::interfaces::Predictor;
use prediction_core::interfaces::PredictorError;
use prediction_core::interfaces::RawPrediction;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::heuristics::scale;
use crate::heuristics::unit_interval_from_bytes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted geometry payload, in bytes (spec §4.3, default 50 MB).
pub const MAX_GEOMETRY_BYTES: u64 = 50 * 1024 * 1024;

// ============================================================================
// SECTION: Feature Extractor
// ============================================================================

/// Extracts geometry and print-parameter features from a print-time request.
///
/// Expects `raw_input` to carry `geometry_base64` (the mesh bytes, base64
/// encoded) alongside `material`, `printer_model`, `layer_height_mm`,
/// `infill_percent`, `nozzle_temp_c`, `bed_temp_c`, and `print_speed_mm_s`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintTimeExtractor;

impl FeatureExtractor for PrintTimeExtractor {
    fn extract(&self, raw_input: &Value) -> Result<Value, FeatureExtractorError> {
        let geometry_b64 = raw_input
            .get("geometry_base64")
            .and_then(Value::as_str)
            .ok_or_else(|| FeatureExtractorError::Malformed("missing geometry_base64".to_string()))?;

        let geometry_bytes = BASE64
            .decode(geometry_b64)
            .map_err(|err| FeatureExtractorError::Malformed(format!("invalid base64 geometry: {err}")))?;

        if geometry_bytes.is_empty() {
            return Err(FeatureExtractorError::Malformed("geometry payload is empty".to_string()));
        }
        let byte_len = geometry_bytes.len() as u64;
        if byte_len > MAX_GEOMETRY_BYTES {
            return Err(FeatureExtractorError::TooLarge(byte_len, MAX_GEOMETRY_BYTES));
        }

        let layer_height_mm = raw_input.get("layer_height_mm").and_then(Value::as_f64).unwrap_or(0.2);
        if layer_height_mm <= 0.0 {
            return Err(FeatureExtractorError::Malformed("layer_height_mm must be positive".to_string()));
        }

        let signal = unit_interval_from_bytes(&geometry_bytes);
        let size_signal = ((byte_len as f64).ln().max(0.0)) / 20.0;

        let bbox_x_mm = scale(signal, 10.0, 300.0);
        let bbox_y_mm = scale((signal * 1.37) % 1.0, 10.0, 300.0);
        let bbox_z_mm = scale((signal * 2.11) % 1.0, 5.0, 250.0);
        let volume_mm3 = bbox_x_mm * bbox_y_mm * bbox_z_mm * scale(signal, 0.05, 0.6);
        let surface_area_mm2 = 2.0 * (bbox_x_mm * bbox_y_mm + bbox_y_mm * bbox_z_mm + bbox_x_mm * bbox_z_mm);
        let layer_count = (bbox_z_mm / layer_height_mm).ceil().max(1.0);
        let support_percent = scale(size_signal.clamp(0.0, 1.0), 0.0, 35.0);
        let complexity_score = scale(signal, 0.1, 1.0);

        Ok(json!({
            "volume_mm3": volume_mm3,
            "surface_area_mm2": surface_area_mm2,
            "bbox_x_mm": bbox_x_mm,
            "bbox_y_mm": bbox_y_mm,
            "bbox_z_mm": bbox_z_mm,
            "layer_count": layer_count,
            "support_percent": support_percent,
            "complexity_score": complexity_score,
            "material": raw_input.get("material").and_then(Value::as_str).unwrap_or("PLA"),
            "printer_model": raw_input.get("printer_model").and_then(Value::as_str).unwrap_or("generic"),
            "infill_percent": raw_input.get("infill_percent").and_then(Value::as_f64).unwrap_or(20.0),
            "nozzle_temp_c": raw_input.get("nozzle_temp_c").and_then(Value::as_f64).unwrap_or(210.0),
            "bed_temp_c": raw_input.get("bed_temp_c").and_then(Value::as_f64).unwrap_or(60.0),
            "print_speed_mm_s": raw_input.get("print_speed_mm_s").and_then(Value::as_f64).unwrap_or(50.0),
        }))
    }
}

// ============================================================================
// SECTION: Artifact
// ============================================================================

/// The serialized coefficients for [`PrintTimePredictor`] (spec §1: choice
/// of ML algorithm out of scope; this is a linear heuristic placeholder).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrintTimeArtifact {
    /// Minutes of print time per mm³ of volume.
    pub minutes_per_mm3: f64,
    /// Fixed post-processing minutes.
    pub post_process_minutes: f64,
    /// Fixed quality-control minutes.
    pub qc_minutes: f64,
    /// Additional minutes per percentage point of support material.
    pub minutes_per_support_percent: f64,
}

impl Default for PrintTimeArtifact {
    fn default() -> Self {
        Self {
            minutes_per_mm3: 0.00045,
            post_process_minutes: 8.0,
            qc_minutes: 5.0,
            minutes_per_support_percent: 0.6,
        }
    }
}

// ============================================================================
// SECTION: Predictor
// ============================================================================

/// A loaded print-time predictor (spec §4.3 table).
#[derive(Debug, Clone, Copy)]
pub struct PrintTimePredictor {
    artifact: PrintTimeArtifact,
}

impl PrintTimePredictor {
    /// Constructs a predictor from deserialized artifact bytes.
    ///
    /// # Errors
    ///
    /// Returns an error string when `bytes` is not a valid
    /// [`PrintTimeArtifact`] JSON document.
    pub fn from_artifact_bytes(bytes: &[u8]) -> Result<Self, String> {
        let artifact: PrintTimeArtifact = serde_json::from_slice(bytes).map_err(|err| err.to_string())?;
        Ok(Self { artifact })
    }
}

impl Predictor for PrintTimePredictor {
    fn predict(&self, features: &Value) -> Result<RawPrediction, PredictorError> {
        let volume_mm3 = features
            .get("volume_mm3")
            .and_then(Value::as_f64)
            .ok_or_else(|| PredictorError::Inference("missing volume_mm3 feature".to_string()))?;
        let support_percent = features.get("support_percent").and_then(Value::as_f64).unwrap_or(0.0);
        let infill_percent = features.get("infill_percent").and_then(Value::as_f64).unwrap_or(20.0);
        let print_speed = features.get("print_speed_mm_s").and_then(Value::as_f64).unwrap_or(50.0);

        let speed_factor = (50.0 / print_speed.max(1.0)).clamp(0.3, 3.0);
        let infill_factor = 0.6 + (infill_percent / 100.0) * 0.8;

        let print_minutes = volume_mm3 * self.artifact.minutes_per_mm3 * speed_factor * infill_factor;
        let support_minutes = support_percent * self.artifact.minutes_per_support_percent;
        let estimated_minutes = print_minutes + support_minutes + self.artifact.post_process_minutes + self.artifact.qc_minutes;

        let spread = estimated_minutes * 0.12;

        Ok(RawPrediction {
            value: json!({
                "estimated_minutes": estimated_minutes,
                "breakdown": {
                    "print_minutes": print_minutes + support_minutes,
                    "post_process_minutes": self.artifact.post_process_minutes,
                    "qc_minutes": self.artifact.qc_minutes,
                },
                "unit": "minutes",
            }),
            confidence_interval: Some(ConfidenceInterval {
                lower: (estimated_minutes - spread).max(0.0),
                upper: estimated_minutes + spread,
            }),
            feature_scores: vec![
                ("volume_mm3".to_string(), volume_mm3),
                ("support_percent".to_string(), support_percent),
                ("infill_percent".to_string(), infill_percent),
                ("print_speed_mm_s".to_string(), print_speed),
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

    fn sample_request(geometry_len: usize) -> Value {
        let geometry = vec![0x42u8; geometry_len];
        json!({
            "geometry_base64": BASE64.encode(geometry),
            "material": "PLA",
            "printer_model": "Prusa-MK4",
            "layer_height_mm": 0.2,
            "infill_percent": 20,
            "print_speed_mm_s": 50,
        })
    }

    #[test]
    fn empty_geometry_is_malformed() {
        let extractor = PrintTimeExtractor;
        let request = json!({ "geometry_base64": BASE64.encode(Vec::<u8>::new()) });
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::Malformed(_)));
    }

    #[test]
    fn oversized_geometry_is_rejected() {
        let extractor = PrintTimeExtractor;
        let request = sample_request((MAX_GEOMETRY_BYTES + 1) as usize);
        let err = extractor.extract(&request).unwrap_err();
        assert!(matches!(err, FeatureExtractorError::TooLarge(_, _)));
    }

    #[test]
    fn same_geometry_extracts_identical_features() {
        let extractor = PrintTimeExtractor;
        let request = sample_request(512);
        let a = extractor.extract(&request).unwrap();
        let b = extractor.extract(&request).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn layer_count_matches_height_over_layer_height() {
        let extractor = PrintTimeExtractor;
        let request = sample_request(512);
        let features = extractor.extract(&request).unwrap();
        let bbox_z = features.get("bbox_z_mm").and_then(Value::as_f64).unwrap_or(0.0);
        let layer_count = features.get("layer_count").and_then(Value::as_f64).unwrap_or(0.0);
        assert!((layer_count - (bbox_z / 0.2).ceil()).abs() < f64::EPSILON);
    }

    #[test]
    fn predictor_returns_consistent_breakdown() {
        let predictor = PrintTimePredictor { artifact: PrintTimeArtifact::default() };
        let features = json!({
            "volume_mm3": 8000.0,
            "support_percent": 5.0,
            "infill_percent": 20.0,
            "print_speed_mm_s": 50.0,
        });
        let prediction = predictor.predict(&features).unwrap();
        let estimated = prediction.value.get("estimated_minutes").and_then(Value::as_f64).unwrap_or(0.0);
        let breakdown_sum = prediction.value["breakdown"]["print_minutes"].as_f64().unwrap_or(0.0)
            + prediction.value["breakdown"]["post_process_minutes"].as_f64().unwrap_or(0.0)
            + prediction.value["breakdown"]["qc_minutes"].as_f64().unwrap_or(0.0);
        assert!((estimated - breakdown_sum).abs() < 1e-9);
        let ci = prediction.confidence_interval.unwrap();
        assert!(ci.lower <= estimated && estimated <= ci.upper);
    }
}
