// prediction-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and output-shaping helpers in
//              the CLI entry point.
// Purpose: Ensure malformed operator input is rejected with a clear message
//          instead of panicking.
// Dependencies: prediction-cli main helpers
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use prediction_core::ModelStatus;
use prediction_core::ModelType;
use prediction_core::TrainingTrigger;

use super::parse_model_type;
use super::parse_status;
use super::parse_timestamp;
use super::parse_trigger;
use super::read_json_input;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn parse_model_type_accepts_every_known_type() {
    for model_type in ModelType::ALL {
        let parsed = parse_model_type(model_type.as_str()).expect("known model type must parse");
        assert_eq!(parsed, model_type);
    }
}

#[test]
fn parse_model_type_rejects_unknown_values() {
    let err = parse_model_type("not_a_model_type").unwrap_err();
    assert!(err.to_string().contains("unknown model type"));
}

#[test]
fn parse_trigger_covers_every_variant() {
    assert_eq!(parse_trigger("manual").unwrap(), TrainingTrigger::Manual);
    assert_eq!(parse_trigger("scheduled").unwrap(), TrainingTrigger::Scheduled);
    assert_eq!(parse_trigger("drift").unwrap(), TrainingTrigger::Drift);
    assert_eq!(parse_trigger("event").unwrap(), TrainingTrigger::Event);
}

#[test]
fn parse_trigger_rejects_unknown_values() {
    let err = parse_trigger("nightly").unwrap_err();
    assert!(err.to_string().contains("unknown trigger"));
}

#[test]
fn parse_status_covers_every_variant() {
    assert_eq!(parse_status("draft").unwrap(), ModelStatus::Draft);
    assert_eq!(parse_status("testing").unwrap(), ModelStatus::Testing);
    assert_eq!(parse_status("active").unwrap(), ModelStatus::Active);
    assert_eq!(parse_status("deprecated").unwrap(), ModelStatus::Deprecated);
    assert_eq!(parse_status("archived").unwrap(), ModelStatus::Archived);
}

#[test]
fn parse_status_rejects_unknown_values() {
    assert!(parse_status("retired").is_err());
}

#[test]
fn parse_timestamp_round_trips_rfc3339() {
    let parsed = parse_timestamp("2026-01-15T12:00:00Z").expect("valid RFC 3339 timestamp must parse");
    let rendered: String = parsed.into();
    assert_eq!(rendered, "2026-01-15T12:00:00Z");
}

#[test]
fn parse_timestamp_rejects_malformed_input() {
    let err = parse_timestamp("not-a-timestamp").unwrap_err();
    assert!(err.to_string().contains("invalid RFC 3339 timestamp"));
}

#[test]
fn read_json_input_reads_from_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("input.json");
    std::fs::write(&path, b"{\"a\":1}").expect("write input file");
    let bytes = read_json_input(&path).expect("file must be readable");
    assert_eq!(bytes, b"{\"a\":1}");
}

#[test]
fn read_json_input_reports_missing_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.json");
    let err = read_json_input(&missing).unwrap_err();
    assert!(err.to_string().contains("reading"));
}

#[test]
fn write_stdout_line_appends_a_single_trailing_newline() {
    let mut buf: Vec<u8> = Vec::new();
    writeln!(&mut buf, "{}", "hello").expect("write must succeed");
    assert_eq!(buf, b"hello\n");
}
