// prediction-config/src/docs.rs
// ============================================================================
// Module: Config Docs Generator
// Description: Markdown generator for prediction-service.toml documentation.
// Purpose: Keep config docs in sync with the schema, generated rather than
//          hand-maintained so they cannot drift from the validated shape.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! Generates `Docs/configuration/prediction-service.toml.md` from
//! [`crate::schema::config_schema`]. Output is deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;
use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::schema::config_schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default output path for generated configuration docs.
const DOCS_PATH: &str = "Docs/configuration/prediction-service.toml.md";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Documentation generation errors.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Writing the rendered docs file failed.
    #[error("docs io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Markdown Generation
// ============================================================================

/// Renders the configuration schema as markdown documentation.
#[must_use]
pub fn config_docs_markdown() -> String {
    let schema = config_schema();
    let mut out = String::new();
    let _ = writeln!(out, "# `prediction-service.toml` Configuration Reference");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated from the configuration schema. Every section is optional; omitted fields take the defaults shown below."
    );
    let _ = writeln!(out);

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return out;
    };

    for (section, definition) in properties {
        let _ = writeln!(out, "## `[{section}]`");
        let _ = writeln!(out);
        render_fields(&mut out, definition);
        let _ = writeln!(out);
    }

    out
}

fn render_fields(out: &mut String, definition: &Value) {
    let Some(fields) = definition.get("properties").and_then(Value::as_object) else {
        return;
    };
    let _ = writeln!(out, "| Field | Type | Default | Notes |");
    let _ = writeln!(out, "|---|---|---|---|");
    for (field, field_schema) in fields {
        let field_type = field_schema
            .get("type")
            .map_or_else(|| "object".to_string(), |value| value.to_string().trim_matches('"').to_string());
        let default = field_schema.get("default").map_or_else(|| "-".to_string(), |value| value.to_string());
        let notes = field_schema.get("description").and_then(Value::as_str).unwrap_or("-");
        let _ = writeln!(out, "| `{field}` | {field_type} | {default} | {notes} |");
    }
}

/// Writes the rendered docs to `path`, or [`DOCS_PATH`] when `path` is
/// `None`.
///
/// # Errors
///
/// Returns [`DocsError::Io`] when the file cannot be written.
pub fn write_config_docs(path: Option<&Path>) -> Result<(), DocsError> {
    let target = path.unwrap_or_else(|| Path::new(DOCS_PATH));
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| DocsError::Io(err.to_string()))?;
        }
    }
    fs::write(target, config_docs_markdown()).map_err(|err| DocsError::Io(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

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
    fn markdown_contains_every_top_level_section() {
        let markdown = config_docs_markdown();
        for section in ["cache", "training", "lifecycle", "drift", "artifact", "predictor", "limits", "rate_limit", "storage", "logging", "fallback"] {
            assert!(markdown.contains(&format!("[{section}]")), "missing section {section} in rendered docs");
        }
    }

    #[test]
    fn write_config_docs_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("prediction-service.toml.md");
        write_config_docs(Some(&target)).unwrap();
        assert!(target.exists());
    }
}
