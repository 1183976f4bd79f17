// prediction-config/src/policy.rs
// ============================================================================
// Module: Fallback Policy Configuration
// Description: Per-model-type rule-based fallback configuration for the
//              `NoActiveModel` error path (spec §7).
// Purpose: Let operators declare, per model type, whether a rule-based
//          fallback should serve degraded predictions when no Active model
//          exists, instead of failing the request with 503.
// Dependencies: prediction-core, serde
// ============================================================================

//! ## Overview
//! When [`Registry::get_active`](prediction_core) returns no model for a
//! type (spec §4.3 step 3), the orchestrator's caller consults
//! [`FallbackPolicyConfig`] to decide whether to serve a rule-based
//! fallback prediction with a `degraded: true` flag, or to surface
//! `NoActiveModel` (503) to the client (spec §7). The fallback rule itself
//! (a fixed heuristic estimate, independent of any trained model) is
//! defined and invoked by the serving layer; this crate only carries the
//! declarative per-type policy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use prediction_core::ModelType;
use serde::Deserialize;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Fallback Policy
// ============================================================================

/// Declarative rule-based fallback policy, keyed by model type (spec §7
/// `NoActiveModel`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FallbackPolicyConfig {
    /// Per-type fallback rules, keyed by [`ModelType::as_str`]. A type with
    /// no entry has fallback disabled: `NoActiveModel` surfaces as a 503.
    #[serde(default)]
    pub rules: BTreeMap<String, FallbackRule>,
}

impl FallbackPolicyConfig {
    /// Returns the configured fallback rule for `model_type`, if any.
    #[must_use]
    pub fn rule_for(&self, model_type: ModelType) -> Option<&FallbackRule> {
        self.rules.get(model_type.as_str())
    }

    /// Returns whether a rule-based fallback is configured for
    /// `model_type`.
    #[must_use]
    pub fn is_enabled_for(&self, model_type: ModelType) -> bool {
        self.rule_for(model_type).is_some_and(FallbackRule::is_enabled)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (key, rule) in &self.rules {
            key.parse::<ModelType>()
                .map_err(|_| ConfigError::Invalid(format!("fallback.rules has unknown model type {key}")))?;
            rule.validate(key)?;
        }
        Ok(())
    }
}

/// A single type's rule-based fallback configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackRule {
    /// Whether this rule is active. Present-but-disabled entries let
    /// operators document a considered-and-rejected fallback without
    /// deleting its parameters.
    #[serde(default = "default_rule_enabled")]
    pub enabled: bool,
    /// Fixed point estimate this rule returns in place of a model
    /// prediction (spec §7 "rule-based fallback"; units are
    /// type-specific, e.g. hours for `print_time`, a currency amount for
    /// `price_optimization`).
    pub estimate: f64,
    /// Human-readable explanation surfaced alongside the `degraded: true`
    /// flag, so a caller can distinguish a heuristic estimate from a real
    /// prediction.
    #[serde(default = "default_rule_explanation")]
    pub explanation: String,
}

const fn default_rule_enabled() -> bool {
    true
}

fn default_rule_explanation() -> String {
    "estimate produced by a fixed fallback rule; no trained model is active for this type".to_string()
}

impl FallbackRule {
    /// Returns whether this rule is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn validate(&self, key: &str) -> Result<(), ConfigError> {
        if !self.estimate.is_finite() {
            return Err(ConfigError::Invalid(format!("fallback.rules.{key}.estimate must be finite")));
        }
        if self.explanation.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("fallback.rules.{key}.explanation must not be empty")));
        }
        Ok(())
    }
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
    fn unconfigured_type_has_fallback_disabled() {
        let policy = FallbackPolicyConfig::default();
        assert!(!policy.is_enabled_for(ModelType::PrintTime));
    }

    #[test]
    fn configured_enabled_rule_reports_enabled() {
        let mut policy = FallbackPolicyConfig::default();
        policy.rules.insert(
            "print_time".to_string(),
            FallbackRule {
                enabled: true,
                estimate: 4.5,
                explanation: "median historical print time for this material class".to_string(),
            },
        );
        assert!(policy.is_enabled_for(ModelType::PrintTime));
        assert_eq!(policy.rule_for(ModelType::PrintTime).unwrap().estimate, 4.5);
    }

    #[test]
    fn disabled_rule_reports_disabled_despite_being_present() {
        let mut policy = FallbackPolicyConfig::default();
        policy.rules.insert(
            "print_time".to_string(),
            FallbackRule {
                enabled: false,
                estimate: 4.5,
                explanation: "retired fallback, kept for reference".to_string(),
            },
        );
        assert!(!policy.is_enabled_for(ModelType::PrintTime));
    }

    #[test]
    fn unknown_model_type_key_is_rejected() {
        let mut policy = FallbackPolicyConfig::default();
        policy.rules.insert(
            "not_a_type".to_string(),
            FallbackRule {
                enabled: true,
                estimate: 1.0,
                explanation: "x".to_string(),
            },
        );
        assert!(policy.validate().is_err());
    }

    #[test]
    fn non_finite_estimate_is_rejected() {
        let mut policy = FallbackPolicyConfig::default();
        policy.rules.insert(
            "print_time".to_string(),
            FallbackRule {
                enabled: true,
                estimate: f64::NAN,
                explanation: "x".to_string(),
            },
        );
        assert!(policy.validate().is_err());
    }
}
