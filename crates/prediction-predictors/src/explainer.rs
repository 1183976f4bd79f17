// prediction-predictors/src/explainer.rs
// ============================================================================
// Module: Percentile Band Explainer
// Description: Default Explainer implementation (spec §4.7).
// Purpose: Turn a predictor's raw feature-score vector into the top 3-5
//          feature contributions plus a template-generated human-readable
//          phrase, grounded entirely in stored population statistics.
// Dependencies: prediction-core
// ============================================================================

//! ## Overview
//! [`PercentileBandExplainer`] never fabricates a statistic: every
//! percentile phrase it emits ("top 10%", "above average", "below average")
//! is derived from the [`prediction_core::core::FeaturePopulationStats`]
//! stored with the serving model. A feature with no stored population entry
//! is still ranked by weight but contributes no trend and no percentile
//! phrase.

// ============================================================================
// SECTION: Imports
// ============================================================================

use prediction_core::core::FeatureContribution;
use prediction_core::core::FeaturePopulationStats;
use prediction_core::core::Trend;
use prediction_core::interfaces::Explainer;
use prediction_core::interfaces::Explanation;
use prediction_core::interfaces::ExplainerError;
use serde_json::Value;

/// Minimum features kept, even when fewer than this many have nonzero
/// weight (spec §4.7 "top 3-5").
const MIN_FACTORS: usize = 3;
/// Maximum features kept.
const MAX_FACTORS: usize = 5;

/// Default [`Explainer`]: ranks feature scores by absolute magnitude,
/// normalizes the top-k to `[0, 1]` weights summing to at most `1.0`, and
/// classifies each feature's current value against its stored trailing
/// population window.
#[derive(Debug, Default, Clone, Copy)]
pub struct PercentileBandExplainer;

impl PercentileBandExplainer {
    /// Classifies `value` against `stats` using ±1σ bands (spec §4.7).
    #[must_use]
    fn trend(stats: &FeaturePopulationStats, value: f64) -> Trend {
        if stats.stddev <= 0.0 {
            return Trend::Stable;
        }
        let z = (value - stats.mean) / stats.stddev;
        if z >= 1.0 {
            Trend::Worsening
        } else if z <= -1.0 {
            Trend::Improving
        } else {
            Trend::Stable
        }
    }

    /// Renders a percentile phrase for `value` against `stats`, never
    /// inventing a number that is not directly one of the stored quantiles.
    #[must_use]
    fn percentile_phrase(stats: &FeaturePopulationStats, value: f64) -> &'static str {
        if value >= stats.p90 {
            "in the top 10%"
        } else if value <= stats.p10 {
            "in the bottom 10%"
        } else if value >= stats.p50 {
            "above average"
        } else {
            "below average"
        }
    }

    fn current_value(current_values: &Value, name: &str) -> Option<f64> {
        current_values.get(name).and_then(Value::as_f64)
    }
}

impl Explainer for PercentileBandExplainer {
    fn explain(
        &self,
        feature_scores: &[(String, f64)],
        population: &[FeaturePopulationStats],
        current_values: &Value,
    ) -> Result<Explanation, ExplainerError> {
        if feature_scores.is_empty() {
            return Err(ExplainerError::Explanation("no feature scores to explain".to_string()));
        }

        let mut ranked: Vec<(&String, f64)> =
            feature_scores.iter().map(|(name, weight)| (name, weight.abs())).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let total: f64 = ranked.iter().map(|(_, w)| *w).sum();
        if total <= 0.0 {
            return Err(ExplainerError::Explanation("all feature scores are zero".to_string()));
        }

        let keep = ranked.len().clamp(MIN_FACTORS.min(ranked.len()), MAX_FACTORS);
        let top = &ranked[..keep];

        let mut top_factors = Vec::with_capacity(top.len());
        let mut phrases = Vec::with_capacity(top.len());
        for (name, raw_weight) in top {
            let normalized = raw_weight / total;
            let stats = population.iter().find(|s| &s.name == *name);
            let value = Self::current_value(current_values, name);

            let trend = match (stats, value) {
                (Some(stats), Some(value)) => Some(Self::trend(stats, value)),
                _ => None,
            };

            if let (Some(stats), Some(value)) = (stats, value) {
                phrases.push(format!("{name} is {}", Self::percentile_phrase(stats, value)));
            }

            top_factors.push(FeatureContribution {
                name: (*name).clone(),
                weight: normalized,
                trend,
            });
        }

        let human_readable = if phrases.is_empty() {
            format!(
                "Primary factor: {}",
                top_factors.first().map_or("unknown", |f| f.name.as_str())
            )
        } else {
            phrases.join("; ")
        };

        Ok(Explanation { top_factors, human_readable })
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
    use serde_json::json;

    fn stats(name: &str, p10: f64, p50: f64, p90: f64, mean: f64, stddev: f64) -> FeaturePopulationStats {
        FeaturePopulationStats {
            name: name.to_string(),
            p10,
            p50,
            p90,
            mean,
            stddev,
        }
    }

    #[test]
    fn weights_are_normalized_and_descending() {
        let explainer = PercentileBandExplainer;
        let scores = vec![
            ("volume".to_string(), 8.0),
            ("infill".to_string(), 2.0),
            ("layer_height".to_string(), 4.0),
        ];
        let explanation = explainer.explain(&scores, &[], &json!({})).unwrap();
        assert_eq!(explanation.top_factors[0].name, "volume");
        assert!(explanation.top_factors.windows(2).all(|w| w[0].weight >= w[1].weight));
        let total: f64 = explanation.top_factors.iter().map(|f| f.weight).sum();
        assert!(total <= 1.0 + f64::EPSILON);
    }

    #[test]
    fn trend_uses_one_sigma_bands() {
        let explainer = PercentileBandExplainer;
        let population = vec![stats("infill", 10.0, 20.0, 30.0, 20.0, 5.0)];
        let scores = vec![("infill".to_string(), 1.0), ("volume".to_string(), 1.0), ("speed".to_string(), 1.0)];

        let worsening = explainer.explain(&scores, &population, &json!({"infill": 30.0})).unwrap();
        let factor = worsening.top_factors.iter().find(|f| f.name == "infill").unwrap();
        assert_eq!(factor.trend, Some(Trend::Worsening));

        let improving = explainer.explain(&scores, &population, &json!({"infill": 5.0})).unwrap();
        let factor = improving.top_factors.iter().find(|f| f.name == "infill").unwrap();
        assert_eq!(factor.trend, Some(Trend::Improving));
    }

    #[test]
    fn all_zero_scores_is_an_error() {
        let explainer = PercentileBandExplainer;
        let scores = vec![("a".to_string(), 0.0), ("b".to_string(), 0.0)];
        assert!(explainer.explain(&scores, &[], &json!({})).is_err());
    }

    #[test]
    fn caps_at_five_factors() {
        let explainer = PercentileBandExplainer;
        let scores: Vec<(String, f64)> = (0..8).map(|i| (format!("f{i}"), f64::from(i + 1))).collect();
        let explanation = explainer.explain(&scores, &[], &json!({})).unwrap();
        assert_eq!(explanation.top_factors.len(), 5);
    }
}
