// prediction-core/src/core/cache_key.rs
// ============================================================================
// Module: Prediction Cache Key
// Description: Content-addressed cache key construction for predictions.
// Purpose: Guarantee Invariant C1 (version embedded) and property P3/P5.
// Dependencies: crate::core::{hashing, model}
// ============================================================================

//! ## Overview
//! Per Open Question resolution in `SPEC_FULL.md` §9, every cache key
//! **always** embeds the serving model's version, in the form
//! `"{type}:{fingerprint}:{version}"`. This makes promotion automatically
//! partition the key space (Invariant C1): a cache lookup for a new Active
//! version can never observe a stale entry written under the old version.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::Fingerprint;
use crate::core::model::ModelType;
use crate::core::model::ModelVersion;

// ============================================================================
// SECTION: Cache Key
// ============================================================================

/// A fully-qualified prediction cache key: `"{type}:{fingerprint}:{version}"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    key: String,
    model_type: ModelType,
    version: ModelVersion,
}

impl CacheKey {
    /// Builds a cache key for a request fingerprint served by a specific
    /// model version.
    #[must_use]
    pub fn new(model_type: ModelType, fingerprint: &Fingerprint, version: ModelVersion) -> Self {
        Self {
            key: format!("{model_type}:{fingerprint}:{version}"),
            model_type,
            version,
        }
    }

    /// Returns the key's wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Returns the model type embedded in this key.
    #[must_use]
    pub const fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Returns the model version embedded in this key.
    #[must_use]
    pub const fn version(&self) -> ModelVersion {
        self.version
    }

    /// Returns the invalidation prefix `"{type}:*:{version}"` matching every
    /// key sharing this key's type and version, regardless of fingerprint
    /// (spec §4.4, used defensively after promotion).
    #[must_use]
    pub fn version_prefix(model_type: ModelType, version: ModelVersion) -> CachePrefix {
        CachePrefix {
            model_type,
            version: Some(version),
        }
    }

    /// Returns whether `self` is matched by `prefix`.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &CachePrefix) -> bool {
        if self.model_type != prefix.model_type {
            return false;
        }
        match prefix.version {
            Some(version) => self.version == version,
            None => true,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// An invalidation prefix: all keys for a model type, optionally scoped to
/// one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePrefix {
    model_type: ModelType,
    version: Option<ModelVersion>,
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
    use crate::core::hashing::fingerprint_bytes;

    #[test]
    fn key_embeds_type_fingerprint_and_version() {
        let fp = fingerprint_bytes(b"input");
        let key = CacheKey::new(ModelType::PrintTime, &fp, ModelVersion::new(1, 2, 3));
        assert_eq!(key.as_str(), format!("print_time:{fp}:1.2.3"));
    }

    #[test]
    fn prefix_matches_only_same_type_and_version() {
        let fp = fingerprint_bytes(b"input");
        let v1 = ModelVersion::new(1, 0, 0);
        let v2 = ModelVersion::new(1, 1, 0);
        let key_v1 = CacheKey::new(ModelType::PrintTime, &fp, v1);
        let key_v2 = CacheKey::new(ModelType::PrintTime, &fp, v2);

        let prefix_v1 = CacheKey::version_prefix(ModelType::PrintTime, v1);
        assert!(key_v1.matches_prefix(&prefix_v1));
        assert!(!key_v2.matches_prefix(&prefix_v1));

        let other_type = CacheKey::new(ModelType::DemandForecast, &fp, v1);
        assert!(!other_type.matches_prefix(&prefix_v1));
    }
}
