// prediction-core/src/core/hashing.rs
// ============================================================================
// Module: Canonical Hashing and Fingerprinting
// Description: RFC 8785 JSON canonicalization and content hashing utilities.
// Purpose: Provide deterministic fingerprints for prediction cache keys and
//          content-addressed dataset identity.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Prediction requests and training datasets are identified by a SHA-256
//! digest over RFC 8785 (JCS) canonical JSON, guaranteeing that semantically
//! equal inputs (same parameters, reordered, re-whitespaced) fingerprint
//! identically (property P9). Binary payloads (geometry bytes) are hashed
//! directly over the raw bytes alongside the canonicalized non-binary
//! parameters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Fingerprint
// ============================================================================

/// A lowercase hex-encoded SHA-256 fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Returns the fingerprint as a lowercase hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Fingerprints canonical JSON, producing a lowercase hex SHA-256 digest.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn fingerprint_canonical_json<T: Serialize + ?Sized>(
    value: &T,
) -> Result<Fingerprint, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(fingerprint_bytes(&bytes))
}

/// Fingerprints raw bytes directly (used for opaque binary inputs such as
/// geometry meshes, optionally concatenated with canonicalized parameters).
#[must_use]
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    Fingerprint(hex_encode(&digest))
}

/// Fingerprints a binary payload together with its canonicalized parameters,
/// per the geometry-input fingerprinting rule in the prediction orchestrator
/// contract: the bytes are hashed first, then the canonical parameter JSON.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn fingerprint_bytes_with_params<T: Serialize + ?Sized>(
    bytes: &[u8],
    params: &T,
) -> Result<Fingerprint, HashError> {
    let param_bytes = canonical_json_bytes(params)?;
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.update(&param_bytes);
    let digest = hasher.finalize();
    Ok(Fingerprint(hex_encode(&digest)))
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
