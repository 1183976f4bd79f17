// prediction-ingestion/src/source/mod.rs
// ============================================================================
// Module: Event Source Trait and Shared Limits
// Description: Resolves a URI referenced by an inbound event envelope into
//              raw payload bytes (spec §4.6 step 3's transform input).
// Purpose: Let large event payloads live outside the envelope (object
//          storage, an internal file share, an upstream HTTP callback) while
//          keeping the same fetch contract across file/http/inline schemes.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`EventSource`] fetches payload bytes for a URI. Implementations must fail
//! closed on invalid URIs or fetch errors rather than returning partial or
//! best-effort content.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Source Payload
// ============================================================================

/// Payload bytes resolved from an external source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePayload {
    /// Raw payload bytes.
    pub bytes: Vec<u8>,
    /// Optional content type hint.
    pub content_type: Option<String>,
}

// ============================================================================
// SECTION: Size Limits
// ============================================================================

/// Maximum number of bytes a single event payload may resolve to, sized the
/// same as the orchestrator's `MAX_INPUT_BYTES` (64 MiB): ingestion and
/// inference sit on the same trust boundary for externally supplied bytes.
pub const MAX_SOURCE_BYTES: usize = 64 * 1024 * 1024;

/// Returns [`MAX_SOURCE_BYTES`] widened to `u64` for comparison against
/// lengths reported by I/O APIs that use `u64` (content-length headers,
/// file metadata).
///
/// # Errors
///
/// Returns [`SourceError::LimitOverflow`] if the limit cannot be represented
/// as `u64` (unreachable on supported platforms, but checked rather than
/// cast unconditionally per the crate's no-truncating-cast lint).
pub fn max_source_bytes_u64() -> Result<u64, SourceError> {
    u64::try_from(MAX_SOURCE_BYTES).map_err(|_| SourceError::LimitOverflow {
        limit: MAX_SOURCE_BYTES,
    })
}

/// Rejects a resolved byte count that exceeds [`MAX_SOURCE_BYTES`].
///
/// # Errors
///
/// Returns [`SourceError::TooLarge`] when `actual_bytes` exceeds the limit.
pub fn enforce_max_bytes(actual_bytes: usize) -> Result<(), SourceError> {
    if actual_bytes > MAX_SOURCE_BYTES {
        return Err(SourceError::TooLarge {
            max_bytes: MAX_SOURCE_BYTES,
            actual_bytes,
        });
    }
    Ok(())
}

// ============================================================================
// SECTION: Source Errors
// ============================================================================

/// Errors emitted by event sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Unsupported or missing URI scheme.
    #[error("unsupported uri scheme: {0}")]
    UnsupportedScheme(String),
    /// URI failed to parse or resolve.
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    /// Resource was not found.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// Source reported an I/O failure.
    #[error("io failure: {0}")]
    Io(String),
    /// HTTP source failed.
    #[error("http failure: {0}")]
    Http(String),
    /// Inline source failed to decode payload.
    #[error("inline decode failure: {0}")]
    Decode(String),
    /// Host policy rejected the request (denylisted, not allowlisted, or
    /// resolves to a private/link-local address).
    #[error("source policy violation: {0}")]
    Policy(String),
    /// Resolved (or declared) payload size exceeds [`MAX_SOURCE_BYTES`].
    #[error("source payload of {actual_bytes} bytes exceeds the {max_bytes} byte limit")]
    TooLarge {
        /// The configured maximum.
        max_bytes: usize,
        /// The size that was rejected.
        actual_bytes: usize,
    },
    /// The read-limit computation overflowed (a fixed-limit invariant
    /// violation rather than a runtime condition).
    #[error("source byte limit of {limit} could not be represented for this read")]
    LimitOverflow {
        /// The configured maximum that could not be widened.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Source Trait
// ============================================================================

/// Resolves a payload URI into bytes.
pub trait EventSource: Send + Sync {
    /// Fetches payload bytes for the provided URI.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the content cannot be resolved.
    fn fetch(&self, uri: &str) -> Result<SourcePayload, SourceError>;
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod file;
pub mod http;
pub mod inline;

pub use file::FileSource;
pub use http::HttpSource;
pub use http::HttpSourcePolicy;
pub use inline::InlineSource;
