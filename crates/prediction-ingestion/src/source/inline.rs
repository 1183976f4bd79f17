// prediction-ingestion/src/source/inline.rs
// ============================================================================
// Module: Inline Event Source
// Description: Inline payload source for envelopes embedding content
//              directly into the URI rather than referencing it externally.
// Purpose: Decode base64-encoded inline payloads.
// Dependencies: base64
// ============================================================================

//! ## Overview
//! [`InlineSource`] resolves `inline:` URIs that embed payload bytes
//! directly. Supported prefixes: `inline+json:`, `inline+bytes:`, and
//! `inline:`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::source::EventSource;
use crate::source::SourceError;
use crate::source::SourcePayload;

// ============================================================================
// SECTION: Inline Source
// ============================================================================

/// Inline payload source using base64-encoded payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSource;

impl InlineSource {
    /// Creates a new inline source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decodes a base64-encoded payload.
    fn decode_base64(&self, encoded: &str) -> Result<Vec<u8>, SourceError> {
        STANDARD.decode(encoded.as_bytes()).map_err(|err| SourceError::Decode(err.to_string()))
    }
}

impl EventSource for InlineSource {
    fn fetch(&self, uri: &str) -> Result<SourcePayload, SourceError> {
        if let Some(encoded) = uri.strip_prefix("inline+json:") {
            let bytes = self.decode_base64(encoded)?;
            return Ok(SourcePayload {
                bytes,
                content_type: Some("application/json".to_string()),
            });
        }
        if let Some(encoded) = uri.strip_prefix("inline+bytes:") {
            let bytes = self.decode_base64(encoded)?;
            return Ok(SourcePayload {
                bytes,
                content_type: Some("application/octet-stream".to_string()),
            });
        }
        if let Some(encoded) = uri.strip_prefix("inline:") {
            let bytes = self.decode_base64(encoded)?;
            return Ok(SourcePayload {
                bytes,
                content_type: None,
            });
        }
        Err(SourceError::UnsupportedScheme("inline".to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted to unwrap.")]
    use super::*;

    #[test]
    fn decodes_a_plain_inline_payload() {
        let encoded = STANDARD.encode(b"hello");
        let source = InlineSource::new();
        let resolved = source.fetch(&format!("inline:{encoded}")).unwrap();
        assert_eq!(resolved.bytes, b"hello");
        assert_eq!(resolved.content_type, None);
    }

    #[test]
    fn decodes_an_inline_json_payload_with_a_content_type_hint() {
        let encoded = STANDARD.encode(b"{\"a\":1}");
        let source = InlineSource::new();
        let resolved = source.fetch(&format!("inline+json:{encoded}")).unwrap();
        assert_eq!(resolved.content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn rejects_an_unrecognized_scheme() {
        let source = InlineSource::new();
        let err = source.fetch("file:///tmp/x").unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedScheme(_)));
    }
}
