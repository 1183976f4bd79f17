// prediction-core/src/core/time.rs
// ============================================================================
// Module: Timestamp
// Description: UTC timestamp newtype used across audit, training, and cache records.
// Purpose: Provide a serializable, orderable timestamp independent of wall-clock
//          access so runtime code stays testable and deterministic.
// Dependencies: time
// ============================================================================

//! ## Overview
//! All persisted timestamps are UTC (spec §6). Callers supply the current
//! time explicitly rather than the core reaching for the system clock, so
//! tests can construct deterministic sequences.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// A UTC point in time, serialized as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Wraps an existing [`OffsetDateTime`].
    #[must_use]
    pub const fn from_offset_date_time(value: OffsetDateTime) -> Self {
        Self(value)
    }

    /// Returns the underlying [`OffsetDateTime`].
    #[must_use]
    pub const fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns whole seconds elapsed since `self` until `other`; negative if
    /// `other` precedes `self`.
    #[must_use]
    pub fn seconds_until(&self, other: Timestamp) -> i64 {
        (other.0 - self.0).whole_seconds()
    }

    /// Returns whole hours elapsed since `self` until `other`.
    #[must_use]
    pub fn hours_until(&self, other: Timestamp) -> i64 {
        (other.0 - self.0).whole_hours()
    }

    /// Returns a new timestamp offset by the given number of seconds.
    #[must_use]
    pub fn plus_seconds(&self, seconds: i64) -> Self {
        Self(self.0 + time::Duration::seconds(seconds))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(&Rfc3339).map_err(|_| std::fmt::Error)?)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = time::error::Parse;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(Self(OffsetDateTime::parse(&value, &Rfc3339)?))
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.0.format(&Rfc3339).unwrap_or_default()
    }
}
