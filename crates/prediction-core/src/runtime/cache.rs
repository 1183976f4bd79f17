// prediction-core/src/runtime/cache.rs
// ============================================================================
// Module: In-Memory Prediction Cache
// Description: Reference PredictionCache implementation for tests and demos.
// Purpose: Provide a deterministic cache without an external cache dependency.
// Dependencies: crate::core, crate::interfaces::PredictionCache
// ============================================================================

//! ## Overview
//! Expiry is checked lazily on read rather than by a background sweep; a
//! production deployment would back this trait with an external cache that
//! handles TTL natively. This implementation exists for tests, demos, and
//! single-process deployments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::CacheKey;
use crate::core::CachePrefix;
use crate::core::Timestamp;
use crate::interfaces::CacheError;
use crate::interfaces::CacheValue;
use crate::interfaces::PredictionCache;

struct Entry {
    value: CacheValue,
    expires_at: Timestamp,
}

/// In-memory [`PredictionCache`] (spec §4.4, Invariant C1/C2).
#[derive(Default, Clone)]
pub struct InMemoryPredictionCache {
    entries: Arc<Mutex<BTreeMap<CacheKey, Entry>>>,
}

impl InMemoryPredictionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<CacheKey, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Backend("prediction cache mutex poisoned".to_string()))
    }
}

impl PredictionCache for InMemoryPredictionCache {
    fn get(&self, key: &CacheKey, now: Timestamp) -> Result<Option<CacheValue>, CacheError> {
        let mut guard = self.lock()?;
        let Some(entry) = guard.get(key) else {
            return Ok(None);
        };
        if now.as_offset_date_time() > entry.expires_at.as_offset_date_time() {
            guard.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    fn put(&self, key: CacheKey, value: CacheValue, ttl_seconds: i64, now: Timestamp) -> Result<(), CacheError> {
        let mut guard = self.lock()?;
        guard.insert(
            key,
            Entry {
                value,
                expires_at: now.plus_seconds(ttl_seconds),
            },
        );
        Ok(())
    }

    fn invalidate_prefix(&self, prefix: &CachePrefix) -> Result<u64, CacheError> {
        let mut guard = self.lock()?;
        let stale: Vec<CacheKey> = guard
            .keys()
            .filter(|key| key.matches_prefix(prefix))
            .cloned()
            .collect();
        let count = stale.len() as u64;
        for key in stale {
            guard.remove(&key);
        }
        Ok(count)
    }
}

impl InMemoryPredictionCache {
    /// Returns whether the entry at `key` has expired as of `now`, or
    /// `None` if no entry exists. Exposed for tests; [`PredictionCache::get`]
    /// performs this same check on every lookup and evicts the entry rather
    /// than returning a stale value.
    #[must_use]
    pub fn is_expired(&self, key: &CacheKey, now: Timestamp) -> Option<bool> {
        let guard = self.entries.lock().ok()?;
        guard.get(key).map(|entry| now.as_offset_date_time() > entry.expires_at.as_offset_date_time())
    }
}
