// prediction-ingestion/src/dedup.rs
// ============================================================================
// Module: Event Deduplication Window
// Description: Bounded, per-entity LRU set of recently seen event ids
//              (spec §4.6 step 1).
// Purpose: Make duplicate delivery of the same event id a no-op without
//          retaining an unbounded history, per the teacher's "bounded
//          in-memory batches" concurrency note (spec §5) generalized to
//          this crate's dedup window.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`DedupRegistry`] bounds memory two ways: each entity key keeps only its
//! most recent `max_events_per_entity` ids, and the registry itself tracks
//! only its `max_entities` most recently touched entity keys, evicting the
//! least recently touched one when a new key arrives at capacity. This is
//! `SPEC_FULL.md`'s resolution of spec.md's silence on the dedup window's
//! memory bound.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;

/// Default number of distinct entity keys tracked at once.
pub const DEFAULT_MAX_ENTITIES: usize = 4096;

/// Default number of recent event ids retained per entity key.
pub const DEFAULT_MAX_EVENTS_PER_ENTITY: usize = 256;

// ============================================================================
// SECTION: Per-Entity Window
// ============================================================================

/// Recently seen event ids for a single entity key, oldest first.
#[derive(Debug, Default)]
struct EntityWindow {
    ids: HashSet<String>,
    order: VecDeque<String>,
}

impl EntityWindow {
    /// Records `event_id`, evicting the oldest id once over `capacity`.
    /// Returns `true` when `event_id` had not been seen before.
    fn observe(&mut self, event_id: &str, capacity: usize) -> bool {
        if self.ids.contains(event_id) {
            return false;
        }
        self.ids.insert(event_id.to_string());
        self.order.push_back(event_id.to_string());
        if self.order.len() > capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.ids.remove(&oldest);
        }
        true
    }
}

// ============================================================================
// SECTION: Dedup Registry
// ============================================================================

/// Bounded, per-entity-key deduplication window.
#[derive(Debug)]
pub struct DedupRegistry {
    max_entities: usize,
    max_events_per_entity: usize,
    entity_order: VecDeque<String>,
    windows: HashMap<String, EntityWindow>,
}

impl DedupRegistry {
    /// Creates a registry bounded to `max_entities` distinct keys, each
    /// retaining up to `max_events_per_entity` recent event ids.
    #[must_use]
    pub fn new(max_entities: usize, max_events_per_entity: usize) -> Self {
        Self {
            max_entities,
            max_events_per_entity,
            entity_order: VecDeque::new(),
            windows: HashMap::new(),
        }
    }

    /// Records `(entity_key, event_id)`. Returns `true` when this is the
    /// first time the pair has been observed (i.e. it should be processed);
    /// `false` means the delivery is a duplicate and must be a no-op.
    pub fn observe(&mut self, entity_key: &str, event_id: &str) -> bool {
        if !self.windows.contains_key(entity_key) {
            self.evict_oldest_entity_if_full();
            self.windows.insert(entity_key.to_string(), EntityWindow::default());
            self.entity_order.push_back(entity_key.to_string());
        }
        match self.windows.get_mut(entity_key) {
            Some(window) => window.observe(event_id, self.max_events_per_entity),
            None => true,
        }
    }

    /// Evicts the least recently touched entity key when at capacity.
    fn evict_oldest_entity_if_full(&mut self) {
        if self.windows.len() < self.max_entities {
            return;
        }
        if let Some(oldest_key) = self.entity_order.pop_front() {
            self.windows.remove(&oldest_key);
        }
    }
}

impl Default for DedupRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTITIES, DEFAULT_MAX_EVENTS_PER_ENTITY)
    }
}
