// prediction-training/src/ids.rs
// ============================================================================
// Module: Training Identifier Generator
// Description: Boot-scoped unique id generation for datasets and jobs.
// Purpose: Issue dataset/training-job identifiers without a central
//          sequence, the way correlation ids are issued elsewhere in the
//          broader stack this crate draws its conventions from.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! [`IdGenerator`] combines a process-boot random seed with a monotonic
//! counter, so identifiers are unique within a process lifetime without a
//! shared sequence or clock dependency.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;

/// Issues unique, prefixed identifiers for training entities.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: &'static str,
    boot_id: u64,
    counter: AtomicU64,
}

impl IdGenerator {
    /// Creates a generator that prefixes every issued id with `prefix`.
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        Self { prefix, boot_id: u64::from_be_bytes(bytes), counter: AtomicU64::new(1) }
    }

    /// Issues a new identifier.
    #[must_use]
    pub fn issue(&self) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:016x}-{:016x}", self.prefix, self.boot_id, seq)
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

    #[test]
    fn issued_ids_are_unique_and_prefixed() {
        let gen = IdGenerator::new("ds");
        let a = gen.issue();
        let b = gen.issue();
        assert_ne!(a, b);
        assert!(a.starts_with("ds-"));
        assert!(b.starts_with("ds-"));
    }
}
