//! # Identifier Generation
//!
//! Ledger functions never call `Uuid::new_v4()` themselves. They take an
//! [`IdGenerator`] so that tests can predict every id a sale, payment or
//! credit note receives.
//!
//! ```rust
//! use ledger_core::ids::{IdGenerator, SequentialIdGenerator};
//!
//! let ids = SequentialIdGenerator::new("pay");
//! assert_eq!(ids.next_id(), "pay-1");
//! assert_eq!(ids.next_id(), "pay-2");
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of fresh entity ids.
pub trait IdGenerator: Send + Sync {
    /// Returns an id that has not been returned before.
    fn next_id(&self) -> String;
}

/// Random UUID v4 ids. The production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `{prefix}-{n}` ids starting at 1.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        SequentialIdGenerator {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// How many ids have been handed out.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}
