//! Per-producer sequence ids

use std::sync::atomic::{AtomicU64, Ordering};

/// Issues strictly increasing ids, starting at 1
///
/// One allocator belongs to one delivery client. Ids are not global and not
/// per group.
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    current: AtomicU64,
}

impl SequenceAllocator {
    /// Create an allocator whose first id is 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id
    pub fn next(&self) -> u64 {
        self.current.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The most recently issued id (0 if none yet)
    pub fn last(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }
}
