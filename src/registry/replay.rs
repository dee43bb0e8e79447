//! Replay buffer for late joiners and reconnecting subscribers
//!
//! A group keeps its most recent entries so a subscriber can ask for
//! "everything after id N". Eviction is strict FIFO: the oldest entry goes
//! first, regardless of how often it was replayed.
//!
//! Replay is best effort. A subscriber that reconnects after more than
//! `capacity` entries were published simply gets what is left; no gap is
//! reported.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::entry::LogEntry;

use super::config::CacheLimit;

/// Bounded FIFO of recent entries
///
/// Not synchronized by itself; the owning group's lock covers append and
/// query together.
#[derive(Debug)]
pub struct ReplayBuffer {
    /// Shared maximum size, read on every call
    limit: CacheLimit,
    /// Retained entries, oldest first
    entries: VecDeque<Arc<LogEntry>>,
}

impl ReplayBuffer {
    /// Create a buffer that follows a shared limit
    pub fn new(limit: CacheLimit) -> Self {
        Self {
            limit,
            entries: VecDeque::new(),
        }
    }

    /// Create a buffer with its own fixed capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(CacheLimit::new(capacity))
    }

    /// Current capacity (0 = disabled)
    pub fn capacity(&self) -> usize {
        self.limit.get()
    }

    /// Add an entry at the tail
    ///
    /// Evicts the head once if the buffer grew past capacity. Returns false
    /// (and keeps nothing) when caching is disabled.
    pub fn append(&mut self, entry: Arc<LogEntry>) -> bool {
        let capacity = self.limit.get();
        if capacity == 0 {
            return false;
        }

        self.entries.push_back(entry);
        if self.entries.len() > capacity {
            self.entries.pop_front();
        }

        true
    }

    /// All retained entries with `id > since_id`, oldest first
    pub fn query(&self, since_id: u64) -> Vec<Arc<LogEntry>> {
        if !self.limit.is_enabled() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|entry| entry.id > since_id)
            .cloned()
            .collect()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id of the newest retained entry
    pub fn newest_id(&self) -> Option<u64> {
        self.entries.back().map(|entry| entry.id)
    }

    /// Id of the oldest retained entry
    pub fn oldest_id(&self) -> Option<u64> {
        self.entries.front().map(|entry| entry.id)
    }
}
