//! Hub configuration

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Group used when a producer or subscriber names none
pub const DEFAULT_GROUP: &str = "DefaultGroup";

/// Shared, runtime-adjustable maximum number of cached entries per group
///
/// Cloning shares the underlying value. Every replay buffer reads it on each
/// append and query, so a change applies to subsequent calls only and
/// existing buffer contents are not resized.
#[derive(Debug, Clone, Default)]
pub struct CacheLimit(Arc<AtomicUsize>);

impl CacheLimit {
    /// Create a limit; 0 disables caching
    pub fn new(max_entries: usize) -> Self {
        Self(Arc::new(AtomicUsize::new(max_entries)))
    }

    /// Current maximum
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Change the maximum for all buffers sharing this limit
    pub fn set(&self, max_entries: usize) {
        self.0.store(max_entries, Ordering::Relaxed);
    }

    /// Whether caching (and therefore replay) is on
    pub fn is_enabled(&self) -> bool {
        self.get() > 0
    }
}

/// Configuration for the broadcast hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum cached entries per group (0 = caching and replay disabled)
    pub maximum_cached_entries: usize,

    /// Queue size for channel-backed subscribers
    pub subscriber_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            maximum_cached_entries: 0,
            subscriber_queue_capacity: 1024,
        }
    }
}

impl HubConfig {
    /// Set the maximum cached entries per group
    pub fn maximum_cached_entries(mut self, max: usize) -> Self {
        self.maximum_cached_entries = max;
        self
    }

    /// Set the subscriber queue capacity (at least 1)
    pub fn subscriber_queue_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_queue_capacity = capacity.max(1);
        self
    }
}
