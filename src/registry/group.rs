//! Group state
//!
//! A group is a named broadcast channel: a replay buffer plus the set of
//! subscribers currently joined. Groups are created on first use and live as
//! long as the hub.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::entry::LogEntry;
use crate::hub::{ConnectionId, LogSubscriber};

use super::config::CacheLimit;
use super::replay::ReplayBuffer;

/// Entry for a single group in the registry
pub struct Group {
    /// Group name (case-sensitive)
    name: String,

    /// Recent entries for late joiners
    replay: ReplayBuffer,

    /// Joined subscribers, keyed by connection
    subscribers: HashMap<ConnectionId, Arc<dyn LogSubscriber>>,

    /// When the group was created
    created_at: Instant,
}

impl Group {
    /// Create a new, empty group
    pub(super) fn new(name: impl Into<String>, limit: CacheLimit) -> Self {
        Self {
            name: name.into(),
            replay: ReplayBuffer::new(limit),
            subscribers: HashMap::new(),
            created_at: Instant::now(),
        }
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the group was created
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Join a subscriber; returns false if its connection was already joined
    ///
    /// A rejoining connection has its handle replaced.
    pub fn add_subscriber(&mut self, subscriber: Arc<dyn LogSubscriber>) -> bool {
        self.subscribers
            .insert(subscriber.connection_id(), subscriber)
            .is_none()
    }

    /// Remove a subscriber; returns false if it was not joined
    pub fn remove_subscriber(&mut self, connection: ConnectionId) -> bool {
        self.subscribers.remove(&connection).is_some()
    }

    /// Whether a connection is joined
    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.subscribers.contains_key(&connection)
    }

    /// Number of joined subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Joined subscribers, in no particular order
    pub fn subscribers(&self) -> impl Iterator<Item = &Arc<dyn LogSubscriber>> {
        self.subscribers.values()
    }

    /// Replay buffer
    pub fn replay(&self) -> &ReplayBuffer {
        &self.replay
    }

    /// Record a published entry for replay
    pub(crate) fn cache(&mut self, entry: Arc<LogEntry>) -> bool {
        self.replay.append(entry)
    }

    /// Entries a subscriber that last saw `since_id` has missed
    pub fn catchup(&self, since_id: u64) -> Vec<Arc<LogEntry>> {
        self.replay.query(since_id)
    }

    /// Snapshot statistics
    pub fn stats(&self) -> GroupStats {
        GroupStats {
            subscriber_count: self.subscribers.len(),
            cached_entries: self.replay.len(),
            oldest_cached_id: self.replay.oldest_id(),
            newest_cached_id: self.replay.newest_id(),
        }
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.len())
            .field("cached_entries", &self.replay.len())
            .finish()
    }
}

/// Statistics for a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStats {
    /// Number of joined subscribers
    pub subscriber_count: usize,
    /// Number of entries in the replay buffer
    pub cached_entries: usize,
    /// Oldest replayable id
    pub oldest_cached_id: Option<u64>,
    /// Newest replayable id
    pub newest_cached_id: Option<u64>,
}
