//! Group registry implementation
//!
//! Maps group names to their state. Lookups share a read lock; creating a
//! group takes the write lock and re-checks, so two first touches of the same
//! name end up with one group.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::config::CacheLimit;
use super::group::Group;

/// Registry of all groups
///
/// Each group sits behind its own mutex, so activity on one group never
/// contends with another.
pub struct GroupRegistry {
    /// Map of group name to group
    groups: RwLock<HashMap<String, Arc<Mutex<Group>>>>,

    /// Cache limit shared by every group's replay buffer
    limit: CacheLimit,
}

impl GroupRegistry {
    /// Create an empty registry
    pub fn new(limit: CacheLimit) -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            limit,
        }
    }

    /// The shared cache limit
    pub fn cache_limit(&self) -> &CacheLimit {
        &self.limit
    }

    /// Get a group, creating it on first use
    pub async fn get_or_create(&self, name: &str) -> Arc<Mutex<Group>> {
        if let Some(group) = self.groups.read().await.get(name) {
            return Arc::clone(group);
        }

        let mut groups = self.groups.write().await;
        let limit = &self.limit;
        let group = groups.entry(name.to_string()).or_insert_with(|| {
            tracing::info!(group = %name, "Group created");
            Arc::new(Mutex::new(Group::new(name, limit.clone())))
        });

        Arc::clone(group)
    }

    /// Get an existing group
    pub async fn get(&self, name: &str) -> Option<Arc<Mutex<Group>>> {
        self.groups.read().await.get(name).cloned()
    }

    /// Snapshot of all groups
    pub async fn all(&self) -> Vec<Arc<Mutex<Group>>> {
        self.groups.read().await.values().cloned().collect()
    }

    /// Names of all groups, sorted
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get total number of groups
    pub async fn group_count(&self) -> usize {
        self.groups.read().await.len()
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new(CacheLimit::default())
    }
}
