//! Delivery client configuration

use crate::registry::DEFAULT_GROUP;

/// Delivery client configuration options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the hub (required; empty is logged as a configuration error)
    pub hub_url: String,

    /// Group every entry is published to
    pub group_name: String,

    /// Entries waiting for delivery before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hub_url: String::new(),
            group_name: DEFAULT_GROUP.to_string(),
            queue_capacity: 1024,
        }
    }
}

impl ClientConfig {
    /// Create a config for the given hub address
    pub fn new(hub_url: impl Into<String>) -> Self {
        Self {
            hub_url: hub_url.into(),
            ..Default::default()
        }
    }

    /// Set the target group
    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.group_name = name.into();
        self
    }

    /// Set the queue capacity (at least 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Whether a hub address is configured
    pub fn has_hub_url(&self) -> bool {
        !self.hub_url.trim().is_empty()
    }
}
