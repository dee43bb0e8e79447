//! Broadcast hub implementation
//!
//! Accepts subscribe, unsubscribe, disconnect and publish, and fans each
//! published entry out to the group's current subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::entry::LogEntry;
use crate::registry::{CacheLimit, GroupRegistry, GroupStats, HubConfig, DEFAULT_GROUP};

use super::catalog::{KnownLoggers, LoggerCatalog};
use super::session::HubSession;
use super::subscriber::{ChannelSubscriber, ConnectionId, HubMessage, LogSubscriber};

/// Central hub for all groups
///
/// Subscribe (join + backlog query + `Initialize`) and publish (cache +
/// fan-out) each run entirely under the group's lock. Since delivery to a
/// [`LogSubscriber`] only enqueues, every subscriber sees its backlog followed
/// by live entries in publish order, with nothing missing or repeated.
pub struct BroadcastHub {
    /// Groups by name
    registry: GroupRegistry,

    /// Logger names reported on subscribe
    catalog: Arc<dyn LoggerCatalog>,

    /// Configuration
    config: HubConfig,

    /// Next id for connections accepted through `connect`
    next_connection_id: AtomicU64,
}

impl BroadcastHub {
    /// Create a hub with default configuration (caching disabled)
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a hub with custom configuration
    pub fn with_config(config: HubConfig) -> Self {
        Self::with_catalog(config, Arc::new(KnownLoggers::new()))
    }

    /// Create a hub with a custom logger catalog
    pub fn with_catalog(config: HubConfig, catalog: Arc<dyn LoggerCatalog>) -> Self {
        let registry = GroupRegistry::new(CacheLimit::new(config.maximum_cached_entries));

        Self {
            registry,
            catalog,
            config,
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Get the hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Name of the default group
    ///
    /// Always [`DEFAULT_GROUP`], the same name a default-configured
    /// [`DeliveryClient`](crate::client::DeliveryClient) publishes to.
    pub fn default_group(&self) -> &str {
        DEFAULT_GROUP
    }

    /// Current maximum cached entries per group
    pub fn maximum_cached_entries(&self) -> usize {
        self.registry.cache_limit().get()
    }

    /// Change the maximum cached entries for every group
    ///
    /// Applies to later appends and queries; buffers are not resized now.
    /// Setting 0 disables caching and replay.
    pub fn set_maximum_cached_entries(&self, max: usize) {
        self.registry.cache_limit().set(max);
        tracing::info!(maximum_cached_entries = max, "Cache limit changed");
    }

    /// Allocate an id for a new transport connection
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Accept a connection backed by a [`ChannelSubscriber`]
    ///
    /// Returns the session to drive the RPC surface with and the receiver the
    /// transport drains to reach the remote subscriber.
    pub fn connect(self: &Arc<Self>) -> (HubSession, tokio::sync::mpsc::Receiver<HubMessage>) {
        let id = self.next_connection_id();
        let (subscriber, rx) = ChannelSubscriber::new(id, self.config.subscriber_queue_capacity);

        tracing::debug!(connection = %id, "Connection accepted");

        (HubSession::new(Arc::clone(self), Arc::new(subscriber)), rx)
    }

    /// Join `subscriber` to a group and send it the backlog after `since_id`
    pub async fn subscribe(
        &self,
        subscriber: Arc<dyn LogSubscriber>,
        group_name: &str,
        since_id: u64,
    ) {
        let group = self.registry.get_or_create(group_name).await;
        let loggers = self.logger_names();
        let connection = subscriber.connection_id();

        let mut group = group.lock().await;
        group.add_subscriber(Arc::clone(&subscriber));
        let backlog = group.catchup(since_id);
        let backlog_len = backlog.len();

        if let Err(e) = subscriber.initialize(loggers, backlog) {
            tracing::warn!(
                group = %group_name,
                connection = %connection,
                error = %e,
                "Failed to initialize subscriber"
            );
            return;
        }

        tracing::debug!(
            group = %group_name,
            connection = %connection,
            since_id = since_id,
            backlog = backlog_len,
            subscribers = group.subscriber_count(),
            "Subscriber added"
        );
    }

    /// Remove a connection from a group
    ///
    /// Returns false (and does nothing) if it was not joined.
    pub async fn unsubscribe(&self, connection: ConnectionId, group_name: &str) -> bool {
        let Some(group) = self.registry.get(group_name).await else {
            return false;
        };

        let mut group = group.lock().await;
        let removed = group.remove_subscriber(connection);

        if removed {
            tracing::debug!(
                group = %group_name,
                connection = %connection,
                subscribers = group.subscriber_count(),
                "Subscriber removed"
            );
        }

        removed
    }

    /// Remove a connection from every group it joined
    ///
    /// Returns the number of groups it was removed from.
    pub async fn disconnect(&self, connection: ConnectionId) -> usize {
        let mut removed = 0;

        for group in self.registry.all().await {
            if group.lock().await.remove_subscriber(connection) {
                removed += 1;
            }
        }

        tracing::debug!(connection = %connection, groups = removed, "Connection disconnected");

        removed
    }

    /// Publish an entry to a group
    ///
    /// Caches it for replay (if enabled), then delivers it to each subscriber
    /// independently. A failed delivery is logged and skipped; the subscriber
    /// stays joined until it unsubscribes or disconnects. Returns the number
    /// of successful deliveries.
    pub async fn publish(&self, entry: Arc<LogEntry>, group_name: &str) -> usize {
        self.catalog.observe(entry.logger_name());

        let group = self.registry.get_or_create(group_name).await;
        let mut group = group.lock().await;

        group.cache(Arc::clone(&entry));

        let mut delivered = 0;
        for subscriber in group.subscribers() {
            match subscriber.on_logged_event(Arc::clone(&entry)) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        group = %group_name,
                        connection = %subscriber.connection_id(),
                        id = entry.id,
                        error = %e,
                        "Failed to deliver entry"
                    );
                }
            }
        }

        tracing::trace!(
            group = %group_name,
            id = entry.id,
            delivered = delivered,
            "Entry published"
        );

        delivered
    }

    /// Publish an entry to the default group
    pub async fn publish_default(&self, entry: Arc<LogEntry>) -> usize {
        self.publish(entry, DEFAULT_GROUP).await
    }

    /// Sorted snapshot of known logger names
    pub fn logger_names(&self) -> Vec<String> {
        let mut names = self.catalog.logger_names();
        names.sort();
        names
    }

    /// Get group statistics
    pub async fn group_stats(&self, group_name: &str) -> Option<GroupStats> {
        let group = self.registry.get(group_name).await?;
        let stats = group.lock().await.stats();
        Some(stats)
    }

    /// Names of all groups, sorted
    pub async fn group_names(&self) -> Vec<String> {
        self.registry.names().await
    }

    /// Get total number of groups
    pub async fn group_count(&self) -> usize {
        self.registry.group_count().await
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
