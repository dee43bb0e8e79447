//! Per-connection hub session
//!
//! A transport creates one session per accepted connection and routes the
//! remote calls to it. The session carries the connection identity, so the
//! calls themselves only name groups and offsets.

use std::sync::Arc;

use crate::entry::LogEntry;

use super::broadcast::BroadcastHub;
use super::subscriber::{ConnectionId, LogSubscriber};

/// Hub operations as seen by one connection
#[derive(Clone)]
pub struct HubSession {
    /// Hub serving this connection
    hub: Arc<BroadcastHub>,

    /// Callback handle for this connection
    subscriber: Arc<dyn LogSubscriber>,
}

impl HubSession {
    /// Create a session for a connection
    pub fn new(hub: Arc<BroadcastHub>, subscriber: Arc<dyn LogSubscriber>) -> Self {
        Self { hub, subscriber }
    }

    /// Connection identity
    pub fn connection_id(&self) -> ConnectionId {
        self.subscriber.connection_id()
    }

    /// Hub serving this connection
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Join the default group and receive its whole backlog
    pub async fn subscribe_to_default_group(&self) {
        let group = self.hub.default_group().to_string();
        self.subscribe_to_group(&group).await;
    }

    /// Join a group and receive its whole backlog
    pub async fn subscribe_to_group(&self, group_name: &str) {
        self.subscribe_to_group_with_offset(group_name, 0).await;
    }

    /// Join a group and receive the backlog after `since_id`
    pub async fn subscribe_to_group_with_offset(&self, group_name: &str, since_id: u64) {
        self.hub.subscribe(Arc::clone(&self.subscriber), group_name, since_id).await;
    }

    /// Leave the default group
    pub async fn unsubscribe_from_default_group(&self) {
        let group = self.hub.default_group().to_string();
        self.unsubscribe_from_group(&group).await;
    }

    /// Leave a group (no-op if not joined)
    pub async fn unsubscribe_from_group(&self, group_name: &str) {
        self.hub.unsubscribe(self.connection_id(), group_name).await;
    }

    /// Producer call: publish to the default group
    pub async fn on_message_logged(&self, entry: LogEntry) {
        self.hub.publish_default(Arc::new(entry)).await;
    }

    /// Producer call: publish to a named group
    pub async fn on_message_logged_to_group(&self, entry: LogEntry, group_name: &str) {
        self.hub.publish(Arc::new(entry), group_name).await;
    }

    /// Transport-level disconnect: leave every joined group
    pub async fn disconnect(&self) {
        self.hub.disconnect(self.connection_id()).await;
    }
}

impl std::fmt::Debug for HubSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubSession")
            .field("connection", &self.connection_id())
            .finish()
    }
}
