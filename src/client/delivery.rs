//! Log delivery client
//!
//! The producer side of the hub. Stamps each event with a sequence id, queues
//! it and lets a background worker push it to the hub over a lazily created
//! connection. Nothing here blocks or fails the caller: a missing hub, a
//! failed connect or a failed send is logged and the entry dropped.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::entry::{EventData, LogEntry, SequenceAllocator};
use crate::error::Result;

use super::config::ClientConfig;
use super::connection::{Connector, HubConnection};
use super::state::{ConnectionSlot, ConnectionState};

/// Producer-side client of a broadcast hub
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use loghub::client::{ClientConfig, DeliveryClient, HubDirectory, LocalConnector};
/// use loghub::entry::{EventData, LevelRegistry, LevelToken, SimpleEvent};
/// use loghub::hub::BroadcastHub;
///
/// # async fn example() {
/// let directory = HubDirectory::new();
/// directory.bind("local://hub", Arc::new(BroadcastHub::new()));
///
/// let client = DeliveryClient::new(
///     ClientConfig::new("local://hub"),
///     LocalConnector::new(directory),
/// );
///
/// let levels = LevelRegistry::new();
/// let event = SimpleEvent::new(LevelToken::INFO, "app", "started");
/// client.append("INFO app - started", EventData::capture(&event, &levels));
///
/// client.shutdown().await;
/// # }
/// ```
pub struct DeliveryClient<C: Connector> {
    inner: Arc<ClientInner<C>>,

    /// Producer queue (None after shutdown)
    queue: Mutex<Option<mpsc::Sender<LogEntry>>>,

    /// Worker draining the queue
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct ClientInner<C: Connector> {
    config: ClientConfig,
    connector: C,
    sequence: SequenceAllocator,
    slot: Mutex<ConnectionSlot<C::Connection>>,
}

impl<C: Connector> DeliveryClient<C> {
    /// Create a client and spawn its delivery worker
    ///
    /// No connection is made until the first entry is sent.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the worker is started
    /// with `tokio::spawn`.
    pub fn new(config: ClientConfig, connector: C) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

        let inner = Arc::new(ClientInner {
            config,
            connector,
            sequence: SequenceAllocator::new(),
            slot: Mutex::new(ConnectionSlot::new()),
        });

        let worker = tokio::spawn(Arc::clone(&inner).run_worker(rx));

        Self {
            inner,
            queue: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.slot.lock().state()
    }

    /// Id of the most recently stamped entry (0 if none)
    pub fn last_id(&self) -> u64 {
        self.inner.sequence.last()
    }

    /// Stamp an event with the next sequence id
    pub fn stamp(&self, formatted_event: impl Into<String>, event: EventData) -> LogEntry {
        LogEntry::new(self.inner.sequence.next(), formatted_event, event)
    }

    /// Log an event: stamp it and queue it for delivery
    ///
    /// Never blocks. If the queue is full or the client is shut down the
    /// entry is dropped with a warning.
    pub fn append(&self, formatted_event: impl Into<String>, event: EventData) {
        // Stamp under the queue lock so queue order matches id order
        let queue = self.queue.lock();
        let entry = self.stamp(formatted_event, event);

        let Some(tx) = queue.as_ref() else {
            tracing::warn!(id = entry.id, "Delivery client shut down, entry dropped");
            return;
        };

        if let Err(e) = tx.try_send(entry) {
            let (reason, entry) = match e {
                mpsc::error::TrySendError::Full(entry) => ("queue full", entry),
                mpsc::error::TrySendError::Closed(entry) => ("worker stopped", entry),
            };
            tracing::warn!(id = entry.id, reason = reason, "Log entry dropped");
        }
    }

    /// Deliver one entry now
    ///
    /// Connects first if no connection exists. If the connection is not open
    /// afterwards the entry is dropped. Errors are logged, never returned.
    pub async fn send(&self, entry: &LogEntry) {
        self.inner.send(entry).await;
    }

    /// Stop delivering and close the connection
    ///
    /// Waits for queued entries to be handed to the transport, then for the
    /// connection to stop. Entries appended afterwards are dropped.
    pub async fn shutdown(&self) {
        drop(self.queue.lock().take());

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "Delivery worker ended abnormally");
            }
        }

        let connection = self.inner.slot.lock().reset();
        if let Some(connection) = connection {
            match connection.stop().await {
                Ok(()) => {
                    tracing::info!(hub = %self.inner.config.hub_url, "Hub connection stopped")
                }
                Err(e) => tracing::warn!(error = %e, "Failed to stop hub connection"),
            }
        }
    }
}

impl<C: Connector> ClientInner<C> {
    async fn run_worker(self: Arc<Self>, mut rx: mpsc::Receiver<LogEntry>) {
        while let Some(entry) = rx.recv().await {
            self.send(&entry).await;
        }

        tracing::debug!("Delivery worker finished");
    }

    async fn send(self: &Arc<Self>, entry: &LogEntry) {
        if let Err(e) = self.try_send(entry).await {
            tracing::warn!(id = entry.id, error = %e, "OnMessageLogged failed");
        }
    }

    async fn try_send(self: &Arc<Self>, entry: &LogEntry) -> Result<()> {
        match self.ensure_connected().await? {
            Some(connection) => connection.send(entry, &self.config.group_name).await,
            None => {
                tracing::debug!(id = entry.id, "Hub connection not open, entry dropped");
                Ok(())
            }
        }
    }

    /// Return the open connection, creating and starting one if none exists
    ///
    /// Returns `None` while another caller's start is still pending.
    async fn ensure_connected(self: &Arc<Self>) -> Result<Option<Arc<C::Connection>>> {
        let (connection, generation) = {
            let mut slot = self.slot.lock();
            match slot.state() {
                ConnectionState::Open => return Ok(slot.handle()),
                ConnectionState::Connecting => return Ok(None),
                ConnectionState::Closed => {}
            }

            if !self.config.has_hub_url() {
                tracing::error!("Hub URL needs to be configured");
            }

            let connection = Arc::new(self.connector.connect(&self.config.hub_url));
            let generation = slot.begin(Arc::clone(&connection));
            (connection, generation)
        };

        tracing::debug!(hub = %self.config.hub_url, generation = generation, "Connecting to hub");

        if let Err(e) = connection.start().await {
            self.slot.lock().close(generation);
            return Err(e);
        }

        if !self.slot.lock().open(generation) {
            // Shut down or replaced while starting
            return Ok(None);
        }

        tracing::info!(hub = %self.config.hub_url, generation = generation, "Hub connection open");
        self.watch_close(Arc::clone(&connection), generation);

        Ok(Some(connection))
    }

    /// Move to Closed when this connection drops, unless it was replaced
    fn watch_close(self: &Arc<Self>, connection: Arc<C::Connection>, generation: u64) {
        let inner: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            connection.closed().await;

            if let Some(inner) = inner.upgrade() {
                if inner.slot.lock().close(generation) {
                    tracing::info!(
                        hub = %inner.config.hub_url,
                        generation = generation,
                        "Hub connection closed"
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc::Receiver;

    use super::*;
    use crate::client::local::{HubDirectory, LocalConnector};
    use crate::entry::{LevelRegistry, LevelToken, SimpleEvent};
    use crate::hub::{BroadcastHub, HubMessage};
    use crate::registry::{HubConfig, DEFAULT_GROUP};

    const URL: &str = "local://hub";

    fn event(message: &str) -> EventData {
        EventData::capture(
            &SimpleEvent::new(LevelToken::INFO, "client", message),
            &LevelRegistry::new(),
        )
    }

    async fn setup(group: &str) -> (Arc<BroadcastHub>, HubDirectory, Receiver<HubMessage>) {
        let hub = Arc::new(BroadcastHub::with_config(
            HubConfig::default().maximum_cached_entries(100),
        ));
        let directory = HubDirectory::new();
        directory.bind(URL, Arc::clone(&hub));

        let (viewer, mut rx) = hub.connect();
        viewer.subscribe_to_group(group).await;
        assert!(matches!(rx.recv().await, Some(HubMessage::Initialize { .. })));

        (hub, directory, rx)
    }

    fn drain_ids(rx: &mut Receiver<HubMessage>) -> Vec<u64> {
        let mut ids = Vec::new();
        while let Ok(message) = rx.try_recv() {
            ids.extend(message.entry_id());
        }
        ids
    }

    async fn next_id(rx: &mut Receiver<HubMessage>) -> u64 {
        let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("entry delivered in time")
            .expect("channel open");
        message.entry_id().expect("live entry")
    }

    #[tokio::test]
    async fn test_missing_hub_url_stays_closed() {
        let client = DeliveryClient::new(
            ClientConfig::default(),
            LocalConnector::new(HubDirectory::new()),
        );

        let entry = client.stamp("dropped", event("dropped"));
        client.send(&entry).await;

        assert_eq!(client.state(), ConnectionState::Closed);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_hub_stays_closed() {
        let connector = LocalConnector::new(HubDirectory::new());
        let client = DeliveryClient::new(ClientConfig::new("local://nowhere"), connector.clone());

        for i in 0..3 {
            let entry = client.stamp("x", event(&format!("attempt {}", i)));
            client.send(&entry).await;
            assert_eq!(client.state(), ConnectionState::Closed);
        }

        // Every attempt built a fresh handle
        assert_eq!(connector.connections_made(), 3);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_connects_lazily() {
        let (_hub, directory, mut rx) = setup("DefaultGroup").await;
        let connector = LocalConnector::new(directory);
        let client = DeliveryClient::new(ClientConfig::new(URL), connector.clone());

        assert_eq!(client.state(), ConnectionState::Closed);
        assert_eq!(connector.connections_made(), 0);

        let entry = client.stamp("first", event("first"));
        client.send(&entry).await;

        assert_eq!(client.state(), ConnectionState::Open);
        assert_eq!(next_id(&mut rx).await, 1);

        let entry = client.stamp("second", event("second"));
        client.send(&entry).await;
        assert_eq!(next_id(&mut rx).await, 2);
        assert_eq!(connector.connections_made(), 1);

        client.shutdown().await;
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_append_delivers_in_order_to_group() {
        let (hub, directory, mut rx) = setup("billing").await;
        let client = DeliveryClient::new(
            ClientConfig::new(URL).group("billing"),
            LocalConnector::new(directory),
        );

        for i in 0..20 {
            client.append(format!("line {}", i), event(&format!("line {}", i)));
        }

        for expected in 1..=20 {
            assert_eq!(next_id(&mut rx).await, expected);
        }
        assert_eq!(client.last_id(), 20);

        client.shutdown().await;
        assert_eq!(hub.group_stats("billing").await.unwrap().cached_entries, 20);
    }

    #[tokio::test]
    async fn test_ids_advance_even_when_dropped() {
        let client = DeliveryClient::new(
            ClientConfig::new("local://nowhere"),
            LocalConnector::new(HubDirectory::new()),
        );

        client.append("a", event("a"));
        client.append("b", event("b"));
        let entry = client.stamp("c", event("c"));

        assert_eq!(entry.id, 3);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconnects_after_drop() {
        let (_hub, directory, mut rx) = setup("DefaultGroup").await;
        let connector = LocalConnector::new(directory);
        let client = DeliveryClient::new(ClientConfig::new(URL), connector.clone());

        client.send(&client.stamp("1", event("1"))).await;
        assert_eq!(next_id(&mut rx).await, 1);

        connector.sever_all();
        for _ in 0..100 {
            if client.state() == ConnectionState::Closed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(client.state(), ConnectionState::Closed);

        client.send(&client.stamp("2", event("2"))).await;
        assert_eq!(client.state(), ConnectionState::Open);
        assert_eq!(next_id(&mut rx).await, 2);
        assert_eq!(connector.connections_made(), 2);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (hub, directory, mut rx) = setup("DefaultGroup").await;
        let client = DeliveryClient::new(
            ClientConfig::new(URL).queue_capacity(2),
            LocalConnector::new(directory),
        );

        // The worker cannot run until this task yields, so only two fit
        let started = std::time::Instant::now();
        for i in 0..10 {
            client.append(format!("burst {}", i), event("burst"));
        }
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(client.last_id(), 10);

        client.shutdown().await;

        assert_eq!(drain_ids(&mut rx), vec![1, 2]);
        assert_eq!(hub.group_stats("DefaultGroup").await.unwrap().cached_entries, 2);
    }

    #[tokio::test]
    async fn test_default_client_reaches_default_group_viewer() {
        let hub = Arc::new(BroadcastHub::new());
        let directory = HubDirectory::new();
        directory.bind(URL, Arc::clone(&hub));

        let (viewer, mut rx) = hub.connect();
        viewer.subscribe_to_default_group().await;
        assert!(matches!(rx.recv().await, Some(HubMessage::Initialize { .. })));

        let client = DeliveryClient::new(ClientConfig::new(URL), LocalConnector::new(directory));
        client.append("hello", event("hello"));
        client.shutdown().await;

        assert_eq!(next_id(&mut rx).await, 1);
        assert_eq!(hub.group_names().await, vec![DEFAULT_GROUP]);
    }

    #[tokio::test]
    async fn test_append_after_shutdown_is_dropped() {
        let (_hub, directory, mut rx) = setup("DefaultGroup").await;
        let client = DeliveryClient::new(ClientConfig::new(URL), LocalConnector::new(directory));

        client.append("before", event("before"));
        client.shutdown().await;
        assert_eq!(next_id(&mut rx).await, 1);

        client.append("after", event("after"));
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
