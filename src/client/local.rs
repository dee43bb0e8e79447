//! In-process transport
//!
//! Connects delivery clients to hubs living in the same process, addressed by
//! URL through a [`HubDirectory`]. Entries cross the boundary by value, as
//! they would over a wire. Connections can be severed to simulate a network
//! drop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::entry::LogEntry;
use crate::error::{Error, Result};
use crate::hub::BroadcastHub;

use super::connection::{Connector, HubConnection};

/// URL → hub lookup shared by connectors
#[derive(Clone, Default)]
pub struct HubDirectory {
    hubs: Arc<RwLock<HashMap<String, Arc<BroadcastHub>>>>,
}

impl HubDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a hub reachable at `url`
    pub fn bind(&self, url: impl Into<String>, hub: Arc<BroadcastHub>) {
        let url = url.into();
        tracing::debug!(url = %url, "Hub bound");
        self.hubs.write().insert(url, hub);
    }

    /// Make `url` unreachable; existing connections keep working
    pub fn unbind(&self, url: &str) -> Option<Arc<BroadcastHub>> {
        self.hubs.write().remove(url)
    }

    /// Look up the hub at `url`
    pub fn resolve(&self, url: &str) -> Option<Arc<BroadcastHub>> {
        self.hubs.read().get(url).cloned()
    }
}

/// Builds [`LocalConnection`]s against a directory
#[derive(Clone)]
pub struct LocalConnector {
    directory: HubDirectory,
    links: Arc<Mutex<Vec<Arc<Link>>>>,
    connections_made: Arc<AtomicUsize>,
}

impl LocalConnector {
    /// Create a connector resolving URLs through `directory`
    pub fn new(directory: HubDirectory) -> Self {
        Self {
            directory,
            links: Arc::new(Mutex::new(Vec::new())),
            connections_made: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of handles built so far
    pub fn connections_made(&self) -> usize {
        self.connections_made.load(Ordering::Relaxed)
    }

    /// Drop every live connection built by this connector
    pub fn sever_all(&self) {
        let links = std::mem::take(&mut *self.links.lock());
        for link in links {
            link.close();
        }
    }
}

impl Connector for LocalConnector {
    type Connection = LocalConnection;

    fn connect(&self, hub_url: &str) -> LocalConnection {
        self.connections_made.fetch_add(1, Ordering::Relaxed);

        let link = Arc::new(Link::new());
        let mut links = self.links.lock();
        links.retain(|l| !l.is_closed());
        links.push(Arc::clone(&link));

        LocalConnection {
            url: hub_url.to_string(),
            directory: self.directory.clone(),
            link,
        }
    }
}

/// Connection state shared between a handle and its connector
struct Link {
    hub: Mutex<Option<Arc<BroadcastHub>>>,
    closed: watch::Sender<bool>,
}

impl Link {
    fn new() -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            hub: Mutex::new(None),
            closed,
        }
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    fn close(&self) {
        self.hub.lock().take();
        self.closed.send_replace(true);
    }
}

/// Handle to a hub in this process
pub struct LocalConnection {
    url: String,
    directory: HubDirectory,
    link: Arc<Link>,
}

impl LocalConnection {
    /// Address this handle targets
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Simulate a network drop
    pub fn sever(&self) {
        self.link.close();
    }
}

impl HubConnection for LocalConnection {
    async fn start(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::MissingHubUrl);
        }
        if self.link.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let hub = self
            .directory
            .resolve(&self.url)
            .ok_or_else(|| Error::HubUnreachable(self.url.clone()))?;

        *self.link.hub.lock() = Some(hub);
        Ok(())
    }

    async fn send(&self, entry: &LogEntry, group_name: &str) -> Result<()> {
        let hub = self.link.hub.lock().clone().ok_or(Error::ConnectionClosed)?;

        hub.publish(Arc::new(entry.clone()), group_name).await;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.link.close();
        Ok(())
    }

    async fn closed(&self) {
        let mut rx = self.link.closed.subscribe();
        while !*rx.borrow_and_update() {
            // Sender gone means the link is gone too
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EventData, LevelRegistry, LevelToken, SimpleEvent};
    use tokio_test::{assert_err, assert_ok};

    fn entry(id: u64) -> LogEntry {
        let data = EventData::capture(
            &SimpleEvent::new(LevelToken::INFO, "local", "m"),
            &LevelRegistry::new(),
        );
        LogEntry::new(id, "m", data)
    }

    #[tokio::test]
    async fn test_start_requires_url() {
        let connector = LocalConnector::new(HubDirectory::new());
        let connection = connector.connect("");

        assert_eq!(connection.start().await, Err(Error::MissingHubUrl));
    }

    #[tokio::test]
    async fn test_start_unknown_url() {
        let connector = LocalConnector::new(HubDirectory::new());
        let connection = connector.connect("local://nowhere");

        assert_eq!(
            connection.start().await,
            Err(Error::HubUnreachable("local://nowhere".into()))
        );
    }

    #[tokio::test]
    async fn test_send_publishes() {
        let hub = Arc::new(BroadcastHub::new());
        let directory = HubDirectory::new();
        directory.bind("local://hub", Arc::clone(&hub));

        let connection = LocalConnector::new(directory).connect("local://hub");
        assert_err!(connection.send(&entry(1), "G").await);

        assert_ok!(connection.start().await);
        assert_ok!(connection.send(&entry(1), "G").await);
        assert_eq!(hub.group_names().await, vec!["G"]);
    }

    #[tokio::test]
    async fn test_sever_closes() {
        let directory = HubDirectory::new();
        directory.bind("local://hub", Arc::new(BroadcastHub::new()));
        let connection = LocalConnector::new(directory).connect("local://hub");
        assert_ok!(connection.start().await);

        connection.sever();
        connection.closed().await;

        assert_eq!(
            connection.send(&entry(1), "G").await,
            Err(Error::ConnectionClosed)
        );
        assert_eq!(connection.start().await, Err(Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_unbind_keeps_existing_connections() {
        let directory = HubDirectory::new();
        directory.bind("local://hub", Arc::new(BroadcastHub::new()));
        let connector = LocalConnector::new(directory.clone());

        let connection = connector.connect("local://hub");
        assert_ok!(connection.start().await);
        assert!(directory.unbind("local://hub").is_some());

        assert_ok!(connection.send(&entry(1), "G").await);
        assert_err!(connector.connect("local://hub").start().await);
    }
}
