//! Subscriber handles
//!
//! The hub talks to subscribers only through [`LogSubscriber`]. A transport
//! implements it per connection. Both callbacks must return promptly: the hub
//! calls them while holding the group lock, which is what keeps a subscriber's
//! backlog and its live entries free of gaps and duplicates. Transports that
//! do real I/O should queue, as [`ChannelSubscriber`] does.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::entry::LogEntry;
use crate::error::DeliveryError;

/// Identifies one transport-level connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw id
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Hub → subscriber callbacks
pub trait LogSubscriber: Send + Sync {
    /// Connection this handle belongs to
    fn connection_id(&self) -> ConnectionId;

    /// Sent once per subscribe: known logger names and the replay backlog
    fn initialize(
        &self,
        loggers: Vec<String>,
        entries: Vec<Arc<LogEntry>>,
    ) -> Result<(), DeliveryError>;

    /// Sent for every entry published to a joined group
    fn on_logged_event(&self, entry: Arc<LogEntry>) -> Result<(), DeliveryError>;
}

/// Message delivered to a channel-backed subscriber
#[derive(Debug, Clone)]
pub enum HubMessage {
    /// Subscription acknowledged with backlog
    Initialize {
        /// Sorted logger names
        loggers: Vec<String>,
        /// Missed entries, oldest first
        entries: Vec<Arc<LogEntry>>,
    },
    /// A live entry
    LoggedEvent(Arc<LogEntry>),
}

impl HubMessage {
    /// Id of a live entry, `None` for `Initialize`
    pub fn entry_id(&self) -> Option<u64> {
        match self {
            HubMessage::LoggedEvent(entry) => Some(entry.id),
            HubMessage::Initialize { .. } => None,
        }
    }
}

/// Subscriber backed by a bounded tokio channel
///
/// Delivery never waits: a full queue is reported as
/// [`DeliveryError::Lagged`] and a dropped receiver as
/// [`DeliveryError::Disconnected`].
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    id: ConnectionId,
    tx: mpsc::Sender<HubMessage>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiving end of its queue
    pub fn new(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<HubMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id, tx }, rx)
    }

    fn push(&self, message: HubMessage) -> Result<(), DeliveryError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Lagged(self.id),
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Disconnected(self.id),
        })
    }
}

impl LogSubscriber for ChannelSubscriber {
    fn connection_id(&self) -> ConnectionId {
        self.id
    }

    fn initialize(
        &self,
        loggers: Vec<String>,
        entries: Vec<Arc<LogEntry>>,
    ) -> Result<(), DeliveryError> {
        self.push(HubMessage::Initialize { loggers, entries })
    }

    fn on_logged_event(&self, entry: Arc<LogEntry>) -> Result<(), DeliveryError> {
        self.push(HubMessage::LoggedEvent(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EventData, LevelRegistry, LevelToken, SimpleEvent};

    fn entry(id: u64) -> Arc<LogEntry> {
        let data = EventData::capture(
            &SimpleEvent::new(LevelToken::DEBUG, "sub", "m"),
            &LevelRegistry::new(),
        );
        Arc::new(LogEntry::new(id, "m", data))
    }

    #[tokio::test]
    async fn test_channel_delivery() {
        let (sub, mut rx) = ChannelSubscriber::new(ConnectionId::new(3), 4);

        sub.initialize(vec!["a".into()], vec![entry(1)]).unwrap();
        sub.on_logged_event(entry(2)).unwrap();

        match rx.recv().await.unwrap() {
            HubMessage::Initialize { loggers, entries } => {
                assert_eq!(loggers, vec!["a"]);
                assert_eq!(entries.len(), 1);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(rx.recv().await.unwrap().entry_id(), Some(2));
    }

    #[test]
    fn test_full_queue_lags() {
        let (sub, _rx) = ChannelSubscriber::new(ConnectionId::new(4), 1);

        sub.on_logged_event(entry(1)).unwrap();
        assert_eq!(
            sub.on_logged_event(entry(2)),
            Err(DeliveryError::Lagged(ConnectionId::new(4)))
        );
    }

    #[test]
    fn test_dropped_receiver_disconnects() {
        let (sub, rx) = ChannelSubscriber::new(ConnectionId::new(5), 4);
        drop(rx);

        assert_eq!(
            sub.on_logged_event(entry(1)),
            Err(DeliveryError::Disconnected(ConnectionId::new(5)))
        );
    }
}
