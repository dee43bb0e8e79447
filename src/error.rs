//! Error types
//!
//! Producer-side transport errors and hub-side per-subscriber delivery errors.
//! Neither ever reaches a logging call site: the delivery client and the hub
//! catch them at their boundary and log them.

use crate::hub::ConnectionId;

/// Result type for producer-side transport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the producer-side connection to a hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No hub URL was configured
    MissingHubUrl,
    /// Nothing is listening at the given URL
    HubUnreachable(String),
    /// The connection was closed while an operation was in flight
    ConnectionClosed,
    /// Any other transport failure
    Transport(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingHubUrl => write!(f, "Hub URL needs to be configured"),
            Error::HubUnreachable(url) => write!(f, "Hub unreachable: {}", url),
            Error::ConnectionClosed => write!(f, "Connection closed"),
            Error::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Error type for delivering a message to a single subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The subscriber's transport is gone
    Disconnected(ConnectionId),
    /// The subscriber is not draining its queue fast enough
    Lagged(ConnectionId),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Disconnected(id) => write!(f, "Subscriber disconnected: {}", id),
            DeliveryError::Lagged(id) => write!(f, "Subscriber queue full: {}", id),
        }
    }
}

impl std::error::Error for DeliveryError {}
