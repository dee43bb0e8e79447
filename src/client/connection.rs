//! Transport boundary for the delivery client
//!
//! The client never touches the wire itself. A [`Connector`] builds
//! [`HubConnection`] handles; the client drives them through start, send and
//! stop and listens for unsolicited closes.

use std::future::Future;

use crate::entry::LogEntry;
use crate::error::Result;

/// Builds connection handles for a hub address
pub trait Connector: Send + Sync + 'static {
    /// Handle type produced by this connector
    type Connection: HubConnection;

    /// Build an unstarted handle
    ///
    /// Must not do I/O; failures surface from [`HubConnection::start`].
    fn connect(&self, hub_url: &str) -> Self::Connection;
}

/// One producer → hub connection
pub trait HubConnection: Send + Sync + 'static {
    /// Establish the connection
    fn start(&self) -> impl Future<Output = Result<()>> + Send;

    /// Publish an entry to a group on the hub
    fn send(&self, entry: &LogEntry, group_name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection, resolving once it is fully stopped
    fn stop(&self) -> impl Future<Output = Result<()>> + Send;

    /// Resolves when the connection has closed, for whatever reason
    fn closed(&self) -> impl Future<Output = ()> + Send;
}
