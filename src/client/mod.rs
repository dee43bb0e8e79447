//! Producer-side client
//!
//! Delivers log entries to a broadcast hub:
//! - Stamps every entry with a per-client sequence id
//! - Connects lazily on the first send and reconnects after a drop
//! - Never blocks or fails the logging call site

pub mod config;
pub mod connection;
pub mod delivery;
pub mod local;
pub mod state;

pub use config::ClientConfig;
pub use connection::{Connector, HubConnection};
pub use delivery::DeliveryClient;
pub use local::{HubDirectory, LocalConnection, LocalConnector};
pub use state::{ConnectionSlot, ConnectionState};
