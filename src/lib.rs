//! Group-scoped log broadcast hub
//!
//! Distributes application log entries from producers to live and
//! late-joining subscribers, grouped by named channels.
//!
//! - [`hub::BroadcastHub`] fans each published entry out to the group's
//!   subscribers and keeps a bounded per-group replay buffer, so a subscriber
//!   can ask for everything after the last id it saw.
//! - [`client::DeliveryClient`] is the producer side: it stamps entries with
//!   increasing ids and pushes them to a hub over a lazily opened connection,
//!   dropping (and logging) rather than ever blocking the caller.
//!
//! The wire transport is pluggable on both ends: the hub speaks to
//! subscribers through [`hub::LogSubscriber`], the client to the hub through
//! [`client::Connector`]. [`client::LocalConnector`] wires both ends together
//! inside one process.

pub mod client;
pub mod entry;
pub mod error;
pub mod hub;
pub mod registry;

pub use client::{ClientConfig, DeliveryClient};
pub use entry::{EventData, LevelRegistry, LevelToken, LogEntry};
pub use error::{DeliveryError, Error, Result};
pub use hub::{BroadcastHub, HubSession};
pub use registry::{HubConfig, DEFAULT_GROUP};
