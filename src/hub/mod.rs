//! Group-scoped broadcast hub
//!
//! The hub accepts entries from producers and fans them out to every
//! subscriber of the target group. Each group keeps a bounded replay buffer
//! so late or reconnecting subscribers can ask for everything after the last
//! id they saw.
//!
//! # Architecture
//!
//! ```text
//!                           Arc<BroadcastHub>
//!                     ┌──────────────────────────┐
//!                     │ registry: GroupRegistry  │
//!                     │ catalog: LoggerCatalog   │
//!                     └────────────┬─────────────┘
//!                                  │
//!        ┌─────────────────────────┼──────────────────────────┐
//!        │                         │                          │
//!        ▼                         ▼                          ▼
//!   [Producer]               [Subscriber]               [Subscriber]
//!   publish(entry, group)    subscribe(group, since)    on_logged_event()
//!        │                         │                          ▲
//!        └─► cache ─► fan-out ─────┴──► LogSubscriber ────────┘
//! ```
//!
//! The hub depends only on the [`LogSubscriber`] trait; transports provide
//! the implementation. [`HubSession`] exposes the per-connection call surface.

pub mod broadcast;
pub mod catalog;
pub mod session;
pub mod subscriber;

pub use broadcast::BroadcastHub;
pub use catalog::{KnownLoggers, LoggerCatalog};
pub use session::HubSession;
pub use subscriber::{ChannelSubscriber, ConnectionId, HubMessage, LogSubscriber};
