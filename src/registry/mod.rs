//! Group registry and replay buffers
//!
//! The registry owns every group the hub has seen. Each group pairs a bounded
//! replay buffer with the set of subscribers currently joined to it, both
//! guarded by one per-group lock.
//!
//! # Architecture
//!
//! ```text
//!                        GroupRegistry
//!              ┌─────────────────────────────┐
//!              │ groups: HashMap<String,     │
//!              │   Arc<Mutex<Group {         │
//!              │     replay: ReplayBuffer,   │
//!              │     subscribers,            │
//!              │   }>>                       │
//!              │ >                           │
//!              │ limit: CacheLimit ──────────┼──► shared by every ReplayBuffer
//!              └─────────────────────────────┘
//! ```
//!
//! Entries are stored as `Arc<LogEntry>`, so the buffer and every delivery
//! share one allocation.

pub mod config;
pub mod group;
pub mod replay;
pub mod store;

pub use config::{CacheLimit, HubConfig, DEFAULT_GROUP};
pub use group::{Group, GroupStats};
pub use replay::ReplayBuffer;
pub use store::GroupRegistry;
