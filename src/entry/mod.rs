//! Log entries and their payload
//!
//! Everything in here is immutable once constructed and shared by reference
//! between the replay buffers and every delivery. The only state is in the
//! [`SequenceAllocator`] (one per producer) and the [`LevelRegistry`].

pub mod event;
pub mod level;
pub mod log_entry;
pub mod sequence;

pub use event::{CapturedEvent, ErrorDetail, EventData, LogLocation, SimpleEvent};
pub use level::{LevelRegistry, LevelToken, LogLevel};
pub use log_entry::LogEntry;
pub use sequence::SequenceAllocator;
