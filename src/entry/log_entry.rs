//! The unit that flows from producer to hub to subscriber

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::event::EventData;

/// One logged event, stamped with its producer's sequence id
///
/// Immutable once built. The hub keeps entries behind `Arc`, so the replay
/// buffer and every live delivery share one allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogEntry {
    /// Sequence id, increasing per producer
    pub id: u64,
    /// Pre-rendered text
    pub formatted_event: String,
    /// Structured payload
    pub logging_event: Arc<EventData>,
}

impl LogEntry {
    /// Create a new entry
    pub fn new(id: u64, formatted_event: impl Into<String>, logging_event: EventData) -> Self {
        Self {
            id,
            formatted_event: formatted_event.into(),
            logging_event: Arc::new(logging_event),
        }
    }

    /// Logger that produced the entry
    pub fn logger_name(&self) -> &str {
        &self.logging_event.logger_name
    }
}
