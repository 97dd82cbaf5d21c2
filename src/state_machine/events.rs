use serde::{Deserialize, Serialize};

use super::states::TimestampField;

/// Events that can mutate a run's status or timestamps.
///
/// Both dashboard gestures flow through this one type: clicking the status
/// chip requests a cycle step, clicking a time cell stamps that instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RunEvent {
    /// Advance the status to its successor in the display cycle
    CycleRequested,
    /// Stamp the named instant with the current time
    TimestampSet(TimestampField),
}

impl RunEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CycleRequested => "cycle_requested",
            Self::TimestampSet(_) => "timestamp_set",
        }
    }

    /// Extract the stamped field if this is a timestamp event
    pub fn timestamp_field(&self) -> Option<TimestampField> {
        match self {
            Self::TimestampSet(field) => Some(*field),
            _ => None,
        }
    }
}

/// Helpers for creating common events
impl RunEvent {
    /// Create a timestamp event for the given field
    pub fn stamp(field: TimestampField) -> Self {
        Self::TimestampSet(field)
    }
}
