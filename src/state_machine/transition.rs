use chrono::{DateTime, Utc};

use super::events::RunEvent;
use super::states::{RunStatus, TimestampField};

/// What happens to the four lifecycle instants as part of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampEffect {
    /// No instant changes
    Unchanged,
    /// All four instants are cleared
    ClearAll,
    /// The named instant is stamped at the given time
    Set {
        field: TimestampField,
        at: DateTime<Utc>,
    },
}

/// Result of applying a [`RunEvent`] to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub status: RunStatus,
    pub effect: TimestampEffect,
}

/// Determine the target status and timestamp effect for an event.
///
/// Total over every (status, event) pair. Cycling steps to the fixed
/// successor and clears the instants only when landing back on Upcoming.
/// Stamping sets exactly one instant and forces the status only for the
/// preload and complete fields; it is independent of cycle order, so a run
/// can become Complete straight from Upcoming or Cancelled.
pub fn transition(current: RunStatus, event: &RunEvent, now: DateTime<Utc>) -> TransitionOutcome {
    match event {
        RunEvent::CycleRequested => {
            let next = current.successor();
            let effect = if next == RunStatus::Upcoming {
                TimestampEffect::ClearAll
            } else {
                TimestampEffect::Unchanged
            };
            TransitionOutcome {
                status: next,
                effect,
            }
        }
        RunEvent::TimestampSet(field) => TransitionOutcome {
            status: field.forced_status().unwrap_or(current),
            effect: TimestampEffect::Set {
                field: *field,
                at: now,
            },
        },
    }
}
