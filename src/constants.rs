//! # System Constants
//!
//! Core constants and status groupings that define the operational
//! boundaries of the dispatch core.

// Re-export state types for convenience
pub use crate::state_machine::{RunStatus, RunType, TruckType};

/// Notification channels used by the change feed
pub mod channels {
    /// Prefix shared by every change-feed channel
    pub const CHANNEL_PREFIX: &str = "dispatch_changes";

    /// Channel carrying delivery-run row changes
    pub const DELIVERY_RUNS_CHANNEL: &str = "dispatch_changes.active_delivery_runs";

    /// Channel carrying container-count row changes
    pub const CONTAINER_COUNTS_CHANNEL: &str = "dispatch_changes.daily_container_counts";
}

/// Watched table names
pub mod tables {
    pub const ACTIVE_DELIVERY_RUNS: &str = "active_delivery_runs";
    pub const DAILY_CONTAINER_COUNTS: &str = "daily_container_counts";
}

/// System-wide constants
pub mod system {
    /// Version compatibility marker
    pub const DISPATCH_CORE_VERSION: &str = "0.1.0";

    /// pg_notify rejects payloads near 8000 bytes; stay below with headroom
    pub const MAX_NOTIFY_PAYLOAD_BYTES: usize = 7800;

    /// Buffered change events per table channel before slow subscribers lag
    pub const CHANGE_BUFFER_SIZE: usize = 256;

    /// Trailer fullness is a percentage
    pub const TRAILER_FULLNESS_MAX: i32 = 100;
}

/// Status groupings for validation and logic
pub mod status_groups {
    use super::RunStatus;

    /// Run statuses that free the store for reassignment in the same bucket
    pub const TERMINAL_RUN_STATES: &[RunStatus] = &[RunStatus::Complete, RunStatus::Cancelled];

    /// Run statuses that block a store from a second run of the same type
    pub const ACTIVE_RUN_STATES: &[RunStatus] = &[RunStatus::Upcoming, RunStatus::Preloaded];
}
