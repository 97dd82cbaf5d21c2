//! # Change event types
//!
//! Events describing row-level changes to the watched dispatch tables.
//! Database triggers build these payloads with `json_build_object` and
//! publish them over `pg_notify`; the feed decodes them back into
//! [`ChangeEvent`] values.
//!
//! Payloads are deliberately minimal. They say *that* a row changed, never
//! what it now contains, so consumers always refetch current state instead
//! of patching stale snapshots from notification data.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::events::{ChangeEvent, ChangeOp, ChangeTable};
//! use uuid::Uuid;
//!
//! let event = ChangeEvent::insert(ChangeTable::DeliveryRuns, Uuid::new_v4());
//! assert_eq!(event.op, ChangeOp::Insert);
//! assert_eq!(event.table.table_name(), "active_delivery_runs");
//!
//! let json = serde_json::to_string(&event).unwrap();
//! assert!(json.contains("\"op\":\"insert\""));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{channels, tables};

/// The kind of row mutation a change event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

impl ChangeOp {
    /// Lowercase operation name as it appears in notification payloads
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOp::Insert => "insert",
            ChangeOp::Update => "update",
            ChangeOp::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The watched tables that emit change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeTable {
    /// `active_delivery_runs` mutations
    #[serde(rename = "active_delivery_runs")]
    DeliveryRuns,
    /// `daily_container_counts` mutations
    #[serde(rename = "daily_container_counts")]
    ContainerCounts,
}

impl ChangeTable {
    /// All watched tables
    pub const ALL: [ChangeTable; 2] = [ChangeTable::DeliveryRuns, ChangeTable::ContainerCounts];

    /// The underlying table name, matching `TG_TABLE_NAME` in the triggers
    #[must_use]
    pub fn table_name(&self) -> &'static str {
        match self {
            ChangeTable::DeliveryRuns => tables::ACTIVE_DELIVERY_RUNS,
            ChangeTable::ContainerCounts => tables::DAILY_CONTAINER_COUNTS,
        }
    }

    /// The default notification channel for this table
    #[must_use]
    pub fn default_channel(&self) -> &'static str {
        match self {
            ChangeTable::DeliveryRuns => channels::DELIVERY_RUNS_CHANNEL,
            ChangeTable::ContainerCounts => channels::CONTAINER_COUNTS_CHANNEL,
        }
    }
}

impl std::fmt::Display for ChangeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// A row-level change to one of the watched tables.
///
/// Field names and encoding match the payload built by the
/// `dispatch_notify_change()` trigger function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened to the row
    pub op: ChangeOp,
    /// Which table the row belongs to
    pub table: ChangeTable,
    /// Primary key of the affected row
    pub row_id: Uuid,
    /// When the database observed the change
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create a change event with an explicit timestamp
    pub fn with_timestamp(
        op: ChangeOp,
        table: ChangeTable,
        row_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            op,
            table,
            row_id,
            occurred_at,
        }
    }

    /// Create an insert event stamped with the current time
    pub fn insert(table: ChangeTable, row_id: Uuid) -> Self {
        Self::with_timestamp(ChangeOp::Insert, table, row_id, Utc::now())
    }

    /// Create an update event stamped with the current time
    pub fn update(table: ChangeTable, row_id: Uuid) -> Self {
        Self::with_timestamp(ChangeOp::Update, table, row_id, Utc::now())
    }

    /// Create a delete event stamped with the current time
    pub fn delete(table: ChangeTable, row_id: Uuid) -> Self {
        Self::with_timestamp(ChangeOp::Delete, table, row_id, Utc::now())
    }

    /// Check whether this event is for the given table
    #[must_use]
    pub fn matches_table(&self, table: ChangeTable) -> bool {
        self.table == table
    }
}
