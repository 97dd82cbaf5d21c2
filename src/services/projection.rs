//! Dashboard snapshot projection.
//!
//! Pure assembly of the dispatch board from already-fetched rows: runs are
//! grouped into the three daily windows, ordered by board position, and each
//! row is paired with its store's current supply needs. Stores without a
//! supply row get zeroed needs so every run always renders with numbers.
//!
//! Nothing here talks to the database. [`DispatchService`] fetches, this
//! module shapes, which keeps the projection trivially testable.
//!
//! [`DispatchService`]: crate::services::DispatchService

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{DeliveryRun, SupplyNeed};
use crate::state_machine::{RunType, TruckType};

/// Truck type filter applied to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruckFilter {
    /// Show every run
    #[default]
    All,
    /// Only box truck runs
    BoxTrucks,
    /// Only tractor trailer runs
    TractorTrailers,
}

impl TruckFilter {
    /// Whether a run with this truck type passes the filter
    #[must_use]
    pub fn matches(&self, truck_type: TruckType) -> bool {
        match self {
            TruckFilter::All => true,
            TruckFilter::BoxTrucks => truck_type == TruckType::BoxTruck,
            TruckFilter::TractorTrailers => truck_type == TruckType::TractorTrailer,
        }
    }
}

/// One board row: a run plus its store's current supply needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRow {
    pub run: DeliveryRun,
    pub needs: SupplyNeed,
}

/// All rows for one daily window, in board order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunGroup {
    pub run_type: RunType,
    pub rows: Vec<RunRow>,
}

impl RunGroup {
    /// Number of runs in this window
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether this window has no runs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The full dispatch board at a point in time.
///
/// Always contains one group per daily window, in Morning, Afternoon, ADC
/// order, with empty groups preserved so the board layout is stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub groups: Vec<RunGroup>,
    pub filter: TruckFilter,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// Get the group for a daily window
    #[must_use]
    pub fn group(&self, run_type: RunType) -> Option<&RunGroup> {
        self.groups.iter().find(|g| g.run_type == run_type)
    }

    /// Total runs across all windows
    #[must_use]
    pub fn total_runs(&self) -> usize {
        self.groups.iter().map(RunGroup::len).sum()
    }

    /// Find a row by run id
    #[must_use]
    pub fn find_run(&self, run_id: Uuid) -> Option<&RunRow> {
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter())
            .find(|row| row.run.id == run_id)
    }
}

/// Build a board snapshot from fetched runs and supply needs.
///
/// Runs are grouped by daily window and sorted by board position within
/// each group. Needs are joined by store id; a store with no row in the
/// supply view gets zeroed needs.
pub fn build_snapshot(
    runs: &[DeliveryRun],
    needs: &[SupplyNeed],
    filter: TruckFilter,
    generated_at: DateTime<Utc>,
) -> DashboardSnapshot {
    let needs_by_store: HashMap<Uuid, SupplyNeed> =
        needs.iter().map(|need| (need.store_id, *need)).collect();

    let groups = RunType::ALL
        .iter()
        .map(|&run_type| {
            let mut rows: Vec<RunRow> = runs
                .iter()
                .filter(|run| run.run_type == run_type && filter.matches(run.truck_type))
                .map(|run| RunRow {
                    run: run.clone(),
                    needs: needs_by_store
                        .get(&run.store_id)
                        .copied()
                        .unwrap_or_else(|| SupplyNeed::zero(run.store_id)),
                })
                .collect();
            rows.sort_by_key(|row| row.run.position);

            RunGroup { run_type, rows }
        })
        .collect();

    DashboardSnapshot {
        groups,
        filter,
        generated_at,
    }
}
