//! # Dispatch Service
//!
//! The command and query surface the dashboard UI talks to. Every method is
//! one independent database round trip: no cross-command transactions, no
//! optimistic locking, no retries. A failed command is terminal for that
//! command and leaves the board at its last fetched state; the caller
//! reissues if needed.
//!
//! Status mutations all flow through the one transition function in
//! [`state_machine`], so cycling and timestamp stamping cannot disagree
//! about how status and instants move together.
//!
//! [`state_machine`]: crate::state_machine

use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{DispatchError, Result};
use crate::models::{
    ContainerCount, ContainerLogEntry, DeliveryRun, NewContainerCount, NewDeliveryRun, RunPatch,
    Store, SupplyNeed,
};
use crate::services::projection::{build_snapshot, DashboardSnapshot, TruckFilter};
use crate::state_machine::{transition, RunEvent, RunType, TimestampField, TruckType};

/// Today's container activity: who has submitted and who has not
#[derive(Debug, Clone)]
pub struct ContainerLog {
    /// Submissions inside the day window, ordered by department number
    pub submitted: Vec<ContainerLogEntry>,
    /// Active stores with no submission inside the day window
    pub missing: Vec<Store>,
}

/// Service backing the dispatch dashboard
#[derive(Debug, Clone)]
pub struct DispatchService {
    pool: PgPool,
}

impl DispatchService {
    /// Create a new dispatch service
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// All runs on the board, ordered by display position
    #[instrument(skip(self))]
    pub async fn fetch_runs(&self) -> Result<Vec<DeliveryRun>> {
        let runs = DeliveryRun::list_all_ordered(&self.pool).await?;
        debug!(count = runs.len(), "Fetched delivery runs");
        Ok(runs)
    }

    /// Current supply needs for every store with a row in the supply view
    #[instrument(skip(self))]
    pub async fn fetch_supply_needs(&self) -> Result<Vec<SupplyNeed>> {
        Ok(SupplyNeed::fetch_all(&self.pool).await?)
    }

    /// Active stores ordered by department number
    #[instrument(skip(self))]
    pub async fn active_stores(&self) -> Result<Vec<Store>> {
        Ok(Store::list_active(&self.pool).await?)
    }

    /// Active stores that can still be assigned a run in the given window
    #[instrument(skip(self))]
    pub async fn eligible_stores(&self, run_type: RunType) -> Result<Vec<Store>> {
        Ok(DeliveryRun::eligible_stores(&self.pool, run_type).await?)
    }

    /// Find one run, failing when it is gone
    #[instrument(skip(self))]
    pub async fn find_run(&self, run_id: Uuid) -> Result<DeliveryRun> {
        DeliveryRun::find_by_id(&self.pool, run_id)
            .await?
            .ok_or(DispatchError::RunNotFound { run_id })
    }

    /// Add a run for a store to a daily window.
    ///
    /// The run starts Upcoming at the next free position in its window. A
    /// store already holding a non-terminal run in that window is rejected
    /// with [`DispatchError::DuplicateActiveRun`].
    #[instrument(skip(self))]
    pub async fn add_run(
        &self,
        store_id: Uuid,
        run_type: RunType,
        truck_type: TruckType,
    ) -> Result<DeliveryRun> {
        let new_run = NewDeliveryRun {
            store_id,
            run_type,
            truck_type,
        };

        let run = DeliveryRun::create(&self.pool, new_run)
            .await?
            .ok_or(DispatchError::StoreNotFound { store_id })?;

        info!(
            run_id = %run.id,
            store_name = %run.store_name,
            run_type = %run.run_type,
            position = run.position,
            "Added delivery run"
        );
        Ok(run)
    }

    /// Patch one editable field of a run
    #[instrument(skip(self))]
    pub async fn update_run(&self, run_id: Uuid, patch: RunPatch) -> Result<DeliveryRun> {
        let run = DeliveryRun::apply_patch(&self.pool, run_id, &patch)
            .await?
            .ok_or(DispatchError::RunNotFound { run_id })?;

        debug!(run_id = %run.id, field = patch.field_name(), "Updated run field");
        Ok(run)
    }

    /// Advance a run's status one step around the cycle.
    ///
    /// Landing back on Upcoming clears all four timestamps; every other hop
    /// leaves them untouched.
    #[instrument(skip(self, run), fields(run_id = %run.id, from = %run.status))]
    pub async fn cycle_status(&self, run: &DeliveryRun) -> Result<DeliveryRun> {
        let outcome = transition(run.status, &RunEvent::CycleRequested, Utc::now());

        let updated = DeliveryRun::persist_outcome(&self.pool, run.id, &outcome)
            .await?
            .ok_or(DispatchError::RunNotFound { run_id: run.id })?;

        info!(
            run_id = %updated.id,
            from = %run.status,
            to = %updated.status,
            "Cycled run status"
        );
        Ok(updated)
    }

    /// Stamp one of a run's timestamps with the current instant.
    ///
    /// Stamping preload or complete also forces the matching status;
    /// start and depart leave status alone.
    #[instrument(skip(self, run), fields(run_id = %run.id, field = ?field))]
    pub async fn set_timestamp(
        &self,
        run: &DeliveryRun,
        field: TimestampField,
    ) -> Result<DeliveryRun> {
        let outcome = transition(run.status, &RunEvent::TimestampSet(field), Utc::now());

        let updated = DeliveryRun::persist_outcome(&self.pool, run.id, &outcome)
            .await?
            .ok_or(DispatchError::RunNotFound { run_id: run.id })?;

        info!(
            run_id = %updated.id,
            field = field.column_name(),
            status = %updated.status,
            "Stamped run timestamp"
        );
        Ok(updated)
    }

    /// Record a store's morning container count.
    ///
    /// Validation failures are reported before any storage command is
    /// issued.
    #[instrument(skip(self, new_count), fields(store_id = %new_count.store_id))]
    pub async fn submit_container_count(
        &self,
        new_count: NewContainerCount,
    ) -> Result<ContainerCount> {
        new_count.validate()?;

        if Store::find_by_id(&self.pool, new_count.store_id)
            .await?
            .is_none()
        {
            return Err(DispatchError::StoreNotFound {
                store_id: new_count.store_id,
            });
        }

        let count = ContainerCount::create(&self.pool, new_count).await?;

        info!(
            count_id = %count.id,
            store_id = %count.store_id,
            opener = %count.opener_name,
            "Recorded container count"
        );
        Ok(count)
    }

    /// Today's container log: submissions plus the stores still missing
    #[instrument(skip(self))]
    pub async fn container_log(&self, now: DateTime<Utc>) -> Result<ContainerLog> {
        let (start, end) = utc_day_bounds(now);

        let submitted = ContainerCount::log_between(&self.pool, start, end).await?;
        let missing = ContainerCount::missing_between(&self.pool, start, end).await?;

        debug!(
            submitted = submitted.len(),
            missing = missing.len(),
            "Built container log"
        );
        Ok(ContainerLog { submitted, missing })
    }

    /// Delete today's container counts, returning how many were removed
    #[instrument(skip(self))]
    pub async fn clear_container_counts(&self, now: DateTime<Utc>) -> Result<u64> {
        let (start, end) = utc_day_bounds(now);

        let removed = ContainerCount::delete_between(&self.pool, start, end).await?;
        info!(removed = removed, "Cleared today's container counts");
        Ok(removed)
    }

    /// Fetch runs and needs and assemble a board snapshot
    #[instrument(skip(self))]
    pub async fn board_snapshot(&self, filter: TruckFilter) -> Result<DashboardSnapshot> {
        let runs = self.fetch_runs().await?;
        let needs = self.fetch_supply_needs().await?;

        Ok(build_snapshot(&runs, &needs, filter, Utc::now()))
    }
}

/// The UTC day containing `now`, as a half-open [midnight, next midnight)
/// window
pub fn utc_day_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
