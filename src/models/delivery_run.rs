//! # Delivery Run Model
//!
//! One truck dispatch trip assigned to a store within a daily window.
//!
//! ## Overview
//!
//! The `DeliveryRun` model owns every write to the dispatch board: creation
//! with in-statement position assignment, the closed set of field patches,
//! and persistence of state-machine transition outcomes. Reads return runs
//! ordered by their display position.
//!
//! ## Database Schema
//!
//! Maps to `active_delivery_runs` table:
//! ```sql
//! CREATE TABLE active_delivery_runs (
//!   id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!   store_id UUID NOT NULL REFERENCES stores(id),
//!   store_name VARCHAR(255) NOT NULL,
//!   department_number VARCHAR(32) NOT NULL,
//!   run_type run_type NOT NULL,
//!   truck_type truck_type NOT NULL,
//!   status run_status NOT NULL DEFAULT 'Upcoming',
//!   driver VARCHAR(255),
//!   "position" INTEGER NOT NULL CHECK ("position" > 0),
//!   start_time TIMESTAMPTZ,
//!   preload_time TIMESTAMPTZ,
//!   complete_time TIMESTAMPTZ,
//!   depart_time TIMESTAMPTZ,
//!   trailer_number VARCHAR(64),
//!   tractor_number VARCHAR(64),
//!   dock VARCHAR(64),
//!   return_trailer VARCHAR(64),
//!   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!   updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! ## Position Assignment
//!
//! A new run's position is `count(runs with the same run_type) + 1`,
//! computed inside the INSERT statement so the count read and the insert
//! happen in one storage call. Positions are never compacted: a cancelled
//! run keeps its slot and later runs append after it.
//!
//! ## Active-Run Uniqueness
//!
//! A partial unique index on `(store_id, run_type) WHERE status NOT IN
//! ('Complete', 'Cancelled')` rejects a second non-terminal run for the same
//! store and window; the violation surfaces as a unique-constraint error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::store::Store;
use crate::state_machine::{RunStatus, RunType, TimestampEffect, TransitionOutcome, TruckType};

/// Column list shared by every query returning full run rows.
const RUN_COLUMNS: &str = r#"id, store_id, store_name, department_number, run_type, truck_type,
       status, driver, "position", start_time, preload_time, complete_time,
       depart_time, trailer_number, tractor_number, dock, return_trailer,
       created_at, updated_at"#;

/// Represents one truck dispatch trip on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DeliveryRun {
    pub id: Uuid,

    /// The store this run delivers to
    pub store_id: Uuid,

    /// Store name denormalized at creation time
    pub store_name: String,

    /// Store department number denormalized at creation time
    pub department_number: String,

    pub run_type: RunType,
    pub truck_type: TruckType,
    pub status: RunStatus,
    pub driver: Option<String>,

    /// Display-order rank within this run's window; positive, not unique
    pub position: i32,

    pub start_time: Option<DateTime<Utc>>,
    pub preload_time: Option<DateTime<Utc>>,
    pub complete_time: Option<DateTime<Utc>>,
    pub depart_time: Option<DateTime<Utc>>,

    pub trailer_number: Option<String>,
    pub tractor_number: Option<String>,
    pub dock: Option<String>,
    pub return_trailer: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New DeliveryRun for creation (without generated fields)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewDeliveryRun {
    pub store_id: Uuid,
    pub run_type: RunType,
    pub truck_type: TruckType,
}

/// The closed set of single-field patches a dashboard can apply to a run.
///
/// Status and timestamps are excluded on purpose; those mutate only through
/// the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value")]
pub enum RunPatch {
    TruckType(TruckType),
    Driver(Option<String>),
    TrailerNumber(Option<String>),
    TractorNumber(Option<String>),
    Dock(Option<String>),
    ReturnTrailer(Option<String>),
}

impl RunPatch {
    /// Storage column this patch writes, for logging
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::TruckType(_) => "truck_type",
            Self::Driver(_) => "driver",
            Self::TrailerNumber(_) => "trailer_number",
            Self::TractorNumber(_) => "tractor_number",
            Self::Dock(_) => "dock",
            Self::ReturnTrailer(_) => "return_trailer",
        }
    }
}

impl DeliveryRun {
    /// Create a run for a store, assigning the next position in its window.
    ///
    /// Store name and department number are denormalized from the store row
    /// in the same statement. Returns `None` when the store does not exist.
    /// A second non-terminal run for the same (store, run_type) fails with a
    /// unique-constraint violation from the partial index.
    pub async fn create(
        pool: &PgPool,
        new_run: NewDeliveryRun,
    ) -> Result<Option<DeliveryRun>, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO active_delivery_runs
                (store_id, store_name, department_number, run_type, truck_type, status, "position")
            SELECT s.id, s.name, s.department_number, $2, $3, 'Upcoming',
                   (SELECT (COUNT(*) + 1)::int
                    FROM active_delivery_runs
                    WHERE run_type = $2)
            FROM stores s
            WHERE s.id = $1
            RETURNING {RUN_COLUMNS}
            "#
        );

        sqlx::query_as::<_, DeliveryRun>(&query)
            .bind(new_run.store_id)
            .bind(new_run.run_type)
            .bind(new_run.truck_type)
            .fetch_optional(pool)
            .await
    }

    /// Find a run by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<DeliveryRun>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {RUN_COLUMNS}
            FROM active_delivery_runs
            WHERE id = $1
            "#
        );

        sqlx::query_as::<_, DeliveryRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every run on the board ordered by display position
    pub async fn list_all_ordered(pool: &PgPool) -> Result<Vec<DeliveryRun>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {RUN_COLUMNS}
            FROM active_delivery_runs
            ORDER BY "position" ASC
            "#
        );

        sqlx::query_as::<_, DeliveryRun>(&query).fetch_all(pool).await
    }

    /// Apply a single-field patch, returning the updated row.
    ///
    /// Returns `None` when the run does not exist. Column names come from
    /// the closed [`RunPatch`] enum, never from caller input.
    pub async fn apply_patch(
        pool: &PgPool,
        id: Uuid,
        patch: &RunPatch,
    ) -> Result<Option<DeliveryRun>, sqlx::Error> {
        match patch {
            RunPatch::TruckType(truck_type) => {
                let query = format!(
                    r#"
                    UPDATE active_delivery_runs
                    SET truck_type = $2
                    WHERE id = $1
                    RETURNING {RUN_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, DeliveryRun>(&query)
                    .bind(id)
                    .bind(truck_type)
                    .fetch_optional(pool)
                    .await
            }
            RunPatch::Driver(value) => {
                Self::patch_text_column(pool, id, "driver", value.as_deref()).await
            }
            RunPatch::TrailerNumber(value) => {
                Self::patch_text_column(pool, id, "trailer_number", value.as_deref()).await
            }
            RunPatch::TractorNumber(value) => {
                Self::patch_text_column(pool, id, "tractor_number", value.as_deref()).await
            }
            RunPatch::Dock(value) => {
                Self::patch_text_column(pool, id, "dock", value.as_deref()).await
            }
            RunPatch::ReturnTrailer(value) => {
                Self::patch_text_column(pool, id, "return_trailer", value.as_deref()).await
            }
        }
    }

    async fn patch_text_column(
        pool: &PgPool,
        id: Uuid,
        column: &str,
        value: Option<&str>,
    ) -> Result<Option<DeliveryRun>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE active_delivery_runs
            SET {column} = $2
            WHERE id = $1
            RETURNING {RUN_COLUMNS}
            "#
        );

        sqlx::query_as::<_, DeliveryRun>(&query)
            .bind(id)
            .bind(value)
            .fetch_optional(pool)
            .await
    }

    /// Persist a transition outcome in a single UPDATE.
    ///
    /// Status and the timestamp effect are written together so a command is
    /// atomic at the storage boundary. Returns `None` when the run does not
    /// exist.
    pub async fn persist_outcome(
        pool: &PgPool,
        id: Uuid,
        outcome: &TransitionOutcome,
    ) -> Result<Option<DeliveryRun>, sqlx::Error> {
        match outcome.effect {
            TimestampEffect::Unchanged => {
                let query = format!(
                    r#"
                    UPDATE active_delivery_runs
                    SET status = $2
                    WHERE id = $1
                    RETURNING {RUN_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, DeliveryRun>(&query)
                    .bind(id)
                    .bind(outcome.status)
                    .fetch_optional(pool)
                    .await
            }
            TimestampEffect::ClearAll => {
                let query = format!(
                    r#"
                    UPDATE active_delivery_runs
                    SET status = $2,
                        start_time = NULL,
                        preload_time = NULL,
                        complete_time = NULL,
                        depart_time = NULL
                    WHERE id = $1
                    RETURNING {RUN_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, DeliveryRun>(&query)
                    .bind(id)
                    .bind(outcome.status)
                    .fetch_optional(pool)
                    .await
            }
            TimestampEffect::Set { field, at } => {
                let column = field.column_name();
                let query = format!(
                    r#"
                    UPDATE active_delivery_runs
                    SET status = $2,
                        {column} = $3
                    WHERE id = $1
                    RETURNING {RUN_COLUMNS}
                    "#
                );
                sqlx::query_as::<_, DeliveryRun>(&query)
                    .bind(id)
                    .bind(outcome.status)
                    .bind(at)
                    .fetch_optional(pool)
                    .await
            }
        }
    }

    /// Active stores with no non-terminal run in the given window,
    /// ordered by department number
    pub async fn eligible_stores(
        pool: &PgPool,
        run_type: RunType,
    ) -> Result<Vec<Store>, sqlx::Error> {
        sqlx::query_as::<_, Store>(
            r#"
            SELECT s.id, s.name, s.department_number, s.is_active, s.created_at, s.updated_at
            FROM stores s
            WHERE s.is_active = TRUE
              AND NOT EXISTS (
                  SELECT 1 FROM active_delivery_runs r
                  WHERE r.store_id = s.id
                    AND r.run_type = $1
                    AND r.status NOT IN ('Complete', 'Cancelled')
              )
            ORDER BY s.department_number
            "#,
        )
        .bind(run_type)
        .fetch_all(pool)
        .await
    }
}
