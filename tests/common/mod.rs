//! # Shared Test Fixtures
//!
//! Builder-style factories for the reference data the dispatch core reads
//! but does not own (stores, par levels) plus container count helpers that
//! can back-date submissions. Runs are created through the real model and
//! service APIs so tests always exercise the production write paths.

#![allow(dead_code)]

pub mod strategies;

use chrono::{DateTime, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use dispatch_core::models::{ContainerCount, NewContainerCount, Store};

/// Factory for stores, the externally owned roster rows
#[derive(Debug, Clone)]
pub struct StoreFactory {
    name: String,
    department_number: String,
    is_active: bool,
}

impl Default for StoreFactory {
    fn default() -> Self {
        Self {
            name: "Riverside".to_string(),
            department_number: "9001".to_string(),
            is_active: true,
        }
    }
}

impl StoreFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_department(mut self, department_number: &str) -> Self {
        self.department_number = department_number.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub async fn create(&self, pool: &PgPool) -> sqlx::Result<Store> {
        sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (name, department_number, is_active)
            VALUES ($1, $2, $3)
            RETURNING id, name, department_number, is_active, created_at, updated_at
            "#,
        )
        .bind(&self.name)
        .bind(&self.department_number)
        .bind(self.is_active)
        .fetch_one(pool)
        .await
    }
}

/// Par levels to seed for a store, in the same category order the supply
/// view reports
#[derive(Debug, Clone, Copy, Default)]
pub struct ParLevels {
    pub hardlines: i32,
    pub softlines: i32,
    pub canvases: i32,
    pub sleeves: i32,
    pub caps: i32,
    pub totes: i32,
}

impl ParLevels {
    pub fn uniform(value: i32) -> Self {
        Self {
            hardlines: value,
            softlines: value,
            canvases: value,
            sleeves: value,
            caps: value,
            totes: value,
        }
    }
}

/// Seed the externally owned par level row for a store
pub async fn seed_par_levels(pool: &PgPool, store_id: Uuid, pars: ParLevels) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO store_par_levels
            (store_id, hardlines_par, softlines_par, canvases_par, sleeves_par, caps_par, totes_par)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(store_id)
    .bind(pars.hardlines)
    .bind(pars.softlines)
    .bind(pars.canvases)
    .bind(pars.sleeves)
    .bind(pars.caps)
    .bind(pars.totes)
    .execute(pool)
    .await?;

    Ok(())
}

/// Factory for container count submissions
#[derive(Debug, Clone)]
pub struct CountFactory {
    store_id: Uuid,
    opener_name: String,
    arrival_time: NaiveTime,
    donation_count: i32,
    trailer_fullness: i32,
    hardlines_raw: i32,
    softlines_raw: i32,
    canvases: i32,
    sleeves: i32,
    caps: i32,
    totes: i32,
}

impl CountFactory {
    pub fn new(store_id: Uuid) -> Self {
        Self {
            store_id,
            opener_name: "Dana".to_string(),
            arrival_time: NaiveTime::from_hms_opt(5, 45, 0).unwrap(),
            donation_count: 3,
            trailer_fullness: 40,
            hardlines_raw: 0,
            softlines_raw: 0,
            canvases: 0,
            sleeves: 0,
            caps: 0,
            totes: 0,
        }
    }

    pub fn with_opener(mut self, opener_name: &str) -> Self {
        self.opener_name = opener_name.to_string();
        self
    }

    pub fn with_trailer_fullness(mut self, trailer_fullness: i32) -> Self {
        self.trailer_fullness = trailer_fullness;
        self
    }

    /// Counted quantities in hardlines, softlines, canvases, sleeves, caps,
    /// totes order
    pub fn with_quantities(
        mut self,
        hardlines: i32,
        softlines: i32,
        canvases: i32,
        sleeves: i32,
        caps: i32,
        totes: i32,
    ) -> Self {
        self.hardlines_raw = hardlines;
        self.softlines_raw = softlines;
        self.canvases = canvases;
        self.sleeves = sleeves;
        self.caps = caps;
        self.totes = totes;
        self
    }

    pub fn build(&self) -> NewContainerCount {
        NewContainerCount {
            store_id: self.store_id,
            opener_name: self.opener_name.clone(),
            arrival_time: self.arrival_time,
            donation_count: self.donation_count,
            trailer_fullness: self.trailer_fullness,
            hardlines_raw: self.hardlines_raw,
            softlines_raw: self.softlines_raw,
            canvases: self.canvases,
            sleeves: self.sleeves,
            caps: self.caps,
            totes: self.totes,
        }
    }

    /// Create through the model, stamped with the database clock
    pub async fn create(&self, pool: &PgPool) -> sqlx::Result<ContainerCount> {
        ContainerCount::create(pool, self.build()).await
    }

    /// Create with an explicit submission instant, for back-dated fixtures
    pub async fn create_at(
        &self,
        pool: &PgPool,
        submitted_at: DateTime<Utc>,
    ) -> sqlx::Result<ContainerCount> {
        sqlx::query_as::<_, ContainerCount>(
            r#"
            INSERT INTO daily_container_counts
                (store_id, submitted_at, opener_name, arrival_time, donation_count,
                 trailer_fullness, hardlines_raw, softlines_raw, canvases, sleeves, caps, totes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, store_id, submitted_at, opener_name, arrival_time,
                      donation_count, trailer_fullness, hardlines_raw, softlines_raw,
                      canvases, sleeves, caps, totes
            "#,
        )
        .bind(self.store_id)
        .bind(submitted_at)
        .bind(&self.opener_name)
        .bind(self.arrival_time)
        .bind(self.donation_count)
        .bind(self.trailer_fullness)
        .bind(self.hardlines_raw)
        .bind(self.softlines_raw)
        .bind(self.canvases)
        .bind(self.sleeves)
        .bind(self.caps)
        .bind(self.totes)
        .fetch_one(pool)
        .await
    }
}

/// Force a run to Cancelled directly, bypassing the cycle, for fixtures
/// that need a terminal run
pub async fn cancel_run(pool: &PgPool, run_id: Uuid) -> sqlx::Result<()> {
    sqlx::query("UPDATE active_delivery_runs SET status = 'Cancelled' WHERE id = $1")
        .bind(run_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Poll a condition until it holds or the timeout elapses
pub async fn eventually<F>(mut check: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    check()
}
