use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::constants::system::TRAILER_FULLNESS_MAX;
use crate::error::DispatchError;
use crate::models::store::Store;

/// ContainerCount is one morning submission from a store opener.
/// Maps to `daily_container_counts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContainerCount {
    pub id: Uuid,
    pub store_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub opener_name: String,
    pub arrival_time: NaiveTime,
    pub donation_count: i32,
    pub trailer_fullness: i32,
    pub hardlines_raw: i32,
    pub softlines_raw: i32,
    pub canvases: i32,
    pub sleeves: i32,
    pub caps: i32,
    pub totes: i32,
}

/// New ContainerCount for creation (without generated fields)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContainerCount {
    pub store_id: Uuid,
    pub opener_name: String,
    pub arrival_time: NaiveTime,
    pub donation_count: i32,
    pub trailer_fullness: i32,
    pub hardlines_raw: i32,
    pub softlines_raw: i32,
    pub canvases: i32,
    pub sleeves: i32,
    pub caps: i32,
    pub totes: i32,
}

/// One row of the container log: a submission joined with store identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContainerLogEntry {
    pub id: Uuid,
    pub store_id: Uuid,
    pub store_name: String,
    pub department_number: String,
    pub submitted_at: DateTime<Utc>,
    pub opener_name: String,
    pub arrival_time: NaiveTime,
    pub donation_count: i32,
    pub trailer_fullness: i32,
    pub hardlines_raw: i32,
    pub softlines_raw: i32,
    pub canvases: i32,
    pub sleeves: i32,
    pub caps: i32,
    pub totes: i32,
}

impl NewContainerCount {
    /// Validate the submission before any storage command is issued.
    ///
    /// Opener name must be non-blank, trailer fullness is a percentage, and
    /// no quantity may be negative.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.opener_name.trim().is_empty() {
            return Err(DispatchError::validation(
                "opener_name",
                "must not be empty",
            ));
        }

        if self.trailer_fullness < 0 || self.trailer_fullness > TRAILER_FULLNESS_MAX {
            return Err(DispatchError::validation(
                "trailer_fullness",
                format!("must be between 0 and {TRAILER_FULLNESS_MAX}"),
            ));
        }

        let quantities = [
            ("donation_count", self.donation_count),
            ("hardlines_raw", self.hardlines_raw),
            ("softlines_raw", self.softlines_raw),
            ("canvases", self.canvases),
            ("sleeves", self.sleeves),
            ("caps", self.caps),
            ("totes", self.totes),
        ];
        for (field, value) in quantities {
            if value < 0 {
                return Err(DispatchError::validation(field, "must not be negative"));
            }
        }

        Ok(())
    }
}

impl ContainerCount {
    /// Insert a submission
    pub async fn create(
        pool: &PgPool,
        new_count: NewContainerCount,
    ) -> Result<ContainerCount, sqlx::Error> {
        sqlx::query_as::<_, ContainerCount>(
            r#"
            INSERT INTO daily_container_counts
                (store_id, opener_name, arrival_time, donation_count, trailer_fullness,
                 hardlines_raw, softlines_raw, canvases, sleeves, caps, totes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, store_id, submitted_at, opener_name, arrival_time,
                      donation_count, trailer_fullness, hardlines_raw, softlines_raw,
                      canvases, sleeves, caps, totes
            "#,
        )
        .bind(new_count.store_id)
        .bind(new_count.opener_name)
        .bind(new_count.arrival_time)
        .bind(new_count.donation_count)
        .bind(new_count.trailer_fullness)
        .bind(new_count.hardlines_raw)
        .bind(new_count.softlines_raw)
        .bind(new_count.canvases)
        .bind(new_count.sleeves)
        .bind(new_count.caps)
        .bind(new_count.totes)
        .fetch_one(pool)
        .await
    }

    /// Find a store's submission inside a time window, most recent first
    pub async fn find_by_store_between(
        pool: &PgPool,
        store_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<ContainerCount>, sqlx::Error> {
        sqlx::query_as::<_, ContainerCount>(
            r#"
            SELECT id, store_id, submitted_at, opener_name, arrival_time,
                   donation_count, trailer_fullness, hardlines_raw, softlines_raw,
                   canvases, sleeves, caps, totes
            FROM daily_container_counts
            WHERE store_id = $1 AND submitted_at >= $2 AND submitted_at < $3
            ORDER BY submitted_at DESC
            LIMIT 1
            "#,
        )
        .bind(store_id)
        .bind(start)
        .bind(end)
        .fetch_optional(pool)
        .await
    }

    /// List submissions inside a time window joined with store identity,
    /// ordered by department number
    pub async fn log_between(
        pool: &PgPool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ContainerLogEntry>, sqlx::Error> {
        sqlx::query_as::<_, ContainerLogEntry>(
            r#"
            SELECT c.id, c.store_id, s.name AS store_name,
                   s.department_number, c.submitted_at, c.opener_name, c.arrival_time,
                   c.donation_count, c.trailer_fullness, c.hardlines_raw, c.softlines_raw,
                   c.canvases, c.sleeves, c.caps, c.totes
            FROM daily_container_counts c
            INNER JOIN stores s ON s.id = c.store_id
            WHERE c.submitted_at >= $1 AND c.submitted_at < $2
            ORDER BY s.department_number
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    /// Active stores with no submission inside a time window
    pub async fn missing_between(
        pool: &PgPool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Store>, sqlx::Error> {
        sqlx::query_as::<_, Store>(
            r#"
            SELECT s.id, s.name, s.department_number, s.is_active, s.created_at, s.updated_at
            FROM stores s
            WHERE s.is_active = TRUE
              AND NOT EXISTS (
                  SELECT 1 FROM daily_container_counts c
                  WHERE c.store_id = s.id
                    AND c.submitted_at >= $1 AND c.submitted_at < $2
              )
            ORDER BY s.department_number
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    /// Delete every submission inside a time window, returning the row count
    pub async fn delete_between(
        pool: &PgPool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM daily_container_counts
            WHERE submitted_at >= $1 AND submitted_at < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
