use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// SupplyNeed is one row of the `run_supply_needs` view: replenishment
/// quantities per supply category for a store.
///
/// The storage projection computes each quantity as the store's par level
/// minus its most recent counted quantity, floored at zero. No par
/// arithmetic happens on the application side; this model only reads the
/// result and supplies the all-zero default for stores without a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SupplyNeed {
    pub store_id: Uuid,
    pub sleeves_needed: i32,
    pub caps_needed: i32,
    pub canvases_needed: i32,
    pub totes_needed: i32,
    pub hardlines_needed: i32,
    pub softlines_needed: i32,
}

impl SupplyNeed {
    /// All-zero needs, used when a store has no projection row
    pub fn zero(store_id: Uuid) -> Self {
        Self {
            store_id,
            sleeves_needed: 0,
            caps_needed: 0,
            canvases_needed: 0,
            totes_needed: 0,
            hardlines_needed: 0,
            softlines_needed: 0,
        }
    }

    /// Fetch the full projection
    pub async fn fetch_all(pool: &PgPool) -> Result<Vec<SupplyNeed>, sqlx::Error> {
        sqlx::query_as::<_, SupplyNeed>(
            r#"
            SELECT store_id, sleeves_needed, caps_needed, canvases_needed,
                   totes_needed, hardlines_needed, softlines_needed
            FROM run_supply_needs
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Fetch one store's needs
    pub async fn find_by_store(
        pool: &PgPool,
        store_id: Uuid,
    ) -> Result<Option<SupplyNeed>, sqlx::Error> {
        sqlx::query_as::<_, SupplyNeed>(
            r#"
            SELECT store_id, sleeves_needed, caps_needed, canvases_needed,
                   totes_needed, hardlines_needed, softlines_needed
            FROM run_supply_needs
            WHERE store_id = $1
            "#,
        )
        .bind(store_id)
        .fetch_optional(pool)
        .await
    }
}
