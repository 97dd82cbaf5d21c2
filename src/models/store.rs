use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Store represents a retail location served by dispatch.
/// Maps to `stores` table. The store roster is owned by an external
/// directory; this subsystem only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub department_number: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// List active stores ordered by department number
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Store>, sqlx::Error> {
        sqlx::query_as::<_, Store>(
            r#"
            SELECT id, name, department_number, is_active, created_at, updated_at
            FROM stores
            WHERE is_active = TRUE
            ORDER BY department_number
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Find a store by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Store>, sqlx::Error> {
        sqlx::query_as::<_, Store>(
            r#"
            SELECT id, name, department_number, is_active, created_at, updated_at
            FROM stores
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
