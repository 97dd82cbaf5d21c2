//! Store Model Tests
//!
//! Tests for the read-only store directory using SQLx native testing

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::StoreFactory;
use dispatch_core::models::Store;

#[sqlx::test]
async fn test_list_active_orders_by_department(pool: PgPool) -> sqlx::Result<()> {
    StoreFactory::new()
        .with_name("Hilltop")
        .with_department("9003")
        .create(&pool)
        .await?;
    StoreFactory::new()
        .with_name("Riverside")
        .with_department("9001")
        .create(&pool)
        .await?;
    StoreFactory::new()
        .with_name("Lakeview")
        .with_department("9002")
        .inactive()
        .create(&pool)
        .await?;

    let active = Store::list_active(&pool).await?;

    // Inactive stores never appear; order follows department number
    let departments: Vec<&str> = active
        .iter()
        .map(|s| s.department_number.as_str())
        .collect();
    assert_eq!(departments, vec!["9001", "9003"]);
    assert!(active.iter().all(|s| s.is_active));

    Ok(())
}

#[sqlx::test]
async fn test_find_by_id(pool: PgPool) -> sqlx::Result<()> {
    let created = StoreFactory::new().with_name("Riverside").create(&pool).await?;

    let found = Store::find_by_id(&pool, created.id)
        .await?
        .expect("Store not found");
    assert_eq!(found.id, created.id);
    assert_eq!(found.name, "Riverside");

    let missing = Store::find_by_id(&pool, Uuid::new_v4()).await?;
    assert!(missing.is_none());

    Ok(())
}
