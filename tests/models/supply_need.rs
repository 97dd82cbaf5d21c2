//! Supply Need View Tests
//!
//! The `run_supply_needs` view owns the par arithmetic; the model just
//! reads it. These tests pin the view's contract: par minus latest count,
//! floored at zero, with zero rows for stores missing pars or counts.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::common::{seed_par_levels, CountFactory, ParLevels, StoreFactory};
use dispatch_core::models::SupplyNeed;

#[sqlx::test]
async fn test_needs_are_par_minus_latest_count(pool: PgPool) -> sqlx::Result<()> {
    let store = StoreFactory::new().create(&pool).await?;
    seed_par_levels(
        &pool,
        store.id,
        ParLevels {
            hardlines: 10,
            softlines: 8,
            canvases: 6,
            sleeves: 4,
            caps: 2,
            totes: 12,
        },
    )
    .await?;

    CountFactory::new(store.id)
        .with_quantities(4, 8, 9, 1, 0, 5)
        .create(&pool)
        .await?;

    let need = SupplyNeed::find_by_store(&pool, store.id)
        .await?
        .expect("view row for store");

    assert_eq!(need.hardlines_needed, 6);
    // Counted exactly at par
    assert_eq!(need.softlines_needed, 0);
    // Counted above par clamps to zero, never negative
    assert_eq!(need.canvases_needed, 0);
    assert_eq!(need.sleeves_needed, 3);
    assert_eq!(need.caps_needed, 2);
    assert_eq!(need.totes_needed, 7);

    Ok(())
}

#[sqlx::test]
async fn test_latest_count_wins(pool: PgPool) -> sqlx::Result<()> {
    let store = StoreFactory::new().create(&pool).await?;
    seed_par_levels(&pool, store.id, ParLevels::uniform(10)).await?;

    let earlier = Utc::now() - Duration::hours(2);
    CountFactory::new(store.id)
        .with_quantities(1, 1, 1, 1, 1, 1)
        .create_at(&pool, earlier)
        .await?;
    CountFactory::new(store.id)
        .with_quantities(7, 7, 7, 7, 7, 7)
        .create(&pool)
        .await?;

    let need = SupplyNeed::find_by_store(&pool, store.id)
        .await?
        .expect("view row for store");

    // Only the most recent submission feeds the arithmetic
    assert_eq!(need.hardlines_needed, 3);
    assert_eq!(need.totes_needed, 3);

    Ok(())
}

#[sqlx::test]
async fn test_store_without_pars_or_counts_reads_zero(pool: PgPool) -> sqlx::Result<()> {
    let bare = StoreFactory::new().with_department("9001").create(&pool).await?;
    let counted_only = StoreFactory::new().with_department("9002").create(&pool).await?;
    CountFactory::new(counted_only.id)
        .with_quantities(5, 5, 5, 5, 5, 5)
        .create(&pool)
        .await?;

    // No par row and no count
    let need = SupplyNeed::find_by_store(&pool, bare.id)
        .await?
        .expect("view row for store");
    assert_eq!(need, SupplyNeed::zero(bare.id));

    // Counts without pars still floor at zero
    let need = SupplyNeed::find_by_store(&pool, counted_only.id)
        .await?
        .expect("view row for store");
    assert_eq!(need, SupplyNeed::zero(counted_only.id));

    Ok(())
}

#[sqlx::test]
async fn test_fetch_all_covers_every_store(pool: PgPool) -> sqlx::Result<()> {
    let s1 = StoreFactory::new().with_department("9001").create(&pool).await?;
    let s2 = StoreFactory::new().with_department("9002").create(&pool).await?;
    seed_par_levels(&pool, s1.id, ParLevels::uniform(5)).await?;

    let all = SupplyNeed::fetch_all(&pool).await?;

    let for_s1 = all.iter().find(|n| n.store_id == s1.id).expect("s1 row");
    let for_s2 = all.iter().find(|n| n.store_id == s2.id).expect("s2 row");

    // Pars with no count yet: full par is needed
    assert_eq!(for_s1.hardlines_needed, 5);
    assert_eq!(*for_s2, SupplyNeed::zero(s2.id));

    Ok(())
}
