//! Dispatch Flow Integration Tests
//!
//! A dispatcher's day driven entirely through [`DispatchService`]: adding
//! runs, stamping times, cycling status, and reading the assembled board.
//!
//! [`DispatchService`]: dispatch_core::services::DispatchService

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{seed_par_levels, CountFactory, ParLevels, StoreFactory};
use dispatch_core::error::DispatchError;
use dispatch_core::models::{RunPatch, SupplyNeed};
use dispatch_core::services::{DispatchService, TruckFilter};
use dispatch_core::state_machine::{RunStatus, RunType, TimestampField, TruckType};

#[sqlx::test]
async fn test_full_day_for_one_run(pool: PgPool) -> sqlx::Result<()> {
    let store = StoreFactory::new().with_name("Riverside").create(&pool).await?;
    let service = DispatchService::new(pool);

    let run = service
        .add_run(store.id, RunType::Morning, TruckType::BoxTruck)
        .await
        .expect("run added");
    assert_eq!(run.status, RunStatus::Upcoming);
    assert_eq!(run.position, 1);
    assert_eq!(run.store_name, "Riverside");

    // Preload crew stamps the start of loading; status holds at Upcoming
    let run = service
        .set_timestamp(&run, TimestampField::Start)
        .await
        .expect("start stamped");
    assert_eq!(run.status, RunStatus::Upcoming);
    assert!(run.start_time.is_some());

    // Preload done forces the matching status
    let run = service
        .set_timestamp(&run, TimestampField::Preload)
        .await
        .expect("preload stamped");
    assert_eq!(run.status, RunStatus::Preloaded);
    assert!(run.preload_time.is_some());

    let run = service
        .set_timestamp(&run, TimestampField::Complete)
        .await
        .expect("complete stamped");
    assert_eq!(run.status, RunStatus::Complete);
    assert!(run.complete_time.is_some());

    // Departure is recorded after the fact without moving status
    let run = service
        .set_timestamp(&run, TimestampField::Depart)
        .await
        .expect("depart stamped");
    assert_eq!(run.status, RunStatus::Complete);
    assert!(run.depart_time.is_some());

    // Cycling moves status only
    let run = service.cycle_status(&run).await.expect("cycled");
    assert_eq!(run.status, RunStatus::Cancelled);
    assert!(run.start_time.is_some());
    assert!(run.depart_time.is_some());

    // Wrapping around to Upcoming resets the day's times
    let run = service.cycle_status(&run).await.expect("cycled");
    assert_eq!(run.status, RunStatus::Upcoming);
    assert!(run.start_time.is_none());
    assert!(run.preload_time.is_none());
    assert!(run.complete_time.is_none());
    assert!(run.depart_time.is_none());

    Ok(())
}

#[sqlx::test]
async fn test_add_run_rejections(pool: PgPool) -> sqlx::Result<()> {
    let store = StoreFactory::new().create(&pool).await?;
    let service = DispatchService::new(pool);

    service
        .add_run(store.id, RunType::Morning, TruckType::BoxTruck)
        .await
        .expect("first run added");

    let err = service
        .add_run(store.id, RunType::Morning, TruckType::TractorTrailer)
        .await
        .expect_err("second active run in the window");
    assert!(matches!(err, DispatchError::DuplicateActiveRun { .. }));

    // A different window is a separate assignment
    service
        .add_run(store.id, RunType::Afternoon, TruckType::BoxTruck)
        .await
        .expect("afternoon run added");

    let err = service
        .add_run(Uuid::new_v4(), RunType::Morning, TruckType::BoxTruck)
        .await
        .expect_err("unknown store");
    assert!(matches!(err, DispatchError::StoreNotFound { .. }));

    Ok(())
}

#[sqlx::test]
async fn test_update_run_and_missing_runs(pool: PgPool) -> sqlx::Result<()> {
    let store = StoreFactory::new().create(&pool).await?;
    let service = DispatchService::new(pool.clone());

    let run = service
        .add_run(store.id, RunType::Adc, TruckType::TractorTrailer)
        .await
        .expect("run added");

    let run = service
        .update_run(run.id, RunPatch::Dock(Some("D4".to_string())))
        .await
        .expect("dock assigned");
    assert_eq!(run.dock.as_deref(), Some("D4"));

    let err = service
        .update_run(Uuid::new_v4(), RunPatch::Driver(None))
        .await
        .expect_err("missing run");
    assert!(matches!(err, DispatchError::RunNotFound { .. }));

    let err = service.find_run(Uuid::new_v4()).await.expect_err("missing run");
    assert!(err.is_not_found());

    // A run deleted out from under a held handle surfaces as not found
    sqlx::query("DELETE FROM active_delivery_runs WHERE id = $1")
        .bind(run.id)
        .execute(&pool)
        .await?;
    let err = service.cycle_status(&run).await.expect_err("deleted run");
    assert!(matches!(err, DispatchError::RunNotFound { .. }));

    Ok(())
}

#[sqlx::test]
async fn test_board_snapshot_joins_runs_and_needs(pool: PgPool) -> sqlx::Result<()> {
    let counted = StoreFactory::new()
        .with_name("Riverside")
        .with_department("9001")
        .create(&pool)
        .await?;
    let uncounted = StoreFactory::new()
        .with_name("Hillcrest")
        .with_department("9002")
        .create(&pool)
        .await?;
    seed_par_levels(&pool, counted.id, ParLevels::uniform(10)).await?;
    CountFactory::new(counted.id)
        .with_quantities(4, 4, 4, 4, 4, 4)
        .create(&pool)
        .await?;

    let service = DispatchService::new(pool);
    let morning_run = service
        .add_run(counted.id, RunType::Morning, TruckType::BoxTruck)
        .await
        .expect("morning run");
    service
        .add_run(uncounted.id, RunType::Morning, TruckType::TractorTrailer)
        .await
        .expect("second morning run");
    service
        .add_run(counted.id, RunType::Afternoon, TruckType::BoxTruck)
        .await
        .expect("afternoon run");

    let board = service
        .board_snapshot(TruckFilter::All)
        .await
        .expect("board snapshot");
    assert_eq!(board.total_runs(), 3);

    let morning = board.group(RunType::Morning).expect("morning group");
    assert_eq!(morning.len(), 2);
    assert_eq!(morning.rows[0].run.id, morning_run.id);
    // Par 10 minus counted 4 in every category
    assert_eq!(morning.rows[0].needs.hardlines_needed, 6);
    assert_eq!(morning.rows[1].needs, SupplyNeed::zero(uncounted.id));

    // Filtering drops the tractor trailer but keeps stable group layout
    let boxes = service
        .board_snapshot(TruckFilter::BoxTrucks)
        .await
        .expect("filtered snapshot");
    assert_eq!(boxes.total_runs(), 2);
    assert_eq!(boxes.group(RunType::Morning).expect("morning group").len(), 1);
    assert_eq!(boxes.groups.len(), 3);

    Ok(())
}

#[sqlx::test]
async fn test_store_rosters(pool: PgPool) -> sqlx::Result<()> {
    let assigned = StoreFactory::new().with_department("9001").create(&pool).await?;
    let free = StoreFactory::new().with_department("9002").create(&pool).await?;
    StoreFactory::new()
        .with_department("9003")
        .inactive()
        .create(&pool)
        .await?;

    let service = DispatchService::new(pool);
    assert_eq!(service.active_stores().await.expect("active stores").len(), 2);

    service
        .add_run(assigned.id, RunType::Morning, TruckType::BoxTruck)
        .await
        .expect("run added");

    let eligible = service
        .eligible_stores(RunType::Morning)
        .await
        .expect("eligible stores");
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0].id, free.id);

    // The hold applies per window
    let eligible = service
        .eligible_stores(RunType::Afternoon)
        .await
        .expect("eligible stores");
    assert_eq!(eligible.len(), 2);

    Ok(())
}
