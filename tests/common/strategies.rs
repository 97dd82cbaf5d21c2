use chrono::{DateTime, Utc};
use proptest::prelude::*;

use dispatch_core::models::NewContainerCount;
use dispatch_core::state_machine::{RunEvent, RunStatus, TimestampField};
use uuid::Uuid;

/// Strategy for generating run statuses
pub fn run_status_strategy() -> impl Strategy<Value = RunStatus> {
    prop_oneof![
        Just(RunStatus::Upcoming),
        Just(RunStatus::Preloaded),
        Just(RunStatus::Complete),
        Just(RunStatus::Cancelled),
    ]
}

/// Strategy for generating timestamp fields
pub fn timestamp_field_strategy() -> impl Strategy<Value = TimestampField> {
    prop_oneof![
        Just(TimestampField::Start),
        Just(TimestampField::Preload),
        Just(TimestampField::Complete),
        Just(TimestampField::Depart),
    ]
}

/// Strategy for generating run events
pub fn run_event_strategy() -> impl Strategy<Value = RunEvent> {
    prop_oneof![
        Just(RunEvent::CycleRequested),
        timestamp_field_strategy().prop_map(RunEvent::TimestampSet),
    ]
}

/// Strategy for generating instants at second precision
pub fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..=2_000_000_000i64).prop_map(|secs| {
        DateTime::from_timestamp(secs, 0).expect("seconds in range")
    })
}

/// Strategy for generating opener names
pub fn opener_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,15}( [A-Z][a-z]{1,15})?"
}

/// Strategy for generating container quantities
pub fn quantity_strategy() -> impl Strategy<Value = i32> {
    0i32..=500
}

/// Strategy for generating NewContainerCount submissions that pass
/// validation
pub fn valid_submission_strategy() -> impl Strategy<Value = NewContainerCount> {
    (
        opener_name_strategy(),
        0u32..24,
        0u32..60,
        quantity_strategy(),
        0i32..=100,
        prop::collection::vec(quantity_strategy(), 6),
    )
        .prop_map(
            |(opener_name, hour, minute, donation_count, trailer_fullness, quantities)| {
                NewContainerCount {
                    store_id: Uuid::new_v4(),
                    opener_name,
                    arrival_time: chrono::NaiveTime::from_hms_opt(hour, minute, 0)
                        .expect("time in range"),
                    donation_count,
                    trailer_fullness,
                    hardlines_raw: quantities[0],
                    softlines_raw: quantities[1],
                    canvases: quantities[2],
                    sleeves: quantities[3],
                    caps: quantities[4],
                    totes: quantities[5],
                }
            },
        )
}
