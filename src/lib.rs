#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dispatch Core
//!
//! Core engine for a delivery-run dispatch dashboard: truck runs assigned to
//! stores across the three daily windows (Morning, Afternoon, ADC), tracked
//! through a cyclic status lifecycle and rendered alongside each store's
//! current supply needs.
//!
//! ## Overview
//!
//! The crate owns run scheduling state and its change notifications. Stores
//! and their par levels are externally managed reference data; supply math
//! happens in a database view. The core joins, orders, and projects, and it
//! pushes change signals so every open dashboard converges on the same
//! board without polling.
//!
//! ## Architecture
//!
//! Writes flow through [`services::DispatchService`] into PostgreSQL, where
//! row triggers publish minimal change payloads over LISTEN/NOTIFY. An
//! [`events::ChangeFeed`] decodes and fans those out to subscribed
//! [`services::DashboardSession`]s, each of which reacts by refetching the
//! whole board. Payloads carry no row content, so a dropped or coalesced
//! signal can never leave a session showing stale rows for long: the next
//! signal triggers the same full refetch.
//!
//! Status changes all pass through one transition function in
//! [`state_machine`]: cycling Upcoming → Preloaded → Complete → Cancelled →
//! Upcoming (clearing timestamps on the wrap), and timestamp stamping that
//! forces Preloaded/Complete where the operational flow implies it.
//!
//! ## Module Organization
//!
//! - [`models`] - Data layer: runs, stores, supply needs, container counts
//! - [`state_machine`] - Run status lifecycle and timestamp effects
//! - [`services`] - Dispatch commands, board projection, live sessions
//! - [`events`] - LISTEN/NOTIFY change feed
//! - [`database`] - Connections and schema migrations
//! - [`config`] - YAML configuration with environment overrides
//! - [`error`] - Structured error handling
//! - [`constants`] - Channel names, table names, system limits
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dispatch_core::database::DatabaseConnection;
//! use dispatch_core::services::DispatchService;
//! use dispatch_core::state_machine::{RunType, TruckType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = DatabaseConnection::new().await?;
//! let service = DispatchService::new(connection.pool().clone());
//!
//! let stores = service.eligible_stores(RunType::Morning).await?;
//! if let Some(store) = stores.first() {
//!     let run = service
//!         .add_run(store.id, RunType::Morning, TruckType::BoxTruck)
//!         .await?;
//!     println!("run {} at position {}", run.id, run.position);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Integration tests use SQLx native testing with automatic database
//! isolation per test:
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod services;
pub mod state_machine;

pub use config::{ConfigManager, DatabaseConfig, DispatchConfig, FeedConfig, LoggingConfig};
pub use constants::{channels, status_groups, system, tables};
pub use error::{DispatchError, Result};
pub use events::{ChangeEvent, ChangeFeed, ChangeOp, ChangeTable};
pub use models::{
    ContainerCount, ContainerLogEntry, DeliveryRun, NewContainerCount, NewDeliveryRun, RunPatch,
    Store, SupplyNeed,
};
pub use services::{DashboardSession, DashboardSnapshot, DispatchService, TruckFilter};
pub use state_machine::{RunEvent, RunStatus, RunType, TimestampField, TruckType};
