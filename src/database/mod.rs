//! # Database Operations
//!
//! Connection management and schema migrations for the dispatch core.
//!
//! ## Key Components
//!
//! - [`connection`] - Connection pooling with configuration-driven sizing
//! - [`migrations`] - Schema migration system with concurrency control
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dispatch_core::database::{DatabaseConnection, DispatchMigrations};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseConnection::new().await?;
//! DispatchMigrations::run_all(db.pool()).await?;
//! assert!(db.health_check().await?);
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::DispatchMigrations;
