//! # Dispatch Error Types
//!
//! Structured error handling for the dispatch core using thiserror,
//! with conversions from the storage and serialization layers.

use thiserror::Error;
use uuid::Uuid;

/// Error type covering every dispatch operation.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Store already has an active run of this type: {message}")]
    DuplicateActiveRun { message: String },

    #[error("Delivery run not found: {run_id}")]
    RunNotFound { run_id: Uuid },

    #[error("Store not found: {store_id}")]
    StoreNotFound { store_id: Uuid },

    #[error("Database error: {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("Change feed error: {message}")]
    ChangeFeed { message: String },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DispatchError {
    /// Create a validation error for a named input field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate active run error
    pub fn duplicate_active_run(message: impl Into<String>) -> Self {
        Self::DuplicateActiveRun {
            message: message.into(),
        }
    }

    /// Create a run not found error
    pub fn run_not_found(run_id: Uuid) -> Self {
        Self::RunNotFound { run_id }
    }

    /// Create a store not found error
    pub fn store_not_found(store_id: Uuid) -> Self {
        Self::StoreNotFound { store_id }
    }

    /// Create a database error for a named operation
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a change feed error
    pub fn change_feed(message: impl Into<String>) -> Self {
        Self::ChangeFeed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// True for input errors detected before any storage command was issued
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// True when the referenced run or store row was absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RunNotFound { .. } | Self::StoreNotFound { .. })
    }
}

/// Conversion from sqlx::Error to DispatchError
impl From<sqlx::Error> for DispatchError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DispatchError::database("query", "no rows found"),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DispatchError::duplicate_active_run(db_err.to_string())
                } else if db_err.is_check_violation() {
                    DispatchError::validation("database_check", db_err.to_string())
                } else {
                    DispatchError::database("database", db_err.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => {
                DispatchError::database("connection_pool", "pool timed out")
            }
            sqlx::Error::PoolClosed => DispatchError::database("connection_pool", "pool is closed"),
            sqlx::Error::Configuration(config_err) => {
                DispatchError::configuration("database", config_err.to_string())
            }
            _ => DispatchError::database("connection", err.to_string()),
        }
    }
}

/// Conversion from serde_json::Error to DispatchError
impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::serialization(err.to_string())
    }
}

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;
