//! Change event emitters.
//!
//! The triggers installed by the schema migrations emit change events for
//! every row mutation, so normal writes need no application-side emission.
//! [`DbEmitter`] exists for the cases that bypass the triggers, synthetic
//! events in tests and manual repair tooling, and publishes over the same
//! channels the feed listens on.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};

use crate::config::FeedConfig;
use crate::error::{DispatchError, Result};
use crate::events::change::ChangeEvent;

/// Trait for emitting change events
#[async_trait]
pub trait ChangeEmitter: Send + Sync {
    /// Emit a change event to its table's channel
    async fn emit_change(&self, event: ChangeEvent) -> Result<()>;

    /// Check if the emitter is healthy and can send notifications
    async fn is_healthy(&self) -> bool;
}

/// Database-backed emitter using `pg_notify`
pub struct DbEmitter {
    pool: PgPool,
    config: FeedConfig,
}

impl std::fmt::Debug for DbEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbEmitter")
            .field("config", &self.config)
            .field("pool", &"PgPool")
            .finish()
    }
}

impl DbEmitter {
    /// Create a new database emitter
    pub fn new(pool: PgPool, config: FeedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { pool, config })
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Serialize an event with size validation
    fn build_payload(&self, event: &ChangeEvent) -> Result<String> {
        let payload = serde_json::to_string(event)?;

        if payload.len() > self.config.max_payload_size {
            return Err(DispatchError::change_feed(format!(
                "payload size {} exceeds limit {}",
                payload.len(),
                self.config.max_payload_size
            )));
        }

        Ok(payload)
    }

    /// Send a notification to a channel
    #[instrument(skip(self, payload), fields(channel = %channel))]
    async fn notify_channel(&self, channel: &str, payload: &str) -> Result<()> {
        debug!(channel = %channel, "Sending change notification");

        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(channel)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(channel = %channel, error = %e, "Failed to send change notification");
                DispatchError::from(e)
            })?;

        Ok(())
    }
}

#[async_trait]
impl ChangeEmitter for DbEmitter {
    #[instrument(skip(self, event), fields(table = %event.table, op = %event.op, row_id = %event.row_id))]
    async fn emit_change(&self, event: ChangeEvent) -> Result<()> {
        let payload = self.build_payload(&event)?;
        let channel = self.config.channel_for_table(event.table.table_name());

        self.notify_channel(&channel, &payload).await
    }

    async fn is_healthy(&self) -> bool {
        match self.pool.acquire().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Database emitter health check failed");
                false
            }
        }
    }
}

/// No-operation emitter for tests and disabled scenarios
#[derive(Debug, Clone)]
pub struct NoopEmitter {
    config: FeedConfig,
}

impl NoopEmitter {
    /// Create a new no-op emitter
    pub fn new(config: FeedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }
}

#[async_trait]
impl ChangeEmitter for NoopEmitter {
    async fn emit_change(&self, event: ChangeEvent) -> Result<()> {
        debug!(
            table = %event.table,
            op = %event.op,
            row_id = %event.row_id,
            "NoopEmitter: would emit change event"
        );
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
