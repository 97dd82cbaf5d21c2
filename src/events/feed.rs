//! Change feed built on PostgreSQL LISTEN/NOTIFY.
//!
//! [`ChangeFeed`] holds one `PgListener` connection and listens on the
//! notification channel of each watched table it is told to follow. A
//! background task decodes incoming payloads into [`ChangeEvent`]s and fans
//! them out over per-table broadcast channels, so any number of dashboard
//! sessions can watch the same table without extra database connections.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use parking_lot::RwLock;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::config::FeedConfig;
use crate::error::{DispatchError, Result};
use crate::events::change::{ChangeEvent, ChangeTable};

/// Statistics about the feed
#[derive(Debug, Clone, Default)]
pub struct FeedStats {
    pub connected: bool,
    pub channels_listening: usize,
    pub events_received: u64,
    pub events_delivered: u64,
    pub parse_errors: u64,
    pub connection_errors: u64,
    pub last_event_at: Option<SystemTime>,
    pub last_error_at: Option<SystemTime>,
}

/// Trait for handling decoded change events
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    /// Handle a received change event
    async fn handle_change(&self, event: ChangeEvent) -> Result<()>;

    /// Handle a notification that failed to decode
    async fn handle_parse_error(&self, channel: &str, payload: &str, error: DispatchError) {
        warn!(
            channel = %channel,
            payload = %payload,
            error = %error,
            "Failed to decode change notification"
        );
    }

    /// Handle connection issues
    async fn handle_connection_error(&self, error: DispatchError) {
        error!(error = %error, "Connection error in change feed");
    }
}

/// Change feed over the dispatch notification channels
pub struct ChangeFeed {
    pool: PgPool,
    config: FeedConfig,
    listener: Option<PgListener>,
    listening: Arc<RwLock<HashSet<ChangeTable>>>,
    senders: Arc<DashMap<ChangeTable, broadcast::Sender<ChangeEvent>>>,
    stats: Arc<RwLock<FeedStats>>,
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("config", &self.config)
            .field("connected", &self.listener.is_some())
            .field("channels_listening", &self.listening.read().len())
            .finish()
    }
}

impl ChangeFeed {
    /// Create a new change feed
    pub fn new(pool: PgPool, config: FeedConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            pool,
            config,
            listener: None,
            listening: Arc::new(RwLock::new(HashSet::new())),
            senders: Arc::new(DashMap::new()),
            stats: Arc::new(RwLock::new(FeedStats::default())),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Get feed statistics
    pub fn stats(&self) -> FeedStats {
        self.stats.read().clone()
    }

    /// Whether the feed has an open listener connection
    pub fn is_connected(&self) -> bool {
        self.stats.read().connected
    }

    /// Channels the feed is currently listening on
    pub fn channels(&self) -> Vec<String> {
        self.listening
            .read()
            .iter()
            .map(|table| self.config.channel_for_table(table.table_name()))
            .collect()
    }

    /// Open the listener connection.
    ///
    /// Connecting subscribes to nothing; follow up with [`ChangeFeed::listen`]
    /// or [`ChangeFeed::listen_all`] before starting the decode loop.
    #[instrument(skip(self))]
    pub async fn connect(&mut self) -> Result<()> {
        if self.listener.is_some() {
            debug!("Change feed already connected");
            return Ok(());
        }

        info!("Connecting change feed listener");
        let listener = PgListener::connect_with(&self.pool).await?;
        self.listener = Some(listener);
        self.stats.write().connected = true;

        info!("Change feed listener connected");
        Ok(())
    }

    /// Begin listening on one table's notification channel
    #[instrument(skip(self))]
    pub async fn listen(&mut self, table: ChangeTable) -> Result<()> {
        let listener = self
            .listener
            .as_mut()
            .ok_or_else(|| DispatchError::change_feed("listener is not connected"))?;

        if self.listening.read().contains(&table) {
            debug!(table = table.table_name(), "Already listening");
            return Ok(());
        }

        let channel = self.config.channel_for_table(table.table_name());
        listener.listen(&channel).await?;

        let listening_count = {
            let mut listening = self.listening.write();
            listening.insert(table);
            listening.len()
        };
        self.stats.write().channels_listening = listening_count;

        info!(channel = %channel, "Listening for changes");
        Ok(())
    }

    /// Stop listening on one table's notification channel
    #[instrument(skip(self))]
    pub async fn unlisten(&mut self, table: ChangeTable) -> Result<()> {
        let listener = self
            .listener
            .as_mut()
            .ok_or_else(|| DispatchError::change_feed("listener is not connected"))?;

        if !self.listening.read().contains(&table) {
            debug!(table = table.table_name(), "Not listening");
            return Ok(());
        }

        let channel = self.config.channel_for_table(table.table_name());
        listener.unlisten(&channel).await?;

        let listening_count = {
            let mut listening = self.listening.write();
            listening.remove(&table);
            listening.len()
        };
        self.stats.write().channels_listening = listening_count;

        info!(channel = %channel, "Stopped listening for changes");
        Ok(())
    }

    /// Listen on every watched table's channel
    pub async fn listen_all(&mut self) -> Result<()> {
        for table in ChangeTable::ALL {
            self.listen(table).await?;
        }
        Ok(())
    }

    /// Drop the listener connection
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(listener) = self.listener.take() {
            info!("Disconnecting change feed listener");
            drop(listener);
        }

        self.listening.write().clear();
        {
            let mut stats = self.stats.write();
            stats.connected = false;
            stats.channels_listening = 0;
        }

        Ok(())
    }

    /// Subscribe to change events for one table.
    ///
    /// Receivers only see events decoded after subscription; callers are
    /// expected to fetch current state first and then watch for changes.
    pub fn subscribe(&self, table: ChangeTable) -> broadcast::Receiver<ChangeEvent> {
        self.senders
            .entry(table)
            .or_insert_with(|| broadcast::channel(self.config.buffer_size).0)
            .subscribe()
    }

    /// Number of live subscribers for a table
    pub fn subscriber_count(&self, table: ChangeTable) -> usize {
        self.senders
            .get(&table)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Start the decode loop in a background task.
    ///
    /// The task runs until the notification stream ends or a connection
    /// error occurs. Returns the task handle so callers can await or abort
    /// shutdown.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<tokio::task::JoinHandle<()>> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| DispatchError::change_feed("listener is not connected"))?;

        if self.listening.read().is_empty() {
            warn!("Change feed started with no channels subscribed");
        }

        let senders = Arc::clone(&self.senders);
        let listening = Arc::clone(&self.listening);
        let stats = Arc::clone(&self.stats);

        info!("Starting change feed decode loop");

        let handle = tokio::spawn(async move {
            let mut stream = listener.into_stream();

            while let Some(notification) = stream.next().await {
                match notification {
                    Ok(notification) => {
                        debug!(
                            channel = %notification.channel(),
                            payload = %notification.payload(),
                            "Received change notification"
                        );

                        match decode_payload(notification.payload()) {
                            Ok(event) => route_event(&senders, &stats, event),
                            Err(e) => {
                                {
                                    let mut stats = stats.write();
                                    stats.parse_errors += 1;
                                    stats.last_error_at = Some(SystemTime::now());
                                }
                                warn!(
                                    channel = %notification.channel(),
                                    payload = %notification.payload(),
                                    error = %e,
                                    "Failed to decode change notification"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        {
                            let mut stats = stats.write();
                            stats.connection_errors += 1;
                            stats.last_error_at = Some(SystemTime::now());
                        }
                        error!(error = %e, "Change feed connection lost");
                        break;
                    }
                }
            }

            listening.write().clear();
            {
                let mut stats = stats.write();
                stats.connected = false;
                stats.channels_listening = 0;
            }
            info!("Change feed decode loop ended");
        });

        Ok(handle)
    }

    /// Run the decode loop inline, dispatching to a handler.
    ///
    /// Only returns when the notification stream ends or a connection error
    /// occurs. Use [`ChangeFeed::start`] for a detached background task.
    #[instrument(skip(self, handler))]
    pub async fn run_with_handler<H>(&mut self, handler: H) -> Result<()>
    where
        H: ChangeHandler + 'static,
    {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| DispatchError::change_feed("listener is not connected"))?;

        let handler = Arc::new(handler);
        let stats = Arc::clone(&self.stats);
        let mut stream = listener.into_stream();

        info!("Starting change feed handler loop");

        while let Some(notification) = stream.next().await {
            match notification {
                Ok(notification) => match decode_payload(notification.payload()) {
                    Ok(event) => {
                        {
                            let mut stats = stats.write();
                            stats.events_received += 1;
                            stats.last_event_at = Some(SystemTime::now());
                        }
                        if let Err(e) = handler.handle_change(event).await {
                            error!(error = %e, "Change handler failed");
                        }
                    }
                    Err(e) => {
                        {
                            let mut stats = stats.write();
                            stats.parse_errors += 1;
                            stats.last_error_at = Some(SystemTime::now());
                        }
                        handler
                            .handle_parse_error(notification.channel(), notification.payload(), e)
                            .await;
                    }
                },
                Err(e) => {
                    {
                        let mut stats = stats.write();
                        stats.connection_errors += 1;
                        stats.last_error_at = Some(SystemTime::now());
                    }
                    handler.handle_connection_error(e.into()).await;
                    break;
                }
            }
        }

        self.listening.write().clear();
        {
            let mut stats = self.stats.write();
            stats.connected = false;
            stats.channels_listening = 0;
        }

        info!("Change feed handler loop ended");
        Ok(())
    }
}

/// Decode a notification payload into a change event
fn decode_payload(payload: &str) -> Result<ChangeEvent> {
    Ok(serde_json::from_str(payload)?)
}

/// Route a decoded event to the broadcast channel for its table
fn route_event(
    senders: &DashMap<ChangeTable, broadcast::Sender<ChangeEvent>>,
    stats: &RwLock<FeedStats>,
    event: ChangeEvent,
) {
    {
        let mut stats = stats.write();
        stats.events_received += 1;
        stats.last_event_at = Some(SystemTime::now());
    }

    if let Some(sender) = senders.get(&event.table) {
        // A send error just means no live subscribers for this table
        if sender.send(event).is_ok() {
            stats.write().events_delivered += 1;
        }
    }
}
