//! # Dashboard Session
//!
//! One open dashboard: a change feed subscription paired with a cached
//! board snapshot. Change events carry no row content, so the session
//! reacts to every signal the same way, by refetching the whole board.
//! Signals are level-triggered: a lagged or coalesced notification just
//! means the next refresh happens a little later, never that state is
//! lost.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::events::{ChangeFeed, ChangeTable};
use crate::services::dispatch_service::DispatchService;
use crate::services::projection::{DashboardSnapshot, TruckFilter};

/// A live dashboard view backed by the change feed
pub struct DashboardSession {
    service: DispatchService,
    snapshot: Arc<RwLock<DashboardSnapshot>>,
    filter: Arc<RwLock<TruckFilter>>,
    refreshes: Arc<AtomicU64>,
    watcher: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("filter", &*self.filter.read())
            .field("refreshes", &self.refreshes.load(Ordering::Relaxed))
            .field("watching", &self.is_watching())
            .finish()
    }
}

impl DashboardSession {
    /// Open a session: fetch the initial board and start watching for
    /// changes.
    ///
    /// The session subscribes to both watched tables, since run mutations
    /// and container count submissions both change what the board shows.
    #[instrument(skip(service, feed))]
    pub async fn open(service: DispatchService, feed: &ChangeFeed) -> Result<DashboardSession> {
        Self::open_with_filter(service, feed, TruckFilter::default()).await
    }

    /// Open a session with an explicit truck filter
    #[instrument(skip(service, feed))]
    pub async fn open_with_filter(
        service: DispatchService,
        feed: &ChangeFeed,
        filter: TruckFilter,
    ) -> Result<DashboardSession> {
        let initial = service.board_snapshot(filter).await?;

        let snapshot = Arc::new(RwLock::new(initial));
        let filter = Arc::new(RwLock::new(filter));
        let refreshes = Arc::new(AtomicU64::new(0));

        let mut runs_rx = feed.subscribe(ChangeTable::DeliveryRuns);
        let mut counts_rx = feed.subscribe(ChangeTable::ContainerCounts);

        let watcher = {
            let service = service.clone();
            let snapshot = Arc::clone(&snapshot);
            let filter = Arc::clone(&filter);
            let refreshes = Arc::clone(&refreshes);

            tokio::spawn(async move {
                loop {
                    let signal = tokio::select! {
                        result = runs_rx.recv() => result,
                        result = counts_rx.recv() => result,
                    };

                    match signal {
                        Ok(event) => {
                            debug!(
                                table = %event.table,
                                op = %event.op,
                                row_id = %event.row_id,
                                "Change signal, refreshing board"
                            );
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            // Dropped signals are harmless, one refresh
                            // catches up on all of them
                            warn!(skipped = skipped, "Session lagged behind change feed");
                        }
                        Err(RecvError::Closed) => {
                            info!("Change feed closed, session watcher stopping");
                            break;
                        }
                    }

                    let current_filter = *filter.read();
                    match service.board_snapshot(current_filter).await {
                        Ok(fresh) => {
                            *snapshot.write() = fresh;
                            refreshes.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            // Keep showing the last good board
                            warn!(error = %e, "Board refresh failed, keeping last snapshot");
                        }
                    }
                }
            })
        };

        info!("Dashboard session opened");

        Ok(DashboardSession {
            service,
            snapshot,
            filter,
            refreshes,
            watcher: Some(watcher),
        })
    }

    /// The current board snapshot
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.read().clone()
    }

    /// The active truck filter
    pub fn filter(&self) -> TruckFilter {
        *self.filter.read()
    }

    /// How many times the board has refreshed since opening, not counting
    /// the initial fetch
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Whether the change watcher is still running
    pub fn is_watching(&self) -> bool {
        self.watcher
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Explicitly refetch the board
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<DashboardSnapshot> {
        let current_filter = *self.filter.read();
        let fresh = self.service.board_snapshot(current_filter).await?;

        *self.snapshot.write() = fresh.clone();
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        Ok(fresh)
    }

    /// Change the truck filter and refetch
    #[instrument(skip(self))]
    pub async fn set_filter(&self, filter: TruckFilter) -> Result<DashboardSnapshot> {
        *self.filter.write() = filter;
        self.refresh().await
    }

    /// Close the session, releasing the change subscription
    pub fn close(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
            info!("Dashboard session closed");
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.close();
    }
}
