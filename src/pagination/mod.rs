//! Pagination controller.
//!
//! [`PaginationController`] owns the paging state of one article list and exposes
//! the operations the presentation layer drives it with:
//! - [`initialize`](PaginationController::initialize) - first load on mount
//! - [`load_more`](PaginationController::load_more) - append the next page
//! - [`refresh`](PaginationController::refresh) - reload page 1 of the current query
//! - [`update_filters`](PaginationController::update_filters) - switch query
//! - [`shutdown`](PaginationController::shutdown) - teardown
//!
//! At most one request is live. Starting a fetch cancels the previous request's
//! [`CancellationToken`] and bumps a generation counter; a completion whose
//! generation is no longer current is discarded without touching state, even if the
//! underlying transport ignored the cancellation. Dropping an operation's future
//! mid-fetch releases the live request and its loading flags.
//!
//! Errors never clear the list. They are stored in
//! [`ControllerState::last_error`] and broadcast as [`Notification`]s.

mod state;

pub use state::{ControllerState, LoadPhase};

use crate::articles::{ArticleService, ArticleSource};
use crate::client::FetchClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{FilterParams, FilterUpdate, LoadMoreHandler, Notification, PageResult};
use state::FetchReason;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the notification channel
const NOTIFICATION_CAPACITY: usize = 64;

/// Result of one controller operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page was merged into the list
    Applied {
        /// Number of articles on the applied page
        items: usize,
    },
    /// The operation was a no-op (already loading, nothing more, or shut down)
    Skipped,
    /// A newer operation or teardown took over; state was left untouched
    Superseded,
    /// The fetch failed; the message is in `last_error`
    Failed(Error),
}

/// The request currently allowed to apply its result
struct InFlight {
    generation: u64,
    token: CancellationToken,
}

struct Inner {
    state: ControllerState,
    in_flight: Option<InFlight>,
    generation: u64,
    closed: bool,
}

struct Shared {
    source: Arc<dyn ArticleSource>,
    inner: Mutex<Inner>,
    notifications: broadcast::Sender<Notification>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let inner = self
            .inner
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(in_flight) = inner.in_flight.take() {
            in_flight.token.cancel();
        }
    }
}

/// Paging state machine for one article list (cloneable - all handles share state)
#[derive(Clone)]
pub struct PaginationController {
    shared: Arc<Shared>,
}

struct Ticket {
    generation: u64,
    token: CancellationToken,
    reason: FetchReason,
    params: FilterParams,
}

impl PaginationController {
    /// Create a controller for `initial` without fetching anything yet
    pub fn new(source: Arc<dyn ArticleSource>, initial: FilterParams) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                source,
                inner: Mutex::new(Inner {
                    state: ControllerState::new(initial),
                    in_flight: None,
                    generation: 0,
                    closed: false,
                }),
                notifications,
            }),
        }
    }

    /// Build the whole pipeline (fetch client, article service, controller) from
    /// configuration, starting from the configured initial query
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be
    /// created.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Arc::new(FetchClient::new(config)?);
        let service = ArticleService::new(client);

        let mut initial = FilterParams::new(config.paging.page_size);
        initial.category = config.paging.initial_category.clone();
        initial.search_text = config.paging.initial_query.clone();

        Ok(Self::new(Arc::new(service), initial))
    }

    /// Subscribe to notifications (errors, refresh confirmations)
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifications.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ControllerState {
        self.lock().state.clone()
    }

    /// Whether another page is available
    pub fn has_more(&self) -> bool {
        self.lock().state.has_more
    }

    /// Whether a fetch is in flight
    pub fn is_loading(&self) -> bool {
        self.lock().state.is_loading
    }

    /// Load page 1 of the current query, replacing the list
    pub async fn initialize(&self) -> FetchOutcome {
        let ticket = {
            let mut inner = self.lock();
            let params = Self::requested_query(&inner).at_page(1);
            Self::begin(&mut inner, FetchReason::Initial, params)
        };
        self.run(ticket).await
    }

    /// Append the next page
    ///
    /// No-op while a fetch is in flight or when the last page has been reached.
    pub async fn load_more(&self) -> FetchOutcome {
        let ticket = {
            let mut inner = self.lock();
            if inner.state.is_loading || !inner.state.has_more {
                debug!(
                    loading = inner.state.is_loading,
                    has_more = inner.state.has_more,
                    "load more ignored"
                );
                return FetchOutcome::Skipped;
            }
            let next = inner.state.active_params.page + 1;
            let params = inner.state.active_params.at_page(next);
            Self::begin(&mut inner, FetchReason::LoadMore, params)
        };
        self.run(ticket).await
    }

    /// Reload page 1 of the current query
    ///
    /// On success a notification with the number of fetched articles is broadcast.
    pub async fn refresh(&self) -> FetchOutcome {
        let ticket = {
            let mut inner = self.lock();
            let params = Self::requested_query(&inner).at_page(1);
            Self::begin(&mut inner, FetchReason::Refresh, params)
        };
        self.run(ticket).await
    }

    /// Merge `update` into the current query and load its first page
    ///
    /// Successive updates made while a filter change is in flight build on the
    /// pending query, so rapid category and search edits combine.
    pub async fn update_filters(&self, update: FilterUpdate) -> FetchOutcome {
        let ticket = {
            let mut inner = self.lock();
            let params = Self::requested_query(&inner).merged(&update);
            Self::begin(&mut inner, FetchReason::FilterChange, params)
        };
        self.run(ticket).await
    }

    /// Cancel any in-flight fetch and refuse further operations
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        if let Some(in_flight) = inner.in_flight.take() {
            debug!(generation = in_flight.generation, "cancelling fetch on shutdown");
            in_flight.token.cancel();
        }
        inner.state.abandon();
    }

    /// Query the user asked for most recently, pending, failed or applied
    fn requested_query(inner: &Inner) -> FilterParams {
        inner
            .state
            .requested_params
            .clone()
            .unwrap_or_else(|| inner.state.active_params.clone())
    }

    /// Cancel the live request and register a new one
    fn begin(inner: &mut Inner, reason: FetchReason, params: FilterParams) -> Option<Ticket> {
        if inner.closed {
            return None;
        }

        if let Some(previous) = inner.in_flight.take() {
            debug!(
                generation = previous.generation,
                "cancelling superseded fetch"
            );
            previous.token.cancel();
        }

        inner.generation += 1;
        let token = CancellationToken::new();
        inner.in_flight = Some(InFlight {
            generation: inner.generation,
            token: token.clone(),
        });
        inner.state.begin(reason, &params);

        Some(Ticket {
            generation: inner.generation,
            token,
            reason,
            params,
        })
    }

    async fn run(&self, ticket: Option<Ticket>) -> FetchOutcome {
        let Some(ticket) = ticket else {
            return FetchOutcome::Skipped;
        };

        debug!(
            generation = ticket.generation,
            page = ticket.params.page,
            reason = ?ticket.reason,
            "fetching page"
        );

        let mut guard = AbandonOnDrop {
            controller: self,
            generation: ticket.generation,
            armed: true,
        };
        let result = self
            .shared
            .source
            .get_articles(&ticket.params, ticket.token.clone())
            .await;
        guard.armed = false;

        self.finish(ticket, result)
    }

    fn finish(&self, ticket: Ticket, result: Result<PageResult>) -> FetchOutcome {
        let (outcome, notification) = {
            let mut inner = self.lock();

            let is_live = inner
                .in_flight
                .as_ref()
                .is_some_and(|live| live.generation == ticket.generation);
            if !is_live || ticket.token.is_cancelled() {
                debug!(generation = ticket.generation, "discarding stale completion");
                return FetchOutcome::Superseded;
            }
            inner.in_flight = None;

            match result {
                Ok(page) => {
                    let count = page.items.len();
                    info!(
                        page = ticket.params.page,
                        items = count,
                        total_pages = page.total_pages,
                        "page applied"
                    );
                    inner.state.apply(ticket.reason, ticket.params, page);
                    let notification = (ticket.reason == FetchReason::Refresh)
                        .then(|| Notification::refreshed(count));
                    (FetchOutcome::Applied { items: count }, notification)
                }
                Err(e) if e.is_cancelled() => {
                    debug!(generation = ticket.generation, "fetch cancelled by source");
                    inner.state.abandon();
                    (FetchOutcome::Superseded, None)
                }
                Err(e) => {
                    let message = e.user_message();
                    warn!(page = ticket.params.page, error = %message, "fetch failed");
                    inner.state.fail(message.clone());
                    (FetchOutcome::Failed(e), Some(Notification::error(message)))
                }
            }
        };

        if let Some(notification) = notification {
            // send() returns Err if there are no receivers, which is fine
            self.shared.notifications.send(notification).ok();
        }
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases the live fetch when its operation future is dropped before completion
struct AbandonOnDrop<'a> {
    controller: &'a PaginationController,
    generation: u64,
    armed: bool,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.controller.lock();
        let is_live = inner
            .in_flight
            .as_ref()
            .is_some_and(|live| live.generation == self.generation);
        if !is_live {
            return;
        }
        if let Some(in_flight) = inner.in_flight.take() {
            debug!(generation = self.generation, "operation dropped; abandoning fetch");
            in_flight.token.cancel();
        }
        inner.state.abandon();
    }
}

impl LoadMoreHandler for PaginationController {
    /// Spawn [`load_more`](PaginationController::load_more) on the current runtime
    fn request_next_page(&self) {
        let controller = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    controller.load_more().await;
                });
            }
            Err(_) => warn!("no tokio runtime available; ignoring load more request"),
        }
    }
}
