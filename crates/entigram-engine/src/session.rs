//! Debounced, staleness-checked search dispatch.
//!
//! The UI issues one search per keystroke; a newer search must supersede an
//! in-flight one rather than queue behind it. Each dispatch gets a ticket;
//! a result is applied only while its ticket is still the latest. A
//! superseded result is not an error; it is silently discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use entigram_core::{defaults, EntityIndex, Result};

use crate::projection::SearchProjection;

/// A dispatched search's claim on being the latest input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Issues tickets and answers whether a ticket is still current.
#[derive(Clone)]
pub struct SearchDispatcher {
    latest: Arc<AtomicU64>,
    debounce: Duration,
}

impl SearchDispatcher {
    pub fn new() -> Self {
        Self::with_debounce(Duration::from_millis(defaults::SEARCH_DEBOUNCE_MS))
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            latest: Arc::new(AtomicU64::new(0)),
            debounce,
        }
    }

    /// Issue a ticket for a new dispatch, superseding all earlier tickets.
    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the latest issued.
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Wait out the debounce window, then report whether `ticket` survived
    /// it (trailing-edge: only the latest dispatch does).
    pub async fn debounce(&self, ticket: &SearchTicket) -> bool {
        tokio::time::sleep(self.debounce).await;
        self.is_current(ticket)
    }
}

impl Default for SearchDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a dispatched search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    /// The result is current and should be applied.
    Applied(T),
    /// A newer dispatch superseded this one; discard the result.
    Superseded,
}

impl<T> SearchOutcome<T> {
    pub fn is_superseded(&self) -> bool {
        matches!(self, SearchOutcome::Superseded)
    }

    pub fn into_applied(self) -> Option<T> {
        match self {
            SearchOutcome::Applied(value) => Some(value),
            SearchOutcome::Superseded => None,
        }
    }
}

/// Debounced search front-end over a shared index.
///
/// Every keystroke calls [`submit`](Self::submit); keystroke storms
/// coalesce because earlier dispatches fail their ticket check after the
/// debounce window, before any collaborator call is made. Staleness is
/// checked again after the projection completes, so a result computed
/// against superseded input is never applied.
pub struct DebouncedSearch {
    dispatcher: SearchDispatcher,
    projection: Arc<SearchProjection>,
    index: Arc<RwLock<EntityIndex>>,
}

impl DebouncedSearch {
    pub fn new(projection: Arc<SearchProjection>, index: Arc<RwLock<EntityIndex>>) -> Self {
        Self::with_debounce(
            projection,
            index,
            Duration::from_millis(defaults::SEARCH_DEBOUNCE_MS),
        )
    }

    pub fn with_debounce(
        projection: Arc<SearchProjection>,
        index: Arc<RwLock<EntityIndex>>,
        debounce: Duration,
    ) -> Self {
        Self {
            dispatcher: SearchDispatcher::with_debounce(debounce),
            projection,
            index,
        }
    }

    /// Dispatch a search for the current input.
    pub async fn submit(&self, query: &str) -> Result<SearchOutcome<Vec<String>>> {
        let ticket = self.dispatcher.issue();
        if !self.dispatcher.debounce(&ticket).await {
            debug!(query = %query, "Search superseded during debounce");
            return Ok(SearchOutcome::Superseded);
        }

        let result = {
            let index = self.index.read().await;
            self.projection.project(&index, query).await?
        };

        if !self.dispatcher.is_current(&ticket) {
            debug!(query = %query, "Search superseded after projection");
            return Ok(SearchOutcome::Superseded);
        }
        Ok(SearchOutcome::Applied(result))
    }
}
