//! Fetch lifecycle for one directory view.
//!
//! `Idle → Loading → {Ready, Failed}`; every filter mutation moves the view
//! back to `Loading` synchronously. There is no cancellation. Each fetch
//! carries a [`FetchTicket`] and a response is applied only if its ticket
//! still matches the current generation (last request wins).

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{DirectoryError, ErrorKind};
use super::filter_state::FilterState;
use super::records::DirectoryRecord;
use super::service::DirectoryService;
use super::types::{ListingFilter, ListingPage};

/// Failure recorded on a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DirectoryError> for FetchFailure {
    fn from(error: &DirectoryError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Lifecycle state of one view.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchState<R> {
    Idle,
    Loading,
    Ready(ListingPage<R>),
    Failed(FetchFailure),
}

impl<R> FetchState<R> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn page(&self) -> Option<&ListingPage<R>> {
        match self {
            Self::Ready(page) => Some(page),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Snapshot of the filter that produced a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub filter: ListingFilter,
    pub scope: Option<Uuid>,
}

struct ViewState<R> {
    filter: FilterState,
    fetch: FetchState<R>,
}

/// Owns the filter and fetch state of one listing view.
pub struct ListingController<R> {
    service: Arc<DirectoryService>,
    scope: Option<Uuid>,
    view: Mutex<ViewState<R>>,
}

impl<R: DirectoryRecord> ListingController<R> {
    pub fn new(service: Arc<DirectoryService>, scope: Option<Uuid>) -> Self {
        let filter = FilterState::new(service.limits());
        Self {
            service,
            scope,
            view: Mutex::new(ViewState {
                filter,
                fetch: FetchState::Idle,
            }),
        }
    }

    pub fn state(&self) -> FetchState<R> {
        self.view.lock().fetch.clone()
    }

    pub fn filter(&self) -> ListingFilter {
        self.view.lock().filter.filter().clone()
    }

    pub fn generation(&self) -> u64 {
        self.view.lock().filter.generation()
    }

    /// First fetch after the view mounts.
    pub fn mount(&self) -> FetchTicket {
        self.update(FilterState::touch)
    }

    /// Apply a filter mutation and move to `Loading`.
    ///
    /// The returned ticket must be passed to [`run`](Self::run) (or
    /// [`apply`](Self::apply)) to resolve the fetch.
    pub fn update(&self, mutate: impl FnOnce(&mut FilterState) -> u64) -> FetchTicket {
        let mut view = self.view.lock();
        let generation = mutate(&mut view.filter);
        view.fetch = FetchState::Loading;

        FetchTicket {
            generation,
            filter: view.filter.filter().clone(),
            scope: self.scope,
        }
    }

    /// Re-run the current filter (user retry after a transient failure).
    pub fn retry(&self) -> FetchTicket {
        self.update(FilterState::touch)
    }

    /// Execute the fetch for `ticket`; returns whether its result was applied.
    pub async fn run(&self, ticket: FetchTicket) -> bool {
        let result = self
            .service
            .fetch_listing::<R>(&ticket.filter, ticket.scope)
            .await;
        self.apply(&ticket, result)
    }

    /// Resolve `ticket`, discarding the result if a newer fetch was issued.
    pub fn apply(
        &self,
        ticket: &FetchTicket,
        result: Result<ListingPage<R>, DirectoryError>,
    ) -> bool {
        let mut view = self.view.lock();
        let current = view.filter.generation();
        if ticket.generation != current {
            debug!(
                table = R::TABLE.name(),
                stale = ticket.generation,
                current,
                "discarding superseded fetch"
            );
            return false;
        }

        view.fetch = match result {
            Ok(page) => FetchState::Ready(page),
            Err(e) => {
                warn!(table = e.table(), kind = e.kind().as_str(), error = %e, "listing fetch failed");
                FetchState::Failed(FetchFailure::from(&e))
            }
        };
        true
    }

    /// Mutate, fetch and return the resulting state.
    pub async fn refresh(&self, mutate: impl FnOnce(&mut FilterState) -> u64) -> FetchState<R> {
        let ticket = self.update(mutate);
        self.run(ticket).await;
        self.state()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::directory::types::RowRange;

    #[test]
    fn failure_carries_kind_and_message() {
        let error = DirectoryError::not_provisioned("markets");
        let failure = FetchFailure::from(&error);
        assert_eq!(failure.kind, ErrorKind::NotProvisioned);
        assert_eq!(failure.message, error.to_string());
    }

    #[test]
    fn state_serializes_with_tag() {
        let state: FetchState<()> = FetchState::Ready(ListingPage::new(Vec::new(), 0, RowRange::page(0, 20)));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["total"], 0);

        let loading: FetchState<()> = FetchState::Loading;
        assert!(loading.is_loading());
        assert!(loading.page().is_none());
    }
}
