//! HTTP route handlers.

pub mod health;
pub mod listing;
pub mod page;
pub mod reference;
pub mod similar;

use axum::Router;

use crate::state::AppState;

/// Every kernel route, without middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(listing::router())
        .merge(reference::router())
        .merge(similar::router())
        .merge(page::router())
}
