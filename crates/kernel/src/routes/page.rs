//! Server-rendered directory listing pages.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use super::listing::ListingParams;
use crate::directory::{
    Business, DirectoryRecord, DirectoryTable, FetchState, ListingController, ListingFilter,
    Product,
};
use crate::error::{AppError, AppResult, directory_status};
use crate::state::AppState;

/// Create the listing page router.
pub fn router() -> Router<AppState> {
    Router::new().route("/directory/{table}", get(render_directory))
}

async fn render_directory(
    State(state): State<AppState>,
    Path(table): Path<String>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> AppResult<(StatusCode, Html<String>)> {
    let filter = ListingParams::extract(params)?.into_filter(state.config().listing)?;

    match DirectoryTable::from_segment(&table) {
        Some(DirectoryTable::Businesses) => {
            render_listing::<Business>(&state, "Businesses", filter).await
        }
        Some(DirectoryTable::Products) => render_listing::<Product>(&state, "Products", filter).await,
        _ => Err(AppError::NotFound),
    }
}

async fn render_listing<R: DirectoryRecord>(
    state: &AppState,
    title: &str,
    filter: ListingFilter,
) -> AppResult<(StatusCode, Html<String>)> {
    let controller = ListingController::<R>::new(state.directory().clone(), None);
    let fetched = controller.refresh(|s| s.replace(filter)).await;

    let status = match &fetched {
        FetchState::Failed(failure) => directory_status(failure.kind),
        _ => StatusCode::OK,
    };
    let html = state
        .presenter()
        .render(title, &fetched, &controller.filter())?;

    Ok((status, Html(html)))
}
