//! Reference option routes (categories and markets for filter pickers).

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::directory::{ReferenceOption, ReferenceSource};
use crate::error::AppResult;
use crate::state::AppState;

/// Create the reference router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/markets", get(list_markets))
}

async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<ReferenceOption>>> {
    let options = state
        .directory()
        .reference_options(ReferenceSource::Categories)
        .await?;
    Ok(Json(options))
}

async fn list_markets(State(state): State<AppState>) -> AppResult<Json<Vec<ReferenceOption>>> {
    let options = state
        .directory()
        .reference_options(ReferenceSource::Markets)
        .await?;
    Ok(Json(options))
}
