//! Visual search: products ranked by embedding similarity.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::directory::SimilarProduct;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the similarity router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/products/similar", post(similar_products))
}

#[derive(Deserialize)]
struct SimilarRequest {
    /// Query embedding, produced by the external vision API.
    embedding: Vec<f32>,
    limit: Option<u32>,
}

#[derive(Serialize)]
struct SimilarResponse {
    results: Vec<SimilarProduct>,
}

async fn similar_products(
    State(state): State<AppState>,
    Json(request): Json<SimilarRequest>,
) -> AppResult<Json<SimilarResponse>> {
    if request.embedding.is_empty() {
        return Err(AppError::BadRequest("embedding must not be empty".to_string()));
    }
    if request.embedding.iter().any(|v| !v.is_finite()) {
        return Err(AppError::BadRequest(
            "embedding must contain only finite numbers".to_string(),
        ));
    }

    let limit = request
        .limit
        .unwrap_or(state.config().listing.default_page_size);
    let results = state
        .directory()
        .similar_products(&request.embedding, limit)
        .await?;

    Ok(Json(SimilarResponse { results }))
}
