//! Listing API routes.
//!
//! JSON endpoints returning enriched, paginated directory listings.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::ListingLimits;
use crate::directory::{
    Business, DirectoryRecord, IdFilter, ListingFilter, ListingPage, ListingSort, Product,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the listing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/businesses", get(list::<Business>))
        .route("/api/products", get(list::<Product>))
        .route("/api/owners/{owner_id}/businesses", get(list_owned::<Business>))
        .route("/api/owners/{owner_id}/products", get(list_owned::<Product>))
}

// -------------------------------------------------------------------------
// Request types
// -------------------------------------------------------------------------

/// Listing query string.
///
/// Unrecognized `category`/`market` values mean "all".
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    #[serde(default)]
    pub category: IdFilter,
    #[serde(default)]
    pub market: IdFilter,
    pub q: Option<String>,
    pub sort: Option<ListingSort>,
    pub offset: Option<u64>,
    pub limit: Option<u32>,
}

/// Largest offset PostgreSQL accepts in `OFFSET` (a signed bigint).
const MAX_OFFSET: u64 = i64::MAX as u64;

impl ListingParams {
    /// Unwrap an extracted query string, reporting bad values as `BadRequest`.
    pub fn extract(params: Result<Query<Self>, QueryRejection>) -> AppResult<Self> {
        let Query(params) = params?;
        Ok(params)
    }

    pub fn into_filter(self, limits: ListingLimits) -> AppResult<ListingFilter> {
        let offset = self.offset.unwrap_or(0);
        if offset > MAX_OFFSET {
            return Err(AppError::BadRequest(format!(
                "offset must be at most {MAX_OFFSET}"
            )));
        }

        let defaults = ListingFilter::new(&limits);
        Ok(ListingFilter {
            category: self.category,
            market: self.market,
            search_text: self.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
            sort: self.sort.unwrap_or(defaults.sort),
            offset,
            limit: limits.clamp(self.limit.unwrap_or(defaults.limit)),
        })
    }
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

async fn list<R: DirectoryRecord>(
    State(state): State<AppState>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> AppResult<Json<ListingPage<R>>> {
    let filter = ListingParams::extract(params)?.into_filter(state.config().listing)?;
    let page = state.directory().fetch_listing::<R>(&filter, None).await?;
    Ok(Json(page))
}

async fn list_owned<R: DirectoryRecord>(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    params: Result<Query<ListingParams>, QueryRejection>,
) -> AppResult<Json<ListingPage<R>>> {
    let filter = ListingParams::extract(params)?.into_filter(state.config().listing)?;
    let page = state
        .directory()
        .fetch_listing::<R>(&filter, Some(owner_id))
        .await?;
    Ok(Json(page))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn params_default_to_mount_filter() {
        let filter = ListingParams::default()
            .into_filter(ListingLimits::default())
            .unwrap();
        assert_eq!(filter, ListingFilter::default());
    }

    #[test]
    fn params_clamp_limit_and_trim_search() {
        let params = ListingParams {
            market: IdFilter::Id(3),
            q: Some("  ".to_string()),
            limit: Some(500),
            ..Default::default()
        };
        let filter = params.into_filter(ListingLimits::default()).unwrap();

        assert_eq!(filter.market, IdFilter::Id(3));
        assert_eq!(filter.search_text, None);
        assert_eq!(filter.limit, 100);
    }

    #[test]
    fn offset_beyond_bigint_is_rejected() {
        let params = ListingParams {
            offset: Some(u64::MAX),
            ..Default::default()
        };
        let err = params.into_filter(ListingLimits::default()).unwrap_err();
        assert_eq!(err.kind(), "bad_request");

        let params = ListingParams {
            offset: Some(i64::MAX as u64),
            ..Default::default()
        };
        assert!(params.into_filter(ListingLimits::default()).is_ok());
    }
}
