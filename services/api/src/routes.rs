use crate::infra::AppState;
use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use mc_directory::directory::{
    apply, DirectoryFacets, FilterState, ListingProvider, ListingRecord, QueryParams, SortOrder,
};
use mc_directory::error::AppError;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Serialize)]
pub(crate) struct ListingsResponse {
    pub(crate) filters: FilterState,
    pub(crate) applied_sort: SortOrder,
    pub(crate) total: usize,
    pub(crate) listings: Vec<ListingRecord>,
}

/// Router exposing the filtered directory over the listing provider.
pub(crate) fn directory_router<P>(provider: Arc<P>) -> Router
where
    P: ListingProvider + 'static,
{
    Router::new()
        .route("/api/v1/listings", get(listings_handler::<P>))
        .route("/api/v1/listings/facets", get(facets_handler::<P>))
        .with_state(provider)
}

pub(crate) fn with_directory_routes<P>(provider: Arc<P>) -> Router
where
    P: ListingProvider + 'static,
{
    directory_router(provider)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn listings_handler<P>(
    State(provider): State<Arc<P>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ListingsResponse>, AppError>
where
    P: ListingProvider + 'static,
{
    let params = QueryParams::parse(raw.as_deref().unwrap_or_default());
    let filters = FilterState::from_query(&params);
    let collection = provider.listings()?;
    let listings: Vec<ListingRecord> = apply(&filters, &collection)
        .into_iter()
        .cloned()
        .collect();

    debug!(?filters, matched = listings.len(), "directory query");

    Ok(Json(ListingsResponse {
        applied_sort: filters.effective_sort(),
        total: listings.len(),
        filters,
        listings,
    }))
}

pub(crate) async fn facets_handler<P>(
    State(provider): State<Arc<P>>,
) -> Result<Json<DirectoryFacets>, AppError>
where
    P: ListingProvider + 'static,
{
    let listings = provider.listings()?;
    Ok(Json(DirectoryFacets::from_listings(&listings)))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
