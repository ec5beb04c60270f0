use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use listing_extraction::Listing;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::domains::listings::ListingFilter;
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct ListingsResponse {
    items: Vec<Listing>,
    total: i64,
    limit: i64,
    offset: i64,
}

/// `GET /listings` - stored listings matching the query filter.
pub async fn list_listings_handler(
    Extension(state): Extension<AppState>,
    Query(filter): Query<ListingFilter>,
) -> Result<Json<ListingsResponse>, (StatusCode, Json<Value>)> {
    let items = state.repository.find_all(&filter).await.map_err(internal)?;
    let total = state.repository.count(&filter).await.map_err(internal)?;

    Ok(Json(ListingsResponse {
        items,
        total,
        limit: filter.limit(),
        offset: filter.offset(),
    }))
}

fn internal(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    error!(error = %format!("{:#}", e), "Listing query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "failed to query listings" })),
    )
}
