use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::kernel::jobs::TriggerError;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    #[serde(default)]
    site: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// `POST /scrape?site=<id>&url=<optional>` - start an on-demand run.
///
/// The run is tracked by the scheduler but takes no lock, so it can overlap a
/// scheduled run of the same site.
pub async fn trigger_scrape_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<ScrapeParams>,
) -> (StatusCode, Json<Value>) {
    let Some(site) = params.site.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing required parameter: site" })),
        );
    };

    match state.scheduler.trigger(site, params.url.as_deref()) {
        Ok(url) => {
            info!(site = %site, url = %url, "On-demand scrape accepted");
            (
                StatusCode::ACCEPTED,
                Json(json!({ "status": "started", "site": site, "url": url })),
            )
        }
        Err(e @ TriggerError::UnknownSite(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": e.to_string() })),
        ),
        Err(e @ TriggerError::ShuttingDown) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}
