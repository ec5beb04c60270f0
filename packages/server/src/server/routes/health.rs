use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    worker_id: String,
    jobs: Vec<JobHealth>,
}

#[derive(Serialize)]
pub struct JobHealth {
    site: String,
    schedule: String,
}

/// Health check endpoint
///
/// Reports this worker's id and the jobs it has scheduled.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let jobs = state
        .scheduler
        .jobs()
        .into_iter()
        .map(|job| JobHealth {
            site: job.site,
            schedule: job.schedule,
        })
        .collect();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            worker_id: state.worker_id.clone(),
            jobs,
        }),
    )
}
