//! Health and stats endpoints.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "skiff-orchestrator",
    })
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    containers: usize,
    deployments: usize,
    services: usize,
    uptime_secs: u64,
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let containers = state.runtime().list().await?;
    let (deployments, services) = state.scheduler().counts().await;

    Ok(Json(StatsResponse {
        containers: containers.len(),
        deployments,
        services,
        uptime_secs: state.uptime_secs(),
    }))
}
