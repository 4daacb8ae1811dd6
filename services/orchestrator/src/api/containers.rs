//! Direct container management endpoints.
//!
//! Thin pass-through to the runtime backend for containers that are not
//! managed by any deployment. Containers are addressed by name, full ID,
//! or unambiguous ID prefix.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::spec::{Container, ContainerSpec};
use crate::state::AppState;

const DEFAULT_LOG_TAIL: u32 = 100;
const MAX_LOG_TAIL: u32 = 10_000;
const MAX_LOG_BYTES: usize = 10 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/containers", get(list_containers).post(create_container))
        .route("/containers/{name}", get(get_container))
        .route("/containers/{name}/start", post(start_container))
        .route("/containers/{name}/stop", post(stop_container))
        .route("/containers/{name}/remove", delete(remove_container))
        .route("/containers/{name}/logs", get(container_logs))
}

/// Resolve a name, full ID, or ID prefix to a container ID.
async fn resolve_container_id(state: &AppState, name_or_id: &str) -> Result<String, ApiError> {
    // Direct lookup first; the runtime accepts both names and IDs.
    if let Ok(container) = state.runtime().get(name_or_id).await {
        return Ok(container.id);
    }

    let containers = state.runtime().list().await?;
    containers
        .iter()
        .find(|c| c.name == name_or_id || c.id == name_or_id || c.id.starts_with(name_or_id))
        .map(|c| c.id.clone())
        .ok_or_else(|| {
            ApiError::not_found("not_found", format!("container not found: {name_or_id}"))
        })
}

fn validate_container_spec(spec: &ContainerSpec) -> Result<(), ApiError> {
    if spec.name.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_spec",
            "container name cannot be empty",
        ));
    }
    if spec.image.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_spec",
            "container image cannot be empty",
        ));
    }

    for (container_port, host_port) in &spec.ports {
        let container_port = container_port
            .split('/')
            .next()
            .unwrap_or(container_port.as_str());
        for (label, value) in [("container", container_port), ("host", host_port.as_str())] {
            let port: i64 = value.parse().map_err(|_| {
                ApiError::bad_request("invalid_spec", format!("invalid {label} port: {value}"))
            })?;
            if !(1..=65535).contains(&port) {
                return Err(ApiError::bad_request(
                    "invalid_spec",
                    format!("{label} port {port} must be within 1-65535"),
                ));
            }
        }
    }

    Ok(())
}

async fn list_containers(State(state): State<AppState>) -> Result<Json<Vec<Container>>, ApiError> {
    Ok(Json(state.runtime().list().await?))
}

async fn create_container(
    State(state): State<AppState>,
    Json(spec): Json<ContainerSpec>,
) -> Result<Json<Container>, ApiError> {
    validate_container_spec(&spec)?;
    Ok(Json(state.runtime().create(&spec).await?))
}

async fn get_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Container>, ApiError> {
    let id = resolve_container_id(&state, &name).await?;
    Ok(Json(state.runtime().get(&id).await?))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

async fn start_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = resolve_container_id(&state, &name).await?;
    state.runtime().start(&id).await?;
    Ok(Json(StatusResponse { status: "started" }))
}

async fn stop_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = resolve_container_id(&state, &name).await?;
    state.runtime().stop(&id, state.stop_grace_secs()).await?;
    Ok(Json(StatusResponse { status: "stopped" }))
}

async fn remove_container(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = resolve_container_id(&state, &name).await?;
    state.runtime().remove(&id, true).await?;
    Ok(Json(StatusResponse { status: "removed" }))
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    tail: Option<u32>,
}

async fn container_logs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<String, ApiError> {
    let id = resolve_container_id(&state, &name).await?;
    let tail = query
        .tail
        .filter(|&t| t > 0)
        .unwrap_or(DEFAULT_LOG_TAIL)
        .min(MAX_LOG_TAIL);
    Ok(state.runtime().logs(&id, tail, MAX_LOG_BYTES).await?)
}
