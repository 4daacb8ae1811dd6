//! Deployment endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::debug;

use crate::api::error::ApiError;
use crate::spec::{Deployment, DeploymentSpec};
use crate::state::AppState;
use crate::store::StoreError;

const MAX_REPLICAS: usize = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/deployments", get(list_deployments).post(create_deployment))
        .route(
            "/deployments/{name}",
            get(get_deployment).delete(delete_deployment),
        )
}

fn validate_deployment_spec(spec: &DeploymentSpec) -> Result<(), ApiError> {
    if spec.name.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_spec",
            "deployment name cannot be empty",
        ));
    }
    if spec.replicas < 1 {
        return Err(ApiError::bad_request(
            "invalid_spec",
            "replica count must be at least 1",
        ));
    }
    if spec.replicas > MAX_REPLICAS {
        return Err(ApiError::bad_request(
            "invalid_spec",
            format!("replica count cannot exceed {MAX_REPLICAS}"),
        ));
    }
    if spec.container.name.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_spec",
            "container name cannot be empty",
        ));
    }
    if spec.container.image.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_spec",
            "container image cannot be empty",
        ));
    }
    Ok(())
}

async fn list_deployments(State(state): State<AppState>) -> Json<Vec<Deployment>> {
    Json(state.scheduler().list_deployments().await)
}

async fn create_deployment(
    State(state): State<AppState>,
    Json(spec): Json<DeploymentSpec>,
) -> Result<Json<Deployment>, ApiError> {
    validate_deployment_spec(&spec)?;

    let deployment = state.scheduler().create_deployment(spec).await?;
    state.store().save_deployment(&deployment)?;

    Ok(Json(deployment))
}

async fn get_deployment(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Deployment>, ApiError> {
    Ok(Json(state.scheduler().get_deployment(&name).await?))
}

async fn delete_deployment(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Deployment>, ApiError> {
    let deployment = state.scheduler().delete_deployment(&name).await?;

    // The registry is authoritative; a document that was never persisted
    // does not block deletion.
    match state.store().delete_deployment(deployment.id) {
        Ok(()) => {}
        Err(StoreError::NotFound(id)) => {
            debug!(deployment_id = %id, "No persisted document to delete");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(deployment))
}
