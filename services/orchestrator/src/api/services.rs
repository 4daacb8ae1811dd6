//! Service endpoints.
//!
//! Field validation beyond the name lives in the scheduler so its checks
//! run in a fixed order against the registry.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::debug;

use crate::api::error::ApiError;
use crate::spec::{Service, ServiceSpec};
use crate::state::AppState;
use crate::store::StoreError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(list_services).post(create_service))
        .route("/services/{name}", get(get_service).delete(delete_service))
}

async fn list_services(State(state): State<AppState>) -> Json<Vec<Service>> {
    Json(state.scheduler().list_services().await)
}

async fn create_service(
    State(state): State<AppState>,
    Json(spec): Json<ServiceSpec>,
) -> Result<Json<Service>, ApiError> {
    if spec.name.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_spec",
            "service name cannot be empty",
        ));
    }

    let service = state.scheduler().create_service(spec).await?;
    state.store().save_service(&service)?;

    Ok(Json(service))
}

async fn get_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Service>, ApiError> {
    Ok(Json(state.scheduler().get_service(&name).await?))
}

async fn delete_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Service>, ApiError> {
    let service = state.scheduler().delete_service(&name).await?;

    match state.store().delete_service(service.id) {
        Ok(()) => {}
        Err(StoreError::NotFound(id)) => {
            debug!(service_id = %id, "No persisted document to delete");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(service))
}
