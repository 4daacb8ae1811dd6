//! HTTP API handlers and routing.

pub mod error;

mod containers;
mod deployments;
mod health;
mod services;

use axum::{
    http::{header, Method},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .merge(health::routes())
        .merge(containers::routes())
        .merge(deployments::routes())
        .merge(services::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
