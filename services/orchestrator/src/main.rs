//! skiff orchestrator server.
//!
//! Wires the scheduler, runtime backend, document store, and HTTP API
//! together and serves until interrupted.

use std::sync::Arc;

use anyhow::Result;
use skiff_orchestrator::{
    api,
    config::{Config, RuntimeBackend},
    runtime::{docker::DockerRuntime, ContainerRuntime, MockRuntime},
    scheduler::Scheduler,
    state::AppState,
    store::Store,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting skiff orchestrator");
    info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        runtime = ?config.runtime,
        "Configuration loaded"
    );

    let runtime: Arc<dyn ContainerRuntime> = match config.runtime {
        RuntimeBackend::Docker => match DockerRuntime::connect() {
            Ok(runtime) => Arc::new(runtime),
            Err(e) => {
                error!(error = %e, "Failed to connect to the Docker daemon");
                return Err(e.into());
            }
        },
        RuntimeBackend::Mock => Arc::new(MockRuntime::new()),
    };

    let store = Store::open(&config.data_dir)?;
    load_persisted(&store);

    let scheduler = Scheduler::new(Arc::clone(&runtime), config.stop_grace_secs);
    let state = AppState::new(scheduler, runtime, store, config.stop_grace_secs);

    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("Orchestrator shutdown complete");
    Ok(())
}

/// Report persisted documents at startup. Corrupt records were already
/// skipped with a warning by the store; the registry starts empty either
/// way because container state does not survive a daemon restart.
fn load_persisted(store: &Store) {
    match store.load_all_deployments() {
        Ok(deployments) => info!(count = deployments.len(), "Loaded persisted deployments"),
        Err(e) => warn!(error = %e, "Failed to load persisted deployments"),
    }
    match store.load_all_services() {
        Ok(services) => info!(count = services.len(), "Loaded persisted services"),
        Err(e) => warn!(error = %e, "Failed to load persisted services"),
    }
}
