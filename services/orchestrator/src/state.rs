//! Application state shared across request handlers.

use std::sync::Arc;
use std::time::Instant;

use crate::runtime::ContainerRuntime;
use crate::scheduler::Scheduler;
use crate::store::Store;

/// Shared application state, passed to handlers via axum's state
/// extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    scheduler: Scheduler,
    runtime: Arc<dyn ContainerRuntime>,
    store: Store,
    stop_grace_secs: u32,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        scheduler: Scheduler,
        runtime: Arc<dyn ContainerRuntime>,
        store: Store,
        stop_grace_secs: u32,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                scheduler,
                runtime,
                store,
                stop_grace_secs,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn runtime(&self) -> &dyn ContainerRuntime {
        self.inner.runtime.as_ref()
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Grace period passed to direct container stops.
    pub fn stop_grace_secs(&self) -> u32 {
        self.inner.stop_grace_secs
    }

    /// Seconds since the server started.
    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
