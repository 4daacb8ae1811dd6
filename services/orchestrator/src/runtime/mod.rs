//! Container runtime interface and mock implementation.
//!
//! The runtime interface abstracts container lifecycle operations:
//! create/start/stop/remove plus list/get/logs introspection. The
//! scheduler only ever talks to this trait, so alternate backends or
//! deterministic test doubles can be substituted without touching
//! scheduler logic.
//!
//! A mock implementation is provided for testing and development; the
//! Docker backend lives in [`docker`].

pub mod docker;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::spec::{Container, ContainerSpec};

/// Errors from runtime backend operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("docker API error: {0}")]
    Api(#[from] bollard::errors::Error),

    #[error("container not found: {0}")]
    NotFound(String),

    #[error("invalid port specification: {0}")]
    InvalidPort(String),

    #[error("{0}")]
    Backend(String),
}

/// Container runtime interface.
///
/// Create and start are two independent, non-atomic steps; callers own
/// cleanup of containers that were created but never started.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create a container from a spec. The container is not running yet.
    async fn create(&self, spec: &ContainerSpec) -> Result<Container, RuntimeError>;

    /// Start a created container.
    async fn start(&self, id: &str) -> Result<(), RuntimeError>;

    /// Stop a running container, waiting up to `grace_secs` before the
    /// backend kills it.
    async fn stop(&self, id: &str, grace_secs: u32) -> Result<(), RuntimeError>;

    /// Remove a container.
    async fn remove(&self, id: &str, force: bool) -> Result<(), RuntimeError>;

    /// List all containers known to the backend, running or not.
    async fn list(&self) -> Result<Vec<Container>, RuntimeError>;

    /// Inspect a container by ID.
    async fn get(&self, id: &str) -> Result<Container, RuntimeError>;

    /// Fetch up to `tail` trailing log lines, capped at `max_bytes`.
    async fn logs(&self, id: &str, tail: u32, max_bytes: usize) -> Result<String, RuntimeError>;
}

/// A recorded call against the mock runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    Create(String),
    Start(String),
    Stop(String),
    Remove(String),
}

/// Mock runtime for testing and development.
///
/// Keeps containers in an in-memory map and records every lifecycle call
/// so tests can assert on cleanup behavior. Failure injection covers the
/// create and start paths.
pub struct MockRuntime {
    counter: AtomicU64,
    containers: Mutex<HashMap<String, Container>>,
    calls: Mutex<Vec<RuntimeCall>>,
    fail_create_at: Option<u64>,
    fail_start_at: Option<u64>,
}

impl MockRuntime {
    /// Create a new mock runtime that never fails.
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            containers: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_create_at: None,
            fail_start_at: None,
        }
    }

    /// Fail the `n`th create call (0-indexed).
    pub fn failing_create_at(n: u64) -> Self {
        Self {
            fail_create_at: Some(n),
            ..Self::new()
        }
    }

    /// Fail the `n`th start call (0-indexed).
    pub fn failing_start_at(n: u64) -> Self {
        Self {
            fail_start_at: Some(n),
            ..Self::new()
        }
    }

    /// Snapshot of every lifecycle call made so far.
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }

    fn record(&self, call: RuntimeCall) {
        self.calls.lock().expect("mock lock poisoned").push(call);
    }

    fn next_id(&self) -> String {
        let counter = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("ctr_{counter:016x}")
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<Container, RuntimeError> {
        let creates_so_far = {
            let calls = self.calls.lock().expect("mock lock poisoned");
            calls
                .iter()
                .filter(|c| matches!(c, RuntimeCall::Create(_)))
                .count() as u64
        };
        if self.fail_create_at == Some(creates_so_far) {
            return Err(RuntimeError::Backend(format!(
                "mock create failure for '{}'",
                spec.name
            )));
        }

        let id = self.next_id();
        info!(container_id = %id, name = %spec.name, image = %spec.image, "[MOCK] Container created");
        self.record(RuntimeCall::Create(id.clone()));

        let container = Container {
            id: id.clone(),
            name: spec.name.clone(),
            image: spec.image.clone(),
            status: "created".to_string(),
            ports: spec.ports.clone(),
            environment: spec.environment.clone(),
            labels: spec.labels.clone(),
            created_at: Utc::now(),
            started_at: None,
        };
        self.containers
            .lock()
            .expect("mock lock poisoned")
            .insert(id, container.clone());

        Ok(container)
    }

    async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        let starts_so_far = {
            let calls = self.calls.lock().expect("mock lock poisoned");
            calls
                .iter()
                .filter(|c| matches!(c, RuntimeCall::Start(_)))
                .count() as u64
        };
        if self.fail_start_at == Some(starts_so_far) {
            return Err(RuntimeError::Backend(format!(
                "mock start failure for '{id}'"
            )));
        }

        let mut containers = self.containers.lock().expect("mock lock poisoned");
        let container = containers
            .get_mut(id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;
        container.status = "running".to_string();
        container.started_at = Some(Utc::now());
        drop(containers);

        debug!(container_id = %id, "[MOCK] Container started");
        self.record(RuntimeCall::Start(id.to_string()));
        Ok(())
    }

    async fn stop(&self, id: &str, _grace_secs: u32) -> Result<(), RuntimeError> {
        self.record(RuntimeCall::Stop(id.to_string()));
        let mut containers = self.containers.lock().expect("mock lock poisoned");
        let container = containers
            .get_mut(id)
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))?;
        container.status = "exited".to_string();
        debug!(container_id = %id, "[MOCK] Container stopped");
        Ok(())
    }

    async fn remove(&self, id: &str, _force: bool) -> Result<(), RuntimeError> {
        self.record(RuntimeCall::Remove(id.to_string()));
        let removed = self
            .containers
            .lock()
            .expect("mock lock poisoned")
            .remove(id);
        if removed.is_none() {
            return Err(RuntimeError::NotFound(id.to_string()));
        }
        debug!(container_id = %id, "[MOCK] Container removed");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Container>, RuntimeError> {
        let containers = self.containers.lock().expect("mock lock poisoned");
        Ok(containers.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Container, RuntimeError> {
        let containers = self.containers.lock().expect("mock lock poisoned");
        containers
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }

    async fn logs(&self, id: &str, tail: u32, _max_bytes: usize) -> Result<String, RuntimeError> {
        let containers = self.containers.lock().expect("mock lock poisoned");
        if !containers.contains_key(id) {
            return Err(RuntimeError::NotFound(id.to_string()));
        }
        Ok(format!("[MOCK] last {tail} log lines for {id}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_spec(name: &str) -> ContainerSpec {
        ContainerSpec {
            name: name.to_string(),
            image: "nginx:alpine".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn mock_create_start_stop_remove() {
        let runtime = MockRuntime::new();
        let container = runtime.create(&test_spec("web-0")).await.unwrap();
        assert_eq!(container.status, "created");

        runtime.start(&container.id).await.unwrap();
        let fetched = runtime.get(&container.id).await.unwrap();
        assert_eq!(fetched.status, "running");
        assert!(fetched.started_at.is_some());

        runtime.stop(&container.id, 30).await.unwrap();
        runtime.remove(&container.id, true).await.unwrap();
        assert!(runtime.get(&container.id).await.is_err());
    }

    #[tokio::test]
    async fn mock_records_calls_in_order() {
        let runtime = MockRuntime::new();
        let container = runtime.create(&test_spec("web-0")).await.unwrap();
        runtime.start(&container.id).await.unwrap();

        let calls = runtime.calls();
        assert_eq!(
            calls,
            vec![
                RuntimeCall::Create(container.id.clone()),
                RuntimeCall::Start(container.id.clone()),
            ]
        );
    }

    #[tokio::test]
    async fn mock_failure_injection() {
        let runtime = MockRuntime::failing_create_at(1);
        runtime.create(&test_spec("web-0")).await.unwrap();
        assert!(runtime.create(&test_spec("web-1")).await.is_err());

        let runtime = MockRuntime::failing_start_at(0);
        let container = runtime.create(&test_spec("web-0")).await.unwrap();
        assert!(runtime.start(&container.id).await.is_err());
    }

    #[tokio::test]
    async fn mock_stop_missing_container_errors() {
        let runtime = MockRuntime::new();
        let err = runtime.stop("ctr_missing", 30).await.unwrap_err();
        assert!(matches!(err, RuntimeError::NotFound(_)));
    }
}
