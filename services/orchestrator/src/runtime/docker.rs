//! Docker runtime backend via the bollard API.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::models::{HostConfig, PortBinding};
use bollard::Docker;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tracing::{debug, info};

use crate::spec::{Container, ContainerSpec};

use super::{ContainerRuntime, RuntimeError};

/// Docker-backed container runtime.
pub struct DockerRuntime {
    client: Docker,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon using environment defaults
    /// (`DOCKER_HOST` or the platform socket).
    pub fn connect() -> Result<Self, RuntimeError> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(Self { client })
    }
}

/// Normalize a container-port key to docker's `{port}/{proto}` form.
fn port_key(container_port: &str) -> String {
    if container_port.contains('/') {
        container_port.to_string()
    } else {
        format!("{container_port}/tcp")
    }
}

fn parse_env(env: &[String]) -> HashMap<String, String> {
    env.iter()
        .filter_map(|e| e.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn parse_docker_time(s: &str) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(s).ok()?;
    let utc = parsed.with_timezone(&Utc);
    // Docker reports a zero time for containers that never started.
    if utc.timestamp() <= 0 {
        return None;
    }
    Some(utc)
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, spec: &ContainerSpec) -> Result<Container, RuntimeError> {
        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();

        for (container_port, host_port) in &spec.ports {
            let key = port_key(container_port);
            let (port, _proto) = key
                .split_once('/')
                .ok_or_else(|| RuntimeError::InvalidPort(container_port.clone()))?;
            if port.parse::<u32>().is_err() {
                return Err(RuntimeError::InvalidPort(container_port.clone()));
            }

            exposed_ports.insert(key.clone(), HashMap::new());
            port_bindings.insert(
                key,
                Some(vec![PortBinding {
                    host_ip: Some("0.0.0.0".to_string()),
                    host_port: Some(host_port.clone()),
                }]),
            );
        }

        let env: Vec<String> = spec
            .environment
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        let binds: Vec<String> = spec
            .volumes
            .iter()
            .map(|v| {
                if v.read_only {
                    format!("{}:{}:ro", v.source, v.destination)
                } else {
                    format!("{}:{}", v.source, v.destination)
                }
            })
            .collect();

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(env),
            labels: Some(spec.labels.clone()),
            working_dir: spec.working_dir.clone(),
            cmd: if spec.command.is_empty() {
                None
            } else {
                Some(spec.command.clone())
            },
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                binds: if binds.is_empty() { None } else { Some(binds) },
                ..Default::default()
            }),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(
                Some(CreateContainerOptions {
                    name: spec.name.as_str(),
                    platform: None,
                }),
                config,
            )
            .await?;

        info!(container_id = %response.id, name = %spec.name, image = %spec.image, "Container created");

        Ok(Container {
            id: response.id,
            name: spec.name.clone(),
            image: spec.image.clone(),
            status: "created".to_string(),
            ports: spec.ports.clone(),
            environment: spec.environment.clone(),
            labels: spec.labels.clone(),
            created_at: Utc::now(),
            started_at: None,
        })
    }

    async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        self.client
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        info!(container_id = %id, "Container started");
        Ok(())
    }

    async fn stop(&self, id: &str, grace_secs: u32) -> Result<(), RuntimeError> {
        self.client
            .stop_container(id, Some(StopContainerOptions { t: grace_secs as i64 }))
            .await?;
        info!(container_id = %id, "Container stopped");
        Ok(())
    }

    async fn remove(&self, id: &str, force: bool) -> Result<(), RuntimeError> {
        self.client
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await?;
        info!(container_id = %id, "Container removed");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Container>, RuntimeError> {
        let summaries = self
            .client
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                ..Default::default()
            }))
            .await?;

        let containers = summaries
            .into_iter()
            .map(|summary| {
                let name = summary
                    .names
                    .as_ref()
                    .and_then(|names| names.first())
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_default();

                let mut ports = HashMap::new();
                for port in summary.ports.unwrap_or_default() {
                    if let Some(public) = port.public_port {
                        ports.insert(port.private_port.to_string(), public.to_string());
                    }
                }

                Container {
                    id: summary.id.unwrap_or_default(),
                    name,
                    image: summary.image.unwrap_or_default(),
                    status: summary.status.unwrap_or_default(),
                    ports,
                    environment: HashMap::new(),
                    labels: summary.labels.unwrap_or_default(),
                    created_at: summary
                        .created
                        .and_then(|secs| DateTime::from_timestamp(secs, 0))
                        .unwrap_or_else(Utc::now),
                    started_at: None,
                }
            })
            .collect();

        Ok(containers)
    }

    async fn get(&self, id: &str) -> Result<Container, RuntimeError> {
        let inspect = self.client.inspect_container(id, None).await?;

        let name = inspect
            .name
            .as_deref()
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default();

        let mut ports = HashMap::new();
        if let Some(port_map) = inspect.network_settings.and_then(|s| s.ports) {
            for (key, bindings) in port_map {
                let container_port = key.split('/').next().unwrap_or(&key).to_string();
                if let Some(binding) = bindings.and_then(|b| b.into_iter().next()) {
                    if let Some(host_port) = binding.host_port {
                        ports.insert(container_port, host_port);
                    }
                }
            }
        }

        let config = inspect.config.unwrap_or_default();
        let state = inspect.state.unwrap_or_default();

        Ok(Container {
            id: inspect.id.unwrap_or_else(|| id.to_string()),
            name,
            image: config.image.unwrap_or_default(),
            status: state
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            ports,
            environment: parse_env(&config.env.unwrap_or_default()),
            labels: config.labels.unwrap_or_default(),
            created_at: inspect
                .created
                .as_deref()
                .and_then(parse_docker_time)
                .unwrap_or_else(Utc::now),
            started_at: state.started_at.as_deref().and_then(parse_docker_time),
        })
    }

    async fn logs(&self, id: &str, tail: u32, max_bytes: usize) -> Result<String, RuntimeError> {
        let mut stream = self.client.logs(
            id,
            Some(LogsOptions::<String> {
                stdout: true,
                stderr: true,
                tail: tail.to_string(),
                ..Default::default()
            }),
        );

        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let bytes = chunk.into_bytes();
            let remaining = max_bytes.saturating_sub(buffer.len());
            if remaining == 0 {
                debug!(container_id = %id, max_bytes, "Log output truncated");
                break;
            }
            buffer.extend_from_slice(&bytes[..bytes.len().min(remaining)]);
        }

        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_key_normalizes_bare_ports() {
        assert_eq!(port_key("80"), "80/tcp");
        assert_eq!(port_key("53/udp"), "53/udp");
    }

    #[test]
    fn parse_env_splits_on_first_equals() {
        let env = vec!["A=1".to_string(), "B=x=y".to_string(), "garbage".to_string()];
        let parsed = parse_env(&env);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["A"], "1");
        assert_eq!(parsed["B"], "x=y");
    }

    #[test]
    fn zero_time_is_treated_as_never_started() {
        assert!(parse_docker_time("0001-01-01T00:00:00Z").is_none());
        assert!(parse_docker_time("2024-05-01T12:00:00.000000000Z").is_some());
    }
}
