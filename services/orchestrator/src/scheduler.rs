//! Deployment and service scheduling.
//!
//! The scheduler owns the authoritative in-memory registry of deployments
//! and services. It fans a deployment out into per-replica containers with
//! deterministic port striping, enforces global port-conflict rules across
//! every registered service and deployment, and compensates runtime state
//! when replica creation fails partway.
//!
//! The registry is reachable only through the scheduler's public
//! operations. One lock guards both collections: mutations hold it
//! exclusively for their entire body, including runtime calls, so creates
//! and deletes are strictly serialized against each other and against
//! reads. A slow multi-replica create therefore blocks unrelated registry
//! activity; that ordering guarantee is deliberate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use skiff_id::{DeploymentId, ServiceId};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::runtime::{ContainerRuntime, RuntimeError};
use crate::spec::{
    Container, ContainerSpec, Deployment, DeploymentSpec, DeploymentStatus, Service, ServiceSpec,
    ServiceStatus, SERVICE_TYPES,
};

/// Errors from scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("deployment already exists: {0}")]
    DeploymentExists(String),

    #[error("service already exists: {0}")]
    ServiceExists(String),

    #[error("deployment not found: {0}")]
    DeploymentNotFound(String),

    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("invalid spec: {0}")]
    Validation(String),

    #[error("replica {index} failed: {source}")]
    Runtime {
        index: usize,
        #[source]
        source: RuntimeError,
    },
}

/// Resolves a service selector to endpoint addresses.
///
/// Extension point: nothing in the current design populates endpoints, so
/// the default resolver always returns an empty list.
pub trait EndpointResolver: Send + Sync {
    fn resolve(&self, selector: &HashMap<String, String>) -> Vec<String>;
}

/// Default resolver; services carry no endpoints.
pub struct NoopEndpointResolver;

impl EndpointResolver for NoopEndpointResolver {
    fn resolve(&self, _selector: &HashMap<String, String>) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Default)]
struct Registry {
    deployments: HashMap<DeploymentId, Deployment>,
    deployment_names: HashMap<String, DeploymentId>,
    services: HashMap<ServiceId, Service>,
    service_names: HashMap<String, ServiceId>,
}

/// Manages deployments and services against a runtime backend.
pub struct Scheduler {
    runtime: Arc<dyn ContainerRuntime>,
    endpoints: Box<dyn EndpointResolver>,
    stop_grace_secs: u32,
    registry: RwLock<Registry>,
}

impl Scheduler {
    /// Create a scheduler with the default (no-op) endpoint resolver.
    pub fn new(runtime: Arc<dyn ContainerRuntime>, stop_grace_secs: u32) -> Self {
        Self::with_endpoint_resolver(runtime, stop_grace_secs, Box::new(NoopEndpointResolver))
    }

    pub fn with_endpoint_resolver(
        runtime: Arc<dyn ContainerRuntime>,
        stop_grace_secs: u32,
        endpoints: Box<dyn EndpointResolver>,
    ) -> Self {
        Self {
            runtime,
            endpoints,
            stop_grace_secs,
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Create a deployment: fan the container template out to
    /// `spec.replicas` containers, create and start each, and register the
    /// deployment only once every replica is running.
    ///
    /// On any replica failure, containers started so far are stopped and
    /// removed best-effort and the deployment is never registered.
    pub async fn create_deployment(
        &self,
        spec: DeploymentSpec,
    ) -> Result<Deployment, SchedulerError> {
        let mut registry = self.registry.write().await;

        if registry.deployment_names.contains_key(&spec.name) {
            return Err(SchedulerError::DeploymentExists(spec.name));
        }

        if spec.replicas < 1 {
            return Err(SchedulerError::Validation(
                "replica count must be at least 1".to_string(),
            ));
        }

        let mut deployment = Deployment {
            id: DeploymentId::new(),
            name: spec.name.clone(),
            spec: spec.clone(),
            status: DeploymentStatus::Creating,
            replicas: Vec::with_capacity(spec.replicas),
            created_at: Utc::now(),
        };

        for index in 0..spec.replicas {
            let replica_spec = replica_spec(&spec, index);

            let mut container = match self.runtime.create(&replica_spec).await {
                Ok(container) => container,
                Err(source) => {
                    self.cleanup_replicas(&deployment.replicas).await;
                    return Err(SchedulerError::Runtime { index, source });
                }
            };

            if let Err(source) = self.runtime.start(&container.id).await {
                self.cleanup_replicas(&deployment.replicas).await;
                return Err(SchedulerError::Runtime { index, source });
            }

            container.status = "running".to_string();
            deployment.replicas.push(container);
        }

        deployment.status = DeploymentStatus::Running;
        registry
            .deployment_names
            .insert(deployment.name.clone(), deployment.id);
        registry.deployments.insert(deployment.id, deployment.clone());

        info!(
            deployment_id = %deployment.id,
            name = %deployment.name,
            replicas = spec.replicas,
            "Deployment created"
        );

        Ok(deployment)
    }

    /// Get a deployment by name.
    pub async fn get_deployment(&self, name: &str) -> Result<Deployment, SchedulerError> {
        let registry = self.registry.read().await;
        registry
            .deployment_names
            .get(name)
            .and_then(|id| registry.deployments.get(id))
            .cloned()
            .ok_or_else(|| SchedulerError::DeploymentNotFound(name.to_string()))
    }

    /// List all deployments in unspecified order.
    pub async fn list_deployments(&self) -> Vec<Deployment> {
        let registry = self.registry.read().await;
        registry.deployments.values().cloned().collect()
    }

    /// Delete a deployment by name, stopping and removing its replicas.
    ///
    /// Container cleanup is best-effort; the registry entry is removed even
    /// when individual runtime calls fail.
    pub async fn delete_deployment(&self, name: &str) -> Result<Deployment, SchedulerError> {
        let mut registry = self.registry.write().await;

        let id = *registry
            .deployment_names
            .get(name)
            .ok_or_else(|| SchedulerError::DeploymentNotFound(name.to_string()))?;
        let mut deployment = registry
            .deployments
            .get(&id)
            .cloned()
            .ok_or_else(|| SchedulerError::DeploymentNotFound(name.to_string()))?;

        deployment.status = DeploymentStatus::Deleting;
        self.cleanup_replicas(&deployment.replicas).await;

        // Cleanup failures never block logical deletion.
        registry.deployment_names.remove(name);
        registry.deployments.remove(&id);

        info!(deployment_id = %id, name = %name, "Deployment deleted");
        Ok(deployment)
    }

    /// Create a service after running the conflict checks in strict order:
    /// name uniqueness, field validation, self conflict, cross-service
    /// conflict, cross-deployment conflict.
    pub async fn create_service(&self, spec: ServiceSpec) -> Result<Service, SchedulerError> {
        let mut registry = self.registry.write().await;

        if registry.service_names.contains_key(&spec.name) {
            return Err(SchedulerError::ServiceExists(spec.name));
        }

        validate_service_fields(&spec)?;
        validate_port_conflicts(&registry, &spec)?;

        let service = Service {
            id: ServiceId::new(),
            name: spec.name.clone(),
            endpoints: self.endpoints.resolve(&spec.selector),
            status: ServiceStatus::Active,
            created_at: Utc::now(),
            spec,
        };

        registry
            .service_names
            .insert(service.name.clone(), service.id);
        registry.services.insert(service.id, service.clone());

        info!(
            service_id = %service.id,
            name = %service.name,
            service_type = %service.spec.service_type,
            "Service created"
        );

        Ok(service)
    }

    /// Get a service by name.
    pub async fn get_service(&self, name: &str) -> Result<Service, SchedulerError> {
        let registry = self.registry.read().await;
        registry
            .service_names
            .get(name)
            .and_then(|id| registry.services.get(id))
            .cloned()
            .ok_or_else(|| SchedulerError::ServiceNotFound(name.to_string()))
    }

    /// List all services in unspecified order.
    pub async fn list_services(&self) -> Vec<Service> {
        let registry = self.registry.read().await;
        registry.services.values().cloned().collect()
    }

    /// Delete a service by name. Services hold no runtime state, so this
    /// is a pure registry removal.
    pub async fn delete_service(&self, name: &str) -> Result<Service, SchedulerError> {
        let mut registry = self.registry.write().await;

        let id = registry
            .service_names
            .remove(name)
            .ok_or_else(|| SchedulerError::ServiceNotFound(name.to_string()))?;
        let removed = registry
            .services
            .remove(&id)
            .ok_or_else(|| SchedulerError::ServiceNotFound(name.to_string()))?;

        info!(service_id = %id, name = %name, "Service deleted");
        Ok(removed)
    }

    /// Registered deployment and service counts.
    pub async fn counts(&self) -> (usize, usize) {
        let registry = self.registry.read().await;
        (registry.deployments.len(), registry.services.len())
    }

    /// Stop and remove the given replicas, logging but not failing on each
    /// individual error. One pass, no retries.
    async fn cleanup_replicas(&self, replicas: &[Container]) {
        for container in replicas {
            if let Err(e) = self.runtime.stop(&container.id, self.stop_grace_secs).await {
                warn!(container_id = %container.id, error = %e, "Failed to stop container");
            }
            if let Err(e) = self.runtime.remove(&container.id, true).await {
                warn!(container_id = %container.id, error = %e, "Failed to remove container");
            }
        }
    }
}

/// Derive the container spec for replica `index`: the template with the
/// replica name `{deployment}-{index}` and every host port striped to
/// `base + index`.
fn replica_spec(spec: &DeploymentSpec, index: usize) -> ContainerSpec {
    let mut container = spec.container.clone();
    container.name = format!("{}-{}", spec.name, index);
    container.ports = spec
        .container
        .ports
        .iter()
        .map(|(container_port, base_host_port)| {
            // Textual base ports that fail to parse stripe from zero,
            // keeping replica ports distinct either way.
            let base: i64 = base_host_port.trim().parse().unwrap_or(0);
            (container_port.clone(), (base + index as i64).to_string())
        })
        .collect();
    container
}

fn validate_service_fields(spec: &ServiceSpec) -> Result<(), SchedulerError> {
    if !SERVICE_TYPES.contains(&spec.service_type.as_str()) {
        return Err(SchedulerError::Validation(format!(
            "unsupported service type: {} (expected one of {})",
            spec.service_type,
            SERVICE_TYPES.join(", ")
        )));
    }

    if spec.ports.is_empty() {
        return Err(SchedulerError::Validation(
            "at least one port mapping is required".to_string(),
        ));
    }

    for port in &spec.ports {
        if !(1..=65535).contains(&port.port) {
            return Err(SchedulerError::Validation(format!(
                "invalid port {}: must be within 1-65535",
                port.port
            )));
        }
        if !(1..=65535).contains(&port.target_port) {
            return Err(SchedulerError::Validation(format!(
                "invalid target port {}: must be within 1-65535",
                port.target_port
            )));
        }
    }

    Ok(())
}

fn validate_port_conflicts(registry: &Registry, spec: &ServiceSpec) -> Result<(), SchedulerError> {
    // Conflicts within the new spec itself.
    let mut used = HashSet::new();
    for port in &spec.ports {
        if !used.insert(port.port) {
            return Err(SchedulerError::Validation(format!(
                "port {} already mapped within this service",
                port.port
            )));
        }
    }

    // Conflicts with every other registered service.
    for existing in registry.services.values() {
        for existing_port in &existing.spec.ports {
            for port in &spec.ports {
                if existing_port.port == port.port {
                    return Err(SchedulerError::Validation(format!(
                        "port {} already in use by service '{}'",
                        port.port, existing.name
                    )));
                }
            }
        }
    }

    // Conflicts with host ports bound by deployment replicas. Host-port
    // strings that fail to parse are skipped, never treated as conflicts.
    for deployment in registry.deployments.values() {
        for replica in &deployment.replicas {
            for (container_port, host_port) in &replica.ports {
                let Ok(host_port) = host_port.parse::<i64>() else {
                    continue;
                };
                for port in &spec.ports {
                    if host_port == port.port {
                        return Err(SchedulerError::Validation(format!(
                            "port {} already bound by deployment '{}' (container port {})",
                            port.port, deployment.name, container_port
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::spec::ServicePort;

    fn template(name: &str, ports: &[(&str, &str)]) -> DeploymentSpec {
        DeploymentSpec {
            name: name.to_string(),
            replicas: 1,
            container: ContainerSpec {
                name: name.to_string(),
                image: "nginx:alpine".to_string(),
                ports: ports
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            },
            strategy: None,
        }
    }

    #[test]
    fn replica_spec_names_and_stripes_ports() {
        let spec = template("web", &[("80/tcp", "9000"), ("443/tcp", "9443")]);

        let replica = replica_spec(&spec, 2);
        assert_eq!(replica.name, "web-2");
        assert_eq!(replica.ports["80/tcp"], "9002");
        assert_eq!(replica.ports["443/tcp"], "9445");
    }

    #[rstest]
    #[case("9000", 0, "9000")]
    #[case("9000", 3, "9003")]
    #[case(" 9000 ", 1, "9001")]
    #[case("auto", 0, "0")]
    #[case("auto", 3, "3")]
    #[case("", 2, "2")]
    fn replica_spec_striping_bases(
        #[case] base: &str,
        #[case] index: usize,
        #[case] expected: &str,
    ) {
        let spec = template("web", &[("80/tcp", base)]);
        assert_eq!(replica_spec(&spec, index).ports["80/tcp"], expected);
    }

    #[test]
    fn service_field_validation() {
        let mut spec = ServiceSpec {
            name: "frontend".to_string(),
            service_type: "ClusterIP".to_string(),
            selector: HashMap::new(),
            ports: vec![ServicePort {
                port: 8080,
                target_port: 80,
            }],
        };
        assert!(validate_service_fields(&spec).is_ok());

        spec.service_type = "ExternalName".to_string();
        assert!(validate_service_fields(&spec).is_err());

        spec.service_type = "NodePort".to_string();
        spec.ports.clear();
        assert!(validate_service_fields(&spec).is_err());

        spec.ports = vec![ServicePort {
            port: 70000,
            target_port: 80,
        }];
        assert!(validate_service_fields(&spec).is_err());
    }
}
