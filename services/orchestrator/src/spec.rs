//! Data model: container, deployment, and service specs plus the registry
//! entities built from them.
//!
//! Specs are the caller-supplied desired state; entities are what the
//! scheduler registers once the runtime has been driven to match.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skiff_id::{DeploymentId, ServiceId};

/// Desired state for a single container.
///
/// `ports` maps a container port (`"80"` or `"80/tcp"`) to a host port,
/// both as strings. For deployment templates the host port is the base of
/// the per-replica stripe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub ports: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeMount>,
}

/// A host-path volume mount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeMount {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Handle to a container as reported by the runtime backend.
///
/// Replicas of a deployment are containers owned exclusively by that
/// deployment; they are never registered on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub ports: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

/// Desired state for a deployment: one container template fanned out to a
/// fixed replica count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub name: String,
    pub replicas: usize,
    pub container: ContainerSpec,
    /// Update strategy tag. Recorded but unused by current logic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Deployment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Creating,
    Running,
    Deleting,
}

/// A registered deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,
    pub name: String,
    pub spec: DeploymentSpec,
    pub status: DeploymentStatus,
    pub replicas: Vec<Container>,
    pub created_at: DateTime<Utc>,
}

/// Recognized service types.
pub const SERVICE_TYPES: &[&str] = &["ClusterIP", "NodePort", "LoadBalancer"];

/// One external-port to target-port mapping of a service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServicePort {
    pub port: i64,
    pub target_port: i64,
}

/// Desired state for a service.
///
/// The selector is a free-form label map; it is not validated against any
/// deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub selector: HashMap<String, String>,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

/// Service lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
}

/// A registered service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub spec: ServiceSpec,
    pub endpoints: Vec<String>,
    pub status: ServiceStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_spec_deserializes_with_defaults() {
        let spec: DeploymentSpec = serde_json::from_str(
            r#"{
                "name": "web",
                "replicas": 3,
                "container": {
                    "name": "web",
                    "image": "nginx:alpine",
                    "ports": {"80/tcp": "9000"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(spec.replicas, 3);
        assert!(spec.strategy.is_none());
        assert_eq!(spec.container.ports["80/tcp"], "9000");
    }

    #[test]
    fn service_spec_uses_type_field_name() {
        let spec: ServiceSpec = serde_json::from_str(
            r#"{
                "name": "frontend",
                "type": "ClusterIP",
                "selector": {"app": "web"},
                "ports": [{"port": 8080, "target_port": 80}]
            }"#,
        )
        .unwrap();
        assert_eq!(spec.service_type, "ClusterIP");
        assert_eq!(spec.ports[0].port, 8080);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DeploymentStatus::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(
            serde_json::to_string(&ServiceStatus::Active).unwrap(),
            "\"active\""
        );
    }
}
