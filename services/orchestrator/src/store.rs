//! Flat-file persistence for deployments and services.
//!
//! One JSON document per entity, keyed by ID, under
//! `{data_dir}/deployments/` and `{data_dir}/services/`. Saves are
//! whole-document overwrites. Bulk loads tolerate individual bad records:
//! an unreadable or corrupt file is skipped with a warning so one bad
//! document never blocks the rest from loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use skiff_id::{DeploymentId, ServiceId};
use thiserror::Error;
use tracing::{debug, warn};

use crate::spec::{Deployment, Service};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

const DEPLOYMENTS_DIR: &str = "deployments";
const SERVICES_DIR: &str = "services";

/// File-backed document store.
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    /// Open a store rooted at `data_dir`, creating the per-kind
    /// subdirectories if needed.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        for dir in [DEPLOYMENTS_DIR, SERVICES_DIR] {
            fs::create_dir_all(data_dir.join(dir))?;
        }
        Ok(Self { data_dir })
    }

    fn document_path(&self, kind: &str, id: &str) -> PathBuf {
        self.data_dir.join(kind).join(format!("{id}.json"))
    }

    fn save<T: Serialize>(&self, kind: &str, id: &str, doc: &T) -> Result<(), StoreError> {
        let path = self.document_path(kind, id);
        let data = serde_json::to_vec_pretty(doc)?;
        fs::write(&path, data)?;
        debug!(id = %id, path = %path.display(), "Document saved");
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<T, StoreError> {
        let path = self.document_path(kind, id);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    fn delete(&self, kind: &str, id: &str) -> Result<(), StoreError> {
        let path = self.document_path(kind, id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(id = %id, path = %path.display(), "Document deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn load_all<T: DeserializeOwned>(&self, kind: &str) -> Result<Vec<T>, StoreError> {
        let dir = self.data_dir.join(kind);
        let mut documents = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let data = match fs::read(&path) {
                Ok(data) => data,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                    continue;
                }
            };

            match serde_json::from_slice(&data) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping corrupt document");
                }
            }
        }

        Ok(documents)
    }

    pub fn save_deployment(&self, deployment: &Deployment) -> Result<(), StoreError> {
        self.save(DEPLOYMENTS_DIR, &deployment.id.to_string(), deployment)
    }

    pub fn load_deployment(&self, id: DeploymentId) -> Result<Deployment, StoreError> {
        self.load(DEPLOYMENTS_DIR, &id.to_string())
    }

    pub fn load_all_deployments(&self) -> Result<Vec<Deployment>, StoreError> {
        self.load_all(DEPLOYMENTS_DIR)
    }

    pub fn delete_deployment(&self, id: DeploymentId) -> Result<(), StoreError> {
        self.delete(DEPLOYMENTS_DIR, &id.to_string())
    }

    pub fn save_service(&self, service: &Service) -> Result<(), StoreError> {
        self.save(SERVICES_DIR, &service.id.to_string(), service)
    }

    pub fn load_service(&self, id: ServiceId) -> Result<Service, StoreError> {
        self.load(SERVICES_DIR, &id.to_string())
    }

    pub fn load_all_services(&self) -> Result<Vec<Service>, StoreError> {
        self.load_all(SERVICES_DIR)
    }

    pub fn delete_service(&self, id: ServiceId) -> Result<(), StoreError> {
        self.delete(SERVICES_DIR, &id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::spec::{
        ContainerSpec, DeploymentSpec, DeploymentStatus, ServicePort, ServiceSpec, ServiceStatus,
    };

    fn sample_deployment(name: &str) -> Deployment {
        Deployment {
            id: DeploymentId::new(),
            name: name.to_string(),
            spec: DeploymentSpec {
                name: name.to_string(),
                replicas: 2,
                container: ContainerSpec {
                    name: name.to_string(),
                    image: "nginx:alpine".to_string(),
                    ports: HashMap::from([("80/tcp".to_string(), "9000".to_string())]),
                    ..Default::default()
                },
                strategy: Some("recreate".to_string()),
            },
            status: DeploymentStatus::Running,
            replicas: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn sample_service(name: &str) -> Service {
        Service {
            id: ServiceId::new(),
            name: name.to_string(),
            spec: ServiceSpec {
                name: name.to_string(),
                service_type: "ClusterIP".to_string(),
                selector: HashMap::from([("app".to_string(), name.to_string())]),
                ports: vec![ServicePort {
                    port: 8080,
                    target_port: 80,
                }],
            },
            endpoints: Vec::new(),
            status: ServiceStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn deployment_roundtrip_preserves_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let deployment = sample_deployment("web");
        store.save_deployment(&deployment).unwrap();

        let loaded = store.load_deployment(deployment.id).unwrap();
        assert_eq!(
            serde_json::to_value(&loaded).unwrap(),
            serde_json::to_value(&deployment).unwrap()
        );
    }

    #[test]
    fn service_roundtrip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let service = sample_service("frontend");
        store.save_service(&service).unwrap();
        assert_eq!(store.load_service(service.id).unwrap().name, "frontend");

        store.delete_service(service.id).unwrap();
        assert!(matches!(
            store.load_service(service.id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn load_all_skips_corrupt_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        for name in ["a", "b", "c"] {
            store.save_deployment(&sample_deployment(name)).unwrap();
        }
        std::fs::write(
            dir.path().join(DEPLOYMENTS_DIR).join("broken.json"),
            b"{ not json",
        )
        .unwrap();
        std::fs::write(dir.path().join(DEPLOYMENTS_DIR).join("notes.txt"), b"hi").unwrap();

        let loaded = store.load_all_deployments().unwrap();
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn delete_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        assert!(matches!(
            store.delete_deployment(DeploymentId::new()),
            Err(StoreError::NotFound(_))
        ));
    }
}
