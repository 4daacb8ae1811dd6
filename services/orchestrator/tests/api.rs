//! HTTP surface tests: routing, status codes, error bodies, and
//! persistence side effects, driven through the router with a mock
//! runtime.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use skiff_orchestrator::api::create_router;
use skiff_orchestrator::runtime::{ContainerRuntime, MockRuntime};
use skiff_orchestrator::scheduler::Scheduler;
use skiff_orchestrator::state::AppState;
use skiff_orchestrator::store::Store;

fn test_app() -> (Router, TempDir) {
    let data_dir = TempDir::new().expect("tempdir");
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(MockRuntime::new());
    let scheduler = Scheduler::new(Arc::clone(&runtime), 30);
    let store = Store::open(data_dir.path()).expect("store");
    let state = AppState::new(scheduler, runtime, store, 30);
    (create_router(state), data_dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn get(path: &str) -> Request<Body> {
    Request::get(path).body(Body::empty()).expect("request")
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn delete(path: &str) -> Request<Body> {
    Request::delete(path).body(Body::empty()).expect("request")
}

fn web_deployment(replicas: u32) -> Value {
    json!({
        "name": "web",
        "replicas": replicas,
        "container": {
            "name": "web",
            "image": "nginx:alpine",
            "ports": {"80/tcp": "9000"}
        }
    })
}

#[tokio::test]
async fn health_reports_service_identity() {
    let (app, _dir) = test_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "skiff-orchestrator");
}

#[tokio::test]
async fn deployment_lifecycle_over_http() {
    let (app, data_dir) = test_app();

    let (status, body) = send(&app, post_json("/deployments", web_deployment(3))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "web");
    assert_eq!(body["status"], "running");
    assert_eq!(body["replicas"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["replicas"][1]["ports"]["80/tcp"], "9001");

    // The accepted deployment is persisted under its ID.
    let id = body["id"].as_str().expect("deployment id");
    let doc = data_dir.path().join("deployments").join(format!("{id}.json"));
    assert!(doc.exists());

    let (status, body) = send(&app, get("/deployments/web")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, body) = send(&app, get("/deployments")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, delete("/deployments/web")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!doc.exists());

    let (status, body) = send(&app, get("/deployments/web")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn duplicate_deployment_is_a_conflict() {
    let (app, _dir) = test_app();

    let (status, _) = send(&app, post_json("/deployments", web_deployment(1))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post_json("/deployments", web_deployment(1))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_exists");
}

#[tokio::test]
async fn deployment_replica_bounds_are_enforced() {
    let (app, _dir) = test_app();

    let (status, body) = send(&app, post_json("/deployments", web_deployment(0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_spec");

    let (status, _) = send(&app, post_json("/deployments", web_deployment(101))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn service_conflicting_with_deployment_port_is_rejected() {
    let (app, _dir) = test_app();

    let (status, _) = send(&app, post_json("/deployments", web_deployment(2))).await;
    assert_eq!(status, StatusCode::OK);

    // Replica 1 holds host port 9001.
    let conflicting = json!({
        "name": "frontend",
        "type": "ClusterIP",
        "selector": {"app": "web"},
        "ports": [{"port": 9001, "target_port": 80}]
    });
    let (status, body) = send(&app, post_json("/services", conflicting)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().expect("message");
    assert!(message.contains("web"), "got: {message}");
}

#[tokio::test]
async fn service_lifecycle_over_http() {
    let (app, data_dir) = test_app();

    let spec = json!({
        "name": "frontend",
        "type": "NodePort",
        "selector": {"app": "web"},
        "ports": [{"port": 30080, "target_port": 80}]
    });
    let (status, body) = send(&app, post_json("/services", spec)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["spec"]["type"], "NodePort");

    let id = body["id"].as_str().expect("service id");
    let doc = data_dir.path().join("services").join(format!("{id}.json"));
    assert!(doc.exists());

    let (status, _) = send(&app, delete("/services/frontend")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!doc.exists());
}

#[tokio::test]
async fn unsupported_service_type_is_rejected() {
    let (app, _dir) = test_app();
    let spec = json!({
        "name": "frontend",
        "type": "ExternalName",
        "selector": {},
        "ports": [{"port": 8080, "target_port": 80}]
    });
    let (status, body) = send(&app, post_json("/services", spec)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_spec");
}

#[tokio::test]
async fn container_lifecycle_over_http() {
    let (app, _dir) = test_app();

    let spec = json!({
        "name": "scratch",
        "image": "alpine:latest",
        "ports": {"80/tcp": "8080"}
    });
    let (status, body) = send(&app, post_json("/containers", spec)).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().expect("container id").to_string();

    let (status, _) = send(&app, post_json(&format!("/containers/{id}/start"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    // Lookup by name resolves to the same container.
    let (status, body) = send(&app, get("/containers/scratch")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["status"], "running");

    // Logs come back as plain text.
    let response = app
        .clone()
        .oneshot(get(&format!("/containers/{id}/logs?tail=5")))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let logs = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert!(String::from_utf8_lossy(&logs).contains(&id));

    let (status, _) = send(&app, post_json(&format!("/containers/{id}/stop"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, delete(&format!("/containers/{id}/remove"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "removed");

    let (status, _) = send(&app, get("/containers/scratch")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn container_spec_ports_are_validated() {
    let (app, _dir) = test_app();

    let spec = json!({
        "name": "scratch",
        "image": "alpine:latest",
        "ports": {"80/tcp": "99999"}
    });
    let (status, body) = send(&app, post_json("/containers", spec)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_spec");

    let spec = json!({"name": "", "image": "alpine:latest"});
    let (status, _) = send(&app, post_json("/containers", spec)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_reports_registry_and_container_counts() {
    let (app, _dir) = test_app();

    let (status, _) = send(&app, post_json("/deployments", web_deployment(2))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deployments"], 1);
    assert_eq!(body["services"], 0);
    assert_eq!(body["containers"], 2);
}
