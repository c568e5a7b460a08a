//! REST surface tests driving the router in-process.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use swarm_agent::api;
use swarm_agent::{
    Connector, ControllerError, StepReply, StepSource, Steps, Swarm, SwarmSettings, WorkerConfig,
};

struct IdleSource;

#[async_trait]
impl StepSource for IdleSource {
    async fn register(&self) -> Result<(), ControllerError> {
        Ok(())
    }

    async fn next_steps(&self) -> Result<Steps, ControllerError> {
        Ok(Steps::default())
    }

    async fn post_reply(&self, _reply: &StepReply) -> Result<(), ControllerError> {
        Ok(())
    }
}

struct IdleConnector;

impl Connector for IdleConnector {
    fn connect(&self, _config: &WorkerConfig) -> Result<Arc<dyn StepSource>, ControllerError> {
        Ok(Arc::new(IdleSource))
    }
}

fn settings() -> SwarmSettings {
    SwarmSettings {
        reboot_poll_interval: Duration::from_millis(20),
        default_instruction_interval: Duration::from_millis(20),
        exit_grace: Duration::from_millis(50),
    }
}

fn app() -> Router {
    api::router(Arc::new(Swarm::new(Arc::new(IdleConnector), settings())))
}

fn hosts_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"hostname": "master-0", "ip": "192.168.126.10", "reboot_marker_path": ""}}]"#
    )
    .unwrap();
    file
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), "GET", "/api/swarm/health", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_list_empty_is_array() {
    let (status, body) = send(&app(), "GET", "/api/swarm/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_with_missing_hosts_file() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/swarm/agents",
        Some(json!({
            "dry_forced_host_id": "11111111-1111-1111-1111-111111111111",
            "dry_cluster_hosts_path": "/nonexistent/hosts.json"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "400");
    assert_eq!(body["id"], 400);
    assert_eq!(body["kind"], "Error");
    assert!(body["reason"]
        .as_str()
        .unwrap()
        .contains("failed to read cluster hosts file"));

    let (status, _) = send(&app, "GET", "/api/swarm/agents/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = send(&app, "GET", "/api/swarm/agents", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/swarm/agents")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_forced_host_id() {
    let (status, body) = send(
        &app(),
        "POST",
        "/api/swarm/agents",
        Some(json!({"dry_forced_host_id": "not-a-uuid"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["reason"].as_str().unwrap().contains("must be of type uuid"));
}

#[tokio::test]
async fn test_create_get_delete() {
    let app = app();
    let hosts = hosts_file();
    let params = json!({"dry_cluster_hosts_path": hosts.path().to_str().unwrap()});

    let (status, first) = send(&app, "POST", "/api/swarm/agents", Some(params.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "RUNNING");
    assert!(first.get("terminated_at").is_none());

    let (_, second) = send(&app, "POST", "/api/swarm/agents", Some(params)).await;
    assert!(second["id"].as_i64().unwrap() > first["id"].as_i64().unwrap());

    let uri = format!("/api/swarm/agents/{}", first["id"]);
    let (status, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], first["id"]);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "404");
    assert_eq!(body["reason"], format!("id {} does not exist", first["id"]));

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app, "GET", "/api/swarm/agents", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let (status, body) = send(&app(), "GET", "/api/swarm/agents/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "Error");
}

#[tokio::test]
async fn test_reboot_marker_terminates_agent() {
    let app = app();
    let hosts = hosts_file();
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("reboot");

    let (status, agent) = send(
        &app,
        "POST",
        "/api/swarm/agents",
        Some(json!({
            "dry_cluster_hosts_path": hosts.path().to_str().unwrap(),
            "dry_fake_reboot_marker_path": marker.to_str().unwrap()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    std::fs::write(&marker, b"").unwrap();

    let uri = format!("/api/swarm/agents/{}", agent["id"]);
    let mut terminated = Value::Null;
    for _ in 0..100 {
        let (_, current) = send(&app, "GET", &uri, None).await;
        if current["status"] == "TERMINATED" {
            terminated = current;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(terminated["status"], "TERMINATED");
    assert!(terminated["terminated_at"].is_string());
}

static EXITED: AtomicBool = AtomicBool::new(false);

fn record_exit(_code: i32) {
    EXITED.store(true, Ordering::SeqCst);
}

#[tokio::test]
async fn test_exit_responds_then_terminates() {
    let swarm = Swarm::new(Arc::new(IdleConnector), settings()).with_exit_hook(record_exit);
    let app = api::router(Arc::new(swarm));

    let (status, _) = send(&app, "POST", "/api/swarm/exit", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!EXITED.load(Ordering::SeqCst));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(EXITED.load(Ordering::SeqCst));
}
