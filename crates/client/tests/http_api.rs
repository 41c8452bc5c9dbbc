//! HttpAttemptApi against an in-process axum backend.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use attempt_sync_client::HttpAttemptApi;
use attempt_sync_core::{
    AttemptApi, FollowUpRequest, ProcessStatus, ProfileVariant, RunReason, SyncError,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Clone, Default)]
struct Backend {
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Backend {
    fn record(&self, route: impl Into<String>, body: Value) {
        self.received.lock().push((route.into(), body));
    }

    fn received(&self) -> Vec<(String, Value)> {
        self.received.lock().clone()
    }
}

fn process_json(id: Uuid, attempt_id: Uuid, status: &str) -> Value {
    json!({
        "id": id,
        "task_attempt_id": attempt_id,
        "run_reason": "codingagent",
        "status": status,
        "executor_action": {
            "typ": {
                "type": "CodingAgentFollowUpRequest",
                "prompt": "tighten validation",
                "session_id": "sess-42",
                "profile": {"profile": "claude-code", "variant": "plan"}
            }
        },
        "exit_code": null,
        "started_at": "2025-07-01T10:00:00Z",
        "completed_at": null,
        "created_at": "2025-07-01T10:00:00Z",
        "updated_at": "2025-07-01T10:00:00Z"
    })
}

async fn list_processes(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let attempt_id: Uuid = query["task_attempt_id"].parse().unwrap();
    Json(json!({
        "success": true,
        "data": [process_json(Uuid::new_v4(), attempt_id, "completed")],
        "message": null
    }))
}

async fn get_process(Path(id): Path<Uuid>) -> impl IntoResponse {
    if id.is_nil() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "data": null, "message": "Execution process not found"})),
        );
    }
    let mut process = process_json(id, Uuid::nil(), "running");
    process["stdout"] = json!("compiling...");
    (
        StatusCode::OK,
        Json(json!({"success": true, "data": process, "message": null})),
    )
}

async fn follow_up(
    State(backend): State<Backend>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.record(format!("follow-up {}", id), body.clone());
    if body["prompt"] == "busy" {
        return Json(json!({"success": false, "data": null, "message": "Executor is busy"}));
    }
    Json(json!({"success": true, "data": null, "message": null}))
}

async fn stop(State(backend): State<Backend>, Path(id): Path<Uuid>) -> Json<Value> {
    backend.record(format!("stop {}", id), Value::Null);
    Json(json!({"success": true, "data": null, "message": null}))
}

async fn open_editor(
    State(backend): State<Backend>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.record(format!("open-editor {}", id), body);
    Json(json!({"success": true, "data": null, "message": null}))
}

async fn get_attempt(Path(id): Path<Uuid>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "id": id,
            "task_id": Uuid::nil(),
            "profile": "claude-code",
            "branch": "vk/abc-fix",
            "base_branch": "main",
            "created_at": "2025-07-01T09:00:00Z",
            "updated_at": "2025-07-01T09:00:00Z"
        },
        "message": null
    }))
}

async fn info() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "config": {
                "theme": "dark",
                "profile": {"profile": "gemini", "variant": null}
            },
            "profiles": [
                {"label": "claude-code", "variants": [{"label": "plan"}]},
                {"label": "gemini", "variants": []}
            ],
            "environment": {"os_type": "Linux"}
        },
        "message": null
    }))
}

async fn broken() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, "upstream down")
}

async fn spawn_backend() -> (Backend, HttpAttemptApi) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/execution-processes", get(list_processes))
        .route("/api/execution-processes/{id}", get(get_process))
        .route("/api/task-attempts/{id}", get(get_attempt))
        .route("/api/task-attempts/{id}/follow-up", post(follow_up))
        .route("/api/task-attempts/{id}/stop", post(stop))
        .route("/api/task-attempts/{id}/open-editor", post(open_editor))
        .route("/api/info", get(info))
        .route("/broken/api/info", get(broken))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let api = HttpAttemptApi::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap();
    (backend, api)
}

#[tokio::test]
async fn test_list_processes_decodes_envelope() {
    let (_backend, api) = spawn_backend().await;
    let attempt_id = Uuid::new_v4();

    let processes = api.list_processes(attempt_id).await.unwrap();
    assert_eq!(processes.len(), 1);
    assert_eq!(processes[0].task_attempt_id, attempt_id);
    assert_eq!(processes[0].run_reason, RunReason::CodingAgent);
    assert_eq!(processes[0].status, ProcessStatus::Completed);
}

#[tokio::test]
async fn test_get_process_detail_and_not_found() {
    let (_backend, api) = spawn_backend().await;
    let id = Uuid::new_v4();

    let detail = api.get_process(id).await.unwrap();
    assert_eq!(detail.id, id);
    assert_eq!(detail.stdout.as_deref(), Some("compiling..."));

    let missing = api.get_process(Uuid::nil()).await;
    assert_eq!(
        missing.unwrap_err(),
        SyncError::Api("Execution process not found".to_string())
    );
}

#[tokio::test]
async fn test_get_attempt() {
    let (_backend, api) = spawn_backend().await;
    let id = Uuid::new_v4();

    let attempt = api.get_attempt(id).await.unwrap();
    assert_eq!(attempt.id, id);
    assert_eq!(attempt.profile.as_deref(), Some("claude-code"));
    assert_eq!(attempt.base_branch.as_deref(), Some("main"));
}

#[tokio::test]
async fn test_follow_up_body_and_api_error() {
    let (backend, api) = spawn_backend().await;
    let id = Uuid::new_v4();

    api.submit_follow_up(
        id,
        &FollowUpRequest {
            prompt: "add tests".to_string(),
            variant: Some("plan".to_string()),
        },
    )
    .await
    .unwrap();

    let busy = api
        .submit_follow_up(
            id,
            &FollowUpRequest {
                prompt: "busy".to_string(),
                variant: None,
            },
        )
        .await;
    assert_eq!(busy, Err(SyncError::Api("Executor is busy".to_string())));

    let received = backend.received();
    assert_eq!(received[0].0, format!("follow-up {}", id));
    assert_eq!(received[0].1, json!({"prompt": "add tests", "variant": "plan"}));
    assert_eq!(received[1].1, json!({"prompt": "busy", "variant": null}));
}

#[tokio::test]
async fn test_stop_and_open_editor() {
    let (backend, api) = spawn_backend().await;
    let id = Uuid::new_v4();

    api.stop_attempt(id).await.unwrap();
    api.open_editor(id, Some("cursor")).await.unwrap();
    api.open_editor(id, None).await.unwrap();

    let received = backend.received();
    assert_eq!(received[0].0, format!("stop {}", id));
    assert_eq!(received[1].1, json!({"editor_type": "cursor"}));
    assert_eq!(received[2].1, json!({"editor_type": null}));
}

#[tokio::test]
async fn test_system_info_catalog() {
    let (_backend, api) = spawn_backend().await;

    let info = api.fetch_system_info().await.unwrap();
    assert_eq!(info.catalog.profiles.len(), 2);
    assert_eq!(info.catalog.first_variant("claude-code"), Some("plan"));
    assert_eq!(info.catalog.first_variant("gemini"), None);
    assert_eq!(info.config.profile, Some(ProfileVariant::new("gemini")));
}

#[tokio::test]
async fn test_non_envelope_error_status() {
    let (_backend, api) = spawn_backend().await;
    let broken = HttpAttemptApi::new(
        format!("{}/broken", api.base_url()),
        Duration::from_secs(5),
    )
    .unwrap();

    let result = broken.fetch_system_info().await;
    match result {
        Err(SyncError::Api(message)) => assert!(message.contains("502")),
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpAttemptApi::new(format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let result = api.list_processes(Uuid::new_v4()).await;
    assert!(matches!(result, Err(SyncError::Network(_))));
}
