// ABOUTME: End-to-end tests through the full HTTP router with the mock backend.
// ABOUTME: Covers message/send, tasks/get, the session and bucket routes, and metrics.

use a2adk::agents::{agent_card, planner_agent};
use a2adk::executor::{AdkAgentExecutor, USER_ID};
use a2adk::server::app_router;
use a2adk::services::Services;
use a2adk_agent::backends::mock::{MockBackend, MockStep};
use a2adk_agent::{Content, Event, Part, SessionService};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

const APP: &str = "birthday_planner";

fn app_with(backend: MockBackend, bucket: Option<PathBuf>) -> (Router, Arc<dyn SessionService>) {
    let services = Services::in_memory();
    let sessions = services.sessions.clone();
    let agent = planner_agent(Arc::new(backend), None);
    let executor = Arc::new(AdkAgentExecutor::new(agent, services));
    let router = app_router(agent_card("localhost", 10008), executor, bucket).unwrap();
    (router, sessions)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec(), headers)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body, _) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn rpc(app: &Router, method: &str, params: Value) -> Value {
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn user_message(text: &str, context_id: &str) -> Value {
    json!({
        "message": {
            "messageId": "m-1",
            "role": "user",
            "kind": "message",
            "parts": [{"kind": "text", "text": text}],
            "contextId": context_id
        }
    })
}

// ============================================================================
// A2A surface
// ============================================================================

#[tokio::test]
async fn test_agent_card_describes_birthday_planner() {
    let (app, _) = app_with(MockBackend::new(), None);
    let (status, card) = get_json(&app, "/.well-known/agent.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(card["name"], "Birthday Planner");
    assert_eq!(card["url"], "http://localhost:10008/");
    assert_eq!(card["skills"][0]["id"], "plan_parties");
}

#[tokio::test]
async fn test_send_message_completes_with_single_artifact() {
    let backend = MockBackend::new()
        .on_prompt("Plan a party for my son turning 3")
        .respond_with(vec![
            MockStep::Partial("Thinking about dinosaurs".to_string()),
            MockStep::Text("Here's a plan...".to_string()),
        ]);
    let (app, _) = app_with(backend, None);

    let response = rpc(
        &app,
        "message/send",
        user_message("Plan a party for my son turning 3", "ctx-1"),
    )
    .await;
    let task = &response["result"];
    assert_eq!(task["kind"], "task");
    assert_eq!(task["contextId"], "ctx-1");
    assert_eq!(task["status"]["state"], "completed");
    let artifacts = task["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0]["parts"], json!([{"kind": "text", "text": "Here's a plan..."}]));

    let fetched = rpc(&app, "tasks/get", json!({"id": task["id"]})).await;
    assert_eq!(fetched["result"]["status"]["state"], "completed");
}

#[tokio::test]
async fn test_failed_run_returns_internal_error() {
    let backend = MockBackend::new()
        .on_prompt("boom")
        .respond_error("model unavailable");
    let (app, _) = app_with(backend, None);

    let response = rpc(&app, "message/send", user_message("boom", "ctx-err")).await;
    assert_eq!(response["error"]["code"], -32603);
    assert!(response["result"].is_null());
}

#[tokio::test]
async fn test_data_part_is_rejected() {
    let (app, _) = app_with(MockBackend::new(), None);
    let params = json!({
        "message": {
            "messageId": "m-1",
            "role": "user",
            "kind": "message",
            "parts": [{"kind": "data", "data": {"guests": 10}}]
        }
    });
    let response = rpc(&app, "message/send", params).await;
    assert_eq!(response["error"]["code"], -32603);
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let (app, _) = app_with(MockBackend::new(), None);
    rpc(&app, "message/send", user_message("hello", "ctx-m")).await;
    let (status, body, _) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("a2adk_agent_runs_total"));
}

// ============================================================================
// Session routes
// ============================================================================

#[tokio::test]
async fn test_session_messages_after_turn() {
    let backend = MockBackend::new()
        .on_prompt("Plan a party")
        .respond_text("Here's a plan...");
    let (app, _) = app_with(backend, None);
    rpc(&app, "message/send", user_message("Plan a party", "ctx-1")).await;

    let (status, messages) = get_json(
        &app,
        &format!("/apps/{}/users/{}/sessions/ctx-1/messages", APP, USER_ID),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["parts"][0], json!({"type": "text", "text": "Plan a party"}));
    assert_eq!(messages[1]["role"], "agent");
    assert_eq!(messages[1]["parts"][0]["text"], "Here's a plan...");
    assert!(messages[1]["messageId"].is_string());
}

#[tokio::test]
async fn test_session_messages_unknown_session_is_404() {
    let (app, _) = app_with(MockBackend::new(), None);
    let (status, body) = get_json(
        &app,
        &format!("/apps/{}/users/{}/sessions/nope/messages", APP, USER_ID),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_session_listing_keeps_recent_sessions_and_user_events() {
    let (app, sessions) = app_with(MockBackend::new(), None);

    for i in 0..7 {
        sessions
            .create_session(APP, USER_ID, Some(&format!("s-{}", i)), None)
            .await
            .unwrap();
    }
    let mut busy = sessions
        .get_session(APP, USER_ID, "s-6")
        .await
        .unwrap()
        .unwrap();
    for i in 0..7 {
        let event = Event::new("inv", "user")
            .with_content(Content::user(vec![Part::text(format!("msg {}", i))]));
        sessions.append_event(&mut busy, event).await.unwrap();
        let reply = Event::new("inv", APP)
            .with_content(Content::model(vec![Part::text("ok")]));
        sessions.append_event(&mut busy, reply).await.unwrap();
    }

    let (status, body) =
        get_json(&app, &format!("/apps/{}/users/{}/sessions", APP, USER_ID)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["sessions"].as_array().unwrap();
    assert_eq!(listed.len(), 5);

    let busy = listed.iter().find(|s| s["id"] == "s-6").unwrap();
    let events = busy["events"].as_array().unwrap();
    assert_eq!(events.len(), 5);
    assert!(events.iter().all(|e| e["author"] == "user"));
}

// ============================================================================
// Bucket route
// ============================================================================

#[tokio::test]
async fn test_bucket_serves_file_inline() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("invites")).unwrap();
    std::fs::write(dir.path().join("invites/card.txt"), "You're invited!").unwrap();
    let (app, _) = app_with(MockBackend::new(), Some(dir.path().to_path_buf()));

    let (status, body, headers) = get(&app, "/buckets/invites/card.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"You're invited!".to_vec());
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"card.txt\""
    );
}

#[tokio::test]
async fn test_bucket_missing_file_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = app_with(MockBackend::new(), Some(dir.path().to_path_buf()));
    let (status, _, _) = get(&app, "/buckets/nothing.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (app, _) = app_with(MockBackend::new(), None);
    let (status, _, _) = get(&app, "/buckets/nothing.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bucket_rejects_parent_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let bucket = dir.path().join("bucket");
    std::fs::create_dir_all(&bucket).unwrap();
    std::fs::write(dir.path().join("secret.txt"), "nope").unwrap();
    let (app, _) = app_with(MockBackend::new(), Some(bucket));

    let (status, _, _) = get(&app, "/buckets/..%2Fsecret.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
