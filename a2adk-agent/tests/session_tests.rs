// ABOUTME: Tests for the in-memory and SQLite session services.
// ABOUTME: Both backends must honor the same get-or-create and append contract.

use a2adk_agent::{
    Content, Event, InMemorySessionService, Part, SessionService, SqliteSessionService,
};
use serde_json::{json, Map};
use tempfile::TempDir;

fn text_event(author: &str, text: &str) -> Event {
    Event::new("inv-1", author).with_content(Content::user(vec![Part::text(text)]))
}

async fn check_create_is_idempotent(service: &dyn SessionService) {
    let first = service
        .create_session("app", "self", Some("s-1"), None)
        .await
        .unwrap()
        .unwrap();
    let second = service
        .create_session("app", "self", Some("s-1"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.app_name, second.app_name);
    assert_eq!(first.user_id, second.user_id);
    assert_eq!(
        service.list_sessions("app", "self").await.unwrap().len(),
        1
    );
}

async fn check_append_persists_events_and_state(service: &dyn SessionService) {
    let mut session = service
        .create_session("app", "self", Some("s-2"), None)
        .await
        .unwrap()
        .unwrap();

    let mut event = text_event("planner", "hello");
    event.actions.state_delta.insert("task_id".to_string(), json!("t-9"));
    event
        .actions
        .state_delta
        .insert("temp:scratch".to_string(), json!(1));
    service.append_event(&mut session, event).await.unwrap();

    // Partial events are not persisted
    let partial = text_event("planner", "hel").with_partial(true);
    service.append_event(&mut session, partial).await.unwrap();

    let loaded = service
        .get_session("app", "self", "s-2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.events.len(), 1);
    assert_eq!(loaded.state.get("task_id"), Some(&json!("t-9")));
    assert!(!loaded.state.contains_key("temp:scratch"));
    assert_eq!(session.events.len(), 1);
}

// =============================================================================
// In-memory
// =============================================================================

#[tokio::test]
async fn test_in_memory_create_is_idempotent() {
    check_create_is_idempotent(&InMemorySessionService::new()).await;
}

#[tokio::test]
async fn test_in_memory_append_persists_events_and_state() {
    check_append_persists_events_and_state(&InMemorySessionService::new()).await;
}

#[tokio::test]
async fn test_in_memory_get_missing_session_is_none() {
    let service = InMemorySessionService::new();
    assert!(service
        .get_session("app", "self", "nope")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_in_memory_create_without_id_generates_one() {
    let service = InMemorySessionService::new();
    let mut state = Map::new();
    state.insert("k".to_string(), json!("v"));
    let session = service
        .create_session("app", "self", None, Some(state))
        .await
        .unwrap()
        .unwrap();
    assert!(!session.id.is_empty());
    assert_eq!(session.state.get("k"), Some(&json!("v")));
}

// =============================================================================
// SQLite
// =============================================================================

#[tokio::test]
async fn test_sqlite_create_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let service = SqliteSessionService::open(dir.path().join("sessions.db")).unwrap();
    check_create_is_idempotent(&service).await;
}

#[tokio::test]
async fn test_sqlite_append_persists_events_and_state() {
    let dir = TempDir::new().unwrap();
    let service = SqliteSessionService::open(dir.path().join("sessions.db")).unwrap();
    check_append_persists_events_and_state(&service).await;
}

#[tokio::test]
async fn test_sqlite_sessions_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("sessions.db");
    {
        let service = SqliteSessionService::open(&path).unwrap();
        let mut session = service
            .create_session("app", "self", Some("s-3"), None)
            .await
            .unwrap()
            .unwrap();
        service
            .append_event(&mut session, text_event("user", "remember me"))
            .await
            .unwrap();
    }

    let service = SqliteSessionService::open(&path).unwrap();
    let session = service
        .get_session("app", "self", "s-3")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.events.len(), 1);
    assert_eq!(
        session.events[0].content.as_ref().unwrap().text(),
        "remember me"
    );
}

#[tokio::test]
async fn test_sqlite_append_to_unknown_session_fails() {
    let dir = TempDir::new().unwrap();
    let service = SqliteSessionService::open(dir.path().join("sessions.db")).unwrap();
    let mut ghost = a2adk_agent::Session::new("app", "self", "ghost", Map::new());
    let err = service
        .append_event(&mut ghost, text_event("user", "hi"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Session not found"));
}
