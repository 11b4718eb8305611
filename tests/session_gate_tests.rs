// ABOUTME: Tests for session get-or-create ahead of each agent turn.
// ABOUTME: Uses the in-memory service plus stubs for backends that yield nothing or fail.

use a2adk::session_gate;
use a2adk_agent::{Event, InMemorySessionService, Session, SessionService};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Backend that never finds a session and silently creates none
struct HollowSessions;

#[async_trait]
impl SessionService for HollowSessions {
    async fn create_session(
        &self,
        _app_name: &str,
        _user_id: &str,
        _session_id: Option<&str>,
        _state: Option<Map<String, Value>>,
    ) -> Result<Option<Session>> {
        Ok(None)
    }

    async fn get_session(&self, _: &str, _: &str, _: &str) -> Result<Option<Session>> {
        Ok(None)
    }

    async fn list_sessions(&self, _: &str, _: &str) -> Result<Vec<Session>> {
        Ok(Vec::new())
    }

    async fn append_event(&self, _session: &mut Session, event: Event) -> Result<Event> {
        Ok(event)
    }
}

/// Backend whose reads fail
struct BrokenSessions;

#[async_trait]
impl SessionService for BrokenSessions {
    async fn create_session(
        &self,
        _: &str,
        _: &str,
        _: Option<&str>,
        _: Option<Map<String, Value>>,
    ) -> Result<Option<Session>> {
        Err(anyhow!("database is locked"))
    }

    async fn get_session(&self, _: &str, _: &str, _: &str) -> Result<Option<Session>> {
        Err(anyhow!("database is locked"))
    }

    async fn list_sessions(&self, _: &str, _: &str) -> Result<Vec<Session>> {
        Err(anyhow!("database is locked"))
    }

    async fn append_event(&self, _session: &mut Session, _event: Event) -> Result<Event> {
        Err(anyhow!("database is locked"))
    }
}

#[tokio::test]
async fn test_resolve_creates_missing_session_with_given_id() {
    let sessions = InMemorySessionService::new();
    let session = session_gate::resolve(&sessions, "planner", "self", "ctx-42")
        .await
        .unwrap();
    assert_eq!(session.id, "ctx-42");
    assert_eq!(session.app_name, "planner");
    assert_eq!(session.user_id, "self");
    assert!(session.events.is_empty());

    let stored = sessions.get_session("planner", "self", "ctx-42").await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_resolve_returns_existing_session() {
    let sessions = InMemorySessionService::new();
    let mut state = Map::new();
    state.insert("theme".to_string(), json!("dinosaurs"));
    sessions
        .create_session("planner", "self", Some("ctx-1"), Some(state))
        .await
        .unwrap();

    let session = session_gate::resolve(&sessions, "planner", "self", "ctx-1")
        .await
        .unwrap();
    assert_eq!(session.state.get("theme"), Some(&json!("dinosaurs")));
}

#[tokio::test]
async fn test_resolve_fails_when_backend_creates_nothing() {
    let err = session_gate::resolve(&HollowSessions, "planner", "self", "ctx-1")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("created no session"));
}

#[tokio::test]
async fn test_resolve_propagates_backend_errors() {
    let err = session_gate::resolve(&BrokenSessions, "planner", "self", "ctx-1")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("database is locked"));
}
