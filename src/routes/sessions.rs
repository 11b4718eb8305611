// ABOUTME: Session listing and per-session message history for the web frontend.
// ABOUTME: Listings are trimmed to recent sessions and recent user events.

use super::{RouteError, RoutesState};
use a2adk_agent::{Event, Part, Session};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

const MAX_SESSIONS: usize = 5;
const MAX_USER_EVENTS: usize = 5;

#[derive(Serialize)]
pub struct SessionList {
    pub sessions: Vec<Session>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessage {
    pub message_id: String,
    pub role: &'static str,
    pub timestamp: f64,
    pub parts: Vec<Value>,
}

/// Most recently updated sessions first, each keeping only its latest user events
fn recent_sessions(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.sort_by(|a, b| b.last_update_time.total_cmp(&a.last_update_time));
    sessions.truncate(MAX_SESSIONS);
    for session in &mut sessions {
        let user_events: Vec<Event> = session
            .events
            .iter()
            .filter(|e| e.author == "user")
            .cloned()
            .collect();
        let skip = user_events.len().saturating_sub(MAX_USER_EVENTS);
        session.events = user_events.into_iter().skip(skip).collect();
    }
    sessions
}

/// Events whose first part is non-empty text, as role-tagged messages
fn session_messages(session: &Session) -> Vec<SessionMessage> {
    session
        .events
        .iter()
        .filter_map(|event| {
            let content = event.content.as_ref()?;
            let first = content.parts.first()?.as_text()?;
            if first.is_empty() {
                return None;
            }
            let parts = content
                .parts
                .iter()
                .map(|part| match part {
                    Part::Text(text) => json!({"type": "text", "text": text}),
                    other => json!({
                        "type": "unknown",
                        "content": serde_json::to_value(other).unwrap_or(Value::Null),
                    }),
                })
                .collect();
            Some(SessionMessage {
                message_id: event.id.clone(),
                role: if content.role.as_deref() == Some("user") {
                    "user"
                } else {
                    "agent"
                },
                timestamp: event.timestamp,
                parts,
            })
        })
        .collect()
}

pub async fn list_sessions(
    State(state): State<Arc<RoutesState>>,
    Path((app_name, user_id)): Path<(String, String)>,
) -> Result<Json<SessionList>, RouteError> {
    let sessions = state.sessions.list_sessions(&app_name, &user_id).await?;
    Ok(Json(SessionList {
        sessions: recent_sessions(sessions),
    }))
}

pub async fn get_session_messages(
    State(state): State<Arc<RoutesState>>,
    Path((app_name, user_id, session_id)): Path<(String, String, String)>,
) -> Result<Json<Vec<SessionMessage>>, RouteError> {
    let session = state
        .sessions
        .get_session(&app_name, &user_id, &session_id)
        .await?
        .ok_or_else(|| RouteError::NotFound(format!("Session not found: {}", session_id)))?;
    Ok(Json(session_messages(&session)))
}
