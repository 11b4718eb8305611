// ABOUTME: Process-local session service backed by a mutex-guarded map.
// ABOUTME: Default backend when no persistent session storage is configured.

use super::{Session, SessionService};
use crate::event::Event;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

type SessionKey = (String, String, String);

#[derive(Default)]
pub struct InMemorySessionService {
    sessions: Mutex<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SessionKey, Session>>> {
        self.sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("Session map mutex poisoned: {}", e))
    }
}

fn key(app_name: &str, user_id: &str, session_id: &str) -> SessionKey {
    (
        app_name.to_string(),
        user_id.to_string(),
        session_id.to_string(),
    )
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
        state: Option<Map<String, Value>>,
    ) -> Result<Option<Session>> {
        let session_id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut sessions = self.lock()?;
        let session = sessions
            .entry(key(app_name, user_id, &session_id))
            .or_insert_with(|| {
                tracing::debug!(app_name, user_id, session_id = %session_id, "Creating session");
                Session::new(app_name, user_id, &session_id, state.unwrap_or_default())
            });
        Ok(Some(session.clone()))
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>> {
        Ok(self.lock()?.get(&key(app_name, user_id, session_id)).cloned())
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        Ok(self
            .lock()?
            .values()
            .filter(|s| s.app_name == app_name && s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn append_event(&self, session: &mut Session, event: Event) -> Result<Event> {
        if event.partial {
            return Ok(event);
        }
        session.apply_event(&event);

        let mut sessions = self.lock()?;
        let stored = sessions
            .get_mut(&key(&session.app_name, &session.user_id, &session.id))
            .ok_or_else(|| anyhow::anyhow!("Session not found: {}", session.id))?;
        stored.apply_event(&event);
        Ok(event)
    }
}
