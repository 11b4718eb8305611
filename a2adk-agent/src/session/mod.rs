// ABOUTME: Session model and the SessionService trait shared by all storage backends.
// ABOUTME: Appending an event applies its state delta and bumps the session's update time.

mod in_memory;
mod sqlite;

pub use in_memory::InMemorySessionService;
pub use sqlite::SqliteSessionService;

use crate::event::Event;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys with this prefix live only for the current invocation
const TEMP_STATE_PREFIX: &str = "temp:";

/// One conversation's durable record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    #[serde(default)]
    pub state: Map<String, Value>,
    #[serde(default)]
    pub events: Vec<Event>,
    /// Seconds since the Unix epoch
    pub last_update_time: f64,
}

impl Session {
    pub fn new(app_name: &str, user_id: &str, id: &str, state: Map<String, Value>) -> Self {
        Self {
            id: id.to_string(),
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            state,
            events: Vec::new(),
            last_update_time: crate::event::now_timestamp(),
        }
    }

    /// Fold an event into this session's in-memory view
    pub fn apply_event(&mut self, event: &Event) {
        for (key, value) in &event.actions.state_delta {
            if key.starts_with(TEMP_STATE_PREFIX) {
                continue;
            }
            self.state.insert(key.clone(), value.clone());
        }
        self.events.push(event.clone());
        self.last_update_time = event.timestamp;
    }
}

// =============================================================================
// Session Service Trait
// =============================================================================

#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a session, or return the existing one with the same identity.
    ///
    /// `None` for `session_id` generates a fresh id. Returns `Ok(None)` only
    /// if the backend failed to produce a session without raising.
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<&str>,
        state: Option<Map<String, Value>>,
    ) -> Result<Option<Session>>;

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>>;

    /// All sessions of a user, with their events
    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>>;

    /// Persist an event and fold it into `session`. Partial events are
    /// returned untouched.
    async fn append_event(&self, session: &mut Session, event: Event) -> Result<Event>;
}
