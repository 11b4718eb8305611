// ABOUTME: SQLite-backed session service persisting sessions and their event history.
// ABOUTME: Events are stored as JSON rows ordered by insertion; state is a JSON column.

use super::{Session, SessionService};
use crate::event::Event;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone)]
pub struct SqliteSessionService {
    db: Arc<Mutex<Connection>>,
}

impl SqliteSessionService {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session database directory")?;
        }
        let conn = Connection::open(db_path).context("Failed to open SQLite session database")?;
        let service = Self::from_connection(conn)?;
        tracing::info!(db = %db_path.display(), "SqliteSessionService initialized");
        Ok(service)
    }

    /// Wrap an existing connection, creating tables if needed
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                app_name TEXT NOT NULL,
                user_id TEXT NOT NULL,
                id TEXT NOT NULL,
                state TEXT NOT NULL,
                update_time REAL NOT NULL,
                PRIMARY KEY (app_name, user_id, id)
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                app_name TEXT NOT NULL,
                user_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                event_json TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_session
             ON events (app_name, user_id, session_id)",
            [],
        )?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| anyhow::anyhow!("Database mutex poisoned: {}", e))
    }
}

fn load_session(
    db: &Connection,
    app_name: &str,
    user_id: &str,
    session_id: &str,
) -> Result<Option<Session>> {
    let row = db
        .query_row(
            "SELECT state, update_time FROM sessions
             WHERE app_name = ?1 AND user_id = ?2 AND id = ?3",
            params![app_name, user_id, session_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
        )
        .optional()?;

    let Some((state_json, update_time)) = row else {
        return Ok(None);
    };

    let state: Map<String, Value> =
        serde_json::from_str(&state_json).context("Corrupt session state")?;

    let mut stmt = db.prepare(
        "SELECT event_json FROM events
         WHERE app_name = ?1 AND user_id = ?2 AND session_id = ?3
         ORDER BY seq",
    )?;
    let events = stmt
        .query_map(params![app_name, user_id, session_id], |row| {
            row.get::<_, String>(0)
        })?
        .map(|json| {
            let json = json?;
            serde_json::from_str::<Event>(&json).context("Corrupt session event")
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(Session {
        id: session_id.to_string(),
        app_name: app_name.to_string(),
        user_id: user_id.to_string(),
        state,
        events,
        last_update_time: update_time,
    }))
}

#[async_trait]
impl SessionService for SqliteSessionService {
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
        let session = Session::new(app_name, user_id, &session_id, state.unwrap_or_default());
        let state_json = serde_json::to_string(&session.state)?;

        let db = self.conn()?;
        // Concurrent creates of the same id collapse onto the first row
        db.execute(
            "INSERT OR IGNORE INTO sessions (app_name, user_id, id, state, update_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![app_name, user_id, session_id, state_json, session.last_update_time],
        )?;
        load_session(&db, app_name, user_id, &session_id)
    }

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>> {
        let db = self.conn()?;
        load_session(&db, app_name, user_id, session_id)
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        let db = self.conn()?;
        let ids = {
            let mut stmt =
                db.prepare("SELECT id FROM sessions WHERE app_name = ?1 AND user_id = ?2")?;
            let rows = stmt.query_map(params![app_name, user_id], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut sessions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(session) = load_session(&db, app_name, user_id, &id)? {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }

    async fn append_event(&self, session: &mut Session, event: Event) -> Result<Event> {
        if event.partial {
            return Ok(event);
        }
        session.apply_event(&event);

        let event_json = serde_json::to_string(&event)?;
        let state_json = serde_json::to_string(&session.state)?;
        let db = self.conn()?;
        let updated = db.execute(
            "UPDATE sessions SET state = ?1, update_time = ?2
             WHERE app_name = ?3 AND user_id = ?4 AND id = ?5",
            params![
                state_json,
                session.last_update_time,
                session.app_name,
                session.user_id,
                session.id
            ],
        )?;
        if updated == 0 {
            anyhow::bail!("Session not found: {}", session.id);
        }
        db.execute(
            "INSERT INTO events (id, app_name, user_id, session_id, event_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![event.id, session.app_name, session.user_id, session.id, event_json],
        )?;
        Ok(event)
    }
}
