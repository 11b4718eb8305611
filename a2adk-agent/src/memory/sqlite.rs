// ABOUTME: SQLite-backed memory service storing each remembered event as a row.
// ABOUTME: Re-adding a session replaces its rows so repeated commits do not duplicate.

use super::{format_timestamp, matches_query, words, MemoryEntry, MemoryService, SearchMemoryResponse};
use crate::content::Content;
use crate::session::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteMemoryService {
    db: Arc<Mutex<Connection>>,
}

impl SqliteMemoryService {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create memory database directory")?;
        }
        let conn = Connection::open(db_path).context("Failed to open SQLite memory database")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS memories (
                app_name TEXT NOT NULL,
                user_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                author TEXT NOT NULL,
                timestamp REAL NOT NULL,
                text TEXT NOT NULL,
                content_json TEXT NOT NULL,
                PRIMARY KEY (app_name, user_id, session_id, event_id)
            )",
            [],
        )?;
        tracing::info!(db = %db_path.display(), "SqliteMemoryService initialized");
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl MemoryService for SqliteMemoryService {
    async fn add_session_to_memory(&self, session: &Session) -> Result<()> {
        let mut db = self
            .db
            .lock()
            .map_err(|e| anyhow::anyhow!("Database mutex poisoned: {}", e))?;
        let tx = db.transaction()?;
        tx.execute(
            "DELETE FROM memories WHERE app_name = ?1 AND user_id = ?2 AND session_id = ?3",
            params![session.app_name, session.user_id, session.id],
        )?;

        let mut stored = 0usize;
        for event in &session.events {
            let Some(content) = &event.content else {
                continue;
            };
            if content.parts.is_empty() {
                continue;
            }
            tx.execute(
                "INSERT INTO memories
                 (app_name, user_id, session_id, event_id, author, timestamp, text, content_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    session.app_name,
                    session.user_id,
                    session.id,
                    event.id,
                    event.author,
                    event.timestamp,
                    content.text(),
                    serde_json::to_string(content)?
                ],
            )?;
            stored += 1;
        }
        tx.commit()?;

        tracing::debug!(session_id = %session.id, events = stored, "Session added to memory");
        Ok(())
    }

    async fn search_memory(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<SearchMemoryResponse> {
        let query_words = words(query);
        let db = self
            .db
            .lock()
            .map_err(|e| anyhow::anyhow!("Database mutex poisoned: {}", e))?;
        let mut stmt = db.prepare(
            "SELECT author, timestamp, text, content_json FROM memories
             WHERE app_name = ?1 AND user_id = ?2
             ORDER BY timestamp",
        )?;
        let rows = stmt.query_map(params![app_name, user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut memories = Vec::new();
        for row in rows {
            let (author, timestamp, text, content_json) = row?;
            if !matches_query(&query_words, &text) {
                continue;
            }
            let content: Content =
                serde_json::from_str(&content_json).context("Corrupt memory content")?;
            memories.push(MemoryEntry {
                content,
                author: Some(author),
                timestamp: format_timestamp(timestamp),
            });
        }
        Ok(SearchMemoryResponse { memories })
    }
}
