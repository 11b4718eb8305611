// ABOUTME: Process-local memory service keeping indexed events per user.
// ABOUTME: Search returns every remembered event sharing a word with the query.

use super::{format_timestamp, matches_query, words, MemoryEntry, MemoryService, SearchMemoryResponse};
use crate::event::Event;
use crate::session::Session;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

type UserKey = (String, String);

#[derive(Default)]
pub struct InMemoryMemoryService {
    /// (app, user) -> session id -> events with content
    sessions: Mutex<HashMap<UserKey, HashMap<String, Vec<Event>>>>,
}

impl InMemoryMemoryService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryService for InMemoryMemoryService {
    async fn add_session_to_memory(&self, session: &Session) -> Result<()> {
        let events: Vec<Event> = session
            .events
            .iter()
            .filter(|e| e.content.as_ref().is_some_and(|c| !c.parts.is_empty()))
            .cloned()
            .collect();

        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("Memory mutex poisoned: {}", e))?;
        sessions
            .entry((session.app_name.clone(), session.user_id.clone()))
            .or_default()
            .insert(session.id.clone(), events);
        Ok(())
    }

    async fn search_memory(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<SearchMemoryResponse> {
        let query_words = words(query);
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| anyhow::anyhow!("Memory mutex poisoned: {}", e))?;

        let memories = sessions
            .get(&(app_name.to_string(), user_id.to_string()))
            .into_iter()
            .flat_map(|by_session| by_session.values().flatten())
            .filter_map(|event| {
                let content = event.content.as_ref()?;
                if !matches_query(&query_words, &content.text()) {
                    return None;
                }
                Some(MemoryEntry {
                    content: content.clone(),
                    author: Some(event.author.clone()),
                    timestamp: format_timestamp(event.timestamp),
                })
            })
            .collect();

        Ok(SearchMemoryResponse { memories })
    }
}
