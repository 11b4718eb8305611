// ABOUTME: MemoryService trait for indexing finished sessions and searching them later.
// ABOUTME: Keyword matching is shared by the in-memory and SQLite implementations.

mod in_memory;
mod sqlite;

pub use in_memory::InMemoryMemoryService;
pub use sqlite::SqliteMemoryService;

use crate::content::Content;
use crate::session::Session;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One remembered piece of conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// RFC 3339 timestamp of the source event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMemoryResponse {
    pub memories: Vec<MemoryEntry>,
}

#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Index every content-bearing event of a session
    async fn add_session_to_memory(&self, session: &Session) -> Result<()>;

    async fn search_memory(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<SearchMemoryResponse>;
}

/// Lowercased words of a text, split on anything that is not alphanumeric
pub(crate) fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub(crate) fn matches_query(query_words: &HashSet<String>, text: &str) -> bool {
    !query_words.is_empty() && !words(text).is_disjoint(query_words)
}

pub(crate) fn format_timestamp(seconds: f64) -> Option<String> {
    chrono::DateTime::from_timestamp_micros((seconds * 1_000_000.0) as i64).map(|t| t.to_rfc3339())
}
