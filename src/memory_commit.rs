// ABOUTME: Memory committer: indexes a finished session unless it holds nothing worth keeping.
// ABOUTME: Failures from the memory service propagate to the caller.

use crate::metrics;
use a2adk_agent::{MemoryService, Part, Session};
use anyhow::Result;

/// True if any event carries non-blank text or non-empty inline data
pub fn has_memorable_content(session: &Session) -> bool {
    session
        .events
        .iter()
        .filter_map(|e| e.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .any(|part| match part {
            Part::Text(text) => !text.trim().is_empty(),
            Part::InlineData(blob) => !blob.data.is_empty(),
            _ => false,
        })
}

/// Hand `session` to the memory service if it has content.
/// Returns whether a commit happened.
pub async fn maybe_commit(memory: &dyn MemoryService, session: &Session) -> Result<bool> {
    if !has_memorable_content(session) {
        tracing::info!(session_id = %session.id, "No content to commit to memory, skipping");
        metrics::record_memory_commit("skipped");
        return Ok(false);
    }

    memory.add_session_to_memory(session).await?;
    tracing::debug!(
        session_id = %session.id,
        events = session.events.len(),
        "Session committed to memory"
    );
    metrics::record_memory_commit("committed");
    Ok(true)
}
