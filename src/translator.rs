// ABOUTME: Event translator turning one agent run's event stream into task updates.
// ABOUTME: Plain events become working updates, the final response becomes the artifact.

use crate::convert::to_protocol_parts;
use crate::metrics;
use a2adk_agent::Event;
use a2adk_protocol::{TaskState, TaskUpdater};
use anyhow::Result;
use futures_util::{Stream, StreamExt};

/// How an agent event surfaces on the task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Ends the turn; its parts become the task's artifact
    FinalResponse,
    /// Intermediate content published as a working update
    Progress,
    /// Function calls only; nothing is published
    ToolCall,
}

/// Classify an event; the first matching kind wins
pub fn classify(event: &Event) -> EventKind {
    if event.is_final_response() {
        EventKind::FinalResponse
    } else if event.function_calls().is_empty() {
        EventKind::Progress
    } else {
        EventKind::ToolCall
    }
}

/// What a translated turn published
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    pub working_updates: usize,
    pub absorbed: usize,
    pub completed: bool,
}

/// Drive `events` until the final response, publishing through `updater`.
///
/// Errors from the stream, part conversion or the updater abort the turn
/// and are returned as-is; the task keeps the last state published.
pub async fn translate_events<S>(events: S, updater: &TaskUpdater) -> Result<TurnOutcome>
where
    S: Stream<Item = Result<Event>>,
{
    let mut events = std::pin::pin!(events);
    let mut outcome = TurnOutcome::default();

    while let Some(event) = events.next().await {
        let event = event?;
        let kind = classify(&event);
        tracing::debug!(
            task_id = %updater.task_id(),
            event_id = %event.id,
            author = %event.author,
            kind = ?kind,
            "Agent event"
        );

        match kind {
            EventKind::FinalResponse => {
                let parts = to_protocol_parts(event.parts())?;
                updater.add_artifact(parts, None)?;
                metrics::record_artifact();
                updater.complete(None)?;
                metrics::record_status_update("completed");
                outcome.completed = true;
                break;
            }
            EventKind::Progress => {
                let parts = to_protocol_parts(event.parts())?;
                let message = updater.new_agent_message(parts);
                updater.update_status(TaskState::Working, Some(message), false)?;
                metrics::record_status_update("working");
                outcome.working_updates += 1;
            }
            EventKind::ToolCall => {
                outcome.absorbed += 1;
            }
        }
    }

    if !outcome.completed {
        tracing::warn!(
            task_id = %updater.task_id(),
            "Agent run ended without a final response"
        );
    }
    Ok(outcome)
}
