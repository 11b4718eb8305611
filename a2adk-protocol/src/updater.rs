// ABOUTME: TaskUpdater publishes status transitions and artifacts for one task.
// ABOUTME: Once a terminal state is published every later update is refused.

use crate::error::A2aError;
use crate::events::EventQueue;
use crate::types::{
    Artifact, Message, Part, Role, StreamResponse, TaskArtifactUpdateEvent, TaskState,
    TaskStatus, TaskStatusUpdateEvent,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Handle for publishing updates about a single task.
///
/// Clones share the terminal flag, so a completion seen through any clone
/// closes the task for all of them.
#[derive(Clone, Debug)]
pub struct TaskUpdater {
    queue: EventQueue,
    task_id: String,
    context_id: String,
    terminal: Arc<AtomicBool>,
}

impl TaskUpdater {
    pub fn new(queue: EventQueue, task_id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self {
            queue,
            task_id: task_id.into(),
            context_id: context_id.into(),
            terminal: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::SeqCst)
    }

    /// Publish a status transition. Terminal states are always marked final.
    pub fn update_status(
        &self,
        state: TaskState,
        message: Option<Message>,
        is_final: bool,
    ) -> Result<(), A2aError> {
        let became_terminal = state.is_terminal();
        if became_terminal {
            if self.terminal.swap(true, Ordering::SeqCst) {
                return Err(self.closed_error());
            }
        } else if self.is_terminal() {
            return Err(self.closed_error());
        }

        tracing::debug!(task_id = %self.task_id, state = %state, "Publishing task status");

        let mut status = TaskStatus::new(state);
        status.message = message;
        self.queue
            .enqueue(StreamResponse::StatusUpdate(TaskStatusUpdateEvent {
                task_id: self.task_id.clone(),
                context_id: self.context_id.clone(),
                kind: "status-update".to_string(),
                status,
                is_final: is_final || became_terminal,
                metadata: None,
            }))
    }

    /// Attach an artifact to the task; returns the generated artifact id
    pub fn add_artifact(&self, parts: Vec<Part>, name: Option<&str>) -> Result<String, A2aError> {
        if self.is_terminal() {
            return Err(self.closed_error());
        }
        let artifact_id = Uuid::new_v4().to_string();
        tracing::debug!(
            task_id = %self.task_id,
            artifact_id = %artifact_id,
            parts = parts.len(),
            "Publishing artifact"
        );
        self.queue
            .enqueue(StreamResponse::ArtifactUpdate(TaskArtifactUpdateEvent {
                task_id: self.task_id.clone(),
                context_id: self.context_id.clone(),
                kind: "artifact-update".to_string(),
                artifact: Artifact {
                    artifact_id: artifact_id.clone(),
                    name: name.map(str::to_string),
                    description: None,
                    parts,
                    metadata: None,
                },
                append: None,
                last_chunk: None,
                metadata: None,
            }))?;
        Ok(artifact_id)
    }

    pub fn submit(&self, message: Option<Message>) -> Result<(), A2aError> {
        self.update_status(TaskState::Submitted, message, false)
    }

    pub fn start_work(&self, message: Option<Message>) -> Result<(), A2aError> {
        self.update_status(TaskState::Working, message, false)
    }

    pub fn complete(&self, message: Option<Message>) -> Result<(), A2aError> {
        self.update_status(TaskState::Completed, message, true)
    }

    pub fn failed(&self, message: Option<Message>) -> Result<(), A2aError> {
        self.update_status(TaskState::Failed, message, true)
    }

    pub fn requires_auth(&self, message: Option<Message>, is_final: bool) -> Result<(), A2aError> {
        self.update_status(TaskState::AuthRequired, message, is_final)
    }

    /// Build an agent-authored message bound to this task
    pub fn new_agent_message(&self, parts: Vec<Part>) -> Message {
        let mut message = Message::new(Role::Agent, parts);
        message.task_id = Some(self.task_id.clone());
        message.context_id = Some(self.context_id.clone());
        message
    }

    fn closed_error(&self) -> A2aError {
        A2aError::Internal(format!(
            "Task {} is already in a terminal state",
            self.task_id
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_state_closes_updater() {
        let (queue, mut rx) = EventQueue::new();
        let updater = TaskUpdater::new(queue, "task-1", "ctx-1");

        updater.start_work(None).unwrap();
        updater.complete(None).unwrap();
        assert!(updater.is_terminal());
        assert!(updater.start_work(None).is_err());
        assert!(updater.add_artifact(vec![Part::text("late")], None).is_err());

        let mut finals = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let StreamResponse::StatusUpdate(update) = event {
                finals.push((update.status.state, update.is_final));
            }
        }
        assert_eq!(
            finals,
            vec![(TaskState::Working, false), (TaskState::Completed, true)]
        );
    }

    #[test]
    fn test_agent_message_is_bound_to_task() {
        let (queue, _rx) = EventQueue::new();
        let updater = TaskUpdater::new(queue, "task-1", "ctx-1");
        let message = updater.new_agent_message(vec![Part::text("hi")]);
        assert_eq!(message.role, Role::Agent);
        assert_eq!(message.task_id.as_deref(), Some("task-1"));
        assert_eq!(message.context_id.as_deref(), Some("ctx-1"));
    }
}
