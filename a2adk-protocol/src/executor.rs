// ABOUTME: AgentExecutor trait implemented by agents served over A2A.
// ABOUTME: RequestContext carries the resolved task/context ids and the inbound message.

use crate::error::A2aError;
use crate::events::EventQueue;
use crate::types::{Message, MessageSendConfiguration, Task};
use async_trait::async_trait;

/// Everything an executor needs to know about one inbound request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub task_id: String,
    pub context_id: String,
    pub message: Message,
    /// Task the message continues, if it referenced one
    pub current_task: Option<Task>,
    pub configuration: Option<MessageSendConfiguration>,
}

impl RequestContext {
    /// All text parts of the inbound message joined by newlines
    pub fn user_input(&self) -> String {
        self.message.texts().join("\n")
    }
}

#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Run the agent for this request, publishing updates onto `queue`.
    ///
    /// Returning an error fails the request; the task keeps whatever state
    /// was last published.
    async fn execute(&self, context: RequestContext, queue: EventQueue) -> anyhow::Result<()>;

    /// Request cancellation of a running task
    async fn cancel(&self, context: RequestContext, queue: EventQueue) -> Result<(), A2aError>;
}
