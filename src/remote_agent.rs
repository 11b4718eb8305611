// ABOUTME: Tool delegating a message to a second A2A agent, threading one remote task per session.
// ABOUTME: Handles the auth-required case by suspending, then polling the remote task on resume.

use crate::metrics;
use a2adk_agent::{Tool, ToolContext};
use a2adk_protocol::{
    A2aClient, AgentCard, CardResolver, Message, MessageSendParams, Part, RpcOutcome,
    SendMessageResult, Task, TaskQueryParams, TaskState,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Remote task the next message continues
pub const TASK_ID_KEY: &str = "task_id";
/// Set while a remote task waits for authorization
pub const TASK_SUSPENDED_KEY: &str = "task_suspended";
/// Snapshot of the suspended remote task
pub const DEPENDENT_TASK_KEY: &str = "dependent_task";

const CHECKING_OUTPUT_TEXT: &str = "Checking remote agent output";

/// How to wait for a suspended remote task
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Overall deadline after which the invocation fails
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            max_wait: Duration::from_secs(300),
        }
    }
}

pub struct RemoteAgentTool {
    endpoint: String,
    card: AgentCard,
    name: String,
    policy: PollPolicy,
}

impl RemoteAgentTool {
    /// Resolve the remote agent's card and build the tool from it
    pub async fn connect(agent_url: &str) -> Result<Self> {
        Self::connect_with_policy(agent_url, PollPolicy::default()).await
    }

    pub async fn connect_with_policy(agent_url: &str, policy: PollPolicy) -> Result<Self> {
        let card = CardResolver::new(reqwest::Client::new(), agent_url)
            .get_agent_card()
            .await
            .with_context(|| format!("Failed to resolve agent card from {}", agent_url))?;
        tracing::info!(
            agent = %card.name,
            url = %agent_url,
            long_running = card.capabilities.push_notifications,
            "Remote agent resolved"
        );
        Ok(Self {
            endpoint: agent_url.to_string(),
            name: tool_name(&card.name),
            card,
            policy,
        })
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    /// Fresh client per call; nothing is pooled across invocations
    fn client(&self) -> A2aClient {
        A2aClient::new(reqwest::Client::new(), self.endpoint.clone())
    }

    async fn send(&self, text: &str, ctx: &mut ToolContext) -> Result<Value> {
        let mut message = Message::user_text(text);
        message.context_id = Some(ctx.session_id().to_string());
        message.task_id = ctx.state.get_str(TASK_ID_KEY).map(str::to_string);

        let outcome = self
            .client()
            .send_message(MessageSendParams::new(message))
            .await?;

        let mut task_id = None;
        let content = match outcome {
            RpcOutcome::Success(SendMessageResult::Task(task)) => {
                let mut content = task.artifact_texts();
                if content.is_empty() {
                    content = task
                        .status
                        .message
                        .as_ref()
                        .map(Message::texts)
                        .unwrap_or_default();
                }
                // Anything short of completed keeps the remote task open
                if task.status.state != TaskState::Completed {
                    task_id = Some(task.id.clone());
                }
                if task.status.state == TaskState::AuthRequired {
                    tracing::info!(remote_task_id = %task.id, "Remote task requires authorization");
                    ctx.state.set(TASK_SUSPENDED_KEY, json!(true));
                    ctx.state.set(DEPENDENT_TASK_KEY, serde_json::to_value(&task)?);
                }
                content
            }
            RpcOutcome::Success(SendMessageResult::Message(reply)) => reply.texts(),
            RpcOutcome::Error(error) => {
                tracing::warn!(code = error.code, error = %error.message, "Remote agent returned an error");
                Vec::new()
            }
        };

        ctx.state.set(TASK_ID_KEY, task_id.map_or(Value::Null, Value::String));
        Ok(json!({ "response": content.join("\n") }))
    }

    /// Finish a remote task left waiting for authorization.
    ///
    /// Returns `None` when nothing is suspended so the caller proceeds with
    /// a normal send.
    async fn resume_dependent_task(&self, ctx: &mut ToolContext) -> Result<Option<Value>> {
        if !ctx.state.get_flag(TASK_SUSPENDED_KEY) {
            return Ok(None);
        }
        let Some(snapshot) = ctx.state.get(DEPENDENT_TASK_KEY).cloned() else {
            return Ok(None);
        };
        let dependent: Task =
            serde_json::from_value(snapshot).context("Corrupt dependent task snapshot")?;
        if dependent.status.state != TaskState::AuthRequired {
            return Ok(None);
        }

        let updater = ctx.task_updater().clone();
        let mirrored = dependent
            .status
            .message
            .as_ref()
            .map(|m| updater.new_agent_message(m.parts.clone()));
        updater.update_status(TaskState::AuthRequired, mirrored, false)?;

        let task = self.wait_for_completion(dependent).await?;
        updater.start_work(Some(
            updater.new_agent_message(vec![Part::text(CHECKING_OUTPUT_TEXT)]),
        ))?;

        ctx.state.set(TASK_SUSPENDED_KEY, json!(false));
        ctx.state.set(DEPENDENT_TASK_KEY, Value::Null);
        ctx.state.set(TASK_ID_KEY, Value::Null);

        Ok(Some(json!({ "response": task.artifact_texts().join("\n") })))
    }

    /// Poll until the remote task reports completed
    async fn wait_for_completion(&self, mut task: Task) -> Result<Task> {
        let client = self.client();
        let deadline = tokio::time::Instant::now() + self.policy.max_wait;

        while task.status.state != TaskState::Completed {
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!(
                    "Remote task {} did not complete within {:?}",
                    task.id,
                    self.policy.max_wait
                );
            }
            tokio::time::sleep(self.policy.interval).await;

            let params = TaskQueryParams {
                id: task.id.clone(),
                history_length: None,
            };
            match client.get_task(params).await? {
                RpcOutcome::Success(latest) => {
                    tracing::debug!(remote_task_id = %latest.id, state = %latest.status.state, "Polled remote task");
                    task = latest;
                }
                RpcOutcome::Error(error) => {
                    anyhow::bail!("Getting dependent task failed: {}", error);
                }
            }
        }
        Ok(task)
    }
}

#[async_trait]
impl Tool for RemoteAgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.card.description
    }

    fn is_long_running(&self) -> bool {
        self.card.capabilities.push_notifications
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "description": "Message to send to the agent"}
            },
            "required": ["message"]
        })
    }

    async fn call(&self, args: Value, ctx: &mut ToolContext) -> Result<Value> {
        let result = match self.resume_dependent_task(ctx).await {
            Ok(Some(resumed)) => {
                metrics::record_delegation_call("resumed");
                return Ok(resumed);
            }
            Ok(None) => {
                let text = args
                    .get("message")
                    .and_then(Value::as_str)
                    .with_context(|| format!("{} requires a string 'message' argument", self.name))?;
                self.send(text, ctx).await
            }
            Err(e) => Err(e),
        };
        metrics::record_delegation_call(if result.is_ok() { "sent" } else { "error" });
        result
    }
}

/// Function-safe tool name derived from an agent's display name
fn tool_name(agent_name: &str) -> String {
    let name: String = agent_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        "remote_agent".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_name_is_function_safe() {
        assert_eq!(tool_name("Calendar Agent"), "calendar_agent");
        assert_eq!(tool_name("  "), "remote_agent");
    }
}
