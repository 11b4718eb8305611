// ABOUTME: Core traits: AgentBackend produces a run's event stream, Tool is a callable capability.
// ABOUTME: Backends receive an owned InvocationContext and may call tools through it.

use crate::context::{InvocationContext, ToolContext};
use crate::event::Event;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{json, Value};

/// Core trait that all agent backends implement.
pub trait AgentBackend: Send + Sync {
    /// Backend name for logging and metrics
    fn name(&self) -> &'static str;

    /// Run one invocation and stream its events.
    ///
    /// The stream ends after the final response. An `Err` item aborts the
    /// run.
    fn run<'a>(&'a self, ctx: InvocationContext) -> BoxStream<'a, Result<Event>>;
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Long-running tools end the agent's turn once called
    fn is_long_running(&self) -> bool {
        false
    }

    /// JSON schema of the tool's arguments
    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    /// Function declaration handed to a model
    fn declaration(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "parameters": self.parameters(),
        })
    }

    async fn call(&self, args: Value, ctx: &mut ToolContext) -> Result<Value>;
}
