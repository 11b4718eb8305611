// ABOUTME: load_memory tool letting the agent search memories of past conversations.
// ABOUTME: Added to an agent only when a persistent memory service is configured.

use crate::context::ToolContext;
use crate::traits::Tool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct LoadMemoryTool;

impl LoadMemoryTool {
    pub const NAME: &'static str = "load_memory";
}

#[async_trait]
impl Tool for LoadMemoryTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Loads the memory for the current user."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "What to look for in memory"}
            },
            "required": ["query"]
        })
    }

    async fn call(&self, args: Value, ctx: &mut ToolContext) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .context("load_memory requires a string 'query' argument")?;
        let response = ctx.search_memory(query).await?;
        tracing::debug!(query = %query, hits = response.memories.len(), "Memory searched");
        Ok(json!({ "memories": response.memories }))
    }
}
