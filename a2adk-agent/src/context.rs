// ABOUTME: Context values passed down an agent run: run settings, invocation state, tool view.
// ABOUTME: The task updater travels explicitly through these instead of ambient config.

use crate::content::{Content, FunctionCall, FunctionResponse, Part};
use crate::event::Event;
use crate::memory::{MemoryService, SearchMemoryResponse};
use crate::session::Session;
use crate::state::State;
use crate::traits::Tool;
use a2adk_protocol::TaskUpdater;
use anyhow::{anyhow, Context as _, Result};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Per-run settings supplied by whoever starts the run
#[derive(Clone, Debug)]
pub struct RunContext {
    pub task_updater: TaskUpdater,
    /// Replace inline data in the user message with saved artifacts
    pub save_input_blobs_as_artifacts: bool,
}

impl RunContext {
    pub fn new(task_updater: TaskUpdater) -> Self {
        Self {
            task_updater,
            save_input_blobs_as_artifacts: false,
        }
    }

    pub fn with_save_input_blobs(mut self, save: bool) -> Self {
        self.save_input_blobs_as_artifacts = save;
        self
    }
}

/// Everything a backend sees for one invocation of an agent
pub struct InvocationContext {
    pub invocation_id: String,
    pub agent_name: String,
    pub instruction: String,
    pub tools: Vec<Arc<dyn Tool>>,
    /// Session as it was after the user message was appended
    pub session: Session,
    pub user_content: Content,
    pub run: RunContext,
    pub memory: Option<Arc<dyn MemoryService>>,
    /// Session state including deltas produced by tools in this invocation
    state: Map<String, Value>,
}

impl InvocationContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        invocation_id: String,
        agent_name: String,
        instruction: String,
        tools: Vec<Arc<dyn Tool>>,
        session: Session,
        user_content: Content,
        run: RunContext,
        memory: Option<Arc<dyn MemoryService>>,
    ) -> Self {
        let state = session.state.clone();
        Self {
            invocation_id,
            agent_name,
            instruction,
            tools,
            session,
            user_content,
            run,
            memory,
            state,
        }
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    pub fn find_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Execute a function call and build the matching function-response
    /// event. State written by the tool is attached as the event's delta.
    pub async fn call_tool(&mut self, call: &FunctionCall) -> Result<Event> {
        let tool = self
            .find_tool(&call.name)
            .ok_or_else(|| anyhow!("Tool not found: {}", call.name))?;

        tracing::debug!(
            invocation_id = %self.invocation_id,
            tool = %call.name,
            "Calling tool"
        );

        let mut tool_ctx = ToolContext {
            app_name: self.session.app_name.clone(),
            user_id: self.session.user_id.clone(),
            session_id: self.session.id.clone(),
            function_call_id: call.id.clone(),
            state: State::new(self.state.clone()),
            run: self.run.clone(),
            memory: self.memory.clone(),
        };
        let response = tool
            .call(call.args.clone(), &mut tool_ctx)
            .await
            .with_context(|| format!("Tool {} failed", call.name))?;

        let delta = tool_ctx.state.into_delta();
        for (key, value) in &delta {
            self.state.insert(key.clone(), value.clone());
        }

        let mut event = Event::new(self.invocation_id.clone(), self.agent_name.clone())
            .with_content(Content::user(vec![Part::FunctionResponse(FunctionResponse {
                id: call.id.clone(),
                name: call.name.clone(),
                response,
            })]));
        event.actions.state_delta = delta;
        Ok(event)
    }
}

/// A tool's view of the invocation it runs in
pub struct ToolContext {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub function_call_id: Option<String>,
    /// Reads see session state; writes become the response event's delta
    pub state: State,
    run: RunContext,
    memory: Option<Arc<dyn MemoryService>>,
}

impl ToolContext {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        state: Map<String, Value>,
        run: RunContext,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            function_call_id: None,
            state: State::new(state),
            run,
            memory: None,
        }
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryService>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn task_updater(&self) -> &TaskUpdater {
        &self.run.task_updater
    }

    pub async fn search_memory(&self, query: &str) -> Result<SearchMemoryResponse> {
        let memory = self
            .memory
            .as_ref()
            .ok_or_else(|| anyhow!("No memory service is configured"))?;
        memory.search_memory(&self.app_name, &self.user_id, query).await
    }
}
