// ABOUTME: Agent definition: identity, instruction, tool list and the backend that runs it.
// ABOUTME: Built fluently, then shared behind an Arc by the runner.

use crate::traits::{AgentBackend, Tool};
use std::sync::Arc;

pub struct Agent {
    name: String,
    description: String,
    instruction: String,
    tools: Vec<Arc<dyn Tool>>,
    backend: Arc<dyn AgentBackend>,
}

impl Agent {
    pub fn new(name: impl Into<String>, backend: Arc<dyn AgentBackend>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            tools: Vec::new(),
            backend,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.add_tool_if_missing(tool);
        self
    }

    /// Add a tool unless one with the same name is already present.
    /// Returns whether the tool was added.
    pub fn add_tool_if_missing(&mut self, tool: Arc<dyn Tool>) -> bool {
        if self.find_tool(tool.name()).is_some() {
            return false;
        }
        self.tools.push(tool);
        true
    }

    pub fn find_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn backend(&self) -> &Arc<dyn AgentBackend> {
        &self.backend
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("backend", &self.backend.name())
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
