// ABOUTME: The birthday planner agent served by default.
// ABOUTME: Optionally delegates calendar work to a remote agent through a tool.

use crate::remote_agent::RemoteAgentTool;
use a2adk_agent::{Agent, AgentBackend};
use std::sync::Arc;

pub const AGENT_NAME: &str = "birthday_planner";

const INSTRUCTION: &str = "You are a friendly birthday party planner. Help the user plan \
parties: suggest dates, times, themes and age-appropriate activities. When the user wants \
something scheduled and a calendar agent is available, send it the details and report its \
answer back.";

pub fn planner_agent(backend: Arc<dyn AgentBackend>, remote: Option<RemoteAgentTool>) -> Agent {
    let agent = Agent::new(AGENT_NAME, backend)
        .with_description("Plans fun birthday parties.")
        .with_instruction(INSTRUCTION);
    match remote {
        Some(tool) => agent.with_tool(Arc::new(tool)),
        None => agent,
    }
}
