// ABOUTME: Named agents this server can host, built from configuration.
// ABOUTME: `root_agent` is the birthday planner; any other name is rejected.

mod card;
mod planner;

pub use card::agent_card;
pub use planner::{planner_agent, AGENT_NAME};

use crate::config::Config;
use crate::remote_agent::{PollPolicy, RemoteAgentTool};
use a2adk_agent::{Agent, BackendRegistry};
use anyhow::{Context, Result};
use serde_json::json;
use std::time::Duration;

pub async fn get_agent(name: &str, config: &Config, registry: &BackendRegistry) -> Result<Agent> {
    if name != "root_agent" {
        anyhow::bail!("Unknown agent: {}", name);
    }

    let backend = registry
        .create(&config.agent.backend, &json!({ "model": config.model.model }))
        .with_context(|| {
            format!(
                "Failed to create '{}' backend (available: {})",
                config.agent.backend,
                registry.available().join(", ")
            )
        })?;

    let remote = match &config.agent.remote_agent_url {
        Some(url) => {
            let policy = PollPolicy {
                max_wait: Duration::from_secs(config.agent.poll_timeout_secs),
                ..PollPolicy::default()
            };
            Some(RemoteAgentTool::connect_with_policy(url, policy).await?)
        }
        None => None,
    };

    Ok(planner_agent(backend, remote))
}
