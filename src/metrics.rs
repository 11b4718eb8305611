// ABOUTME: Prometheus metrics for agent runs, task updates, memory commits and delegation
// ABOUTME: The recorder is installed once per process; /metrics renders its handle

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Mutex;

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the Prometheus recorder, or return the already installed handle
pub fn init_metrics() -> Result<PrometheusHandle> {
    let mut slot = HANDLE
        .lock()
        .map_err(|e| anyhow::anyhow!("Metrics handle mutex poisoned: {}", e))?;
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    *slot = Some(handle.clone());
    Ok(handle)
}

/// One agent run finished: "completed", "incomplete" or "error"
pub fn record_agent_run(outcome: &str) {
    metrics::counter!("a2adk_agent_runs_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_status_update(state: &str) {
    metrics::counter!("a2adk_status_updates_total", "state" => state.to_string()).increment(1);
}

pub fn record_artifact() {
    metrics::counter!("a2adk_artifacts_total").increment(1);
}

/// "committed" or "skipped"
pub fn record_memory_commit(outcome: &str) {
    metrics::counter!("a2adk_memory_commits_total", "outcome" => outcome.to_string()).increment(1);
}

/// "sent", "resumed" or "error"
pub fn record_delegation_call(outcome: &str) {
    metrics::counter!("a2adk_delegation_calls_total", "outcome" => outcome.to_string())
        .increment(1);
}
