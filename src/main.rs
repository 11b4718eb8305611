// ABOUTME: Entry point for the a2adk A2A server.
// ABOUTME: Loads config, builds the requested agent and its storage, then serves HTTP.

use a2adk::{
    agents::{agent_card, get_agent},
    config::Config,
    executor::AdkAgentExecutor,
    server,
    services::Services,
};
use a2adk_agent::BackendRegistry;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "a2adk", about = "Serve an agent over the A2A protocol")]
struct Args {
    /// Host to bind; defaults to the host in server.base_url
    #[arg(long)]
    host: Option<String>,

    /// Port to bind; defaults to the port in server.base_url
    #[arg(long)]
    port: Option<u16>,

    /// Agent to serve
    #[arg(long)]
    agent: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,a2adk=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.server.workers {
        builder.worker_threads(workers);
    }
    let runtime = builder
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run(args, config))
}

async fn run(args: Args, config: Config) -> Result<()> {
    let (config_host, config_port) = config.server_addr()?;
    let host = args.host.unwrap_or(config_host);
    let port = args.port.unwrap_or(config_port);
    let agent_name = args.agent.unwrap_or_else(|| config.agent.name.clone());

    tracing::info!(
        agent = %agent_name,
        backend = %config.agent.backend,
        host = %host,
        port,
        "Starting a2adk"
    );

    let registry = BackendRegistry::default();
    let agent = get_agent(&agent_name, &config, &registry).await?;
    let services = Services::from_config(&config.storage)?;
    let executor = Arc::new(AdkAgentExecutor::new(agent, services));

    let app = server::app_router(agent_card(&host, port), executor, config.bucket.path.clone())?;
    server::serve(app, &host, port).await
}
