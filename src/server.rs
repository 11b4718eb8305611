// ABOUTME: HTTP server assembly: A2A endpoints, custom routes and the metrics endpoint.
// ABOUTME: `app_router` builds the full router; `serve` binds and runs it.

use crate::executor::AdkAgentExecutor;
use crate::metrics;
use crate::routes::{custom_router, RoutesState};
use a2adk_protocol::{a2a_router, AgentCard, DefaultRequestHandler, InMemoryTaskStore};
use anyhow::{Context, Result};
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn app_router(
    card: AgentCard,
    executor: Arc<AdkAgentExecutor>,
    bucket_path: Option<PathBuf>,
) -> Result<Router> {
    let metrics_handle =
        metrics::init_metrics().context("Failed to initialize Prometheus metrics")?;

    let routes = custom_router(RoutesState {
        sessions: executor.session_service(),
        bucket_path,
    });
    let handler = DefaultRequestHandler::new(executor, Arc::new(InMemoryTaskStore::new()));

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(metrics_handle));

    Ok(a2a_router(card, handler)
        .merge(routes)
        .merge(metrics_routes)
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http()))
}

pub async fn serve(app: Router, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "A2A server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
