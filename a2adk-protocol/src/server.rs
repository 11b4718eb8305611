// ABOUTME: Axum routes serving the agent card and the A2A JSON-RPC endpoint.
// ABOUTME: message/stream answers with server-sent events, one JSON-RPC response per event.

use crate::error::A2aError;
use crate::handler::DefaultRequestHandler;
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use crate::types::{AgentCard, MessageSendParams, StreamResponse, TaskIdParams, TaskQueryParams};
use axum::{
    body::Bytes,
    extract::State,
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{BoxStream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Well-known path of the agent card
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";
/// Newer spelling of the card path, served as an alias
pub const AGENT_CARD_ALIAS_PATH: &str = "/.well-known/agent-card.json";

#[derive(Clone)]
struct A2aState {
    card: Arc<AgentCard>,
    handler: DefaultRequestHandler,
}

/// Build the A2A router: agent card discovery plus JSON-RPC on `/`
pub fn a2a_router(card: AgentCard, handler: DefaultRequestHandler) -> Router {
    let state = A2aState {
        card: Arc::new(card),
        handler,
    };

    Router::new()
        .route(AGENT_CARD_PATH, get(agent_card_handler))
        .route(AGENT_CARD_ALIAS_PATH, get(agent_card_handler))
        .route("/", post(jsonrpc_handler))
        .with_state(state)
}

async fn agent_card_handler(State(state): State<A2aState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}

async fn jsonrpc_handler(State(state): State<A2aState>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return rpc_error(None, A2aError::Parse(e.to_string())),
    };
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => return rpc_error(None, A2aError::InvalidRequest(e.to_string())),
    };
    if request.jsonrpc != JSONRPC_VERSION {
        return rpc_error(
            request.id,
            A2aError::InvalidRequest(format!("Unsupported jsonrpc version: {}", request.jsonrpc)),
        );
    }

    let id = request.id;
    tracing::debug!(method = %request.method, "A2A JSON-RPC request");

    match request.method.as_str() {
        "message/send" => match parse_params::<MessageSendParams>(request.params) {
            Ok(params) => respond(id, state.handler.on_message_send(params).await),
            Err(e) => rpc_error(id, e),
        },
        "message/stream" => match parse_params::<MessageSendParams>(request.params) {
            Ok(params) => stream_response(id, state.handler.on_message_stream(params)),
            Err(e) => rpc_error(id, e),
        },
        "tasks/get" => match parse_params::<TaskQueryParams>(request.params) {
            Ok(params) => respond(id, state.handler.on_get_task(params).await),
            Err(e) => rpc_error(id, e),
        },
        "tasks/cancel" => match parse_params::<TaskIdParams>(request.params) {
            Ok(params) => respond(id, state.handler.on_cancel_task(params).await),
            Err(e) => rpc_error(id, e),
        },
        other => rpc_error(id, A2aError::MethodNotFound(other.to_string())),
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, A2aError> {
    serde_json::from_value(params).map_err(|e| A2aError::InvalidParams(e.to_string()))
}

fn to_result_value<T: Serialize>(result: Result<T, A2aError>) -> Result<Value, A2aError> {
    result.and_then(|v| serde_json::to_value(v).map_err(|e| A2aError::Internal(e.to_string())))
}

fn respond<T: Serialize>(id: Option<Value>, result: Result<T, A2aError>) -> Response {
    match to_result_value(result) {
        Ok(value) => Json(JsonRpcResponse::success(id, value)).into_response(),
        Err(e) => rpc_error(id, e),
    }
}

fn rpc_error(id: Option<Value>, err: A2aError) -> Response {
    tracing::warn!(code = err.code(), error = %err, "A2A request failed");
    Json(JsonRpcResponse::error(id, err.to_rpc_error())).into_response()
}

fn stream_response(
    id: Option<Value>,
    events: BoxStream<'static, Result<StreamResponse, A2aError>>,
) -> Response {
    let stream = events.map(move |item| {
        let response = match to_result_value(item) {
            Ok(value) => JsonRpcResponse::success(id.clone(), value),
            Err(e) => JsonRpcResponse::error(id.clone(), e.to_rpc_error()),
        };
        SseEvent::default().json_data(&response)
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
