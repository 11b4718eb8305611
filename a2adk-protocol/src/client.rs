// ABOUTME: HTTP client for calling a remote A2A agent over JSON-RPC.
// ABOUTME: Includes the agent card resolver used to discover a remote agent's capabilities.

use crate::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::AGENT_CARD_PATH;
use crate::types::{AgentCard, MessageSendParams, SendMessageResult, Task, TaskQueryParams};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum A2aClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote agent returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid JSON-RPC response: {0}")]
    InvalidResponse(String),
}

/// A JSON-RPC answer that was well formed on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome<T> {
    Success(T),
    Error(JsonRpcError),
}

impl<T> RpcOutcome<T> {
    pub fn into_result(self) -> Result<T, JsonRpcError> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Error(e) => Err(e),
        }
    }
}

/// Client for one remote A2A endpoint
#[derive(Clone)]
pub struct A2aClient {
    http: reqwest::Client,
    url: String,
}

impl A2aClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Target the JSON-RPC endpoint advertised in a card
    pub fn from_card(http: reqwest::Client, card: &AgentCard) -> Self {
        Self::new(http, card.url.clone())
    }

    pub async fn send_message(
        &self,
        params: MessageSendParams,
    ) -> Result<RpcOutcome<SendMessageResult>, A2aClientError> {
        self.call("message/send", params).await
    }

    pub async fn get_task(&self, params: TaskQueryParams) -> Result<RpcOutcome<Task>, A2aClientError> {
        self.call("tasks/get", params).await
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<RpcOutcome<R>, A2aClientError> {
        let params = serde_json::to_value(params)
            .map_err(|e| A2aClientError::InvalidResponse(format!("Unserializable params: {}", e)))?;
        let request = JsonRpcRequest::new(Uuid::new_v4().to_string(), method, params);

        tracing::debug!(url = %self.url, method = %method, "Sending A2A request");
        let response = self.http.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(A2aClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: JsonRpcResponse = response.json().await?;
        if let Some(error) = envelope.error {
            return Ok(RpcOutcome::Error(error));
        }
        let result = envelope
            .result
            .ok_or_else(|| A2aClientError::InvalidResponse("missing result".to_string()))?;
        serde_json::from_value(result)
            .map(RpcOutcome::Success)
            .map_err(|e| A2aClientError::InvalidResponse(e.to_string()))
    }
}

/// Fetches the agent card of a remote agent
pub struct CardResolver {
    http: reqwest::Client,
    base_url: String,
    card_path: String,
}

impl CardResolver {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            card_path: AGENT_CARD_PATH.to_string(),
        }
    }

    pub fn with_card_path(mut self, card_path: impl Into<String>) -> Self {
        self.card_path = card_path.into();
        self
    }

    pub async fn get_agent_card(&self) -> Result<AgentCard, A2aClientError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.card_path.trim_start_matches('/')
        );
        tracing::debug!(url = %url, "Resolving agent card");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(A2aClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}
