// ABOUTME: Protocol-level errors with their JSON-RPC error codes.
// ABOUTME: Handlers return these so the server can answer with a structured error object.

use crate::jsonrpc::JsonRpcError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum A2aError {
    #[error("Invalid JSON payload: {0}")]
    Parse(String),
    #[error("Request payload validation error: {0}")]
    InvalidRequest(String),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("Task cannot be canceled: {0}")]
    TaskNotCancelable(String),
    #[error("This operation is not supported: {0}")]
    UnsupportedOperation(String),
}

impl A2aError {
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse(_) => -32700,
            Self::InvalidRequest(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Internal(_) => -32603,
            Self::TaskNotFound(_) => -32001,
            Self::TaskNotCancelable(_) => -32002,
            Self::UnsupportedOperation(_) => -32004,
        }
    }

    pub fn to_rpc_error(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}

impl From<anyhow::Error> for A2aError {
    fn from(err: anyhow::Error) -> Self {
        // Executors may surface a typed protocol error through anyhow
        match err.downcast::<A2aError>() {
            Ok(typed) => typed,
            Err(other) => Self::Internal(format!("{:#}", other)),
        }
    }
}
