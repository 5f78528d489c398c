use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::JSON_RPC_VERSION;
use super::errors::RequestError;

/// An inbound JSON-RPC 2.0 request.
#[derive(Clone, Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Returns the positional parameter at `index`, if any.
    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.as_array().and_then(|params| params.get(index))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    Result(Value),
    Error(JsonRpcError),
}

/// A JSON-RPC 2.0 response envelope. The `id` of a request without one is `0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            id: response_id(id),
            payload: ResponsePayload::Result(result),
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            id: response_id(id),
            payload: ResponsePayload::Error(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn invalid_params(id: Value, error: RequestError) -> Self {
        Self::error(id, error.code(), error.to_string())
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(result) => Some(result),
            ResponsePayload::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.payload {
            ResponsePayload::Error(error) => Some(error),
            ResponsePayload::Result(_) => None,
        }
    }
}

fn response_id(id: Value) -> Value {
    if id.is_null() {
        Value::from(0)
    } else {
        id
    }
}

/// An upstream RPC response forwarded without being parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxiedResponse {
    pub status: u16,
    pub body: Bytes,
}

/// What the dispatcher hands back to the HTTP layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RpcOutcome {
    /// A response assembled locally
    Response(JsonRpcResponse),
    /// An upstream response passed through byte for byte
    Proxied(ProxiedResponse),
}
