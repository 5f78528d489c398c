use axum::body::Bytes;

use crate::domain::rpc::{JsonRpcRequest, RpcOutcome};

pub mod app;
pub mod dispatcher;

/// The `Dispatcher` trait defines how a JSON-RPC request is answered.
///
/// Implementors decide, per method, whether the request is served locally or
/// forwarded to an upstream node. The raw request body is handed over alongside
/// the parsed request so that forwarded requests stay byte-for-byte identical.
///
/// # Examples
///
/// ```no_run
/// use axum::body::Bytes;
/// use fogo_rpc_gateway::application::Dispatcher;
/// use fogo_rpc_gateway::domain::rpc::{JsonRpcRequest, JsonRpcResponse, RpcOutcome};
/// use serde_json::Value;
///
/// struct AlwaysNull;
///
/// #[async_trait::async_trait]
/// impl Dispatcher for AlwaysNull {
///     async fn dispatch(&self, request: JsonRpcRequest, _raw_body: Bytes) -> RpcOutcome {
///         RpcOutcome::Response(JsonRpcResponse::success(request.id, Value::Null))
///     }
/// }
/// ```
///
/// Failures never surface as Rust errors: they are encoded in the returned
/// `RpcOutcome` as JSON-RPC error envelopes or null results.
#[async_trait::async_trait]
pub trait Dispatcher {
    async fn dispatch(&self, request: JsonRpcRequest, raw_body: Bytes) -> RpcOutcome;
}
