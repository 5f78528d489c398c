use crate::{
    application::Dispatcher,
    domain::{
        constants::RpcErrorCode,
        rpc::{JsonRpcRequest, JsonRpcResponse, RpcOutcome},
    },
};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::cors::CorsLayer;

/// Builds the HTTP routes: JSON-RPC on `POST /` and liveness on `GET /health`.
pub fn router<D>(dispatcher: Arc<D>) -> Router
where
    D: Dispatcher + Send + Sync + 'static,
{
    Router::new()
        .route("/", post(handle_rpc::<D>))
        .route("/health", get(health))
        .with_state(dispatcher)
        .layer(CorsLayer::permissive())
}

pub async fn start_server<D>(
    shutdown: broadcast::Sender<()>,
    dispatcher: Arc<D>,
    listen_port: u16,
) -> anyhow::Result<()>
where
    D: Dispatcher + Send + Sync + 'static,
{
    let listener = TcpListener::bind(("0.0.0.0", listen_port)).await?;

    tracing::info!("API server started on port {}", listen_port);

    let mut shutdown_rx = shutdown.subscribe();

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            tracing::warn!("API server received shutdown signal");
        })
        .await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_rpc<D>(State(dispatcher): State<Arc<D>>, body: Bytes) -> Response
where
    D: Dispatcher + Send + Sync + 'static,
{
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => return bad_request(Value::Null, RpcErrorCode::PARSE_ERROR, "Parse error"),
    };
    let id = value.get("id").cloned().unwrap_or(Value::Null);

    let request = match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) if !request.method.is_empty() => request,
        _ => return bad_request(id, RpcErrorCode::INVALID_REQUEST, "Invalid Request"),
    };

    match dispatcher.dispatch(request, body).await {
        RpcOutcome::Response(response) => Json(response).into_response(),
        RpcOutcome::Proxied(proxied) => {
            let status = StatusCode::from_u16(proxied.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                proxied.body,
            )
                .into_response()
        }
    }
}

fn bad_request(id: Value, code: i64, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(JsonRpcResponse::error(id, code, message)),
    )
        .into_response()
}
