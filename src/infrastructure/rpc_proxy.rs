use axum::body::Bytes;
use reqwest::header::CONTENT_TYPE;

use super::upstream::UpstreamProxy;
use crate::domain::errors::ProxyError;
use crate::domain::rpc::ProxiedResponse;

/// Forwards JSON-RPC requests to a public Solana RPC node over HTTP.
///
/// Neither the request nor the response body is parsed, so large integers in
/// upstream responses reach the caller exactly as the node wrote them.
#[derive(Clone)]
pub struct HttpRpcProxy {
    http: reqwest::Client,
    rpc_url: String,
}

impl HttpRpcProxy {
    /// Creates a new `HttpRpcProxy` instance.
    ///
    /// # Arguments
    ///
    /// * `http` - The HTTP client used for every request.
    /// * `rpc_url` - The URL of the public RPC endpoint.
    pub fn new(http: reqwest::Client, rpc_url: &str) -> Self {
        Self {
            http,
            rpc_url: rpc_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl UpstreamProxy for HttpRpcProxy {
    async fn forward(&self, body: Bytes) -> Result<ProxiedResponse, ProxyError> {
        let response = self
            .http
            .post(&self.rpc_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(ProxiedResponse { status, body })
    }
}
