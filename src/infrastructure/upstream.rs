use axum::body::Bytes;

use crate::domain::errors::ProxyError;
use crate::domain::rpc::ProxiedResponse;

/// A trait representing the public RPC node that serves every method the
/// explorer cannot answer.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UpstreamProxy {
    /// Forwards a serialized JSON-RPC request and returns the raw response.
    ///
    /// # Arguments
    ///
    /// * `body` - The request body exactly as received.
    ///
    /// # Returns
    ///
    /// * `Result<ProxiedResponse, ProxyError>` - The upstream status and body, or an error if no response was received.
    async fn forward(&self, body: Bytes) -> Result<ProxiedResponse, ProxyError>;
}
