use std::time::Duration;

use super::dispatcher::RpcDispatcher;
use crate::domain::models::BlockSource;
use crate::infrastructure::fogoscan_client::FogoscanClient;
use crate::infrastructure::rpc_proxy::HttpRpcProxy;

/// Settings needed to wire the gateway to its two upstreams.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub fogoscan_api_url: String,
    pub public_rpc_url: String,
    pub block_source: BlockSource,
    /// Timeout applied to every outbound HTTP call, none when unset
    pub http_timeout: Option<Duration>,
}

/// The dispatcher backed by the fogoscan explorer and a public RPC node.
pub type App = RpcDispatcher<FogoscanClient, HttpRpcProxy>;

impl App {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let mut http = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            http = http.timeout(timeout);
        }
        let http = http.build()?;

        tracing::info!(
            "Explorer at {}, upstream rpc at {}, block source {:?}",
            config.fogoscan_api_url,
            config.public_rpc_url,
            config.block_source
        );

        Ok(RpcDispatcher::builder()
            .explorer(FogoscanClient::new(http.clone(), &config.fogoscan_api_url))
            .proxy(HttpRpcProxy::new(http, &config.public_rpc_url))
            .block_source(config.block_source)
            .build())
    }
}
