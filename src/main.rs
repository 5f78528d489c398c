use anyhow::Result;
use clap::Parser;
use fogo_rpc_gateway::application::app::{App, AppConfig};
use fogo_rpc_gateway::domain::models::BlockSource;
use fogo_rpc_gateway::service;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Solana-compatible JSON-RPC gateway backed by the fogoscan explorer API"
)]
struct GatewayProgram {
    /// Fogoscan explorer API base URL
    #[arg(long, env = "FOGOSCAN_API_URL")]
    fogoscan_api_url: String,

    /// Public RPC endpoint for every method not served from the explorer
    #[arg(long, env = "PUBLIC_RPC_URL")]
    public_rpc_url: String,

    /// Listen port for the JSON-RPC API
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Explorer endpoint used for getBlock: detail or transactions
    #[arg(long, env = "BLOCK_SOURCE", default_value = "detail", value_parser = parse_block_source)]
    block_source: BlockSource,

    /// Timeout in seconds for outbound HTTP calls
    #[arg(long, env = "HTTP_TIMEOUT_SECS")]
    http_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON log output
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

fn parse_block_source(s: &str) -> Result<BlockSource, String> {
    s.parse()
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = GatewayProgram::parse();
    init_tracing(&args.log_level, args.json_logs);

    let config = AppConfig {
        fogoscan_api_url: args.fogoscan_api_url,
        public_rpc_url: args.public_rpc_url,
        block_source: args.block_source,
        http_timeout: args.http_timeout_secs.map(Duration::from_secs),
    };
    let app = Arc::new(App::new(&config)?);

    // Create a shutdown channel
    let (shutdown_sender, _) = broadcast::channel(1);

    // Start the API server
    let mut server_handle = tokio::spawn(service::api::start_server(
        shutdown_sender.clone(),
        app,
        args.port,
    ));

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::warn!("Received Ctrl+C, shutting down...");
            let _ = shutdown_sender.send(());
            server_handle.await??;
        }
        result = &mut server_handle => {
            result??;
            tracing::warn!("API server stopped unexpectedly");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
