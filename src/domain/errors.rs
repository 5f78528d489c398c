use thiserror::Error;

use super::constants::RpcErrorCode;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Explorer resource not found")]
    NotFound,
    #[error("Explorer returned HTTP status {0}")]
    Status(u16),
    #[error("Failed explorer request")]
    Request(#[from] reqwest::Error),
    #[error("Explorer reported an unsuccessful response")]
    Unsuccessful,
    #[error("Explorer response has no data")]
    MissingData,
    #[error("Failed to decode explorer response")]
    Decode(#[from] serde_json::Error),
}

impl ExplorerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExplorerError::NotFound)
    }
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Failed upstream rpc request")]
    Request(#[from] reqwest::Error),
}

/// A request that fails validation before any outbound call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("missing signature")]
    MissingSignature,
    #[error("missing slot")]
    MissingSlot,
    #[error("invalid slot")]
    InvalidSlot,
}

impl RequestError {
    pub fn code(&self) -> i64 {
        match self {
            RequestError::MissingSignature
            | RequestError::MissingSlot
            | RequestError::InvalidSlot => RpcErrorCode::INVALID_PARAMS,
        }
    }
}
