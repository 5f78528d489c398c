use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::explorer_client::{short_signature, ExplorerClient};
use crate::domain::errors::ExplorerError;
use crate::domain::models::{BlockTransactionEntry, ExplorerBlock, ExplorerTransaction};

const TRANSACTION_DETAIL_PATH: &str = "/v1/transaction/detail";
const BLOCK_DETAIL_PATH: &str = "/v1/block/detail";
const BLOCK_TRANSACTIONS_PATH: &str = "/v1/block/transactions";

/// Response envelope shared by every fogoscan endpoint.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
}

/// A client for the fogoscan explorer API.
///
/// Requests are issued once; there are no retries.
#[derive(Clone)]
pub struct FogoscanClient {
    http: reqwest::Client,
    base_url: String,
}

impl FogoscanClient {
    /// Creates a new `FogoscanClient` instance.
    ///
    /// # Arguments
    ///
    /// * `http` - The HTTP client used for every request.
    /// * `base_url` - The explorer API base URL, without the `/v1` prefix.
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch<T, Q>(&self, path: &str, query: &Q) -> Result<T, ExplorerError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ExplorerError::NotFound);
        }
        if !status.is_success() {
            return Err(ExplorerError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let envelope: Envelope = serde_json::from_slice(&body)?;
        if !envelope.success {
            return Err(ExplorerError::Unsuccessful);
        }
        if envelope.data.is_null() {
            return Err(ExplorerError::MissingData);
        }
        Ok(serde_json::from_value(envelope.data)?)
    }
}

fn log_failure(label: &str, error: &ExplorerError) {
    match error {
        ExplorerError::NotFound => tracing::debug!("fogoscan 404 {}", label),
        ExplorerError::Status(status) => tracing::error!("fogoscan {} {}", status, label),
        ExplorerError::Unsuccessful | ExplorerError::MissingData => {
            tracing::warn!("fogoscan {} {}", error, label)
        }
        ExplorerError::Request(e) => tracing::error!("fogoscan error {}: {}", label, e),
        ExplorerError::Decode(e) => tracing::error!("fogoscan decode error {}: {}", label, e),
    }
}

#[async_trait::async_trait]
impl ExplorerClient for FogoscanClient {
    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<ExplorerTransaction, ExplorerError> {
        let result = self
            .fetch(TRANSACTION_DETAIL_PATH, &[("tx", signature)])
            .await;
        if let Err(e) = &result {
            log_failure(&format!("tx={}...", short_signature(signature)), e);
        }
        result
    }

    async fn fetch_block_detail(&self, slot: u64) -> Result<ExplorerBlock, ExplorerError> {
        let result = self.fetch(BLOCK_DETAIL_PATH, &[("block", slot)]).await;
        if let Err(e) = &result {
            log_failure(&format!("block={}", slot), e);
        }
        result
    }

    async fn fetch_block_transactions(
        &self,
        slot: u64,
    ) -> Result<Vec<ExplorerTransaction>, ExplorerError> {
        let result: Result<Vec<Value>, ExplorerError> =
            self.fetch(BLOCK_TRANSACTIONS_PATH, &[("block", slot)]).await;
        match result {
            Ok(entries) => Ok(entries
                .into_iter()
                .enumerate()
                .filter_map(|(position, entry)| {
                    match BlockTransactionEntry::from_value(entry) {
                        Ok(entry) => {
                            let tx = entry.into_transaction();
                            if tx.is_none() {
                                tracing::warn!(
                                    "fogoscan block={} entry {} unsuccessful, skipped",
                                    slot,
                                    position
                                );
                            }
                            tx
                        }
                        Err(e) => {
                            tracing::warn!(
                                "fogoscan block={} entry {} undecodable, skipped: {}",
                                slot,
                                position,
                                e
                            );
                            None
                        }
                    }
                })
                .collect()),
            Err(e) => {
                log_failure(&format!("block={}", slot), &e);
                Err(e)
            }
        }
    }
}
