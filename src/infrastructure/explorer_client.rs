use crate::domain::errors::ExplorerError;
use crate::domain::models::{ExplorerBlock, ExplorerTransaction};

/// A client for the block-explorer API that backs `getTransaction` and `getBlock`.
///
/// Every method fails with an `ExplorerError` describing why nothing was
/// returned. Callers answering JSON-RPC requests treat all of them as "not found".
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ExplorerClient {
    /// Retrieves the detail record of a transaction.
    ///
    /// # Arguments
    ///
    /// * `signature` - The transaction signature.
    async fn fetch_transaction(&self, signature: &str)
        -> Result<ExplorerTransaction, ExplorerError>;

    /// Retrieves a full block, including its embedded transactions.
    ///
    /// # Arguments
    ///
    /// * `slot` - The slot of the block.
    async fn fetch_block_detail(&self, slot: u64) -> Result<ExplorerBlock, ExplorerError>;

    /// Retrieves the transaction detail records of every transaction in a block.
    ///
    /// # Arguments
    ///
    /// * `slot` - The slot of the block.
    async fn fetch_block_transactions(
        &self,
        slot: u64,
    ) -> Result<Vec<ExplorerTransaction>, ExplorerError>;
}

/// Shortens a signature for log lines.
pub fn short_signature(signature: &str) -> &str {
    signature.get(..12).unwrap_or(signature)
}
