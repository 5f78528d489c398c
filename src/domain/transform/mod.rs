//! Translation of explorer records into the Solana RPC wire format.
//!
//! Every function here is pure: the same explorer record always produces the
//! same output, and missing optional data degrades to empty values instead of
//! failing.

use std::collections::HashMap;

use serde_json::{json, Value};

use super::constants::ACCOUNT_NOT_FOUND;
use super::models::{AccountKey, MessageHeader};

pub mod block;
pub mod transaction;

pub use block::{transform_block, transform_block_transactions};
pub use transaction::transform_transaction;

/// Derives the message header counts from flagged account keys.
pub fn build_message_header(account_keys: &[AccountKey]) -> MessageHeader {
    account_keys
        .iter()
        .fold(MessageHeader::default(), |mut header, key| {
            match (key.signer, key.writable) {
                (true, true) => header.num_required_signatures += 1,
                (true, false) => {
                    header.num_required_signatures += 1;
                    header.num_readonly_signed_accounts += 1;
                }
                (false, false) => header.num_readonly_unsigned_accounts += 1,
                (false, true) => {}
            }
            header
        })
}

/// Maps account addresses to their position in a message's account-key list.
pub(crate) struct AccountIndex<'a> {
    positions: HashMap<&'a str, i64>,
}

impl<'a> AccountIndex<'a> {
    pub(crate) fn new<I>(addresses: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut positions = HashMap::new();
        for (position, address) in addresses.into_iter().enumerate() {
            // first occurrence wins for duplicated addresses
            positions.entry(address).or_insert(position as i64);
        }
        Self { positions }
    }

    pub(crate) fn resolve(&self, address: &str) -> i64 {
        self.positions
            .get(address)
            .copied()
            .unwrap_or(ACCOUNT_NOT_FOUND)
    }
}

/// Solana encodes execution status as `{"Ok": null}` or `{"Err": <reason>}`.
pub(crate) fn status_from_err(err: &Value) -> Value {
    if err.is_null() {
        json!({ "Ok": null })
    } else {
        json!({ "Err": err })
    }
}
