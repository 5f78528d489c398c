use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::constants::DEFAULT_TRANSACTION_VERSION;

/// Treats an explicit JSON `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An account referenced by a transaction, normalised from either explorer schema.
///
/// Older explorer responses list account keys as bare address strings, newer ones
/// as descriptors carrying the signer and writable flags. Bare strings carry no
/// flags and normalise to a read-only, non-signer account.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "AccountKeyRepr")]
pub struct AccountKey {
    pub pubkey: String,
    pub signer: bool,
    pub writable: bool,
}

impl AccountKey {
    pub fn new(pubkey: impl Into<String>, signer: bool, writable: bool) -> Self {
        Self {
            pubkey: pubkey.into(),
            signer,
            writable,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AccountKeyRepr {
    Address(String),
    Descriptor {
        pubkey: String,
        #[serde(default, deserialize_with = "null_as_default")]
        signer: bool,
        #[serde(default, deserialize_with = "null_as_default")]
        writable: bool,
    },
}

impl From<AccountKeyRepr> for AccountKey {
    fn from(repr: AccountKeyRepr) -> Self {
        match repr {
            AccountKeyRepr::Address(pubkey) => AccountKey::new(pubkey, false, false),
            AccountKeyRepr::Descriptor {
                pubkey,
                signer,
                writable,
            } => AccountKey::new(pubkey, signer, writable),
        }
    }
}

/// Lamport balance of one account before and after a transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BalanceChange {
    #[serde(default)]
    pub pre_balance: Option<u64>,
    #[serde(default)]
    pub post_balance: Option<u64>,
}

/// An instruction as decoded by the explorer, referencing accounts by address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ExplorerInstruction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub program_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inner_instructions: Vec<ExplorerInstruction>,
}

/// Transaction version as reported by Solana: a number, or `"legacy"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionVersion {
    Number(u8),
    Named(String),
}

impl Default for TransactionVersion {
    fn default() -> Self {
        TransactionVersion::Number(DEFAULT_TRANSACTION_VERSION)
    }
}

/// Transaction detail record returned by `/v1/transaction/detail`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ExplorerTransaction {
    /// Transaction id, which is also its first signature
    #[serde(default, deserialize_with = "null_as_default")]
    pub trans_id: String,
    /// Slot the transaction landed in
    #[serde(default, deserialize_with = "null_as_default")]
    pub block_id: u64,
    /// Unix timestamp of the block
    #[serde(default)]
    pub trans_time: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fee: u64,
    #[serde(
        rename = "logMessage",
        default,
        deserialize_with = "null_as_default"
    )]
    pub log_messages: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sol_bal_change: Vec<BalanceChange>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_keys: Vec<AccountKey>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parsed_instructions: Vec<ExplorerInstruction>,
    #[serde(rename = "recentBlockhash", default)]
    pub recent_blockhash: Option<String>,
    /// Explorer execution status, see `STATUS_SUCCESS`
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: i64,
    #[serde(default)]
    pub signatures: Option<Vec<String>>,
    #[serde(rename = "computeUnitsConsumed", default)]
    pub compute_units_consumed: Option<u64>,
    #[serde(default)]
    pub version: Option<TransactionVersion>,
}

/// One entry of `/v1/block/transactions`, which may or may not be wrapped in a
/// `{ "success": ..., "data": ... }` envelope.
///
/// The shape is picked by the presence of a `data` key. A wrapper whose payload
/// fails to decode is an error.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockTransactionEntry {
    Wrapped {
        success: bool,
        data: Option<ExplorerTransaction>,
    },
    Bare(ExplorerTransaction),
}

impl BlockTransactionEntry {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(mut fields) if fields.contains_key("data") => {
                let success = fields
                    .get("success")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                let data = match fields.remove("data") {
                    Some(Value::Null) | None => None,
                    Some(data) => Some(serde_json::from_value(data)?),
                };
                Ok(BlockTransactionEntry::Wrapped { success, data })
            }
            bare => Ok(BlockTransactionEntry::Bare(serde_json::from_value(bare)?)),
        }
    }

    /// The carried transaction, `None` for unsuccessful or empty wrappers.
    pub fn into_transaction(self) -> Option<ExplorerTransaction> {
        match self {
            BlockTransactionEntry::Wrapped {
                success: true,
                data,
            } => data,
            BlockTransactionEntry::Wrapped { .. } => None,
            BlockTransactionEntry::Bare(data) => Some(data),
        }
    }
}

/// Reference from a block instruction to an account, by address or by position.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AccountRef {
    Index(i64),
    Address(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerBlockInstruction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub program_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub accounts: Vec<AccountRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: String,
    #[serde(default)]
    pub stack_height: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerBlockMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_keys: Vec<AccountKey>,
    #[serde(default)]
    pub header: Option<MessageHeader>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instructions: Vec<ExplorerBlockInstruction>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recent_blockhash: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ExplorerBlockTransactionBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub signatures: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: ExplorerBlockMessage,
}

/// Status metadata of a block transaction, already close to the Solana shape.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerBlockMeta {
    #[serde(default)]
    pub compute_units_consumed: Option<u64>,
    #[serde(default)]
    pub err: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fee: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inner_instructions: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub log_messages: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_balances: Vec<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_token_balances: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pre_balances: Vec<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pre_token_balances: Vec<Value>,
    #[serde(default)]
    pub rewards: Option<Vec<Value>>,
    #[serde(default)]
    pub status: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ExplorerBlockTransaction {
    #[serde(default, deserialize_with = "null_as_default")]
    pub transaction: ExplorerBlockTransactionBody,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: ExplorerBlockMeta,
    #[serde(default)]
    pub version: Option<TransactionVersion>,
}

/// Block record returned by `/v1/block/detail`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerBlock {
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blockhash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_slot: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub previous_blockhash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transactions: Vec<ExplorerBlockTransaction>,
}

/// Signer and read-only account counts of a Solana message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    pub num_required_signatures: usize,
    pub num_readonly_signed_accounts: usize,
    pub num_readonly_unsigned_accounts: usize,
}

/// An instruction referencing its program and accounts by position in the
/// message's account-key list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledInstruction {
    pub program_id_index: i64,
    pub accounts: Vec<i64>,
    pub data: String,
    pub stack_height: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMessage {
    pub account_keys: Vec<String>,
    pub header: MessageHeader,
    pub recent_blockhash: String,
    pub instructions: Vec<CompiledInstruction>,
    pub address_table_lookups: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EncodedTransaction {
    pub signatures: Vec<String>,
    pub message: TransactionMessage,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadedAddresses {
    pub readonly: Vec<String>,
    pub writable: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    pub err: Value,
    pub status: Value,
    pub fee: u64,
    pub log_messages: Vec<String>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub inner_instructions: Vec<Value>,
    pub pre_token_balances: Vec<Value>,
    pub post_token_balances: Vec<Value>,
    pub loaded_addresses: LoadedAddresses,
    pub rewards: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_units_consumed: Option<u64>,
}

/// `getTransaction` result in the Solana RPC wire format.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub slot: u64,
    pub block_time: Option<i64>,
    pub meta: TransactionMeta,
    pub transaction: EncodedTransaction,
    pub version: TransactionVersion,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockTransactionResult {
    pub meta: TransactionMeta,
    pub transaction: EncodedTransaction,
    pub version: TransactionVersion,
}

/// `getBlock` result in the Solana RPC wire format.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResult {
    pub block_height: Option<u64>,
    pub block_time: Option<i64>,
    pub blockhash: String,
    pub parent_slot: u64,
    pub previous_blockhash: String,
    pub transactions: Vec<BlockTransactionResult>,
}

/// Minimal `getBlock` result built from a block's transaction list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTransactionsResult {
    pub block_height: u64,
    pub transactions: Vec<TransactionResult>,
}

/// Explorer endpoint used to answer `getBlock`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockSource {
    /// `/v1/block/detail`, full block object
    #[default]
    Detail,
    /// `/v1/block/transactions`, transaction list only
    Transactions,
}

impl FromStr for BlockSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "detail" => Ok(BlockSource::Detail),
            "transactions" => Ok(BlockSource::Transactions),
            _ => Err(format!(
                "Invalid block source '{}'. Use 'detail' or 'transactions'.",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_keys_normalise_from_both_schemas() {
        let keys: Vec<AccountKey> = serde_json::from_str(
            r#"["addr1", {"pubkey": "addr2", "signer": true, "writable": true, "source": "transaction"}]"#,
        )
        .unwrap();

        assert_eq!(keys[0], AccountKey::new("addr1", false, false));
        assert_eq!(keys[1].pubkey, "addr2");
        assert!(keys[1].signer && keys[1].writable);
    }

    #[test]
    fn null_arrays_deserialize_as_empty() {
        let tx: ExplorerTransaction = serde_json::from_str(
            r#"{"trans_id": "sig", "block_id": 7, "logMessage": null, "sol_bal_change": null, "status": 1}"#,
        )
        .unwrap();

        assert!(tx.log_messages.is_empty());
        assert!(tx.sol_bal_change.is_empty());
        assert!(tx.account_keys.is_empty());
        assert_eq!(tx.block_id, 7);
    }

    #[test]
    fn unused_explorer_keys_are_ignored() {
        let change: BalanceChange = serde_json::from_str(
            r#"{"address": "addr1", "pre_balance": 10, "post_balance": 5, "change_amount": -5}"#,
        )
        .unwrap();
        let block: ExplorerBlock =
            serde_json::from_str(r#"{"blockHeight": 7, "slot": 9, "blockhash": "h"}"#).unwrap();

        assert_eq!(change.pre_balance, Some(10));
        assert_eq!(change.post_balance, Some(5));
        assert_eq!(block.block_height, Some(7));
        assert_eq!(block.blockhash, "h");
    }

    fn entry(value: Value) -> Result<BlockTransactionEntry, serde_json::Error> {
        BlockTransactionEntry::from_value(value)
    }

    #[test]
    fn block_transaction_entries_unwrap_both_shapes() {
        let wrapped = entry(serde_json::json!({"success": true, "data": {"trans_id": "a", "status": 1}}));
        let unlabelled = entry(serde_json::json!({"data": {"trans_id": "b", "status": 1}}));
        let bare = entry(serde_json::json!({"trans_id": "c", "status": 0}));

        let ids: Vec<String> = [wrapped, unlabelled, bare]
            .into_iter()
            .map(|e| e.unwrap().into_transaction().unwrap().trans_id)
            .collect();

        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn unsuccessful_block_transaction_entries_carry_no_transaction() {
        let unsuccessful = entry(serde_json::json!({"success": false, "data": null})).unwrap();
        let failed_with_data =
            entry(serde_json::json!({"success": false, "data": {"trans_id": "a"}})).unwrap();
        let empty = entry(serde_json::json!({"success": true, "data": null})).unwrap();

        assert_eq!(unsuccessful.into_transaction(), None);
        assert_eq!(failed_with_data.into_transaction(), None);
        assert_eq!(empty.into_transaction(), None);
    }

    #[test]
    fn mistyped_wrapped_entry_is_rejected() {
        let result = entry(serde_json::json!({
            "success": true,
            "data": {"trans_id": "x", "block_id": "161800848", "status": 1}
        }));

        assert!(result.is_err());
    }

    #[test]
    fn transaction_version_accepts_number_and_legacy() {
        let number: TransactionVersion = serde_json::from_str("0").unwrap();
        let legacy: TransactionVersion = serde_json::from_str(r#""legacy""#).unwrap();

        assert_eq!(number, TransactionVersion::Number(0));
        assert_eq!(legacy, TransactionVersion::Named("legacy".to_string()));
    }

    #[test]
    fn block_source_parses_case_insensitively() {
        assert_eq!("Detail".parse::<BlockSource>(), Ok(BlockSource::Detail));
        assert_eq!(
            "transactions".parse::<BlockSource>(),
            Ok(BlockSource::Transactions)
        );
        assert!("full".parse::<BlockSource>().is_err());
    }
}
