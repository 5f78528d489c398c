use super::{build_message_header, status_from_err, transform_transaction, AccountIndex};
use crate::domain::models::{
    AccountRef, BlockResult, BlockTransactionResult, BlockTransactionsResult, CompiledInstruction,
    EncodedTransaction, ExplorerBlock, ExplorerBlockTransaction, ExplorerTransaction,
    LoadedAddresses, TransactionMessage, TransactionMeta,
};

/// Rebuilds a `getBlock` result from an explorer block-detail record.
///
/// Block metadata is passed through as is. Embedded transactions are already
/// close to the Solana shape and only need their instruction references
/// resolved to positions in their own account-key list.
pub fn transform_block(block: &ExplorerBlock) -> BlockResult {
    BlockResult {
        block_height: block.block_height,
        block_time: block.block_time,
        blockhash: block.blockhash.clone(),
        parent_slot: block.parent_slot,
        previous_blockhash: block.previous_blockhash.clone(),
        transactions: block
            .transactions
            .iter()
            .map(transform_block_transaction)
            .collect(),
    }
}

/// Builds the minimal `getBlock` result served from a block's transaction list.
pub fn transform_block_transactions(
    slot: u64,
    transactions: &[ExplorerTransaction],
) -> BlockTransactionsResult {
    BlockTransactionsResult {
        block_height: slot,
        transactions: transactions.iter().map(transform_transaction).collect(),
    }
}

fn transform_block_transaction(tx: &ExplorerBlockTransaction) -> BlockTransactionResult {
    let message = &tx.transaction.message;
    let account_keys: Vec<String> = message
        .account_keys
        .iter()
        .map(|key| key.pubkey.clone())
        .collect();
    let index = AccountIndex::new(account_keys.iter().map(String::as_str));

    let instructions = message
        .instructions
        .iter()
        .map(|instruction| CompiledInstruction {
            program_id_index: index.resolve(&instruction.program_id),
            accounts: instruction
                .accounts
                .iter()
                .map(|account| match account {
                    AccountRef::Index(position) => *position,
                    AccountRef::Address(address) => index.resolve(address),
                })
                .collect(),
            data: instruction.data.clone(),
            stack_height: instruction.stack_height,
        })
        .collect();

    let meta = &tx.meta;

    BlockTransactionResult {
        meta: TransactionMeta {
            err: meta.err.clone(),
            status: meta
                .status
                .clone()
                .unwrap_or_else(|| status_from_err(&meta.err)),
            fee: meta.fee,
            log_messages: meta.log_messages.clone(),
            pre_balances: meta.pre_balances.clone(),
            post_balances: meta.post_balances.clone(),
            inner_instructions: meta.inner_instructions.clone(),
            pre_token_balances: meta.pre_token_balances.clone(),
            post_token_balances: meta.post_token_balances.clone(),
            loaded_addresses: LoadedAddresses::default(),
            rewards: meta.rewards.clone().unwrap_or_default(),
            compute_units_consumed: meta.compute_units_consumed,
        },
        transaction: EncodedTransaction {
            signatures: tx.transaction.signatures.clone(),
            message: TransactionMessage {
                header: message
                    .header
                    .unwrap_or_else(|| build_message_header(&message.account_keys)),
                account_keys,
                recent_blockhash: message.recent_blockhash.clone(),
                instructions,
                address_table_lookups: Vec::new(),
            },
        },
        version: tx.version.clone().unwrap_or_default(),
    }
}
