use serde_json::{json, Value};

use super::{build_message_header, status_from_err, AccountIndex};
use crate::domain::constants::{DEFAULT_STACK_HEIGHT, FAILED_TRANSACTION_REASON, STATUS_SUCCESS};
use crate::domain::models::{
    CompiledInstruction, EncodedTransaction, ExplorerInstruction, ExplorerTransaction,
    LoadedAddresses, TransactionMessage, TransactionMeta, TransactionResult,
};

/// Rebuilds a `getTransaction` result from an explorer transaction record.
///
/// Instructions reference accounts by address in the explorer record; they are
/// resolved to positions in `account_keys`, in the order the explorer lists them.
/// Addresses missing from that list resolve to `ACCOUNT_NOT_FOUND`.
pub fn transform_transaction(tx: &ExplorerTransaction) -> TransactionResult {
    let account_keys: Vec<String> = tx
        .account_keys
        .iter()
        .map(|key| key.pubkey.clone())
        .collect();
    let index = AccountIndex::new(account_keys.iter().map(String::as_str));

    let instructions = tx
        .parsed_instructions
        .iter()
        .map(|instruction| compile_instruction(instruction, &index, DEFAULT_STACK_HEIGHT))
        .collect();

    let inner_instructions = collect_inner_instructions(&tx.parsed_instructions, &index);

    let (pre_balances, post_balances): (Vec<u64>, Vec<u64>) = tx
        .sol_bal_change
        .iter()
        .map(|change| {
            (
                change.pre_balance.unwrap_or(0),
                change.post_balance.unwrap_or(0),
            )
        })
        .unzip();

    let err = if tx.status == STATUS_SUCCESS {
        Value::Null
    } else {
        json!({ "error": FAILED_TRANSACTION_REASON })
    };

    let signatures = tx
        .signatures
        .clone()
        .unwrap_or_else(|| vec![tx.trans_id.clone()]);

    TransactionResult {
        slot: tx.block_id,
        block_time: tx.trans_time.filter(|time| *time != 0),
        meta: TransactionMeta {
            status: status_from_err(&err),
            err,
            fee: tx.fee,
            log_messages: tx.log_messages.clone(),
            pre_balances,
            post_balances,
            inner_instructions,
            pre_token_balances: Vec::new(),
            post_token_balances: Vec::new(),
            loaded_addresses: LoadedAddresses::default(),
            rewards: Vec::new(),
            compute_units_consumed: tx.compute_units_consumed,
        },
        transaction: EncodedTransaction {
            signatures,
            message: TransactionMessage {
                header: build_message_header(&tx.account_keys),
                account_keys,
                recent_blockhash: tx.recent_blockhash.clone().unwrap_or_default(),
                instructions,
                address_table_lookups: Vec::new(),
            },
        },
        version: tx.version.clone().unwrap_or_default(),
    }
}

fn compile_instruction(
    instruction: &ExplorerInstruction,
    index: &AccountIndex<'_>,
    stack_height: u32,
) -> CompiledInstruction {
    CompiledInstruction {
        program_id_index: index.resolve(&instruction.program_id),
        accounts: instruction
            .accounts
            .iter()
            .map(|account| index.resolve(account))
            .collect(),
        data: instruction.data.clone().unwrap_or_default(),
        stack_height: Some(stack_height),
    }
}

/// Groups nested instructions under the position of their top-level instruction.
fn collect_inner_instructions(
    instructions: &[ExplorerInstruction],
    index: &AccountIndex<'_>,
) -> Vec<Value> {
    instructions
        .iter()
        .enumerate()
        .filter(|(_, instruction)| !instruction.inner_instructions.is_empty())
        .map(|(position, instruction)| {
            let mut compiled = Vec::new();
            flatten_inner(
                &instruction.inner_instructions,
                index,
                DEFAULT_STACK_HEIGHT + 1,
                &mut compiled,
            );
            json!({ "index": position, "instructions": compiled })
        })
        .collect()
}

fn flatten_inner(
    instructions: &[ExplorerInstruction],
    index: &AccountIndex<'_>,
    stack_height: u32,
    compiled: &mut Vec<CompiledInstruction>,
) {
    for instruction in instructions {
        compiled.push(compile_instruction(instruction, index, stack_height));
        flatten_inner(
            &instruction.inner_instructions,
            index,
            stack_height + 1,
            compiled,
        );
    }
}
