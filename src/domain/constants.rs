pub const JSON_RPC_VERSION: &str = "2.0";

/// Explorer status code of a transaction that executed successfully.
pub const STATUS_SUCCESS: i64 = 1;

/// Stack height given to top-level instructions rebuilt from explorer data.
pub const DEFAULT_STACK_HEIGHT: u32 = 1;

pub const DEFAULT_TRANSACTION_VERSION: u8 = 0;

/// Index reported for an address missing from the account-key list.
pub const ACCOUNT_NOT_FOUND: i64 = -1;

pub const FAILED_TRANSACTION_REASON: &str = "failed";

pub struct RpcErrorCode;

impl RpcErrorCode {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}
