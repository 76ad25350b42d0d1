use crate::domain::transaction::TransactionStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the ledger core.
///
/// Every variant except `InconsistentHold` is recoverable from the caller's
/// perspective. `InconsistentHold` marks a detected mismatch between a ledger
/// entry and its funds hold; it is logged under the `anomaly` target for
/// operator attention and never returned to an end caller.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("transaction {0} not found")]
    TransactionNotFound(String),

    #[error("insufficient funds in account {0}")]
    InsufficientFunds(String),

    #[error("transaction {id} cannot be {action} while {status}")]
    InvalidState {
        id: String,
        action: &'static str,
        status: TransactionStatus,
    },

    #[error("invalid status transition {from} -> {to} for transaction {id}")]
    InvalidTransition {
        id: String,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("account {0} still holds a balance")]
    NonZeroBalance(String),

    #[error("held funds for transaction {transaction_id} cannot be returned to account {account}")]
    InconsistentHold {
        transaction_id: String,
        account: String,
    },

    #[error("user {0} is not permitted to perform this action")]
    NotPermitted(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}
