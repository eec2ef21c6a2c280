use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Account not found for user {0}")]
    AccountNotFound(i32),

    #[error("Invalid token amount: {0}")]
    InvalidAmount(i64),

    #[error("Insufficient tokens: balance {balance}, required {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}
