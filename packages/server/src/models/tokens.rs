use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::ledger::{AccountStatement, LedgerEntry, TransactionKind};

/// One ledger entry as returned to the account owner.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TransactionResponse {
    #[schema(example = 3)]
    pub id: i32,
    pub kind: TransactionKind,
    /// Always positive; `kind` gives the direction.
    #[schema(example = 5)]
    pub amount: i64,
    #[schema(example = "Uploaded a PDF: Week 3 notes")]
    pub reason: String,
    /// Balance right after this entry was applied.
    #[schema(example = 95)]
    pub balance_after: i64,
    /// Upload job that produced the entry, if any.
    pub reference: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for TransactionResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind,
            amount: entry.amount,
            reason: entry.reason,
            balance_after: entry.balance_after,
            reference: entry.reference,
            created_at: entry.created_at,
        }
    }
}

/// Current balance with the full history, oldest first.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenStatementResponse {
    #[schema(example = 95)]
    pub balance: i64,
    pub history: Vec<TransactionResponse>,
}

impl From<AccountStatement> for TokenStatementResponse {
    fn from(statement: AccountStatement) -> Self {
        Self {
            balance: statement.balance,
            history: statement
                .history
                .into_iter()
                .map(TransactionResponse::from)
                .collect(),
        }
    }
}
