//! Token ledger: per-user balance plus an append-only transaction history.
//!
//! The balance column on `user` is written only through [`Ledger::debit`] and
//! [`Ledger::credit`]; every mutation appends exactly one `token_transaction`
//! row in the same database transaction.

mod error;
mod service;

pub use error::LedgerError;
pub use service::DbLedger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::entity::token_transaction;

/// Direction of a ledger entry.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
    sea_orm::DeriveActiveEnum,
    sea_orm::EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TransactionKind {
    #[sea_orm(string_value = "Credit")]
    Credit,
    #[sea_orm(string_value = "Debit")]
    Debit,
}

impl TransactionKind {
    /// Signed effect of `amount` on the balance.
    pub fn signed(&self, amount: i64) -> i64 {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit => f.write_str("Credit"),
            Self::Debit => f.write_str("Debit"),
        }
    }
}

/// An immutable, already-applied ledger entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: i32,
    pub kind: TransactionKind,
    pub amount: i64,
    pub reason: String,
    pub balance_after: i64,
    pub reference: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<token_transaction::Model> for LedgerEntry {
    fn from(model: token_transaction::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            amount: model.amount,
            reason: model.reason,
            balance_after: model.balance_after,
            reference: model.reference,
            created_at: model.created_at,
        }
    }
}

/// Balance and full history of one account, history in insertion order.
#[derive(Clone, Debug)]
pub struct AccountStatement {
    pub user_id: i32,
    pub balance: i64,
    pub history: Vec<LedgerEntry>,
}

impl AccountStatement {
    /// Check that the history fully explains the balance.
    ///
    /// Accounts open at zero, so the balance must equal the signed sum of all
    /// entries, every entry's `balance_after` must chain from its predecessor,
    /// and no intermediate balance may be negative.
    pub fn reconcile(&self) -> Result<(), LedgerError> {
        let mut running: i64 = 0;
        for entry in &self.history {
            if entry.amount <= 0 {
                return Err(LedgerError::InvariantViolation(format!(
                    "entry {} has non-positive amount {}",
                    entry.id, entry.amount
                )));
            }
            running = running
                .checked_add(entry.kind.signed(entry.amount))
                .ok_or_else(|| {
                    LedgerError::InvariantViolation(format!("balance overflow at entry {}", entry.id))
                })?;
            if running < 0 {
                return Err(LedgerError::InvariantViolation(format!(
                    "balance negative ({running}) after entry {}",
                    entry.id
                )));
            }
            if running != entry.balance_after {
                return Err(LedgerError::InvariantViolation(format!(
                    "entry {} records balance {} but history sums to {running}",
                    entry.id, entry.balance_after
                )));
            }
        }
        if running != self.balance {
            return Err(LedgerError::InvariantViolation(format!(
                "account {} balance {} does not match history sum {running}",
                self.user_id, self.balance
            )));
        }
        Ok(())
    }

    /// Sum of all entries of the given kind.
    pub fn total(&self, kind: TransactionKind) -> i64 {
        self.history
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.amount)
            .sum()
    }
}

/// The only way to change a token balance.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Remove `amount` tokens if and only if the balance covers it.
    ///
    /// On `InsufficientFunds` nothing is written.
    async fn debit(
        &self,
        user_id: i32,
        amount: i64,
        reason: &str,
        reference: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Add `amount` tokens. Used for top-ups and to compensate a prior debit.
    async fn credit(
        &self,
        user_id: i32,
        amount: i64,
        reason: &str,
        reference: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError>;

    async fn statement(&self, user_id: i32) -> Result<AccountStatement, LedgerError>;
}
