use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::{AccountStatement, Ledger, LedgerEntry, LedgerError, TransactionKind};
use crate::entity::{token_transaction, user};

/// Ledger backed by the `user.token_balance` column and the
/// `token_transaction` table.
///
/// Sufficiency is checked by the database at write time
/// (`UPDATE .. WHERE token_balance >= amount`), so concurrent debits against
/// the same account are linearized by the row update itself.
#[derive(Clone)]
pub struct DbLedger {
    db: DatabaseConnection,
}

impl DbLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn apply(
        &self,
        user_id: i32,
        kind: TransactionKind,
        amount: i64,
        reason: &str,
        reference: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let txn = self.db.begin().await?;

        let balance_expr = match kind {
            TransactionKind::Credit => Expr::col(user::Column::TokenBalance).add(amount),
            TransactionKind::Debit => Expr::col(user::Column::TokenBalance).sub(amount),
        };
        let mut update = user::Entity::update_many()
            .col_expr(user::Column::TokenBalance, balance_expr)
            .filter(user::Column::Id.eq(user_id));
        if kind == TransactionKind::Debit {
            update = update.filter(user::Column::TokenBalance.gte(amount));
        }

        let update_result = update.exec(&txn).await?;

        if update_result.rows_affected == 0 {
            // Nothing was written; dropping `txn` rolls back the empty transaction.
            let balance = current_balance(&txn, user_id).await?;
            return Err(match balance {
                None => LedgerError::AccountNotFound(user_id),
                Some(balance) => LedgerError::InsufficientFunds {
                    balance,
                    requested: amount,
                },
            });
        }

        let balance_after = current_balance(&txn, user_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(user_id))?;

        if balance_after < 0 {
            error!(
                user_id,
                %kind,
                amount,
                balance_after,
                "Refusing ledger mutation that leaves a negative balance"
            );
            return Err(LedgerError::InvariantViolation(format!(
                "{kind} of {amount} would leave account {user_id} at {balance_after}"
            )));
        }

        let entry = token_transaction::ActiveModel {
            user_id: Set(user_id),
            kind: Set(kind),
            amount: Set(amount),
            reason: Set(reason.to_owned()),
            balance_after: Set(balance_after),
            reference: Set(reference),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        debug!(user_id, %kind, amount, balance_after, "Ledger entry appended");
        Ok(entry.into())
    }
}

async fn current_balance<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<Option<i64>, LedgerError> {
    let balance = user::Entity::find_by_id(user_id)
        .select_only()
        .column(user::Column::TokenBalance)
        .into_tuple::<i64>()
        .one(conn)
        .await?;
    Ok(balance)
}

#[async_trait]
impl Ledger for DbLedger {
    #[instrument(skip(self, reason))]
    async fn debit(
        &self,
        user_id: i32,
        amount: i64,
        reason: &str,
        reference: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError> {
        self.apply(user_id, TransactionKind::Debit, amount, reason, reference)
            .await
    }

    #[instrument(skip(self, reason))]
    async fn credit(
        &self,
        user_id: i32,
        amount: i64,
        reason: &str,
        reference: Option<Uuid>,
    ) -> Result<LedgerEntry, LedgerError> {
        self.apply(user_id, TransactionKind::Credit, amount, reason, reference)
            .await
    }

    async fn statement(&self, user_id: i32) -> Result<AccountStatement, LedgerError> {
        // Read balance and history from one snapshot.
        let txn = self.db.begin().await?;

        let balance = current_balance(&txn, user_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(user_id))?;

        let history = token_transaction::Entity::find()
            .filter(token_transaction::Column::UserId.eq(user_id))
            .order_by_asc(token_transaction::Column::Id)
            .all(&txn)
            .await?
            .into_iter()
            .map(LedgerEntry::from)
            .collect();

        txn.commit().await?;

        Ok(AccountStatement {
            user_id,
            balance,
            history,
        })
    }
}
