use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ledger::TransactionKind;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "token_transaction")]
pub struct Model {
    /// Monotonic per table, so ordering by id is insertion order.
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub kind: TransactionKind,
    /// Always positive; the sign comes from `kind`.
    pub amount: i64,
    pub reason: String,
    /// Balance immediately after this entry was applied.
    pub balance_after: i64,
    /// Correlates a refund with the debit it compensates (upload job id).
    pub reference: Option<Uuid>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
