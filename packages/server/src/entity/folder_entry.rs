use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A document reference plus a denormalized copy of its descriptive metadata.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "folder_entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub folder_id: i32,
    #[sea_orm(belongs_to, from = "folder_id", to = "id")]
    pub folder: HasOne<super::folder::Entity>,

    #[sea_orm(unique)]
    pub document_id: Uuid,

    pub name: String,
    pub course: String,
    pub topic: String,
    pub description: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
