use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::{document, folder, folder_entry};
use crate::gateway::{DocumentMetadata, FileKind};

/// Partial update of a document's descriptive fields. `None` keeps the
/// current value, as does an empty string.
#[derive(Clone, Debug, Default)]
pub struct DocumentChanges {
    pub name: Option<String>,
    pub course: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
}

impl DocumentChanges {
    fn pick(new: &Option<String>, current: &str) -> String {
        match new.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => current.to_string(),
        }
    }
}

pub struct CatalogService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> CatalogService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Persist an extracted document and file it in the owner's folder.
    ///
    /// Callers pass a transaction so the document and its folder entry
    /// appear together or not at all.
    pub async fn create_document(
        &self,
        user_id: i32,
        kind: FileKind,
        metadata: &DocumentMetadata,
        extracted_text: String,
    ) -> Result<document::Model, DbErr> {
        let now = Utc::now();
        let doc = document::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            name: Set(metadata.name.clone()),
            course: Set(metadata.course.clone()),
            topic: Set(metadata.topic.clone()),
            description: Set(metadata.description.clone()),
            date: Set(metadata.date.clone()),
            time: Set(metadata.time.clone()),
            file_type: Set(kind.as_str().to_string()),
            extracted_text: Set(extracted_text),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.conn)
        .await?;

        let folder = self.ensure_folder(user_id).await?;

        folder_entry::ActiveModel {
            folder_id: Set(folder.id),
            document_id: Set(doc.id),
            name: Set(doc.name.clone()),
            course: Set(doc.course.clone()),
            topic: Set(doc.topic.clone()),
            description: Set(doc.description.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        Ok(doc)
    }

    /// Return the user's folder, creating it on first use.
    ///
    /// Concurrent first uploads race on the unique `user_id`; the loser's
    /// insert is a no-op and both read back the same row.
    pub async fn ensure_folder(&self, user_id: i32) -> Result<folder::Model, DbErr> {
        folder::Entity::insert(folder::ActiveModel {
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(folder::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(self.conn)
        .await?;

        folder::Entity::find()
            .filter(folder::Column::UserId.eq(user_id))
            .one(self.conn)
            .await?
            .ok_or_else(|| DbErr::Custom("folder missing after upsert".to_string()))
    }

    pub async fn list_documents(&self, user_id: i32) -> Result<Vec<document::Model>, DbErr> {
        document::Entity::find()
            .filter(document::Column::UserId.eq(user_id))
            .order_by_asc(document::Column::CreatedAt)
            .order_by_asc(document::Column::Id)
            .all(self.conn)
            .await
    }

    /// Find a document by id, only if it belongs to `user_id`.
    pub async fn find_owned(
        &self,
        user_id: i32,
        id: Uuid,
    ) -> Result<Option<document::Model>, DbErr> {
        document::Entity::find_by_id(id)
            .filter(document::Column::UserId.eq(user_id))
            .one(self.conn)
            .await
    }

    pub async fn folder_entries(
        &self,
        user_id: i32,
    ) -> Result<Option<(folder::Model, Vec<folder_entry::Model>)>, DbErr> {
        let Some(folder) = folder::Entity::find()
            .filter(folder::Column::UserId.eq(user_id))
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };

        let entries = folder_entry::Entity::find()
            .filter(folder_entry::Column::FolderId.eq(folder.id))
            .order_by_asc(folder_entry::Column::Id)
            .all(self.conn)
            .await?;

        Ok(Some((folder, entries)))
    }

    /// Apply `changes` to the document and its folder entry.
    pub async fn update_document(
        &self,
        doc: document::Model,
        changes: &DocumentChanges,
    ) -> Result<document::Model, DbErr> {
        let name = DocumentChanges::pick(&changes.name, &doc.name);
        let course = DocumentChanges::pick(&changes.course, &doc.course);
        let topic = DocumentChanges::pick(&changes.topic, &doc.topic);
        let description = DocumentChanges::pick(&changes.description, &doc.description);

        let mut active = doc.into_active_model();
        active.name = Set(name.clone());
        active.course = Set(course.clone());
        active.topic = Set(topic.clone());
        active.description = Set(description.clone());
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.conn).await?;

        folder_entry::Entity::update_many()
            .col_expr(folder_entry::Column::Name, sea_orm::sea_query::Expr::value(name))
            .col_expr(folder_entry::Column::Course, sea_orm::sea_query::Expr::value(course))
            .col_expr(folder_entry::Column::Topic, sea_orm::sea_query::Expr::value(topic))
            .col_expr(
                folder_entry::Column::Description,
                sea_orm::sea_query::Expr::value(description),
            )
            .filter(folder_entry::Column::DocumentId.eq(updated.id))
            .exec(self.conn)
            .await?;

        Ok(updated)
    }

    /// Remove the document and its folder entry.
    pub async fn delete_document(&self, doc: document::Model) -> Result<(), DbErr> {
        folder_entry::Entity::delete_many()
            .filter(folder_entry::Column::DocumentId.eq(doc.id))
            .exec(self.conn)
            .await?;

        doc.delete(self.conn).await?;
        Ok(())
    }
}
