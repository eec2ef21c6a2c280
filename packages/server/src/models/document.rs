use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::DocumentChanges;
use crate::entity::{document, folder_entry};
use crate::error::AppError;
use crate::extractors::json::Validate;

/// A stored document with its extracted text.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    #[schema(example = "Week 3 notes")]
    pub name: String,
    #[schema(example = "Linear Algebra")]
    pub course: String,
    #[schema(example = "Eigenvalues")]
    pub topic: String,
    pub description: String,
    #[schema(example = "2026-03-14")]
    pub date: String,
    #[schema(example = "10:30")]
    pub time: String,
    /// One of: `pdf`, `image`.
    #[schema(example = "pdf")]
    pub file_type: String,
    pub extracted_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<document::Model> for DocumentResponse {
    fn from(doc: document::Model) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            course: doc.course,
            topic: doc.topic,
            description: doc.description,
            date: doc.date,
            time: doc.time,
            file_type: doc.file_type,
            extracted_text: doc.extracted_text,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentListResponse {
    pub files: Vec<DocumentResponse>,
    #[schema(example = 2)]
    pub total: usize,
}

/// Metadata cached in the folder for one document.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FolderEntryResponse {
    pub document_id: Uuid,
    pub name: String,
    pub course: String,
    pub topic: String,
    pub description: String,
}

impl From<folder_entry::Model> for FolderEntryResponse {
    fn from(entry: folder_entry::Model) -> Self {
        Self {
            document_id: entry.document_id,
            name: entry.name,
            course: entry.course,
            topic: entry.topic,
            description: entry.description,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FolderResponse {
    #[schema(example = 2)]
    pub document_count: usize,
    pub entries: Vec<FolderEntryResponse>,
}

/// Partial update; omitted or empty fields keep their current value.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateDocumentRequest {
    #[schema(example = "Week 3 notes (revised)")]
    pub name: Option<String>,
    pub course: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
}

impl Validate for UpdateDocumentRequest {
    fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("Name", &self.name),
            ("Course", &self.course),
            ("Topic", &self.topic),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().chars().count() > 256) {
                return Err(AppError::Validation(format!(
                    "{field} must be at most 256 characters"
                )));
            }
        }
        if self
            .description
            .as_deref()
            .is_some_and(|v| v.chars().count() > 4096)
        {
            return Err(AppError::Validation(
                "Description must be at most 4096 characters".into(),
            ));
        }
        Ok(())
    }
}

impl From<UpdateDocumentRequest> for DocumentChanges {
    fn from(req: UpdateDocumentRequest) -> Self {
        Self {
            name: req.name,
            course: req.course,
            topic: req.topic,
            description: req.description,
        }
    }
}
