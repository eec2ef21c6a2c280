use serde::Serialize;
use uuid::Uuid;

use crate::upload::CommittedUpload;

/// Successful upload response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    #[schema(example = "Uploaded successfully")]
    pub message: String,
    #[schema(example = "Eigenvalues")]
    pub topic: String,
    /// Leading characters of the extracted text.
    #[schema(example = "Let A be an n x n matrix...")]
    pub preview: String,
    /// ID of the stored document.
    #[serde(rename = "fileId")]
    pub file_id: Uuid,
    /// Metadata as returned by the extraction service.
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

impl From<CommittedUpload> for UploadResponse {
    fn from(upload: CommittedUpload) -> Self {
        Self {
            message: "Uploaded successfully".into(),
            topic: upload.document.topic,
            preview: upload.preview,
            file_id: upload.document.id,
            metadata: upload.metadata,
        }
    }
}
