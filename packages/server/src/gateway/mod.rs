//! Boundary to the external OCR/RAG service.
//!
//! The upload pipeline only ever sees [`ExtractionGateway`] and a tagged
//! [`GatewayError`], so its failure handling does not depend on how the
//! remote call failed.

mod http;

pub use http::HttpExtractionGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of uploaded material, decided from its MIME type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Image,
}

impl FileKind {
    /// Classify an allowed MIME type. Anything that is neither a PDF nor an
    /// image yields `None`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(Self::Pdf),
            m if m.starts_with("image/") => Some(Self::Image),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File content handed to the service.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Descriptive fields attached to an upload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DocumentMetadata {
    pub name: String,
    pub course: String,
    pub topic: String,
    pub description: String,
    pub date: String,
    pub time: String,
}

/// Successful extraction result.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub text: String,
    /// Metadata as echoed by the service; passed through untouched.
    pub metadata: serde_json::Value,
}

/// Re-index request after a document's metadata changed.
#[derive(Clone, Debug, Serialize)]
pub struct IndexUpdate {
    pub old_course: String,
    pub old_topic: String,
    #[serde(rename = "userEmail")]
    pub user_email: String,
    pub new_course: String,
    pub new_topic: String,
    pub new_description: String,
    pub new_text: String,
    pub name: String,
    pub date: String,
    pub time: String,
    pub file_type: String,
}

/// Drop the index for one (course, topic) of a user.
#[derive(Clone, Debug, Serialize)]
pub struct IndexDelete {
    #[serde(rename = "userEmail")]
    pub user_email: String,
    pub course: String,
    pub topic: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Extraction service timed out")]
    Timeout,

    #[error("Extraction service unreachable: {0}")]
    Transport(String),

    #[error("Extraction service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response from extraction service: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ExtractionGateway: Send + Sync {
    /// Number of pages in a PDF, as reported by the service. The value is not
    /// validated here.
    async fn count_pages(&self, file: &SourceFile) -> Result<i64, GatewayError>;

    /// Extract and index the text of a PDF or image.
    async fn extract(
        &self,
        file: &SourceFile,
        kind: FileKind,
        metadata: &DocumentMetadata,
        user_email: &str,
    ) -> Result<Extraction, GatewayError>;

    async fn update_index(&self, request: &IndexUpdate) -> Result<(), GatewayError>;

    async fn delete_index(&self, request: &IndexDelete) -> Result<(), GatewayError>;
}
