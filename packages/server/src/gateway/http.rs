use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{
    DocumentMetadata, Extraction, ExtractionGateway, FileKind, GatewayError, IndexDelete,
    IndexUpdate, SourceFile,
};
use crate::config::GatewayConfig;

#[derive(Debug, Deserialize)]
struct PagesResponse {
    pages: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    text: String,
    #[serde(default)]
    metadata: serde_json::Value,
}

/// `reqwest` client for the extraction service. Every call is bounded by the
/// configured timeout and attempted once.
pub struct HttpExtractionGateway {
    client: Client,
    base_url: String,
}

impl HttpExtractionGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_decode() {
        GatewayError::Malformed(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

fn file_part(file: &SourceFile) -> Result<Part, GatewayError> {
    Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.mime)
        .map_err(|e| GatewayError::Transport(format!("Invalid content type: {e}")))
}

#[async_trait]
impl ExtractionGateway for HttpExtractionGateway {
    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    async fn count_pages(&self, file: &SourceFile) -> Result<i64, GatewayError> {
        let form = Form::new().part("file", file_part(file)?);

        let response = self
            .send(self.client.post(self.url("/calculatePages/pdf")).multipart(form))
            .await?;

        let body: PagesResponse = response.json().await.map_err(map_reqwest_error)?;
        let pages = body
            .pages
            .ok_or_else(|| GatewayError::Malformed("missing 'pages'".into()))?;

        debug!(pages, "Page count received");
        Ok(pages)
    }

    #[instrument(skip(self, file, metadata, user_email), fields(file_name = %file.file_name, %kind))]
    async fn extract(
        &self,
        file: &SourceFile,
        kind: FileKind,
        metadata: &DocumentMetadata,
        user_email: &str,
    ) -> Result<Extraction, GatewayError> {
        let path = match kind {
            FileKind::Pdf => "/extract/pdf",
            FileKind::Image => "/extract/image",
        };

        let form = Form::new()
            .text("userEmail", user_email.to_string())
            .part("file", file_part(file)?)
            .text("name", metadata.name.clone())
            .text("date", metadata.date.clone())
            .text("time", metadata.time.clone())
            .text("topic", metadata.topic.clone())
            .text("course", metadata.course.clone())
            .text("description", metadata.description.clone());

        let response = self
            .send(self.client.post(self.url(path)).multipart(form))
            .await?;

        let body: ExtractResponse = response.json().await.map_err(map_reqwest_error)?;

        debug!(chars = body.text.chars().count(), "Extraction received");
        Ok(Extraction {
            text: body.text,
            metadata: body.metadata,
        })
    }

    #[instrument(skip(self, request))]
    async fn update_index(&self, request: &IndexUpdate) -> Result<(), GatewayError> {
        self.send(self.client.post(self.url("/rag/update")).json(request))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, request))]
    async fn delete_index(&self, request: &IndexDelete) -> Result<(), GatewayError> {
        self.send(self.client.post(self.url("/rag/delete")).json(request))
            .await?;
        Ok(())
    }
}
