use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, instrument, warn};
use uuid::Uuid;

use super::{FailureCause, JobState, UploadError, UploadJob, compute_cost, preview};
use crate::catalog::CatalogService;
use crate::config::AppConfig;
use crate::entity::document;
use crate::gateway::{ExtractionGateway, FileKind, GatewayError};
use crate::ledger::{Ledger, LedgerError};

/// Result of a job that reached `Committed`.
#[derive(Debug)]
pub struct CommittedUpload {
    pub job_id: Uuid,
    pub document: document::Model,
    /// Metadata echoed by the extraction service.
    pub metadata: serde_json::Value,
    pub charged: i64,
    pub preview: String,
}

/// Drives an [`UploadJob`] through pricing, debit, extraction and either
/// commit or refund.
///
/// The ledger and the extraction service cannot share a transaction, so a
/// failure after the debit is undone by a compensating credit. If that
/// credit fails too the job ends in [`JobState::RefundFailedFatal`] and the
/// error is surfaced as [`UploadError::RefundFailed`].
pub struct UploadCoordinator {
    db: DatabaseConnection,
    ledger: Arc<dyn Ledger>,
    gateway: Arc<dyn ExtractionGateway>,
    config: AppConfig,
    remote_timeout: Duration,
}

impl UploadCoordinator {
    pub fn new(
        db: DatabaseConnection,
        ledger: Arc<dyn Ledger>,
        gateway: Arc<dyn ExtractionGateway>,
        config: AppConfig,
    ) -> Self {
        let remote_timeout = Duration::from_secs(config.gateway.timeout_secs);
        Self {
            db,
            ledger,
            gateway,
            config,
            remote_timeout,
        }
    }

    /// Run the job on its own task.
    ///
    /// Once the debit is written the job must reach a document, a refund or
    /// `RefundFailedFatal`; a detached task keeps going when the request
    /// future is dropped by a client disconnect.
    pub fn spawn(self, job: UploadJob) -> JoinHandle<Result<CommittedUpload, UploadError>> {
        tokio::spawn(async move { self.run(job).await }.in_current_span())
    }

    #[instrument(
        skip(self, job),
        fields(job_id = %job.id, user_id = job.user_id, file_name = %job.file.file_name)
    )]
    pub async fn run(&self, mut job: UploadJob) -> Result<CommittedUpload, UploadError> {
        let kind = self.classify(&job)?;

        let page_count = match kind {
            FileKind::Pdf => {
                let pages = self
                    .bounded(self.gateway.count_pages(&job.file))
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Page count failed; upload rejected before charging");
                        UploadError::InvalidInput("Failed to count PDF pages.".into())
                    })?;
                Some(pages)
            }
            FileKind::Image => None,
        };

        let cost = compute_cost(kind, page_count, self.config.tokens.cost_per_page)?;
        job.advance(JobState::CostComputed);

        let reason = match kind {
            FileKind::Pdf => format!("Uploaded a PDF: {}", job.metadata.name),
            FileKind::Image => format!("Uploaded an Image: {}", job.metadata.name),
        };
        self.ledger
            .debit(job.user_id, cost, &reason, Some(job.id))
            .await
            .map_err(|e| match e {
                LedgerError::InsufficientFunds { balance, requested } => {
                    UploadError::InsufficientFunds {
                        balance,
                        required: requested,
                    }
                }
                other => UploadError::Ledger(other),
            })?;
        job.advance(JobState::Debited);

        job.advance(JobState::Extracting);
        let extracted = self
            .bounded(
                self.gateway
                    .extract(&job.file, kind, &job.metadata, &job.user_email),
            )
            .await;

        let cause = match extracted {
            Ok(extraction) => match self.commit(&job, kind, extraction.text).await {
                Ok(document) => {
                    job.advance(JobState::Committed);
                    info!(document_id = %document.id, charged = cost, "Upload committed");
                    return Ok(CommittedUpload {
                        job_id: job.id,
                        preview: preview(&document.extracted_text, self.config.upload.preview_chars),
                        document,
                        metadata: extraction.metadata,
                        charged: cost,
                    });
                }
                Err(e) => FailureCause::Persist(e),
            },
            Err(e) => FailureCause::Gateway(e),
        };

        Err(self.compensate(&mut job, cost, cause).await)
    }

    fn classify(&self, job: &UploadJob) -> Result<FileKind, UploadError> {
        let mime = job.file.mime.as_str();
        if !self
            .config
            .upload
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed == mime)
        {
            return Err(UploadError::InvalidInput("Unsupported file type.".into()));
        }
        FileKind::from_mime(mime)
            .ok_or_else(|| UploadError::InvalidInput("Unsupported file type.".into()))
    }

    /// Bound a remote call by the gateway timeout; elapsing counts as a
    /// gateway failure.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        tokio::time::timeout(self.remote_timeout, call)
            .await
            .unwrap_or(Err(GatewayError::Timeout))
    }

    async fn commit(
        &self,
        job: &UploadJob,
        kind: FileKind,
        text: String,
    ) -> Result<document::Model, DbErr> {
        let txn = self.db.begin().await?;
        let document = CatalogService::new(&txn)
            .create_document(job.user_id, kind, &job.metadata, text)
            .await?;
        txn.commit().await?;
        Ok(document)
    }

    async fn compensate(&self, job: &mut UploadJob, cost: i64, cause: FailureCause) -> UploadError {
        warn!(error = %cause, amount = cost, "Upload failed after debit; refunding");

        let reason = format!("Upload failed for {}, tokens refunded", job.metadata.name);
        match self
            .ledger
            .credit(job.user_id, cost, &reason, Some(job.id))
            .await
        {
            Ok(_) => {
                job.advance(JobState::RefundIssued);
                job.advance(JobState::Failed);
                UploadError::ExtractionFailed {
                    job_id: job.id,
                    refunded: cost,
                    cause,
                }
            }
            Err(refund_error) => {
                job.advance(JobState::RefundFailedFatal);
                error!(
                    refund_failed = true,
                    job_id = %job.id,
                    user_id = job.user_id,
                    amount = cost,
                    cause = %cause,
                    refund_error = %refund_error,
                    "Refund failed: account charged without a document, manual reconciliation required"
                );
                UploadError::RefundFailed {
                    job_id: job.id,
                    charged: cost,
                    cause,
                    refund_error,
                }
            }
        }
    }
}
