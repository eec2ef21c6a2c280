use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

use crate::gateway::GatewayError;
use crate::ledger::LedgerError;
use crate::upload::UploadError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `INSUFFICIENT_TOKENS`, `NOT_FOUND`,
    /// `EMAIL_TAKEN`, `EXTRACTION_FAILED`, `REFUND_FAILED`, `GATEWAY_ERROR`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "INSUFFICIENT_TOKENS")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Insufficient tokens: balance 0, required 3. No tokens were charged.")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    InsufficientTokens(String),
    NotFound(String),
    EmailTaken,
    /// Upload failed downstream and the charge was refunded.
    ExtractionFailed(String),
    /// Upload failed downstream and the refund failed as well.
    RefundFailed(String),
    Gateway(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid email or password".into(),
                },
            ),
            AppError::InsufficientTokens(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "INSUFFICIENT_TOKENS",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "EMAIL_TAKEN",
                    message: "Email is already registered".into(),
                },
            ),
            AppError::ExtractionFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "EXTRACTION_FAILED",
                    message: msg,
                },
            ),
            AppError::RefundFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "REFUND_FAILED",
                    message: msg,
                },
            ),
            AppError::Gateway(detail) => {
                tracing::warn!("Extraction service error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "GATEWAY_ERROR",
                        message: "The document service is unavailable, no changes were made"
                            .into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Gateway(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(_) => AppError::NotFound("Account not found".into()),
            LedgerError::InvalidAmount(amount) => {
                AppError::Validation(format!("Invalid token amount: {amount}"))
            }
            LedgerError::InsufficientFunds { balance, requested } => {
                AppError::InsufficientTokens(format!(
                    "Insufficient tokens: balance {balance}, required {requested}. \
                     No tokens were charged."
                ))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidInput(msg) => AppError::Validation(msg),
            UploadError::InsufficientFunds { balance, required } => {
                AppError::InsufficientTokens(format!(
                    "Insufficient tokens: balance {balance}, required {required}. \
                     No tokens were charged."
                ))
            }
            // Any ledger failure at debit time rejects the request uncharged.
            UploadError::Ledger(e) => {
                tracing::warn!("Debit rejected: {}", e);
                AppError::InsufficientTokens(format!(
                    "Could not reserve tokens for this upload. No tokens were charged. ({e})"
                ))
            }
            UploadError::ExtractionFailed { refunded, .. } => AppError::ExtractionFailed(format!(
                "OCR extraction failed. {refunded} tokens were refunded."
            )),
            UploadError::RefundFailed {
                job_id, charged, ..
            } => AppError::RefundFailed(format!(
                "OCR extraction failed and the refund of {charged} tokens could not be completed. \
                 Please contact support with reference {job_id}."
            )),
        }
    }
}
