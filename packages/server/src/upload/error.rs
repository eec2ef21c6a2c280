use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::gateway::GatewayError;
use crate::ledger::LedgerError;

/// What went wrong after tokens were already taken.
#[derive(Debug, Error)]
pub enum FailureCause {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Could not save extracted document: {0}")]
    Persist(#[from] DbErr),
}

/// Terminal outcome of a failed job that got past the debit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    FailedAndRefunded,
    FailedAndRefundFailed,
}

#[derive(Debug, Error)]
pub enum UploadError {
    /// Rejected before any ledger mutation.
    #[error("{0}")]
    InvalidInput(String),

    /// Debit refused; nothing was charged.
    #[error("Insufficient tokens: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    /// Any other debit failure; nothing was charged.
    #[error("Could not reserve tokens: {0}")]
    Ledger(LedgerError),

    /// Downstream failure after the debit, compensated by a refund.
    #[error("Upload {job_id} failed ({cause}); {refunded} tokens refunded")]
    ExtractionFailed {
        job_id: Uuid,
        refunded: i64,
        cause: FailureCause,
    },

    /// Downstream failure whose refund also failed. The account stays charged.
    #[error("Upload {job_id} failed ({cause}) and refund of {charged} tokens failed: {refund_error}")]
    RefundFailed {
        job_id: Uuid,
        charged: i64,
        cause: FailureCause,
        refund_error: LedgerError,
    },
}

impl UploadError {
    /// `None` when the job was rejected before it was charged.
    pub fn outcome(&self) -> Option<UploadOutcome> {
        match self {
            Self::InvalidInput(_) | Self::InsufficientFunds { .. } | Self::Ledger(_) => None,
            Self::ExtractionFailed { .. } => Some(UploadOutcome::FailedAndRefunded),
            Self::RefundFailed { .. } => Some(UploadOutcome::FailedAndRefundFailed),
        }
    }
}
