use tracing::debug;
use uuid::Uuid;

use crate::gateway::{DocumentMetadata, SourceFile};

/// Lifecycle of one upload request.
///
/// ```text
/// Received -> CostComputed -> Debited -> Extracting -> Committed
///                                                   -> RefundIssued -> Failed
///                                                   -> RefundFailedFatal
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Received,
    CostComputed,
    Debited,
    Extracting,
    Committed,
    RefundIssued,
    Failed,
    RefundFailedFatal,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Failed | Self::RefundFailedFatal)
    }

    fn can_advance_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (*self, next),
            (Received, CostComputed)
                | (CostComputed, Debited)
                | (Debited, Extracting)
                | (Extracting, Committed)
                | (Extracting, RefundIssued)
                | (Extracting, RefundFailedFatal)
                | (RefundIssued, Failed)
        )
    }
}

/// One upload request. Never persisted; its effects are ledger entries and,
/// on success, a document.
#[derive(Debug)]
pub struct UploadJob {
    pub id: Uuid,
    pub user_id: i32,
    pub user_email: String,
    pub file: SourceFile,
    pub metadata: DocumentMetadata,
    state: JobState,
}

impl UploadJob {
    pub fn new(
        user_id: i32,
        user_email: impl Into<String>,
        file: SourceFile,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            user_email: user_email.into(),
            file,
            metadata,
            state: JobState::Received,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub(super) fn advance(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal upload transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(job_id = %self.id, from = ?self.state, to = ?next, "Upload job transition");
        self.state = next;
    }
}
