//! Paid upload pipeline: price, reserve tokens, extract, then either commit
//! the document or refund.

mod coordinator;
mod cost;
mod error;
mod job;

pub use coordinator::{CommittedUpload, UploadCoordinator};
pub use cost::{compute_cost, preview};
pub use error::{FailureCause, UploadError, UploadOutcome};
pub use job::{JobState, UploadJob};
