use smartleads_core::ValidationError;
use thiserror::Error;

use crate::backend::JobId;

/// Everything that can go wrong between submitting a search and reading its
/// results.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Rejected on the client; nothing was sent.
    #[error("invalid search request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// The backend refused the search or could not be reached.
    #[error("search submission failed: {source}")]
    Submission {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend reported the failure sentinel while polling.
    #[error("search job {job_id} failed on the server")]
    JobFailed { job_id: JobId },

    #[error("search job {job_id} completed but its results could not be fetched: {reason}")]
    ResultFetch { job_id: JobId, reason: String },

    /// One poll tick failed. Logged and retried on the next tick.
    #[error("progress poll for job {job_id} failed: {reason}")]
    TransientPoll { job_id: JobId, reason: String },

    #[error("gave up on job {job_id} after {consecutive_errors} consecutive poll errors")]
    PollingAbandoned {
        job_id: JobId,
        consecutive_errors: u32,
    },

    #[error("search job {job_id} was replaced by a newer search")]
    Superseded { job_id: JobId },

    #[error("polling for search job {job_id} was cancelled")]
    Cancelled { job_id: JobId },
}
