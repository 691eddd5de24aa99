//! Search job lifecycle: submit a company search, poll the server-side job
//! until it finishes, then hand the results to the caller.
//!
//! The remote API is abstracted behind [`SearchBackend`]; the
//! [`SearchCoordinator`] owns the single in-flight job and its polling task.

mod backend;
mod coordinator;
mod error;
mod status;

pub use backend::{JobId, SearchBackend};
pub use coordinator::{CoordinatorConfig, JobHandle, SearchCoordinator};
pub use error::SearchError;
pub use status::{
    progress_label, JobState, JobStatus, ProgressSnapshot, TerminalCondition, FAILURE_SENTINEL,
};
