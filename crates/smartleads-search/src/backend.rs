use std::future::Future;

use smartleads_core::{CompanyCollection, SearchRequest};

/// Opaque identifier the backend assigns to a submitted search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The remote search service the coordinator drives.
///
/// Returned futures must be `Send` because polling runs on a spawned task.
pub trait SearchBackend: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Starts a server-side search and returns its job id.
    fn submit(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<JobId, Self::Error>> + Send;

    /// Current progress of a job: `0..=100`, or `-1` when the job failed.
    fn progress(&self, job_id: &JobId) -> impl Future<Output = Result<i32, Self::Error>> + Send;

    /// Results of the most recently completed search.
    fn results(&self) -> impl Future<Output = Result<CompanyCollection, Self::Error>> + Send;
}
