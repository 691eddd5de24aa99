use std::sync::Arc;

use smartleads_core::{CompanyCollection, SearchRequest};

use crate::backend::JobId;

/// Progress value the backend reports for a failed job.
pub const FAILURE_SENTINEL: i32 = -1;

/// Lifecycle of the coordinator's single job slot.
///
/// `Idle → Submitting → Polling → Completed | Failed`, with
/// `Submitting → Failed` when the backend rejects the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

impl JobState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Idle => write!(f, "idle"),
            JobState::Submitting => write!(f, "submitting"),
            JobState::Polling => write!(f, "polling"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// How a job ended. Set once the job leaves `Polling` for good.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCondition {
    Succeeded { count: usize },
    SubmissionFailed { reason: String },
    JobFailed,
    ResultFetchFailed { reason: String },
    PollingAbandoned { consecutive_errors: u32 },
}

/// Everything the coordinator knows about the current job.
///
/// Published on a watch channel; each new submission replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobStatus {
    pub job_id: Option<JobId>,
    pub request: Option<SearchRequest>,
    pub state: JobState,
    /// `0..=100`, or [`FAILURE_SENTINEL`] once the server reports failure.
    pub progress: i32,
    /// Poll ticks in a row that failed to reach the backend.
    pub transient_errors: u32,
    /// Polling, or the result fetch after completion, was stopped by the
    /// caller before a terminal condition was recorded.
    pub cancelled: bool,
    pub condition: Option<TerminalCondition>,
    /// Results of the last completed job. Emptied on every new submission.
    pub results: Arc<CompanyCollection>,
}

impl JobStatus {
    pub(crate) fn submitting(request: SearchRequest) -> Self {
        Self {
            request: Some(request),
            state: JobState::Submitting,
            ..Self::default()
        }
    }

    /// `true` while this status belongs to `job_id` and polling is live.
    pub(crate) fn is_polling(&self, job_id: &JobId) -> bool {
        self.job_id.as_ref() == Some(job_id) && self.state == JobState::Polling && !self.cancelled
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            state: self.state,
            progress: self.progress,
            label: progress_label(self.progress),
        }
    }
}

/// What a progress indicator needs to draw itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub state: JobState,
    pub progress: i32,
    pub label: &'static str,
}

/// Describes the server-side phase a progress value falls in.
#[must_use]
pub fn progress_label(progress: i32) -> &'static str {
    match progress {
        FAILURE_SENTINEL => "search failed",
        p if p < 15 => "querying location index",
        p if p < 85 => "collecting site data",
        p if p < 100 => "validating records",
        _ => "search complete",
    }
}
