//! Drives one search job at a time from submission to a terminal state.
//!
//! Polling runs on a spawned tokio task owned through [`Poller`]; dropping the
//! guard aborts the task, so a cancelled, superseded, or dropped coordinator
//! never leaves a timer running. State lives in a `watch` channel and every
//! update first checks that it still belongs to the current job, so a response
//! for a superseded job is discarded.

use std::sync::Arc;
use std::time::Duration;

use smartleads_core::{AppConfig, CompanyCollection, SearchRequest};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::backend::{JobId, SearchBackend};
use crate::error::SearchError;
use crate::status::{JobState, JobStatus, ProgressSnapshot, TerminalCondition, FAILURE_SENTINEL};

/// Polling policy for a [`SearchCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Delay between progress requests. The first request goes out one
    /// interval after the backend accepts the job.
    pub poll_interval: Duration,
    /// Fail the job after this many poll errors in a row. `None` polls
    /// until the caller cancels.
    pub max_consecutive_poll_errors: Option<u32>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_consecutive_poll_errors: None,
        }
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_consecutive_poll_errors: config.max_consecutive_poll_errors,
        }
    }
}

/// Whether the polling loop should keep going after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    Continue,
    Stop,
}

/// Aborts the polling task when dropped.
struct Poller(JoinHandle<()>);

impl Drop for Poller {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct Shared<B> {
    backend: B,
    status: watch::Sender<JobStatus>,
    max_consecutive_poll_errors: Option<u32>,
}

/// Owns the single in-flight search job.
///
/// `submit` and `cancel` take `&mut self`, so only the owner can start or stop
/// a job. Observers read state through [`subscribe`](Self::subscribe) or the
/// [`JobHandle`] returned by `submit`.
pub struct SearchCoordinator<B: SearchBackend> {
    shared: Arc<Shared<B>>,
    poll_interval: Duration,
    poller: Option<Poller>,
}

impl<B: SearchBackend> SearchCoordinator<B> {
    #[must_use]
    pub fn new(backend: B, config: CoordinatorConfig) -> Self {
        let (status, _) = watch::channel(JobStatus::default());
        Self {
            shared: Arc::new(Shared {
                backend,
                status,
                max_consecutive_poll_errors: config.max_consecutive_poll_errors,
            }),
            poll_interval: config.poll_interval,
            poller: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    /// Validates `request`, replaces any previous job, and starts polling.
    ///
    /// An invalid request changes nothing: the previous job (if any) keeps
    /// polling and the backend is not called.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidRequest`] if validation fails.
    /// - [`SearchError::Submission`] if the backend rejects the search or is
    ///   unreachable; the job slot is left in `Failed`.
    pub async fn submit(&mut self, request: SearchRequest) -> Result<JobHandle, SearchError> {
        request.validate()?;

        // Stop the previous job's loop without flagging it cancelled; its
        // handles see the job id change and report `Superseded`.
        drop(self.poller.take());
        self.shared
            .status
            .send_replace(JobStatus::submitting(request.clone()));
        tracing::info!(
            category = %request.category,
            radius_km = request.radius_km,
            "submitting company search"
        );

        match self.shared.backend.submit(&request).await {
            Ok(job_id) => {
                self.shared.status.send_modify(|s| {
                    s.job_id = Some(job_id.clone());
                    s.state = JobState::Polling;
                });
                tracing::info!(job_id = %job_id, "search accepted; polling for progress");
                self.poller = Some(self.spawn_poller(job_id.clone()));
                Ok(JobHandle {
                    job_id,
                    updates: self.shared.status.subscribe(),
                })
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!(error = %reason, "search submission failed");
                self.shared.status.send_modify(|s| {
                    s.state = JobState::Failed;
                    s.condition = Some(TerminalCondition::SubmissionFailed { reason });
                });
                Err(SearchError::Submission {
                    source: Box::new(e),
                })
            }
        }
    }

    /// Runs a single poll tick for the current job and returns the resulting
    /// snapshot. Does nothing unless a job is actively polling.
    ///
    /// The background task calls the same logic on every interval; calling
    /// this by hand just brings the next update forward.
    pub async fn poll(&self) -> ProgressSnapshot {
        let current = {
            let status = self.shared.status.borrow();
            status.job_id.clone().filter(|id| status.is_polling(id))
        };
        if let Some(job_id) = current {
            self.shared.tick(&job_id).await;
        }
        self.snapshot()
    }

    /// Stops the polling cadence. Stored progress and state are kept.
    ///
    /// A request already in flight is dropped with the task. That includes a
    /// result fetch for a job that already reached `Completed`; its handles
    /// then resolve to [`SearchError::Cancelled`]. Calling this again, or with
    /// no job, has no further effect.
    pub fn cancel(&mut self) {
        let Some(poller) = self.poller.take() else {
            return;
        };
        drop(poller);
        self.shared.status.send_if_modified(|s| {
            let fetching = s.state == JobState::Completed && s.condition.is_none();
            if !(s.state == JobState::Polling || fetching) || s.cancelled {
                return false;
            }
            s.cancelled = true;
            if let Some(job_id) = &s.job_id {
                tracing::info!(job_id = %job_id, progress = s.progress, "polling cancelled");
            }
            true
        });
    }

    /// `true` while the background polling task is alive.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.0.is_finished())
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.shared.status.borrow().snapshot()
    }

    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.shared.status.borrow().clone()
    }

    /// Results of the last completed job, empty until one completes.
    #[must_use]
    pub fn results(&self) -> Arc<CompanyCollection> {
        Arc::clone(&self.shared.status.borrow().results)
    }

    /// A receiver that sees every state change from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.shared.status.subscribe()
    }

    fn spawn_poller(&self, job_id: JobId) -> Poller {
        let shared = Arc::clone(&self.shared);
        let period = self.poll_interval;
        Poller(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if shared.tick(&job_id).await == Tick::Stop {
                    break;
                }
            }
            tracing::debug!(job_id = %job_id, "polling loop finished");
        }))
    }
}

impl<B: SearchBackend> Shared<B> {
    async fn tick(&self, job_id: &JobId) -> Tick {
        if !self.status.borrow().is_polling(job_id) {
            return Tick::Stop;
        }

        match self.backend.progress(job_id).await {
            Ok(FAILURE_SENTINEL) => {
                self.fail_job(job_id);
                Tick::Stop
            }
            Ok(100) => {
                if self.claim_completion(job_id) {
                    self.fetch_results(job_id).await;
                }
                Tick::Stop
            }
            Ok(progress) if (0..100).contains(&progress) => self.advance(job_id, progress),
            Ok(progress) => {
                self.transient_error(job_id, format!("progress value {progress} is out of range"))
            }
            Err(e) => self.transient_error(job_id, e.to_string()),
        }
    }

    fn advance(&self, job_id: &JobId, progress: i32) -> Tick {
        let mut tick = Tick::Stop;
        self.status.send_if_modified(|s| {
            if !s.is_polling(job_id) {
                tracing::debug!(job_id = %job_id, progress, "discarding progress for inactive job");
                return false;
            }
            tick = Tick::Continue;
            let errors_cleared = s.transient_errors != 0;
            s.transient_errors = 0;
            if progress < s.progress {
                tracing::debug!(
                    job_id = %job_id,
                    progress,
                    current = s.progress,
                    "ignoring progress regression"
                );
                return errors_cleared;
            }
            let changed = progress != s.progress;
            s.progress = progress;
            changed || errors_cleared
        });
        tick
    }

    fn fail_job(&self, job_id: &JobId) {
        self.status.send_if_modified(|s| {
            if !s.is_polling(job_id) {
                return false;
            }
            s.state = JobState::Failed;
            s.progress = FAILURE_SENTINEL;
            s.condition = Some(TerminalCondition::JobFailed);
            let err = SearchError::JobFailed {
                job_id: job_id.clone(),
            };
            tracing::error!(error = %err, "search job failed");
            true
        });
    }

    /// Moves the job to `Completed`. Only the first caller gets `true`, so
    /// results are fetched once even if two ticks see 100.
    fn claim_completion(&self, job_id: &JobId) -> bool {
        self.status.send_if_modified(|s| {
            if !s.is_polling(job_id) {
                return false;
            }
            s.state = JobState::Completed;
            s.progress = 100;
            s.transient_errors = 0;
            tracing::info!(job_id = %job_id, "search job completed; fetching results");
            true
        })
    }

    async fn fetch_results(&self, job_id: &JobId) {
        let outcome = self.backend.results().await;
        self.status.send_if_modified(|s| {
            if s.job_id.as_ref() != Some(job_id) {
                return false;
            }
            match outcome {
                Ok(records) => {
                    let count = records.len();
                    tracing::info!(job_id = %job_id, count, "search results loaded");
                    s.results = Arc::new(records);
                    s.condition = Some(TerminalCondition::Succeeded { count });
                }
                Err(e) => {
                    let reason = e.to_string();
                    let err = SearchError::ResultFetch {
                        job_id: job_id.clone(),
                        reason: reason.clone(),
                    };
                    tracing::error!(error = %err, "could not load search results");
                    s.condition = Some(TerminalCondition::ResultFetchFailed { reason });
                }
            }
            true
        });
    }

    fn transient_error(&self, job_id: &JobId, reason: String) -> Tick {
        let mut tick = Tick::Stop;
        self.status.send_if_modified(|s| {
            if !s.is_polling(job_id) {
                return false;
            }
            s.transient_errors = s.transient_errors.saturating_add(1);
            let err = SearchError::TransientPoll {
                job_id: job_id.clone(),
                reason,
            };
            tracing::warn!(
                error = %err,
                consecutive_errors = s.transient_errors,
                "poll tick failed; retrying on next tick"
            );

            match self.max_consecutive_poll_errors {
                Some(limit) if s.transient_errors >= limit => {
                    let consecutive_errors = s.transient_errors;
                    let err = SearchError::PollingAbandoned {
                        job_id: job_id.clone(),
                        consecutive_errors,
                    };
                    tracing::error!(error = %err, "giving up on search job");
                    s.state = JobState::Failed;
                    s.condition = Some(TerminalCondition::PollingAbandoned { consecutive_errors });
                }
                _ => tick = Tick::Continue,
            }
            true
        });
        tick
    }
}

/// The caller's view of one submitted job.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    updates: watch::Receiver<JobStatus>,
}

impl JobHandle {
    #[must_use]
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Latest status, or `None` once a newer search has replaced this job.
    #[must_use]
    pub fn status(&self) -> Option<JobStatus> {
        let status = self.updates.borrow();
        (status.job_id.as_ref() == Some(&self.job_id)).then(|| status.clone())
    }

    /// Waits for the job's terminal notification.
    ///
    /// # Errors
    ///
    /// - [`SearchError::JobFailed`] if the server reported failure.
    /// - [`SearchError::ResultFetch`] if the job completed but results could
    ///   not be loaded.
    /// - [`SearchError::PollingAbandoned`] if the poll error budget ran out.
    /// - [`SearchError::Superseded`] if another search replaced this one.
    /// - [`SearchError::Cancelled`] if polling was cancelled or the
    ///   coordinator was dropped first.
    pub async fn finished(mut self) -> Result<Arc<CompanyCollection>, SearchError> {
        let job_id = self.job_id;
        let status = self
            .updates
            .wait_for(|s| s.job_id.as_ref() != Some(&job_id) || s.cancelled || s.condition.is_some())
            .await
            .map(|s| (*s).clone())
            .map_err(|_| SearchError::Cancelled {
                job_id: job_id.clone(),
            })?;

        if status.job_id.as_ref() != Some(&job_id) {
            return Err(SearchError::Superseded { job_id });
        }

        match status.condition {
            Some(TerminalCondition::Succeeded { .. }) => Ok(status.results),
            Some(TerminalCondition::JobFailed) => Err(SearchError::JobFailed { job_id }),
            Some(TerminalCondition::ResultFetchFailed { reason }) => {
                Err(SearchError::ResultFetch { job_id, reason })
            }
            Some(TerminalCondition::PollingAbandoned { consecutive_errors }) => {
                Err(SearchError::PollingAbandoned {
                    job_id,
                    consecutive_errors,
                })
            }
            // Submission failures never produce a handle, and a cancelled
            // job has no condition.
            Some(TerminalCondition::SubmissionFailed { .. }) | None => {
                Err(SearchError::Cancelled { job_id })
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
