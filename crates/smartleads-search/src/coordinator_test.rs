use std::sync::atomic::{AtomicU32, Ordering};

use smartleads_core::{Category, CompanyCollection, SearchRequest};

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("unreachable")]
struct Unreachable;

/// Accepts every search with a fresh id and reports 50% progress.
#[derive(Default)]
struct HalfwayBackend {
    next_id: AtomicU32,
    progress_calls: AtomicU32,
}

impl SearchBackend for HalfwayBackend {
    type Error = Unreachable;

    async fn submit(&self, _request: &SearchRequest) -> Result<JobId, Self::Error> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(JobId::new(format!("job-{n}")))
    }

    async fn progress(&self, _job_id: &JobId) -> Result<i32, Self::Error> {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
        Ok(50)
    }

    async fn results(&self) -> Result<CompanyCollection, Self::Error> {
        Ok(CompanyCollection::new())
    }
}

fn idle_coordinator() -> SearchCoordinator<HalfwayBackend> {
    SearchCoordinator::new(
        HalfwayBackend::default(),
        CoordinatorConfig {
            poll_interval: Duration::from_secs(3600),
            max_consecutive_poll_errors: None,
        },
    )
}

fn request() -> SearchRequest {
    SearchRequest::near_place(Category::Hoteles, "Mendoza", 5)
}

#[tokio::test]
async fn late_update_for_superseded_job_is_discarded() {
    let mut coordinator = idle_coordinator();
    let first = coordinator.submit(request()).await.unwrap();
    let old_id = first.job_id().clone();
    coordinator.submit(request()).await.unwrap();

    let before = coordinator.status();
    assert_eq!(coordinator.shared.advance(&old_id, 90), Tick::Stop);
    assert!(!coordinator.shared.claim_completion(&old_id));
    coordinator.shared.fail_job(&old_id);
    assert_eq!(coordinator.status(), before);
    assert_eq!(before.state, JobState::Polling);
    assert_eq!(before.progress, 0);
}

#[tokio::test]
async fn tick_for_inactive_job_skips_the_backend() {
    let mut coordinator = idle_coordinator();
    let first = coordinator.submit(request()).await.unwrap();
    let old_id = first.job_id().clone();
    coordinator.submit(request()).await.unwrap();

    assert_eq!(coordinator.shared.tick(&old_id).await, Tick::Stop);
    assert_eq!(
        coordinator.backend().progress_calls.load(Ordering::SeqCst),
        0
    );
}

#[tokio::test]
async fn dropping_the_poller_aborts_the_task() {
    let mut coordinator = idle_coordinator();
    coordinator.submit(request()).await.unwrap();
    assert!(coordinator.is_polling());

    coordinator.cancel();
    assert!(!coordinator.is_polling());
    assert!(coordinator.poller.is_none());
}
