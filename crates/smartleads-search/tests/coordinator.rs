//! Lifecycle tests for `SearchCoordinator` against an in-memory scripted
//! backend. Poll intervals are a few milliseconds so scenarios finish fast;
//! tests that need exact control use a one-hour interval and call `poll()`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use smartleads_core::{Category, CompanyCollection, CompanyRecord, SearchRequest};
use smartleads_search::{
    CoordinatorConfig, JobId, JobState, SearchBackend, SearchCoordinator, SearchError,
    TerminalCondition, FAILURE_SENTINEL,
};
use tokio::sync::Notify;

const FAST: Duration = Duration::from_millis(5);
const MANUAL: Duration = Duration::from_secs(3600);
const DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeError(String);

#[derive(Default)]
struct Calls {
    submit: AtomicU32,
    progress: AtomicU32,
    results: AtomicU32,
}

impl Calls {
    fn progress(&self) -> u32 {
        self.progress.load(Ordering::SeqCst)
    }
}

/// Replays a fixed list of progress responses, then reports connection
/// errors forever.
struct ScriptedBackend {
    reject_submit: bool,
    submit_gate: Option<Arc<Notify>>,
    results_gate: Option<Arc<Notify>>,
    progress: Mutex<VecDeque<Result<i32, String>>>,
    results: Result<Vec<CompanyRecord>, String>,
    calls: Arc<Calls>,
}

impl ScriptedBackend {
    fn new(progress: &[i32]) -> Self {
        Self::with_script(progress.iter().map(|p| Ok(*p)).collect())
    }

    fn with_script(script: Vec<Result<i32, String>>) -> Self {
        Self {
            reject_submit: false,
            submit_gate: None,
            results_gate: None,
            progress: Mutex::new(script.into()),
            results: Ok(sample_records()),
            calls: Arc::new(Calls::default()),
        }
    }
}

impl SearchBackend for ScriptedBackend {
    type Error = FakeError;

    async fn submit(&self, _request: &SearchRequest) -> Result<JobId, Self::Error> {
        let n = self.calls.submit.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        if self.reject_submit {
            return Err(FakeError("503 Service Unavailable".to_string()));
        }
        Ok(JobId::new(format!("job-{n}")))
    }

    async fn progress(&self, _job_id: &JobId) -> Result<i32, Self::Error> {
        self.calls.progress.fetch_add(1, Ordering::SeqCst);
        let next = self.progress.lock().unwrap().pop_front();
        match next {
            Some(Ok(p)) => Ok(p),
            Some(Err(e)) => Err(FakeError(e)),
            None => Err(FakeError("connection refused".to_string())),
        }
    }

    async fn results(&self) -> Result<CompanyCollection, Self::Error> {
        self.calls.results.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.results_gate {
            gate.notified().await;
        }
        match &self.results {
            Ok(records) => Ok(records.iter().cloned().collect()),
            Err(e) => Err(FakeError(e.clone())),
        }
    }
}

fn sample_records() -> Vec<CompanyRecord> {
    vec![
        CompanyRecord {
            id: "osm-1".to_string(),
            name: "La Marchigiana".to_string(),
            category: "restaurantes".to_string(),
            address: "Patricias Mendocinas 1550".to_string(),
            website: Some("https://marchigiana.example".to_string()),
            email: Some("info@marchigiana.example".to_string()),
            phone: None,
            validated: true,
        },
        CompanyRecord {
            id: "osm-2".to_string(),
            name: "Azafrán".to_string(),
            category: "restaurantes".to_string(),
            address: "Sarmiento 765".to_string(),
            website: None,
            email: None,
            phone: Some("+54 261 429 4200".to_string()),
            validated: false,
        },
    ]
}

fn mendoza() -> SearchRequest {
    SearchRequest::near_place(Category::Restaurantes, "Mendoza", 10)
}

fn coordinator(
    backend: ScriptedBackend,
    interval: Duration,
    max_errors: Option<u32>,
) -> (SearchCoordinator<ScriptedBackend>, Arc<Calls>) {
    let calls = Arc::clone(&backend.calls);
    let config = CoordinatorConfig {
        poll_interval: interval,
        max_consecutive_poll_errors: max_errors,
    };
    (SearchCoordinator::new(backend, config), calls)
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn valid_submit_moves_through_submitting_to_polling() {
    let gate = Arc::new(Notify::new());
    let mut backend = ScriptedBackend::new(&[]);
    backend.submit_gate = Some(Arc::clone(&gate));
    let (mut coordinator, _calls) = coordinator(backend, MANUAL, None);

    assert_eq!(coordinator.snapshot().state, JobState::Idle);
    let mut rx = coordinator.subscribe();

    let observer = async {
        rx.wait_for(|s| s.state == JobState::Submitting)
            .await
            .expect("coordinator alive");
        gate.notify_one();
    };
    let (handle, ()) = tokio::join!(coordinator.submit(mendoza()), observer);

    let handle = handle.expect("valid request should be accepted");
    assert_eq!(handle.job_id().as_str(), "job-1");
    let status = coordinator.status();
    assert_eq!(status.state, JobState::Polling);
    assert_eq!(status.progress, 0);
    assert_eq!(status.job_id, Some(JobId::new("job-1")));
    assert_eq!(status.request, Some(mendoza()));
    assert!(coordinator.is_polling());
}

#[tokio::test]
async fn invalid_requests_never_reach_the_backend() {
    let (mut coordinator, calls) = coordinator(ScriptedBackend::new(&[]), MANUAL, None);

    let too_wide = SearchRequest::near_place(Category::Hoteles, "Mendoza", 51);
    let no_location = SearchRequest {
        category: Category::Hoteles,
        location: None,
        coordinates: None,
        radius_km: 5,
    };
    let mut both = SearchRequest::near_point(Category::Hoteles, -32.9, -68.8, 5);
    both.location = Some("Mendoza".to_string());

    for request in [too_wide, no_location, both] {
        let err = coordinator.submit(request).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidRequest(_)), "got {err:?}");
    }

    assert_eq!(calls.submit.load(Ordering::SeqCst), 0);
    assert_eq!(coordinator.snapshot().state, JobState::Idle);
}

#[tokio::test]
async fn rejected_submission_fails_the_slot() {
    let mut backend = ScriptedBackend::new(&[]);
    backend.reject_submit = true;
    let (mut coordinator, calls) = coordinator(backend, FAST, None);

    let err = coordinator.submit(mendoza()).await.unwrap_err();
    assert!(matches!(err, SearchError::Submission { .. }), "got {err:?}");
    assert!(err.to_string().contains("503"));

    let status = coordinator.status();
    assert_eq!(status.state, JobState::Failed);
    assert!(matches!(
        status.condition,
        Some(TerminalCondition::SubmissionFailed { .. })
    ));
    assert!(!coordinator.is_polling());

    tokio::time::sleep(FAST * 10).await;
    assert_eq!(calls.progress(), 0);
}

// ---------------------------------------------------------------------------
// Polling scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completed_job_exposes_results() {
    let (mut coordinator, calls) = coordinator(ScriptedBackend::new(&[0, 10, 40, 70, 100]), FAST, None);

    let mut rx = coordinator.subscribe();
    let watcher = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().clone();
            if status.job_id.is_some() {
                seen.push(status.progress);
            }
            if status.condition.is_some() {
                break;
            }
        }
        seen
    });

    let handle = coordinator.submit(mendoza()).await.unwrap();
    let results = tokio::time::timeout(DEADLINE, handle.finished())
        .await
        .expect("job should finish")
        .expect("job should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results.as_slice()[0].name, "La Marchigiana");
    assert_eq!(coordinator.snapshot().state, JobState::Completed);
    assert_eq!(coordinator.snapshot().progress, 100);
    assert_eq!(coordinator.snapshot().label, "search complete");
    assert_eq!(coordinator.results().len(), 2);
    assert_eq!(calls.progress(), 5);
    assert_eq!(calls.results.load(Ordering::SeqCst), 1);

    let seen = tokio::time::timeout(DEADLINE, watcher).await.unwrap().unwrap();
    assert!(
        seen.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {seen:?}"
    );
}

#[tokio::test]
async fn failure_sentinel_stops_polling() {
    let (mut coordinator, calls) = coordinator(ScriptedBackend::new(&[0, 20, -1, 50, 100]), FAST, None);

    let handle = coordinator.submit(mendoza()).await.unwrap();
    let job_id = handle.job_id().clone();
    let err = tokio::time::timeout(DEADLINE, handle.finished())
        .await
        .expect("job should finish")
        .unwrap_err();

    assert!(matches!(err, SearchError::JobFailed { job_id: ref id } if *id == job_id));
    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.state, JobState::Failed);
    assert_eq!(snapshot.progress, FAILURE_SENTINEL);
    assert_eq!(snapshot.label, "search failed");

    tokio::time::sleep(FAST * 10).await;
    assert_eq!(calls.progress(), 3, "no backend calls after the sentinel");
    assert_eq!(calls.results.load(Ordering::SeqCst), 0);
    assert!(!coordinator.is_polling());
}

#[tokio::test]
async fn transient_errors_do_not_change_state() {
    let script = vec![
        Err("timeout".to_string()),
        Ok(30),
        Err("connection reset".to_string()),
        Ok(100),
    ];
    let (mut coordinator, calls) = coordinator(ScriptedBackend::with_script(script), MANUAL, None);
    coordinator.submit(mendoza()).await.unwrap();

    let snapshot = coordinator.poll().await;
    assert_eq!(snapshot.state, JobState::Polling);
    assert_eq!(snapshot.progress, 0);
    assert_eq!(coordinator.status().transient_errors, 1);

    assert_eq!(coordinator.poll().await.progress, 30);
    assert_eq!(coordinator.status().transient_errors, 0);

    let snapshot = coordinator.poll().await;
    assert_eq!(snapshot.state, JobState::Polling);
    assert_eq!(snapshot.progress, 30);

    let snapshot = coordinator.poll().await;
    assert_eq!(snapshot.state, JobState::Completed);
    assert_eq!(calls.progress(), 4);
    assert!(matches!(
        coordinator.status().condition,
        Some(TerminalCondition::Succeeded { count: 2 })
    ));
}

#[tokio::test]
async fn progress_never_moves_backwards() {
    let (mut coordinator, _calls) = coordinator(ScriptedBackend::new(&[40, 20, 60]), MANUAL, None);
    coordinator.submit(mendoza()).await.unwrap();

    assert_eq!(coordinator.poll().await.progress, 40);
    assert_eq!(coordinator.poll().await.progress, 40);
    assert_eq!(coordinator.poll().await.progress, 60);
}

#[tokio::test]
async fn out_of_range_progress_is_treated_as_transient() {
    let (mut coordinator, _calls) = coordinator(ScriptedBackend::new(&[150, -7, 10]), MANUAL, None);
    coordinator.submit(mendoza()).await.unwrap();

    assert_eq!(coordinator.poll().await.progress, 0);
    assert_eq!(coordinator.poll().await.progress, 0);
    assert_eq!(coordinator.status().transient_errors, 2);
    assert_eq!(coordinator.poll().await.progress, 10);
    assert_eq!(coordinator.snapshot().state, JobState::Polling);
}

#[tokio::test]
async fn poll_without_a_job_does_not_call_backend() {
    let (coordinator, calls) = coordinator(ScriptedBackend::new(&[10]), MANUAL, None);
    let snapshot = coordinator.poll().await;
    assert_eq!(snapshot.state, JobState::Idle);
    assert_eq!(calls.progress(), 0);
}

#[tokio::test]
async fn result_fetch_failure_is_reported() {
    let mut backend = ScriptedBackend::new(&[50, 100]);
    backend.results = Err("500 Internal Server Error".to_string());
    let (mut coordinator, _calls) = coordinator(backend, FAST, None);

    let handle = coordinator.submit(mendoza()).await.unwrap();
    let err = tokio::time::timeout(DEADLINE, handle.finished())
        .await
        .expect("job should finish")
        .unwrap_err();

    assert!(matches!(err, SearchError::ResultFetch { ref reason, .. } if reason.contains("500")));
    assert_eq!(coordinator.snapshot().state, JobState::Completed);
    assert!(coordinator.results().is_empty());
}

#[tokio::test]
async fn error_budget_abandons_the_job() {
    let (mut coordinator, calls) = coordinator(ScriptedBackend::new(&[10]), FAST, Some(3));

    let handle = coordinator.submit(mendoza()).await.unwrap();
    let err = tokio::time::timeout(DEADLINE, handle.finished())
        .await
        .expect("job should finish")
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::PollingAbandoned {
            consecutive_errors: 3,
            ..
        }
    ));
    assert_eq!(coordinator.snapshot().state, JobState::Failed);
    assert_eq!(coordinator.snapshot().progress, 10);

    tokio::time::sleep(FAST * 10).await;
    assert_eq!(calls.progress(), 4);
}

// ---------------------------------------------------------------------------
// Cancellation and replacement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancel_is_idempotent_and_stops_polling() {
    let (mut coordinator, calls) = coordinator(ScriptedBackend::new(&[10, 20, 30]), FAST, None);
    let handle = coordinator.submit(mendoza()).await.unwrap();

    let mut rx = coordinator.subscribe();
    tokio::time::timeout(DEADLINE, rx.wait_for(|s| s.progress >= 10))
        .await
        .expect("some progress should arrive")
        .unwrap();

    coordinator.cancel();
    let after_first = coordinator.status();
    let calls_after_first = calls.progress();

    coordinator.cancel();
    assert_eq!(coordinator.status(), after_first);
    assert!(after_first.cancelled);
    assert_eq!(after_first.state, JobState::Polling);
    assert!(after_first.progress >= 10);

    tokio::time::sleep(FAST * 10).await;
    assert_eq!(calls.progress(), calls_after_first);
    assert!(!coordinator.is_polling());

    let err = handle.finished().await.unwrap_err();
    assert!(matches!(err, SearchError::Cancelled { .. }), "got {err:?}");

    // A cancelled job cannot be advanced by hand either.
    coordinator.poll().await;
    assert_eq!(calls.progress(), calls_after_first);
}

#[tokio::test]
async fn cancel_during_result_fetch_resolves_the_handle() {
    let gate = Arc::new(Notify::new());
    let mut backend = ScriptedBackend::new(&[100]);
    backend.results_gate = Some(Arc::clone(&gate));
    let (mut coordinator, calls) = coordinator(backend, FAST, None);
    let handle = coordinator.submit(mendoza()).await.unwrap();

    let mut rx = coordinator.subscribe();
    tokio::time::timeout(DEADLINE, rx.wait_for(|s| s.state == JobState::Completed))
        .await
        .expect("job should complete")
        .unwrap();
    while calls.results.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    coordinator.cancel();
    gate.notify_one();

    let err = tokio::time::timeout(DEADLINE, handle.finished())
        .await
        .expect("handle should resolve after cancel")
        .unwrap_err();
    assert!(matches!(err, SearchError::Cancelled { .. }), "got {err:?}");

    let status = coordinator.status();
    assert_eq!(status.state, JobState::Completed);
    assert!(status.cancelled);
    assert_eq!(status.condition, None);
    assert!(coordinator.results().is_empty());

    coordinator.cancel();
    assert_eq!(coordinator.status(), status);
}

#[tokio::test]
async fn new_submit_supersedes_the_previous_job() {
    let (mut coordinator, calls) = coordinator(ScriptedBackend::new(&[10, 50, 100]), MANUAL, None);

    let first = coordinator.submit(mendoza()).await.unwrap();
    assert_eq!(coordinator.poll().await.progress, 10);

    let second_request = SearchRequest::near_point(Category::Hoteles, -32.89, -68.83, 20);
    let second = coordinator.submit(second_request.clone()).await.unwrap();
    assert_ne!(first.job_id(), second.job_id());
    assert!(first.status().is_none());

    let status = coordinator.status();
    assert_eq!(status.progress, 0, "progress resets for the new job");
    assert_eq!(status.request, Some(second_request));

    let err = first.finished().await.unwrap_err();
    assert!(matches!(err, SearchError::Superseded { .. }), "got {err:?}");

    coordinator.poll().await;
    coordinator.poll().await;
    let results = second.finished().await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(calls.submit.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dropping_the_coordinator_stops_polling() {
    let (mut coordinator, calls) = coordinator(ScriptedBackend::new(&[]), FAST, None);
    let handle = coordinator.submit(mendoza()).await.unwrap();
    tokio::time::sleep(FAST * 4).await;

    drop(coordinator);
    tokio::time::sleep(FAST * 2).await;
    let after_drop = calls.progress();
    tokio::time::sleep(FAST * 10).await;
    assert_eq!(calls.progress(), after_drop);

    let err = tokio::time::timeout(DEADLINE, handle.finished())
        .await
        .expect("handle should resolve once the coordinator is gone")
        .unwrap_err();
    assert!(matches!(err, SearchError::Cancelled { .. }), "got {err:?}");
}
