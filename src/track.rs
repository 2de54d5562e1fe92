//! Realtime job status tracking.
//!
//! The tracker consumes a push channel scoped to one job identifier and
//! converges the client-held [`Job`] record to a backend-authoritative
//! terminal state exactly once:
//!
//! ```text
//! Pending ──STARTED──▶ Pending (record refreshed)
//! Pending ──SUCCEEDED/FAILED──▶ terminal: on_complete, subscription released
//! ```
//!
//! Terminal states are sticky. Once the completion callback has fired the
//! subscription is dropped, so a late duplicate terminal message is never
//! reprocessed. Delivery errors are not retried here — a subscription that
//! never yields a terminal update simply leaves the tracker pending, with
//! [`TrackHandle::detach`] as the caller's escape hatch.

use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::job::Job;

/// A boxed stream of job records delivered by the push channel.
pub type JobStream = Pin<Box<dyn Stream<Item = Job> + Send>>;

/// The push-based change-notification channel, scoped per job.
///
/// The transport behind it (websocket, SSE, message bus) is an external
/// collaborator; dropping the returned stream releases the subscription.
pub trait JobFeed: Send + Sync {
    fn subscribe(&self, job_id: &str) -> JobStream;
}

/// Registered callbacks for one tracked job.
///
/// Held in an `Option` slot under a mutex: taking the slot is how both
/// terminal delivery and [`TrackHandle::detach`] end the tracker's life, and
/// callbacks are invoked while the slot's lock is held — `detach()` blocks
/// until an in-flight callback returns, so no callback fires after it does.
/// Calling `detach()` from inside a callback is not supported.
struct Callbacks {
    on_update: Box<dyn FnMut(&Job) + Send>,
    on_complete: Option<Box<dyn FnOnce(&Job) + Send>>,
}

/// Handle for one tracked job; created by [`track`].
pub struct TrackHandle {
    callbacks: Arc<Mutex<Option<Callbacks>>>,
    latest: Arc<Mutex<Option<Job>>>,
    task: tokio::task::JoinHandle<()>,
}

impl TrackHandle {
    /// Release the subscription before a terminal state is reached.
    ///
    /// Race-safe against an in-flight terminal delivery: after `detach()`
    /// returns, no callback fires, even for a message that was already
    /// queued. Safe to call repeatedly.
    pub fn detach(&self) {
        self.callbacks.lock().unwrap().take();
        self.task.abort();
        debug!("tracker detached");
    }

    /// The most recently delivered job record, if any update has arrived.
    pub fn latest(&self) -> Option<Job> {
        self.latest.lock().unwrap().clone()
    }

    /// True while the tracker is still subscribed (no terminal update seen,
    /// not detached).
    pub fn is_active(&self) -> bool {
        self.callbacks.lock().unwrap().is_some()
    }
}

/// Track a job through the push channel until it reaches a terminal state.
///
/// * `on_update` fires for every non-terminal refresh (`STARTED` while
///   already pending); the held record is updated each time.
/// * `on_complete` fires at most once, only for a terminal status, with the
///   final record; the subscription is released immediately afterwards.
pub fn track(
    feed: &dyn JobFeed,
    job_id: &str,
    on_update: impl FnMut(&Job) + Send + 'static,
    on_complete: impl FnOnce(&Job) + Send + 'static,
) -> TrackHandle {
    let mut stream = feed.subscribe(job_id);
    let callbacks = Arc::new(Mutex::new(Some(Callbacks {
        on_update: Box::new(on_update),
        on_complete: Some(Box::new(on_complete)),
    })));
    let latest = Arc::new(Mutex::new(None));

    let slot = Arc::clone(&callbacks);
    let latest_slot = Arc::clone(&latest);
    let id = job_id.to_string();

    let task = tokio::spawn(async move {
        while let Some(update) = stream.next().await {
            let mut guard = slot.lock().unwrap();
            let Some(hooks) = guard.as_mut() else {
                // Detached while this message was in flight.
                break;
            };

            *latest_slot.lock().unwrap() = Some(update.clone());

            if update.status.is_terminal() {
                let mut hooks = guard.take().expect("slot checked above");
                if let Some(complete) = hooks.on_complete.take() {
                    complete(&update);
                }
                debug!("job {} reached {:?}, releasing subscription", id, update.status);
                break;
            }

            (hooks.on_update)(&update);
        }
        // Dropping the stream releases the push subscription.
    });

    TrackHandle {
        callbacks,
        latest,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobStatus, TaskKind};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Duration};
    use tokio_stream::wrappers::ReceiverStream;

    fn update(status: JobStatus) -> Job {
        let now = Utc::now();
        Job {
            id: "job-1".into(),
            task: TaskKind::Analyze,
            status,
            result_url: matches!(status, JobStatus::Succeeded)
                .then(|| "https://results.example.com/job-1".to_string()),
            error: matches!(status, JobStatus::Failed).then(|| "executor crashed".to_string()),
            session_id: "sess-1".into(),
            owner_id: "user-1".into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Single-use feed backed by an mpsc channel.
    struct TestFeed {
        rx: Mutex<Option<mpsc::Receiver<Job>>>,
    }

    impl TestFeed {
        fn pair() -> (Self, mpsc::Sender<Job>) {
            let (tx, rx) = mpsc::channel(16);
            (
                Self {
                    rx: Mutex::new(Some(rx)),
                },
                tx,
            )
        }
    }

    impl JobFeed for TestFeed {
        fn subscribe(&self, _job_id: &str) -> JobStream {
            let rx = self.rx.lock().unwrap().take().expect("single subscription");
            Box::pin(ReceiverStream::new(rx))
        }
    }

    #[tokio::test]
    async fn completion_fires_exactly_once_despite_duplicate_terminal() {
        let (feed, tx) = TestFeed::pair();
        let updates = Arc::new(AtomicUsize::new(0));
        let completions = Arc::new(AtomicUsize::new(0));

        let u = Arc::clone(&updates);
        let c = Arc::clone(&completions);
        let handle = track(
            &feed,
            "job-1",
            move |_| {
                u.fetch_add(1, Ordering::SeqCst);
            },
            move |job| {
                assert_eq!(job.status, JobStatus::Succeeded);
                c.fetch_add(1, Ordering::SeqCst);
            },
        );

        // The tracker drops the subscription at the first terminal message,
        // so the trailing duplicate may find the channel already closed.
        let _ = tx.send(update(JobStatus::Started)).await;
        let _ = tx.send(update(JobStatus::Started)).await;
        let _ = tx.send(update(JobStatus::Succeeded)).await;
        let _ = tx.send(update(JobStatus::Succeeded)).await;
        sleep(Duration::from_millis(50)).await;

        assert_eq!(updates.load(Ordering::SeqCst), 2);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(!handle.is_active(), "terminal delivery releases the tracker");
        assert_eq!(
            handle.latest().unwrap().status,
            JobStatus::Succeeded,
            "held record converged to the terminal state"
        );
    }

    #[tokio::test]
    async fn failed_status_delivers_final_record() {
        let (feed, tx) = TestFeed::pair();
        let completions = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&completions);
        let _handle = track(
            &feed,
            "job-1",
            |_| {},
            move |job| {
                assert_eq!(job.status, JobStatus::Failed);
                assert_eq!(job.error.as_deref(), Some("executor crashed"));
                c.fetch_add(1, Ordering::SeqCst);
            },
        );

        tx.send(update(JobStatus::Failed)).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn detach_suppresses_all_callbacks() {
        let (feed, tx) = TestFeed::pair();
        let fired = Arc::new(AtomicUsize::new(0));

        let f1 = Arc::clone(&fired);
        let f2 = Arc::clone(&fired);
        let handle = track(
            &feed,
            "job-1",
            move |_| {
                f1.fetch_add(1, Ordering::SeqCst);
            },
            move |_| {
                f2.fetch_add(1, Ordering::SeqCst);
            },
        );

        handle.detach();
        // Terminal message arriving after detach must be ignored.
        tx.send(update(JobStatus::Succeeded)).await.ok();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!handle.is_active());
        // Repeated detach is harmless.
        handle.detach();
    }

    #[tokio::test]
    async fn pending_forever_is_tolerated() {
        let (feed, tx) = TestFeed::pair();
        let handle = track(&feed, "job-1", |_| {}, |_| {});

        sleep(Duration::from_millis(50)).await;
        assert!(handle.is_active(), "no terminal update, still subscribed");
        assert!(handle.latest().is_none());

        handle.detach();
        assert!(!handle.is_active());
        drop(tx);
    }
}
