//! Behaviour of the four admission operations on a paused tokio clock.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;

use slotvisor::{
    Admission, Admitted, BoxWorkFuture, Event, EventKind, RuntimeError, Scheduler,
    SchedulerConfig, Subscribe, SubmitError, TaskError, Work,
};

const KEY: &str = "key";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn scheduler() -> Scheduler<&'static str> {
    Scheduler::new(SchedulerConfig::default())
}

/// Work stand-in that records when it started and whether it ran to the end.
///
/// The body stops as soon as its token fires.
#[derive(Default)]
struct Job {
    started: AtomicBool,
    completed: AtomicBool,
    started_at: Mutex<Option<Instant>>,
    completed_at: Mutex<Option<Instant>>,
}

impl Job {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn work(
        self: &Arc<Self>,
        duration: Duration,
    ) -> impl FnOnce(CancellationToken) -> BoxWorkFuture + Send + 'static {
        let job = Arc::clone(self);
        move |ctx: CancellationToken| {
            let fut: BoxWorkFuture = Box::pin(async move {
                job.started.store(true, Ordering::SeqCst);
                *job.started_at.lock().unwrap() = Some(Instant::now());
                tokio::select! {
                    _ = ctx.cancelled() => return Err(TaskError::Canceled),
                    _ = sleep(duration) => {}
                }
                job.completed.store(true, Ordering::SeqCst);
                *job.completed_at.lock().unwrap() = Some(Instant::now());
                Ok(())
            });
            fut
        }
    }

    fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    fn started_at(&self) -> Option<Instant> {
        *self.started_at.lock().unwrap()
    }

    fn completed_at(&self) -> Option<Instant> {
        *self.completed_at.lock().unwrap()
    }
}

fn assert_near(actual: Duration, expected: Duration) {
    let tolerance = ms(5);
    assert!(
        actual >= expected && actual <= expected + tolerance,
        "expected ~{expected:?}, got {actual:?}"
    );
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

#[tokio::test(start_paused = true)]
async fn run_if_not_running_starts_when_key_is_free() {
    let s = scheduler();
    let t0 = Instant::now();
    let op1 = Job::new();
    let op2 = Job::new();

    let admitted = s.run_if_not_running("a", op1.work(ms(1000))).await.unwrap();
    assert_eq!(admitted, Admitted::Started);

    sleep_until(t0 + ms(500)).await;
    let admitted = s.run_if_not_running("b", op2.work(ms(0))).await.unwrap();
    assert_eq!(admitted, Admitted::Started);

    sleep_until(t0 + ms(510)).await;
    assert!(op1.started());
    assert!(!op1.completed());
    assert!(op2.completed());

    sleep_until(t0 + ms(1010)).await;
    assert!(op1.completed());
    assert!(s.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn run_if_not_running_starts_before_next_scheduling_point() {
    let s = scheduler();
    let op = Job::new();

    let _ = s.run_if_not_running(KEY, op.work(ms(100))).await.unwrap();
    tokio::task::yield_now().await;
    assert!(op.started());
}

#[tokio::test(start_paused = true)]
async fn run_if_not_running_discards_while_active() {
    let s = scheduler();
    let t0 = Instant::now();
    let op1 = Job::new();
    let op2 = Job::new();

    let _ = s.run_if_not_running(KEY, op1.work(ms(1000))).await.unwrap();
    sleep_until(t0 + ms(500)).await;
    let admitted = s.run_if_not_running(KEY, op2.work(ms(0))).await.unwrap();
    assert_eq!(admitted, Admitted::Discarded);

    sleep_until(t0 + ms(510)).await;
    assert!(!op1.completed());
    assert!(!op2.started());

    sleep_until(t0 + ms(2000)).await;
    assert!(op1.completed());
    assert!(!op2.started());
}

#[tokio::test(start_paused = true)]
async fn each_run_operation_is_cancellable() {
    for admission in [
        Admission::RunIfNotRunning,
        Admission::RunAfterCurrent,
        Admission::CancelCurrentThenRun,
    ] {
        let s = scheduler();
        let op = Job::new();

        let _ = s.submit(KEY, admission, op.work(ms(1000))).await.unwrap();
        sleep(ms(100)).await;
        assert!(op.started());

        assert!(s.cancel(&KEY).await);
        sleep(ms(2000)).await;
        assert!(!op.completed(), "{admission:?} ran to completion");
        assert!(!s.contains_key(&KEY).await);
    }
}

#[tokio::test(start_paused = true)]
async fn run_after_current_starts_when_key_is_free() {
    let s = scheduler();
    let op = Job::new();

    let admitted = s.run_after_current(KEY, op.work(ms(10))).await.unwrap();
    assert_eq!(admitted, Admitted::Started);
    sleep(ms(20)).await;
    assert!(op.completed());
}

#[tokio::test(start_paused = true)]
async fn run_after_current_waits_for_active_task() {
    let s = scheduler();
    let t0 = Instant::now();
    let op1 = Job::new();
    let op2 = Job::new();

    let _ = s.run_after_current(KEY, op1.work(ms(1000))).await.unwrap();
    sleep_until(t0 + ms(500)).await;
    let admitted = s.run_after_current(KEY, op2.work(ms(500))).await.unwrap();
    assert_eq!(admitted, Admitted::Queued);
    assert!(s.has_pending(&KEY).await);

    sleep_until(t0 + ms(510)).await;
    assert!(!op1.completed());
    assert!(!op2.started());

    sleep_until(t0 + ms(1010)).await;
    assert!(op1.completed());
    assert!(op2.started());
    assert!(!op2.completed());
    assert!(op2.started_at().unwrap() >= op1.completed_at().unwrap());

    sleep_until(t0 + ms(1520)).await;
    assert!(op2.completed());
    assert!(!s.contains_key(&KEY).await);
}

#[tokio::test(start_paused = true)]
async fn run_after_current_keeps_only_latest_pending() {
    let s = scheduler();
    let t0 = Instant::now();
    let op1 = Job::new();
    let op2 = Job::new();
    let op3 = Job::new();

    let _ = s.run_after_current(KEY, op1.work(ms(1000))).await.unwrap();
    sleep_until(t0 + ms(100)).await;
    let _ = s.run_after_current(KEY, op2.work(ms(500))).await.unwrap();
    sleep_until(t0 + ms(200)).await;
    let _ = s.run_after_current(KEY, op3.work(ms(500))).await.unwrap();

    sleep_until(t0 + ms(1050)).await;
    assert!(op1.completed());
    assert!(!op2.started());
    assert!(op3.started());
    assert!(!op3.completed());

    sleep_until(t0 + ms(1550)).await;
    assert!(op3.completed());

    sleep_until(t0 + ms(2100)).await;
    assert!(!op2.started());
}

#[tokio::test(start_paused = true)]
async fn cancel_current_then_run_starts_when_key_is_free() {
    let s = scheduler();
    let t0 = Instant::now();
    let op1 = Job::new();
    let op2 = Job::new();

    let _ = s.cancel_current_then_run("a", op1.work(ms(1000))).await.unwrap();
    sleep_until(t0 + ms(500)).await;
    let admitted = s.cancel_current_then_run("b", op2.work(ms(0))).await.unwrap();
    assert_eq!(admitted, Admitted::Started);

    sleep_until(t0 + ms(510)).await;
    assert!(!op1.completed());
    assert!(op2.completed());

    sleep_until(t0 + ms(1010)).await;
    assert!(op1.completed());
}

#[tokio::test(start_paused = true)]
async fn cancel_current_then_run_preempts_active_task() {
    let s = scheduler();
    let t0 = Instant::now();
    let op1 = Job::new();
    let op2 = Job::new();

    let _ = s.cancel_current_then_run(KEY, op1.work(ms(1000))).await.unwrap();
    sleep_until(t0 + ms(500)).await;
    let admitted = s.cancel_current_then_run(KEY, op2.work(ms(500))).await.unwrap();
    assert_eq!(admitted, Admitted::Preempted);

    sleep_until(t0 + ms(510)).await;
    assert!(op2.started());
    assert!(!op1.completed());
    assert!(!op2.completed());

    sleep_until(t0 + ms(1010)).await;
    assert!(!op1.completed());
    assert!(op2.completed());

    sleep_until(t0 + ms(3000)).await;
    assert!(!op1.completed());
    assert!(s.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn cancel_clears_active_and_pending() {
    let s = scheduler();
    let t0 = Instant::now();
    let op1 = Job::new();
    let op2 = Job::new();
    let op3 = Job::new();

    let _ = s.run_if_not_running(KEY, op1.work(ms(1000))).await.unwrap();
    sleep_until(t0 + ms(100)).await;
    let _ = s.run_after_current(KEY, op2.work(ms(500))).await.unwrap();
    assert!(op1.started());
    assert!(!op2.started());

    sleep_until(t0 + ms(200)).await;
    assert!(s.cancel(&KEY).await);
    assert!(!s.contains_key(&KEY).await);

    // Slot fully cleared: the next submission starts at once.
    let admitted = s.run_if_not_running(KEY, op3.work(ms(100))).await.unwrap();
    assert_eq!(admitted, Admitted::Started);

    sleep_until(t0 + ms(3000)).await;
    assert!(!op1.completed());
    assert!(!op2.started());
    assert!(op3.completed());
}

#[tokio::test(start_paused = true)]
async fn cancel_on_unknown_key_is_noop() {
    let s = scheduler();
    assert!(!s.cancel(&KEY).await);
    assert!(s.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn queue_then_preempt_before_anything_completes() {
    let s = scheduler();
    let t0 = Instant::now();
    let op1 = Job::new();
    let op2 = Job::new();
    let op3 = Job::new();

    let _ = s.run_if_not_running(KEY, op1.work(ms(1000))).await.unwrap();
    sleep_until(t0 + ms(100)).await;
    let _ = s.run_after_current(KEY, op2.work(ms(1000))).await.unwrap();
    sleep_until(t0 + ms(200)).await;
    let admitted = s.cancel_current_then_run(KEY, op3.work(ms(500))).await.unwrap();
    assert_eq!(admitted, Admitted::Preempted);

    sleep_until(t0 + ms(3000)).await;
    assert!(op1.started());
    assert!(!op1.completed());
    assert!(!op2.started());
    assert!(op3.completed());

    assert_near(op3.started_at().unwrap() - t0, ms(200));
    assert_near(op3.completed_at().unwrap() - t0, ms(700));
    assert!(s.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn preempt_promoted_successor() {
    let s = scheduler();
    let t0 = Instant::now();
    let op1 = Job::new();
    let op2 = Job::new();
    let op3 = Job::new();

    let _ = s.run_if_not_running(KEY, op1.work(ms(1000))).await.unwrap();
    sleep_until(t0 + ms(100)).await;
    let _ = s.run_after_current(KEY, op2.work(ms(500))).await.unwrap();

    sleep_until(t0 + ms(1050)).await;
    assert!(op1.completed());
    assert!(op2.started());
    assert!(!op3.started());

    sleep_until(t0 + ms(1200)).await;
    let admitted = s.cancel_current_then_run(KEY, op3.work(ms(500))).await.unwrap();
    assert_eq!(admitted, Admitted::Preempted);

    sleep_until(t0 + ms(3000)).await;
    assert!(!op2.completed());
    assert!(op3.completed());
}

#[tokio::test(start_paused = true)]
async fn finished_key_leaves_no_entry() {
    let s = scheduler();
    let op1 = Job::new();
    let op2 = Job::new();

    let _ = s.run_after_current(KEY, op1.work(ms(10))).await.unwrap();
    let _ = s.run_after_current(KEY, op2.work(ms(10))).await.unwrap();
    assert_eq!(s.keys().await, vec![KEY]);

    sleep(ms(100)).await;
    assert!(op2.completed());
    assert!(!s.contains_key(&KEY).await);
    assert_eq!(s.len().await, 0);

    let op3 = Job::new();
    let admitted = s.run_if_not_running(KEY, op3.work(ms(10))).await.unwrap();
    assert_eq!(admitted, Admitted::Started);
}

#[tokio::test(start_paused = true)]
async fn failing_work_still_promotes_pending() {
    let s = scheduler();
    let mut rx = s.subscribe();
    let next = Job::new();

    let _ = s
        .run_if_not_running(KEY, |_ctx: CancellationToken| async move {
            sleep(ms(50)).await;
            Err::<(), TaskError>(TaskError::fail("boom"))
        })
        .await
        .unwrap();
    let _ = s.run_after_current(KEY, next.work(ms(50))).await.unwrap();

    sleep(ms(200)).await;
    assert!(next.completed());
    assert!(s.is_empty().await);

    let events = drain(&mut rx);
    let failed = events
        .iter()
        .find(|e| e.kind == EventKind::TaskFailed)
        .expect("TaskFailed published");
    assert_eq!(failed.reason.as_deref(), Some("execution failed: boom"));
    assert!(events.iter().any(|e| e.kind == EventKind::PendingPromoted));
}

#[tokio::test(start_paused = true)]
async fn panicking_work_still_promotes_pending() {
    let s = scheduler();
    let mut rx = s.subscribe();
    let next = Job::new();

    let _ = s
        .run_if_not_running(KEY, |_ctx: CancellationToken| async move {
            sleep(ms(50)).await;
            if true {
                panic!("work exploded");
            }
            Ok::<(), TaskError>(())
        })
        .await
        .unwrap();
    let _ = s.run_after_current(KEY, next.work(ms(50))).await.unwrap();

    sleep(ms(200)).await;
    assert!(next.completed());
    assert!(s.is_empty().await);

    let events = drain(&mut rx);
    let panicked = events
        .iter()
        .find(|e| e.kind == EventKind::TaskPanicked)
        .expect("TaskPanicked published");
    assert_eq!(panicked.reason.as_deref(), Some("work exploded"));
}

#[tokio::test(start_paused = true)]
async fn work_reporting_cancellation_is_not_a_failure() {
    let s = scheduler();
    let mut rx = s.subscribe();

    let _ = s
        .run_if_not_running(KEY, |_ctx: CancellationToken| async move {
            Err::<(), TaskError>(TaskError::Canceled)
        })
        .await
        .unwrap();
    sleep(ms(10)).await;

    let events = kinds(&drain(&mut rx));
    assert!(events.contains(&EventKind::TaskCancelled));
    assert!(!events.contains(&EventKind::TaskFailed));
    assert!(s.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn work_can_resubmit_without_deadlock() {
    let s = scheduler();
    let follow_up = Job::new();
    let sibling = Job::new();
    let queued = Arc::new(AtomicBool::new(false));

    let (s2, f2, sib2, q2) = (
        s.clone(),
        Arc::clone(&follow_up),
        Arc::clone(&sibling),
        Arc::clone(&queued),
    );
    let _ = s
        .run_if_not_running(KEY, move |_ctx: CancellationToken| async move {
            let admitted = s2
                .run_after_current(KEY, f2.work(ms(10)))
                .await
                .map_err(|e| TaskError::fail(e.to_string()))?;
            q2.store(admitted == Admitted::Queued, Ordering::SeqCst);
            let _ = s2
                .run_if_not_running("sibling", sib2.work(ms(10)))
                .await
                .map_err(|e| TaskError::fail(e.to_string()))?;
            sleep(ms(10)).await;
            Ok::<(), TaskError>(())
        })
        .await
        .unwrap();

    sleep(ms(100)).await;
    assert!(queued.load(Ordering::SeqCst));
    assert!(follow_up.completed());
    assert!(sibling.completed());
    assert!(s.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn admission_and_lifecycle_events_are_ordered() {
    let s = scheduler();
    let mut rx = s.subscribe();
    let t0 = Instant::now();
    let (op1, op2, op3) = (Job::new(), Job::new(), Job::new());

    let _ = s.run_after_current(KEY, op1.work(ms(100))).await.unwrap();
    let _ = s.run_after_current(KEY, op2.work(ms(100))).await.unwrap();
    let _ = s.run_after_current(KEY, op3.work(ms(100))).await.unwrap();
    let _ = s.run_if_not_running(KEY, Job::new().work(ms(100))).await.unwrap();
    sleep_until(t0 + ms(500)).await;

    let events = drain(&mut rx);
    assert_eq!(
        kinds(&events),
        vec![
            EventKind::TaskStarted,
            EventKind::TaskQueued,
            EventKind::TaskSuperseded,
            EventKind::TaskQueued,
            EventKind::TaskDiscarded,
            EventKind::TaskCompleted,
            EventKind::PendingPromoted,
            EventKind::TaskStarted,
            EventKind::TaskCompleted,
            EventKind::SlotCleared,
        ]
    );
    assert!(events.iter().all(|e| e.key.as_deref() == Some("\"key\"")));
    assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));
    assert_eq!(events[0].admission, Some(Admission::RunAfterCurrent));
    assert_eq!(events[2].reason.as_deref(), Some("replaced"));
    assert_eq!(events[1].task_id, events[2].task_id);
    assert_eq!(events[3].task_id, events[6].task_id);
}

#[tokio::test(start_paused = true)]
async fn cancel_all_clears_every_key() {
    let s = scheduler();
    let jobs: Vec<_> = (0..3).map(|_| Job::new()).collect();

    for (key, job) in ["a", "b", "c"].into_iter().zip(&jobs) {
        let _ = s.run_if_not_running(key, job.work(ms(1000))).await.unwrap();
    }
    assert_eq!(s.len().await, 3);

    assert_eq!(s.cancel_all().await, 3);
    assert!(s.is_empty().await);

    sleep(ms(2000)).await;
    assert!(jobs.iter().all(|p| !p.completed()));

    // Still open for business.
    let admitted = s.run_if_not_running("a", Job::new().work(ms(1))).await.unwrap();
    assert_eq!(admitted, Admitted::Started);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_and_closes() {
    let s = scheduler();
    let mut rx = s.subscribe();
    let op = Job::new();

    let _ = s.run_if_not_running(KEY, op.work(ms(1000))).await.unwrap();
    sleep(ms(10)).await;

    s.shutdown().await.unwrap();
    assert!(!op.completed());
    assert!(s.is_empty().await);

    let err = s
        .run_if_not_running(KEY, Job::new().work(ms(1)))
        .await
        .unwrap_err();
    assert_eq!(err, SubmitError::Closed);

    let events = kinds(&drain(&mut rx));
    assert!(events.contains(&EventKind::ShutdownRequested));
    assert!(events.contains(&EventKind::TaskCancelled));
    assert_eq!(events.last(), Some(&EventKind::AllStoppedWithin));
}

#[tokio::test(start_paused = true)]
async fn shutdown_without_grace_reports_unwinding_tasks() {
    let s: Scheduler<&'static str> = Scheduler::new(SchedulerConfig {
        grace: Duration::ZERO,
        ..SchedulerConfig::default()
    });
    let _ = s.run_if_not_running(KEY, Job::new().work(ms(1000))).await.unwrap();

    match s.shutdown().await {
        Err(RuntimeError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, 1),
        other => panic!("expected GraceExceeded, got {other:?}"),
    }
}

struct Refresh {
    ran: Arc<AtomicBool>,
}

impl Work for Refresh {
    fn run(self: Box<Self>, _ctx: CancellationToken) -> BoxWorkFuture {
        Box::pin(async move {
            self.ran.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[tokio::test(start_paused = true)]
async fn submit_accepts_custom_work_types() {
    let s = scheduler();
    let ran = Arc::new(AtomicBool::new(false));

    let admitted = s
        .submit(
            KEY,
            Admission::CancelCurrentThenRun,
            Refresh {
                ran: Arc::clone(&ran),
            },
        )
        .await
        .unwrap();
    assert_eq!(admitted, Admitted::Started);

    sleep(ms(10)).await;
    assert!(ran.load(Ordering::SeqCst));
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.seen.lock().unwrap().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(start_paused = true)]
async fn subscribers_receive_events() {
    let recorder = Arc::new(Recorder::default());
    let s: Scheduler<u32> = Scheduler::builder(SchedulerConfig::default())
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .build();

    let _ = s.run_if_not_running(7, Job::new().work(ms(10))).await.unwrap();
    sleep(ms(100)).await;

    let seen = recorder.seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            EventKind::TaskStarted,
            EventKind::TaskCompleted,
            EventKind::SlotCleared,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_body_observes_token_and_cleans_up() {
    let s = scheduler();
    let mut rx = s.subscribe();
    let observed = Arc::new(AtomicBool::new(false));
    let cleaned = Arc::new(AtomicBool::new(false));

    let (o, c) = (Arc::clone(&observed), Arc::clone(&cleaned));
    let _ = s
        .run_if_not_running(KEY, move |ctx: CancellationToken| async move {
            tokio::select! {
                _ = ctx.cancelled() => {
                    o.store(true, Ordering::SeqCst);
                    sleep(ms(50)).await;
                    c.store(true, Ordering::SeqCst);
                    Err(TaskError::Canceled)
                }
                _ = sleep(ms(10_000)) => Ok(()),
            }
        })
        .await
        .unwrap();
    sleep(ms(10)).await;

    assert!(s.cancel(&KEY).await);
    sleep(ms(20)).await;
    assert!(observed.load(Ordering::SeqCst));
    assert!(!cleaned.load(Ordering::SeqCst));

    sleep(ms(500)).await;
    assert!(cleaned.load(Ordering::SeqCst));
    let events = kinds(&drain(&mut rx));
    assert!(events.contains(&EventKind::TaskCancelled));
    assert!(!events.contains(&EventKind::TaskCompleted));
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_cleanup_within_grace() {
    let s = scheduler();
    let cleaned = Arc::new(AtomicBool::new(false));

    let c = Arc::clone(&cleaned);
    let _ = s
        .run_if_not_running(KEY, move |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            sleep(ms(200)).await;
            c.store(true, Ordering::SeqCst);
            Err::<(), TaskError>(TaskError::Canceled)
        })
        .await
        .unwrap();
    sleep(ms(10)).await;

    s.shutdown().await.unwrap();
    assert!(cleaned.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn result_after_cancellation_is_reported_as_cancelled() {
    let s = scheduler();
    let mut rx = s.subscribe();

    let _ = s
        .run_if_not_running(KEY, |_ctx: CancellationToken| async move {
            sleep(ms(100)).await;
            Ok::<(), TaskError>(())
        })
        .await
        .unwrap();
    sleep(ms(10)).await;
    assert!(s.cancel(&KEY).await);

    sleep(ms(200)).await;
    let events = kinds(&drain(&mut rx));
    assert!(events.contains(&EventKind::TaskCancelled));
    assert!(!events.contains(&EventKind::TaskCompleted));
    assert!(s.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn shutdown_reports_bodies_that_ignore_cancellation() {
    let s: Scheduler<&'static str> = Scheduler::new(SchedulerConfig {
        grace: ms(100),
        ..SchedulerConfig::default()
    });
    let _ = s
        .run_if_not_running(KEY, |_ctx: CancellationToken| async move {
            sleep(ms(10_000)).await;
            Ok::<(), TaskError>(())
        })
        .await
        .unwrap();
    sleep(ms(10)).await;

    match s.shutdown().await {
        Err(RuntimeError::GraceExceeded { grace, stuck }) => {
            assert_eq!(grace, ms(100));
            assert_eq!(stuck, 1);
        }
        other => panic!("expected GraceExceeded, got {other:?}"),
    }
}

#[derive(Default)]
struct Boom {
    calls: AtomicUsize,
}

#[async_trait]
impl Subscribe for Boom {
    async fn on_event(&self, _ev: &Event) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("boom");
    }

    fn name(&self) -> &'static str {
        "boom"
    }
}

#[tokio::test(start_paused = true)]
async fn panicking_subscriber_does_not_feed_on_its_own_reports() {
    let boom = Arc::new(Boom::default());
    let s: Scheduler<&'static str> = Scheduler::builder(SchedulerConfig::default())
        .with_subscribers(vec![boom.clone() as Arc<dyn Subscribe>])
        .build();
    let mut rx = s.subscribe();

    let _ = s.run_if_not_running(KEY, Job::new().work(ms(1))).await.unwrap();
    sleep(ms(300)).await;

    // Started, Completed, SlotCleared, then one report for each of those.
    assert_eq!(boom.calls.load(Ordering::SeqCst), 6);
    let reports = drain(&mut rx)
        .iter()
        .filter(|e| e.is_subscriber_panic())
        .count();
    assert_eq!(reports, 3);
}
