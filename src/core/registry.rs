//! # Task registry: delayed-execution timeline and cancellation arena.
//!
//! The registry owns every pending scheduled action. Submissions land in an
//! ordered timeline drained by a single worker task, so no two actions ever
//! run concurrently; each submission is paired with a [`CancellationToken`]
//! held in an arena keyed by submission id.
//!
//! ## Architecture
//! ```text
//! schedule()/submit()            worker task (one per registry)
//!   │  mint/adopt token            loop {
//!   │  arena.insert(id, token)       sleep_until(earliest deadline)
//!   └──► mpsc ───────────────►       pop earliest
//!                                    token cancelled? skip : run action
//!                                    arena.remove(id)     (after it finishes)
//!                                  }
//! ```
//!
//! ## Rules
//! - `schedule` never blocks and never runs the action on the caller.
//! - Actions fire in non-decreasing delay order, one at a time.
//! - A cancelled token's action is guaranteed never to fire; an action that
//!   already started runs to completion.
//! - The arena entry is removed only after the action finishes, so a
//!   cancel-all that lands mid-tick still revokes the in-flight countdown's
//!   token (re-armed ticks share the token and are skipped).
//! - `cancel_all` is the single choke point for countdown teardown: on a
//!   non-empty arena it also stops the progress display, clears the restart
//!   target, and publishes [`EventKind::RestartCancelled`]. On an empty arena
//!   it is a silent no-op.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::display::BarTimer;
use crate::core::scheduler::RestartTarget;
use crate::events::{Bus, Event, EventKind};

/// Future produced by a scheduled action.
pub type ActionFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A one-shot action submitted to the timeline.
pub type ScheduledAction = Box<dyn FnOnce() -> ActionFuture + Send + 'static>;

/// One timeline entry, ordered by deadline then submission id.
struct QueuedAction {
    at: Instant,
    id: u64,
    token: CancellationToken,
    action: ScheduledAction,
}

impl PartialEq for QueuedAction {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.id == other.id
    }
}

impl Eq for QueuedAction {}

impl PartialOrd for QueuedAction {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedAction {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.at.cmp(&other.at).then(self.id.cmp(&other.id))
    }
}

/// Single ordered delayed-execution timeline with bulk cancellation.
pub struct TaskRegistry {
    tx: mpsc::UnboundedSender<QueuedAction>,
    pending: Arc<Mutex<HashMap<u64, CancellationToken>>>,
    next_id: AtomicU64,
    bar: Arc<Mutex<BarTimer>>,
    target: Arc<Mutex<Option<RestartTarget>>>,
    bus: Bus,
}

impl TaskRegistry {
    /// Creates the registry and spawns its timeline worker.
    ///
    /// The worker runs until `runtime_token` is cancelled. Must be called
    /// within a tokio runtime.
    pub(crate) fn new(
        bus: Bus,
        runtime_token: CancellationToken,
        bar: Arc<Mutex<BarTimer>>,
        target: Arc<Mutex<Option<RestartTarget>>>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Mutex::new(HashMap::new()));
        spawn_worker(rx, Arc::clone(&pending), runtime_token);

        Self {
            tx,
            pending,
            next_id: AtomicU64::new(0),
            bar,
            target,
            bus,
        }
    }

    /// Enqueues `action` to run once, no earlier than `delay` from now.
    ///
    /// Returns the cancellation token for this submission. Cancelling an
    /// already-fired token is a silent no-op.
    pub async fn schedule<F, Fut>(&self, delay: Duration, action: F) -> CancellationToken
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let boxed: ScheduledAction = Box::new(move || {
            let fut: ActionFuture = Box::pin(action());
            fut
        });
        self.submit(delay, token.clone(), boxed).await;
        token
    }

    /// Enqueues an action under an existing token.
    ///
    /// Used by the countdown to thread one token through all of its re-armed
    /// ticks: cancelling it stops re-submission wherever the loop happens to
    /// be.
    pub(crate) async fn submit(
        &self,
        delay: Duration,
        token: CancellationToken,
        action: ScheduledAction,
    ) {
        let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        self.pending.lock().await.insert(id, token.clone());
        let _ = self.tx.send(QueuedAction {
            at: Instant::now() + delay,
            id,
            token,
            action,
        });
    }

    /// Cancels every outstanding submission.
    ///
    /// On a non-empty arena this additionally stops the progress display,
    /// clears the restart target, and publishes `RestartCancelled` — the
    /// whole countdown-adjacent state resets through this one path. Calling
    /// it again, or on an empty arena, does nothing.
    pub async fn cancel_all(&self) {
        let tokens: Vec<CancellationToken> = {
            let mut pending = self.pending.lock().await;
            if pending.is_empty() {
                return;
            }
            pending.drain().map(|(_, token)| token).collect()
        };

        for token in &tokens {
            token.cancel();
        }

        {
            let mut bar = self.bar.lock().await;
            if bar.is_running() {
                let _ = bar.stop();
            }
        }
        self.target.lock().await.take();

        self.bus.publish(Event::new(EventKind::RestartCancelled));
    }

    /// Number of outstanding submissions.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Spawns the timeline worker: keeps a deadline-ordered heap, fires entries
/// one at a time, and skips entries whose token was cancelled in the
/// meantime.
fn spawn_worker(
    mut rx: mpsc::UnboundedReceiver<QueuedAction>,
    pending: Arc<Mutex<HashMap<u64, CancellationToken>>>,
    runtime_token: CancellationToken,
) {
    tokio::spawn(async move {
        let mut heap: BinaryHeap<Reverse<QueuedAction>> = BinaryHeap::new();

        loop {
            let next_deadline = heap.peek().map(|Reverse(entry)| entry.at);

            tokio::select! {
                _ = runtime_token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Some(entry) => { heap.push(Reverse(entry)); }
                    None => break,
                },
                _ = wait_until(next_deadline) => {
                    if let Some(Reverse(entry)) = heap.pop() {
                        if !entry.token.is_cancelled() {
                            (entry.action)().await;
                        }
                        pending.lock().await.remove(&entry.id);
                    }
                }
            }
        }
    });
}

/// Sleeps until the deadline, or forever when the timeline is empty.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockBridge;
    use std::sync::Mutex as StdMutex;

    fn registry_with_bus() -> (TaskRegistry, Bus, Arc<MockBridge>) {
        let bridge = MockBridge::arc();
        let bus = Bus::new(32);
        let bar = Arc::new(Mutex::new(BarTimer::new(Arc::clone(&bridge) as _)));
        let target = Arc::new(Mutex::new(None));
        let registry = TaskRegistry::new(bus.clone(), CancellationToken::new(), bar, target);
        (registry, bus, bridge)
    }

    #[tokio::test(start_paused = true)]
    async fn actions_fire_in_delay_order() {
        let (registry, _bus, _bridge) = registry_with_bus();
        let log: Arc<StdMutex<Vec<&'static str>>> = Arc::new(StdMutex::new(Vec::new()));

        let log_a = Arc::clone(&log);
        registry
            .schedule(Duration::from_secs(2), move || async move {
                log_a.lock().unwrap().push("late");
            })
            .await;
        let log_b = Arc::clone(&log);
        registry
            .schedule(Duration::from_secs(1), move || async move {
                log_b.lock().unwrap().push("early");
            })
            .await;

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
        assert_eq!(registry.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_action_never_fires() {
        let (registry, _bus, _bridge) = registry_with_bus();
        let fired = Arc::new(StdMutex::new(false));

        let fired_clone = Arc::clone(&fired);
        let token = registry
            .schedule(Duration::from_secs(5), move || async move {
                *fired_clone.lock().unwrap() = true;
            })
            .await;
        token.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!*fired.lock().unwrap());
        assert_eq!(registry.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_is_idempotent_and_reports_once() {
        let (registry, bus, _bridge) = registry_with_bus();
        let mut rx = bus.subscribe();

        registry.schedule(Duration::from_secs(60), || async {}).await;

        registry.cancel_all().await;
        registry.cancel_all().await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        let mut cancelled = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::RestartCancelled {
                cancelled += 1;
            }
        }
        assert_eq!(cancelled, 1);
        assert_eq!(registry.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_on_empty_arena_is_silent() {
        let (registry, bus, _bridge) = registry_with_bus();
        let mut rx = bus.subscribe();

        registry.cancel_all().await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_stops_running_display_and_clears_target() {
        let bridge = MockBridge::arc();
        let bus = Bus::new(32);
        let bar = Arc::new(Mutex::new(BarTimer::new(Arc::clone(&bridge) as _)));
        let target = Arc::new(Mutex::new(None));
        let registry = TaskRegistry::new(
            bus.clone(),
            CancellationToken::new(),
            Arc::clone(&bar),
            Arc::clone(&target),
        );

        bar.lock().await.start(10, "t").unwrap();
        *target.lock().await = Some(RestartTarget {
            at: chrono::Local::now().naive_local(),
            reason: None,
        });
        registry.schedule(Duration::from_secs(60), || async {}).await;

        registry.cancel_all().await;

        assert!(!bar.lock().await.is_running());
        assert!(target.lock().await.is_none());
    }
}
