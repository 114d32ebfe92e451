//! # Countdown tick loop.
//!
//! [`CountdownTask`] runs exactly one countdown to completion or
//! cancellation. It is not a busy loop: each tick re-submits its successor to
//! the registry timeline with a one-second delay, so cancellation simply
//! stops re-submission. All ticks of one countdown share a single
//! [`CancellationToken`] — the registry skips any tick whose token was
//! revoked between arm and fire.
//!
//! ## Tick algorithm
//! ```text
//! open():  display enabled && remaining >= 1 → bar.start(remaining)
//!          threshold check for remaining
//!          remaining == 0 → terminal restart action (zero-delay restart)
//!          otherwise      → re-arm in 1s
//!
//! count(): remaining -= 1
//!          remaining > 0 → threshold check, guarded bar.update, re-arm in 1s
//!          remaining == 0 → terminal restart action, stop (no re-arm)
//! ```
//!
//! The threshold check emits the user-facing broadcast through the bridge and
//! a [`EventKind::CountdownBroadcast`] event on the bus. The terminal action
//! runs inline on the timeline and is therefore no longer cancellable once
//! the final tick has fired, matching the "exactly once" guarantee.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::context::SchedulerContext;
use crate::core::registry::{ActionFuture, ScheduledAction};
use crate::core::restart::RestartAction;
use crate::error::DisplayError;
use crate::events::{Event, EventKind};

/// Interval between countdown ticks.
const TICK: Duration = Duration::from_secs(1);

/// One live countdown: remaining seconds, the reason it was scheduled, and
/// the token shared by all of its ticks.
pub(crate) struct CountdownTask {
    ctx: Arc<SchedulerContext>,
    remaining: u64,
    reason: Option<Arc<str>>,
    token: CancellationToken,
}

impl CountdownTask {
    /// Arms a new countdown on the timeline.
    ///
    /// The first tick fires after `initial_delay`; for direct schedules that
    /// is zero, for recurring schedules it is the gap between "now" and the
    /// start of the notice window.
    pub(crate) async fn launch(
        ctx: Arc<SchedulerContext>,
        seconds: u64,
        reason: Option<Arc<str>>,
        initial_delay: Duration,
    ) {
        let token = CancellationToken::new();
        let task = Self {
            ctx: Arc::clone(&ctx),
            remaining: seconds,
            reason,
            token: token.clone(),
        };
        let action: ScheduledAction = Box::new(move || {
            let fut: ActionFuture = Box::pin(task.open());
            fut
        });
        ctx.registry.submit(initial_delay, token, action).await;
    }

    /// First tick: bring up the display, announce, and start counting.
    async fn open(self) {
        let display_enabled = self.ctx.general.read().await.enable_progress_display;
        if display_enabled && self.remaining >= 1 {
            let result = {
                let messages = self.ctx.messages.read().await;
                let title = messages.countdown_bar_title(self.remaining, self.reason.as_deref());
                self.ctx.bar.lock().await.start(self.remaining, &title)
            };
            if let Err(err) = result {
                self.report_display_fault(err);
            }
        }

        self.check_broadcast().await;

        if self.remaining == 0 {
            RestartAction::new(Arc::clone(&self.ctx)).run().await;
        } else {
            self.rearm().await;
        }
    }

    /// Subsequent ticks: count down, announce, refresh, and either re-arm or
    /// hand off to the terminal action.
    async fn count(mut self) {
        self.remaining -= 1;

        if self.remaining > 0 {
            self.check_broadcast().await;
            self.refresh_bar().await;
            self.rearm().await;
        } else {
            RestartAction::new(Arc::clone(&self.ctx)).run().await;
        }
    }

    /// Emits the countdown notification when `remaining` is a broadcast
    /// threshold.
    async fn check_broadcast(&self) {
        let hit = self
            .ctx
            .general
            .read()
            .await
            .seconds_to_broadcast
            .contains(&self.remaining);
        if !hit {
            return;
        }

        let text = self
            .ctx
            .messages
            .read()
            .await
            .countdown(self.remaining, self.reason.as_deref());
        self.ctx.bridge.broadcast(&text);

        let mut ev = Event::new(EventKind::CountdownBroadcast).with_remaining(self.remaining);
        if let Some(reason) = &self.reason {
            ev = ev.with_reason(Arc::clone(reason));
        }
        self.ctx.bus.publish(ev);
    }

    /// Advances the display by one tick, if it is running.
    async fn refresh_bar(&self) {
        let result = {
            let messages = self.ctx.messages.read().await;
            let mut bar = self.ctx.bar.lock().await;
            if bar.is_running() {
                let reason = self.reason.as_deref();
                bar.update(|rem| messages.countdown_bar_title(rem, reason))
            } else {
                Ok(())
            }
        };
        if let Err(err) = result {
            self.report_display_fault(err);
        }
    }

    /// Submits the next tick under this countdown's token.
    async fn rearm(self) {
        let registry_ctx = Arc::clone(&self.ctx);
        let token = self.token.clone();
        let action = count_action(self);
        registry_ctx.registry.submit(TICK, token, action).await;
    }

    /// Display sequencing errors indicate a bug, not a runtime condition;
    /// they are reported on the bus and never propagate into the tick loop.
    fn report_display_fault(&self, err: DisplayError) {
        self.ctx
            .bus
            .publish(Event::new(EventKind::DisplayFault).with_detail(err.to_string()));
    }
}

/// Builds the scheduled action that runs the task's next `count` tick.
///
/// The `count()` future's `Send` coercion lives here, in a plain function,
/// rather than inside `rearm`'s async body — otherwise the auto-trait check
/// for `count` would recurse into itself and fail to resolve.
fn count_action(task: CountdownTask) -> ScheduledAction {
    Box::new(move || {
        let fut: ActionFuture = Box::pin(task.count());
        fut
    })
}
