//! # Restart scheduler: the owning orchestrator.
//!
//! [`RestartScheduler`] holds the single pending restart target (or none) and
//! exposes every way a schedule can change: by duration, by wall-clock time,
//! from the recurring config, cancellation, and restart-now. Every operation
//! serializes on one mutex and begins by cancelling whatever countdown was
//! active, so at most one countdown ticks at any moment (cancel-then-establish).
//!
//! ## High-level architecture
//! ```text
//! schedule_in / schedule_at / reschedule
//!       │ cancel_all()                        TaskRegistry (timeline worker)
//!       │ target = Some(at, reason)                │ 1s ticks
//!       └─► CountdownTask::launch ──► submit ─────┤
//!                                                 ▼
//!                                      CountdownTask::open/count
//!                                        │ threshold → bridge.broadcast
//!                                        │ bar.update
//!                                        ▼ remaining == 0
//!                                      RestartAction::run (exactly once)
//!
//! cancel / restart_now / reload / shutdown: same ops mutex, same cancel path.
//! ```
//!
//! Constructed once per process via [`SchedulerBuilder`] and shared as an
//! `Arc`; there is no global state.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration as TimeDelta, Local, NaiveDateTime};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::bridge::ServerBridge;
use crate::config::{GeneralConfig, MessageConfig};
use crate::core::context::SchedulerContext;
use crate::core::countdown::CountdownTask;
use crate::core::display::BarTimer;
use crate::core::registry::TaskRegistry;
use crate::core::restart::RestartAction;
use crate::error::{ConfigError, SchedulerError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Seconds in one day, for wrapping past-due wall-clock targets.
const DAY_SECONDS: i64 = 86_400;

/// The pending restart: when, and why.
///
/// Exists only while a restart is scheduled; cleared by cancellation or by
/// the terminal action firing.
#[derive(Debug, Clone)]
pub struct RestartTarget {
    /// Local wall-clock time the restart fires at.
    pub at: NaiveDateTime,
    /// Reason given when the restart was scheduled, if any.
    pub reason: Option<Arc<str>>,
}

/// Orchestrates restart countdowns for one server process.
///
/// ## Example
/// ```no_run
/// use std::sync::Arc;
/// use restartvisor::{RestartScheduler, ServerBridge};
///
/// async fn schedule(bridge: Arc<dyn ServerBridge>) {
///     let scheduler = RestartScheduler::builder(bridge).build().unwrap();
///     scheduler.schedule_in(300, Some("maintenance")).await.unwrap();
///     assert!(scheduler.is_scheduled().await);
/// }
/// ```
pub struct RestartScheduler {
    ctx: Arc<SchedulerContext>,
    runtime_token: CancellationToken,
    ops: Mutex<()>,
    config_dir: Option<PathBuf>,
}

impl RestartScheduler {
    /// Starts building a scheduler around the given server bridge.
    pub fn builder(bridge: Arc<dyn ServerBridge>) -> SchedulerBuilder {
        SchedulerBuilder::new(bridge)
    }

    /// Schedules a restart `seconds` from now.
    ///
    /// Cancels any pending countdown first; the new countdown starts ticking
    /// immediately at `remaining = seconds`.
    ///
    /// # Errors
    /// [`SchedulerError::InvalidDuration`] if `seconds < 1`; no state is
    /// mutated in that case.
    pub async fn schedule_in(
        &self,
        seconds: u64,
        reason: Option<&str>,
    ) -> Result<(), SchedulerError> {
        let _ops = self.ops.lock().await;
        self.establish(seconds, reason).await
    }

    /// Schedules a restart at a wall-clock time.
    ///
    /// The duration is computed to second precision (plus one second so the
    /// countdown lands on, not before, the requested minute); targets in the
    /// past wrap to tomorrow. Returns the duration actually scheduled.
    pub async fn schedule_at(
        &self,
        when: NaiveDateTime,
        reason: Option<&str>,
    ) -> Result<u64, SchedulerError> {
        let _ops = self.ops.lock().await;

        let now = Local::now().naive_local();
        let mut seconds = (when - now).num_seconds() + 1;
        if seconds < 1 {
            seconds += DAY_SECONDS;
        }
        if seconds < 1 {
            return Err(SchedulerError::InvalidDuration { seconds });
        }

        self.establish(seconds as u64, reason).await?;
        Ok(seconds as u64)
    }

    /// Schedules the next restart from the recurring config.
    ///
    /// The soonest configured `"HH:MM"` wins (past-due times wrap to
    /// tomorrow). The countdown only covers the final notice window,
    /// `notice = min(time_until_target, default_notice_time)`: its first tick
    /// is delayed until `time_until_target - notice` seconds from now, so
    /// broadcasts and the display start at the window, not immediately.
    ///
    /// Returns the chosen target, or `None` (with the previous schedule
    /// cancelled) when nothing is configured.
    pub async fn reschedule(&self) -> Option<NaiveDateTime> {
        let _ops = self.ops.lock().await;
        self.reschedule_locked().await
    }

    /// Cancels the pending restart, if any.
    ///
    /// Idempotent: cancelling with nothing scheduled does nothing.
    pub async fn cancel(&self) {
        let _ops = self.ops.lock().await;
        self.ctx.registry.cancel_all().await;
    }

    /// Cancels any pending countdown and runs the terminal restart action
    /// immediately, bypassing the tick loop.
    pub async fn restart_now(&self) {
        let _ops = self.ops.lock().await;
        self.ctx.registry.cancel_all().await;
        self.ctx.bus.publish(Event::new(EventKind::RestartingNow));
        RestartAction::new(Arc::clone(&self.ctx)).run().await;
    }

    /// The pending restart time formatted to second precision, or `""` when
    /// nothing is scheduled.
    pub async fn restart_time_text(&self) -> String {
        match self.ctx.target.lock().await.as_ref() {
            Some(target) => format_time(target.at),
            None => String::new(),
        }
    }

    /// Whether a restart is currently scheduled.
    pub async fn is_scheduled(&self) -> bool {
        self.ctx.target.lock().await.is_some()
    }

    /// Reloads configuration and re-establishes the recurring schedule.
    ///
    /// With a config dir, both files are re-read before anything is touched;
    /// a parse error aborts the reload with the previous schedule and config
    /// intact. Without one, this is equivalent to [`reschedule`](Self::reschedule).
    pub async fn reload(&self) -> Result<(), ConfigError> {
        let _ops = self.ops.lock().await;

        if let Some(dir) = &self.config_dir {
            let general = GeneralConfig::load(dir.join("config.toml"))?;
            let messages = MessageConfig::load(dir.join("messages.toml"))?;
            *self.ctx.general.write().await = general;
            *self.ctx.messages.write().await = messages;
            self.ctx.bus.publish(Event::new(EventKind::ConfigReloaded));
        }

        self.reschedule_locked().await;
        Ok(())
    }

    /// Cancels everything and stops the timeline worker.
    ///
    /// The scheduler is inert afterwards; meant for process teardown.
    pub async fn shutdown(&self) {
        let _ops = self.ops.lock().await;
        self.ctx.registry.cancel_all().await;
        self.runtime_token.cancel();
    }

    /// The runtime event bus (subscribe for lifecycle events).
    pub fn bus(&self) -> &Bus {
        &self.ctx.bus
    }

    /// Snapshot of the live general configuration.
    pub async fn general_config(&self) -> GeneralConfig {
        self.ctx.general.read().await.clone()
    }

    /// Snapshot of the live message templates.
    pub async fn message_config(&self) -> MessageConfig {
        self.ctx.messages.read().await.clone()
    }

    pub(crate) fn context(&self) -> &Arc<SchedulerContext> {
        &self.ctx
    }

    /// Cancel-then-establish: the single path that creates countdowns.
    /// Caller must hold the ops mutex.
    async fn establish(&self, seconds: u64, reason: Option<&str>) -> Result<(), SchedulerError> {
        if seconds < 1 {
            return Err(SchedulerError::InvalidDuration {
                seconds: seconds as i64,
            });
        }

        self.ctx.registry.cancel_all().await;

        let reason: Option<Arc<str>> = reason.map(Arc::from);
        let at = Local::now().naive_local() + TimeDelta::seconds(seconds as i64);
        *self.ctx.target.lock().await = Some(RestartTarget {
            at,
            reason: reason.clone(),
        });

        CountdownTask::launch(
            Arc::clone(&self.ctx),
            seconds,
            reason.clone(),
            std::time::Duration::ZERO,
        )
        .await;

        let mut ev = Event::new(EventKind::RestartScheduled).with_time(format_time(at));
        if let Some(reason) = reason {
            ev = ev.with_reason(reason);
        }
        self.ctx.bus.publish(ev);
        Ok(())
    }

    /// Recurring-config path; caller must hold the ops mutex.
    async fn reschedule_locked(&self) -> Option<NaiveDateTime> {
        self.ctx.registry.cancel_all().await;

        let now = Local::now().naive_local();
        let (next, default_notice, invalid) = {
            let general = self.ctx.general.read().await;
            let invalid: Vec<String> = general
                .restart_times()
                .1
                .into_iter()
                .map(str::to_string)
                .collect();
            (
                general.next_auto_restart_time(now),
                general.default_notice_time,
                invalid,
            )
        };

        for entry in invalid {
            self.ctx.bus.publish(
                Event::new(EventKind::ConfigFault)
                    .with_detail(format!("invalid time format: {entry}")),
            );
        }

        let Some(at) = next else {
            self.ctx.bus.publish(Event::new(EventKind::RestartNotScheduled));
            return None;
        };

        let time_until = (at - now).num_seconds().max(1) as u64;
        let (initial_delay, notice) = notice_plan(time_until, default_notice);

        *self.ctx.target.lock().await = Some(RestartTarget { at, reason: None });
        CountdownTask::launch(
            Arc::clone(&self.ctx),
            notice,
            None,
            std::time::Duration::from_secs(initial_delay),
        )
        .await;

        self.ctx
            .bus
            .publish(Event::new(EventKind::RestartScheduled).with_time(format_time(at)));
        Some(at)
    }
}

/// Splits the gap to a recurring target into (initial delay, countdown
/// length): the countdown covers at most `default_notice` trailing seconds.
fn notice_plan(time_until: u64, default_notice: u64) -> (u64, u64) {
    let notice = default_notice.min(time_until);
    (time_until - notice, notice)
}

/// Formats a restart target to second precision.
fn format_time(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Builder for constructing a [`RestartScheduler`].
///
/// Configuration comes from (in precedence order) explicit structs, the
/// config dir's `config.toml`/`messages.toml`, or the built-in defaults.
/// `build` spawns the timeline worker and the subscriber listener, so it must
/// be called within a tokio runtime.
pub struct SchedulerBuilder {
    bridge: Arc<dyn ServerBridge>,
    general: Option<GeneralConfig>,
    messages: Option<MessageConfig>,
    config_dir: Option<PathBuf>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a new builder around the given server bridge.
    pub fn new(bridge: Arc<dyn ServerBridge>) -> Self {
        Self {
            bridge,
            general: None,
            messages: None,
            config_dir: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the general configuration explicitly (skips file loading).
    pub fn with_general(mut self, general: GeneralConfig) -> Self {
        self.general = Some(general);
        self
    }

    /// Sets the message templates explicitly (skips file loading).
    pub fn with_messages(mut self, messages: MessageConfig) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Loads `config.toml` and `messages.toml` from this directory, and
    /// enables [`RestartScheduler::reload`] to re-read them.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (schedules, broadcasts, faults)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the scheduler: loads configuration, wires the bus to the
    /// subscriber set, and spawns the timeline worker.
    pub fn build(self) -> Result<Arc<RestartScheduler>, ConfigError> {
        let general = match (self.general, &self.config_dir) {
            (Some(general), _) => general,
            (None, Some(dir)) => GeneralConfig::load(dir.join("config.toml"))?,
            (None, None) => GeneralConfig::default(),
        };
        let messages = match (self.messages, &self.config_dir) {
            (Some(messages), _) => messages,
            (None, Some(dir)) => MessageConfig::load(dir.join("messages.toml"))?,
            (None, None) => MessageConfig::default(),
        };

        let bus = Bus::new(general.bus_capacity);
        let runtime_token = CancellationToken::new();
        spawn_subscriber_listener(
            SubscriberSet::new(self.subscribers, bus.clone()),
            bus.clone(),
            runtime_token.clone(),
        );

        let bar = Arc::new(Mutex::new(BarTimer::new(Arc::clone(&self.bridge))));
        let target = Arc::new(Mutex::new(None));
        let registry = TaskRegistry::new(
            bus.clone(),
            runtime_token.clone(),
            Arc::clone(&bar),
            Arc::clone(&target),
        );

        let ctx = Arc::new(SchedulerContext {
            general: RwLock::new(general),
            messages: RwLock::new(messages),
            bridge: self.bridge,
            bar,
            target,
            registry,
            bus,
        });

        Ok(Arc::new(RestartScheduler {
            ctx,
            runtime_token,
            ops: Mutex::new(()),
            config_dir: self.config_dir,
        }))
    }
}

/// Forwards bus events to the subscriber set until shutdown.
fn spawn_subscriber_listener(subs: SubscriberSet, bus: Bus, runtime_token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = runtime_token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit_arc(Arc::new(ev)),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        }
        subs.shutdown().await;
    });
}
