//! # restartvisor
//!
//! **Restartvisor** is a restart-countdown orchestration library for
//! long-running server processes.
//!
//! It schedules a future restart, counts down to it with per-second ticks and
//! threshold broadcasts, drives an optional progress indicator, and
//! guarantees that at most one countdown is live at any moment. The crate is
//! designed as a building block: the host server plugs in via a small bridge
//! trait and keeps full control of its console, chat, and process lifecycle.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   schedule_in / schedule_at / reschedule / cancel / restart_now
//!                     │
//!                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  RestartScheduler (owning orchestrator)                           │
//! │  - RestartTarget (the single "when and why")                      │
//! │  - cancel-then-establish on every operation (single-flight)       │
//! │  - Bus (broadcast events) + SubscriberSet (observability fan-out) │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//! ┌──────────────────────────┐      ┌─────────────────────────────────┐
//! │  TaskRegistry            │      │  CountdownTask (1 Hz ticks)     │
//! │  - ordered timeline      │◄─────┤  - threshold → broadcast        │
//! │  - token arena           │re-arm│  - BarTimer start/update        │
//! │  - cancel_all choke point│      │  - remaining == 0 → terminal    │
//! └──────────────────────────┘      └───────────────┬─────────────────┘
//!                                                   ▼
//!                                   ┌─────────────────────────────────┐
//!                                   │  RestartAction (exactly once)   │
//!                                   │  commands → kick → restart      │
//!                                   └───────────────┬─────────────────┘
//!                                                   ▼
//!                                        ServerBridge (your server)
//! ```
//!
//! ### Lifecycle of a scheduled restart
//! ```text
//! schedule_in(60, "maintenance")
//!   ├─► cancel_all()                 (previous countdown, display, target)
//!   ├─► target = now + 60s
//!   └─► tick loop on the timeline:
//!         t=0   remaining=60  broadcast (60 is a threshold), bar starts
//!         t=30  remaining=30  broadcast
//!         ...
//!         t=59  remaining=1   broadcast, bar shows 1/60
//!         t=60  remaining=0   RestartAction: commands-before, kick,
//!                             bar stops, target clears, restart command
//! ```
//!
//! ## Features
//! | Area            | Description                                           | Key types / traits                  |
//! |-----------------|-------------------------------------------------------|-------------------------------------|
//! | **Scheduling**  | Duration, wall-clock, and recurring-config restarts.  | [`RestartScheduler`]                |
//! | **Countdown**   | Tick loop, broadcast thresholds, progress display.    | [`BarTimer`], [`GeneralConfig`]     |
//! | **Integration** | Host-server boundary for output and side effects.     | [`ServerBridge`], [`Indicator`]     |
//! | **Commands**    | Permission-gated console dispatch surface.            | [`CommandDispatcher`], [`CommandSender`] |
//! | **Events**      | Runtime observability with isolated subscribers.      | [`Event`], [`Bus`], [`Subscribe`]   |
//! | **Config**      | TOML-backed settings and message templates.           | [`GeneralConfig`], [`MessageConfig`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use restartvisor::{Indicator, RestartScheduler, ServerBridge};
//!
//! struct Console;
//!
//! struct NoIndicator;
//! impl Indicator for NoIndicator {
//!     fn set_title(&self, _title: &str) {}
//!     fn set_progress(&self, _fraction: f64) {}
//!     fn set_visible(&self, _visible: bool) {}
//!     fn attach_online(&self) {}
//!     fn detach_all(&self) {}
//! }
//!
//! #[async_trait]
//! impl ServerBridge for Console {
//!     fn broadcast(&self, message: &str) {
//!         println!("{message}");
//!     }
//!
//!     async fn run_console_command(&self, command: &str) -> bool {
//!         println!("dispatch: {command}");
//!         true
//!     }
//!
//!     fn disconnect_all(&self, _message: &str) {}
//!
//!     fn create_indicator(&self, _title: &str) -> Box<dyn Indicator> {
//!         Box::new(NoIndicator)
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = RestartScheduler::builder(Arc::new(Console))
//!         .with_config_dir("/etc/myserver/restartvisor")
//!         .build()?;
//!
//!     // Restart in five minutes, announcing at the configured thresholds.
//!     scheduler.schedule_in(300, Some("maintenance")).await?;
//!
//!     // ... the host keeps running; `scheduler.cancel()`, `restart_now()`,
//!     // and the command dispatcher are available from anywhere.
//!     Ok(())
//! }
//! ```

mod bridge;
mod command;
mod config;
mod core;
mod error;
mod events;
mod subscribers;

#[cfg(test)]
mod testutil;

// ---- Public re-exports ----

pub use bridge::{Indicator, ServerBridge};
pub use command::{CommandDispatcher, CommandSender, SUBCOMMANDS};
pub use config::{colorize, GeneralConfig, MessageConfig};
pub use self::core::{BarTimer, RestartScheduler, RestartTarget, SchedulerBuilder, TaskRegistry};
pub use error::{ConfigError, DisplayError, SchedulerError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
