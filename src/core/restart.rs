//! # Terminal restart action.
//!
//! [`RestartAction`] is the side effect a countdown exists to reach. It runs
//! exactly once per countdown — either from the final tick on the timeline or
//! directly via `restart_now` — and never retries: a failed console command
//! is published as [`EventKind::CommandFailed`] and the sequence continues.

use std::sync::Arc;

use crate::core::context::SchedulerContext;
use crate::events::{Event, EventKind};

/// Runs the restart sequence: pre-restart commands, optional kick, display
/// teardown, target clear, restart command.
pub(crate) struct RestartAction {
    ctx: Arc<SchedulerContext>,
}

impl RestartAction {
    pub(crate) fn new(ctx: Arc<SchedulerContext>) -> Self {
        Self { ctx }
    }

    /// Executes the full restart sequence.
    ///
    /// Command failures are reported, not propagated; if the restart command
    /// itself fails the process keeps running with a cleared schedule.
    pub(crate) async fn run(&self) {
        let (commands_before, kick_before, restart_command) = {
            let general = self.ctx.general.read().await;
            (
                general.commands_before_restart.clone(),
                general.kick_before_restart,
                general.restart_command.clone(),
            )
        };

        for command in &commands_before {
            self.dispatch(command).await;
        }

        if kick_before {
            let message = self.ctx.messages.read().await.kick();
            self.ctx.bridge.disconnect_all(&message);
        }

        {
            let mut bar = self.ctx.bar.lock().await;
            if bar.is_running() {
                let _ = bar.stop();
            }
        }

        self.ctx.target.lock().await.take();

        self.dispatch(&restart_command).await;
    }

    /// Runs one console command, reporting failure on the bus.
    async fn dispatch(&self, command: &str) {
        if !self.ctx.bridge.run_console_command(command).await {
            self.ctx
                .bus
                .publish(Event::new(EventKind::CommandFailed).with_detail(command));
        }
    }
}
