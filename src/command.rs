//! # Console command surface.
//!
//! Thin dispatch layer over the scheduler: one subcommand per scheduler
//! operation, permission-gated per sender. Embedders adapt their own console
//! or chat command plumbing to [`CommandSender`] and feed tokenized arguments
//! to [`CommandDispatcher::dispatch`].
//!
//! ```text
//! cancel                      → RestartScheduler::cancel
//! check                       → RestartScheduler::restart_time_text
//! now                         → RestartScheduler::restart_now
//! reload                      → RestartScheduler::reload
//! reschedule                  → RestartScheduler::reschedule
//! restart [seconds] [reason]  → RestartScheduler::schedule_in
//! time [HH:MM] [reason]       → RestartScheduler::schedule_at
//! help                        → help text
//! ```
//!
//! Argument validation lives here, at the boundary: unparseable seconds or
//! clock times produce the invalid-arg reply and never reach the scheduler.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime, NaiveTime};

use crate::core::RestartScheduler;

/// All recognized subcommands, for help text and tab completion.
pub const SUBCOMMANDS: [&str; 8] = [
    "cancel",
    "check",
    "help",
    "now",
    "reload",
    "reschedule",
    "restart",
    "time",
];

/// Something that issued a command: a console, an admin chat, an RPC peer.
pub trait CommandSender: Send + Sync {
    /// Whether the sender holds the given permission node.
    fn has_permission(&self, permission: &str) -> bool;

    /// Sends a reply to the sender.
    fn send_message(&self, message: &str);
}

/// Permission-gated dispatcher mapping subcommands onto scheduler operations.
pub struct CommandDispatcher {
    scheduler: Arc<RestartScheduler>,
}

impl CommandDispatcher {
    pub fn new(scheduler: Arc<RestartScheduler>) -> Self {
        Self { scheduler }
    }

    /// Handles one tokenized command line.
    ///
    /// Unknown or missing subcommands show the help text.
    pub async fn dispatch(&self, sender: &dyn CommandSender, args: &[&str]) {
        match args.first().map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("cancel") => self.cancel(sender).await,
            Some("check") => self.check(sender).await,
            Some("now") => self.now(sender).await,
            Some("reload") => self.reload(sender).await,
            Some("reschedule") => self.reschedule(sender).await,
            Some("restart") => self.schedule_seconds(sender, args).await,
            Some("time") => self.schedule_time(sender, args).await,
            _ => self.help(sender).await,
        }
    }

    /// Prefix completion for the first argument.
    pub fn complete(&self, args: &[&str]) -> Vec<String> {
        if args.len() != 1 {
            return Vec::new();
        }
        let partial = args[0].to_ascii_lowercase();
        SUBCOMMANDS
            .iter()
            .filter(|sub| sub.starts_with(&partial))
            .map(|sub| sub.to_string())
            .collect()
    }

    async fn cancel(&self, sender: &dyn CommandSender) {
        if !self.check_permission(sender, "cancel").await {
            return;
        }
        self.scheduler.cancel().await;
        let reply = self.scheduler.context().messages.read().await.cancel();
        sender.send_message(&reply);
    }

    async fn check(&self, sender: &dyn CommandSender) {
        if !self.check_permission(sender, "check").await {
            return;
        }
        self.send_check(sender).await;
    }

    async fn now(&self, sender: &dyn CommandSender) {
        if !self.check_permission(sender, "now").await {
            return;
        }
        let reply = self.scheduler.context().messages.read().await.now();
        sender.send_message(&reply);
        self.scheduler.restart_now().await;
    }

    async fn reload(&self, sender: &dyn CommandSender) {
        if !self.check_permission(sender, "reload").await {
            return;
        }
        {
            let messages = self.scheduler.context().messages.read().await;
            sender.send_message(&messages.reload());
        }
        match self.scheduler.reload().await {
            Ok(()) => self.send_check(sender).await,
            Err(err) => {
                let messages = self.scheduler.context().messages.read().await;
                sender.send_message(&messages.reload_failed(&err.to_string()));
            }
        }
    }

    async fn reschedule(&self, sender: &dyn CommandSender) {
        if !self.check_permission(sender, "reschedule").await {
            return;
        }
        self.scheduler.reschedule().await;
        self.send_check(sender).await;
    }

    async fn help(&self, sender: &dyn CommandSender) {
        if !self.check_permission(sender, "help").await {
            return;
        }
        let reply = self.scheduler.context().messages.read().await.help();
        sender.send_message(&reply);
    }

    /// `restart [seconds] [reason...]` — bare `restart` uses the configured
    /// notice time.
    async fn schedule_seconds(&self, sender: &dyn CommandSender, args: &[&str]) {
        if !self.check_permission(sender, "restart").await {
            return;
        }

        let ctx = self.scheduler.context();
        let seconds = match args.get(1) {
            None => ctx.general.read().await.default_notice_time,
            Some(raw) => match raw.parse::<u64>() {
                Ok(seconds) if seconds >= 1 => seconds,
                _ => {
                    let messages = ctx.messages.read().await;
                    sender.send_message(&messages.invalid_arg(raw));
                    return;
                }
            },
        };
        let reason = join_reason(args);

        if self.scheduler.schedule_in(seconds, reason.as_deref()).await.is_ok() {
            self.announce_unless_threshold(seconds, reason.as_deref(), false)
                .await;
        }
    }

    /// `time [HH:MM] [reason...]` — bare `time` falls back to the next
    /// recurring slot, or now plus the notice time.
    async fn schedule_time(&self, sender: &dyn CommandSender, args: &[&str]) {
        if !self.check_permission(sender, "time").await {
            return;
        }

        let ctx = self.scheduler.context();
        let when: NaiveDateTime = match args.get(1) {
            Some(raw) => match NaiveTime::parse_from_str(raw, "%H:%M") {
                Ok(time) => Local::now().naive_local().date().and_time(time),
                Err(_) => {
                    let messages = ctx.messages.read().await;
                    sender.send_message(&messages.invalid_arg(raw));
                    return;
                }
            },
            None => {
                let general = ctx.general.read().await;
                let now = Local::now().naive_local();
                general.next_auto_restart_time(now).unwrap_or_else(|| {
                    now + chrono::Duration::seconds(general.default_notice_time as i64)
                })
            }
        };
        let reason = join_reason(args);

        if let Ok(seconds) = self.scheduler.schedule_at(when, reason.as_deref()).await {
            self.announce_unless_threshold(seconds, reason.as_deref(), true)
                .await;
        }
    }

    /// Broadcasts a scheduling confirmation unless the starting duration is
    /// itself a broadcast threshold (the countdown announces those).
    async fn announce_unless_threshold(&self, seconds: u64, reason: Option<&str>, by_time: bool) {
        let ctx = self.scheduler.context();
        if ctx
            .general
            .read()
            .await
            .seconds_to_broadcast
            .contains(&seconds)
        {
            return;
        }

        let text = {
            let messages = ctx.messages.read().await;
            if by_time {
                messages.scheduled_at(&self.scheduler.restart_time_text().await, reason)
            } else {
                messages.scheduled_in(seconds, reason)
            }
        };
        ctx.bridge.broadcast(&text);
    }

    async fn send_check(&self, sender: &dyn CommandSender) {
        let time_text = self.scheduler.restart_time_text().await;
        let reply = self.scheduler.context().messages.read().await.check(&time_text);
        sender.send_message(&reply);
    }

    /// Verifies `restartvisor.<node>`; replies when missing.
    async fn check_permission(&self, sender: &dyn CommandSender, node: &str) -> bool {
        let permission = format!("restartvisor.{node}");
        if sender.has_permission(&permission) {
            return true;
        }
        let messages = self.scheduler.context().messages.read().await;
        sender.send_message(&messages.no_permission(&permission));
        false
    }
}

/// Everything after the subcommand's first argument is the reason.
fn join_reason(args: &[&str]) -> Option<String> {
    if args.len() > 2 {
        Some(args[2..].join(" "))
    } else {
        None
    }
}
