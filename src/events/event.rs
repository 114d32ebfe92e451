//! # Runtime events emitted by the scheduler, registry, and countdown.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Schedule events**: a restart was scheduled, cancelled, or forced
//! - **Countdown events**: threshold broadcasts during an active countdown
//! - **Fault events**: reported-but-not-fatal operational problems
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! remaining-seconds count, the formatted restart time, and the reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use restartvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CountdownBroadcast)
//!     .with_remaining(30)
//!     .with_reason("maintenance");
//!
//! assert_eq!(ev.kind, EventKind::CountdownBroadcast);
//! assert_eq!(ev.remaining, Some(30));
//! assert_eq!(ev.reason.as_deref(), Some("maintenance"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Schedule events ===
    /// A restart target was established and a countdown armed.
    ///
    /// Sets:
    /// - `time`: formatted restart target
    /// - `reason`: restart reason, if one was given
    RestartScheduled,

    /// A reschedule ran but no recurring restart time is configured.
    RestartNotScheduled,

    /// All pending countdown work was cancelled and the target cleared.
    RestartCancelled,

    /// The terminal restart action is about to run, bypassing the countdown.
    RestartingNow,

    // === Countdown events ===
    /// The remaining time matched a broadcast threshold.
    ///
    /// Sets:
    /// - `remaining`: seconds left on the countdown
    /// - `reason`: restart reason, if one was given
    CountdownBroadcast,

    // === Configuration events ===
    /// Configuration files were reloaded from disk.
    ConfigReloaded,

    /// A configuration entry was skipped as unusable.
    ///
    /// Sets:
    /// - `detail`: description of the offending entry
    ConfigFault,

    // === Fault events ===
    /// A console command reported failure.
    ///
    /// Sets:
    /// - `detail`: the command text
    CommandFailed,

    /// The progress display was driven out of sequence.
    ///
    /// This should never occur in normal operation; it indicates a bug in the
    /// countdown's tick sequencing rather than a runtime condition.
    ///
    /// Sets:
    /// - `detail`: the display error message
    DisplayFault,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `detail`: subscriber name and reason
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `detail`: panic info/message
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Seconds remaining on the countdown, if applicable.
    pub remaining: Option<u64>,
    /// Formatted restart target time, if applicable.
    pub time: Option<Arc<str>>,
    /// Restart reason, if one was given.
    pub reason: Option<Arc<str>>,
    /// Free-form detail (command text, error message, entry name).
    pub detail: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            remaining: None,
            time: None,
            reason: None,
            detail: None,
        }
    }

    /// Attaches a remaining-seconds count.
    #[inline]
    pub fn with_remaining(mut self, remaining: u64) -> Self {
        self.remaining = Some(remaining);
        self
    }

    /// Attaches a formatted restart target time.
    #[inline]
    pub fn with_time(mut self, time: impl Into<Arc<str>>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Attaches a restart reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches free-form detail.
    #[inline]
    pub fn with_detail(mut self, detail: impl Into<Arc<str>>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_detail(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_detail(format!("subscriber={subscriber} panic={info}"))
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
