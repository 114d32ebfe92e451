//! # Server integration boundary.
//!
//! The runtime never talks to a concrete server directly; everything that
//! reaches connected observers or the server console goes through
//! [`ServerBridge`]. Embedders implement this trait once and hand it to
//! [`SchedulerBuilder`](crate::SchedulerBuilder).
//!
//! [`Indicator`] is the visible countdown surface (a boss bar, a tray badge,
//! a status line). The bridge creates one on demand; the display state machine
//! in [`BarTimer`](crate::BarTimer) owns its lifecycle and guarantees at most
//! one exists at a time.

use async_trait::async_trait;

/// Integration point between the scheduler and the host server.
///
/// ### Implementation requirements
/// - `broadcast` and `disconnect_all` should be cheap and non-blocking; the
///   tick loop calls them at one-second granularity.
/// - `run_console_command` returns `false` when the command was dispatched but
///   rejected/failed; the runtime reports this on the bus and moves on.
#[async_trait]
pub trait ServerBridge: Send + Sync + 'static {
    /// Sends a message to every connected observer.
    fn broadcast(&self, message: &str);

    /// Executes a console command, returning whether it succeeded.
    async fn run_console_command(&self, command: &str) -> bool;

    /// Disconnects every connected observer with the given message.
    fn disconnect_all(&self, message: &str);

    /// Creates a fresh (initially hidden) countdown indicator.
    fn create_indicator(&self, title: &str) -> Box<dyn Indicator>;
}

/// A visible countdown indicator managed by the progress display.
///
/// Implementations hold whatever handle the host server uses for the visual
/// (e.g. a boss bar). All methods take `&self`; interior mutability is the
/// implementor's concern.
pub trait Indicator: Send + Sync {
    /// Replaces the indicator text.
    fn set_title(&self, title: &str);

    /// Sets the fill fraction, in `0.0..=1.0`.
    fn set_progress(&self, fraction: f64);

    /// Shows or hides the indicator for attached observers.
    fn set_visible(&self, visible: bool);

    /// Attaches every currently connected observer to the indicator.
    ///
    /// Called on start and on each update so observers who connect
    /// mid-countdown still see the indicator.
    fn attach_online(&self);

    /// Detaches all observers from the indicator.
    fn detach_all(&self);
}
