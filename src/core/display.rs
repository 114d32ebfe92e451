//! # Countdown progress display.
//!
//! [`BarTimer`] owns the optional visible countdown indicator and enforces its
//! lifecycle: `Stopped -> Running -> Stopped`, no other transitions. At most
//! one indicator exists at a time; the cancel path and the terminal restart
//! action both stop it through the registry/scheduler, which hold the single
//! shared instance.
//!
//! The state machine itself is synchronous; the runtime wraps it in a
//! `tokio::sync::Mutex` and never holds the guard across an await.

use std::sync::Arc;

use crate::bridge::{Indicator, ServerBridge};
use crate::error::DisplayError;

/// Progress display state machine driven by the countdown tick loop.
///
/// `Running` is represented by the presence of an indicator handle; counters
/// are only meaningful while running.
pub struct BarTimer {
    bridge: Arc<dyn ServerBridge>,
    indicator: Option<Box<dyn Indicator>>,
    total: u64,
    remaining: u64,
}

impl BarTimer {
    /// Creates a stopped display bound to the given bridge.
    pub fn new(bridge: Arc<dyn ServerBridge>) -> Self {
        Self {
            bridge,
            indicator: None,
            total: 0,
            remaining: 0,
        }
    }

    /// Starts the display for a countdown of `total` seconds.
    ///
    /// Creates a fresh indicator with the given title, makes it visible, and
    /// attaches all currently connected observers.
    ///
    /// # Errors
    /// - [`DisplayError::InvalidTotal`] if `total < 1`
    /// - [`DisplayError::AlreadyRunning`] if called while running
    pub fn start(&mut self, total: u64, title: &str) -> Result<(), DisplayError> {
        if total < 1 {
            return Err(DisplayError::InvalidTotal { total });
        }
        if self.is_running() {
            return Err(DisplayError::AlreadyRunning);
        }

        self.total = total;
        self.remaining = total;

        let indicator = self.bridge.create_indicator(title);
        indicator.set_visible(true);
        indicator.attach_online();
        self.indicator = Some(indicator);
        Ok(())
    }

    /// Advances the display by one tick.
    ///
    /// Decrements `remaining`, pushes the normalized `remaining/total`
    /// fraction, refreshes the title via `title_for(remaining)`, and
    /// re-attaches observers so anyone who connected mid-countdown sees the
    /// indicator.
    ///
    /// # Errors
    /// [`DisplayError::NotRunning`] if called while stopped.
    pub fn update(&mut self, title_for: impl FnOnce(u64) -> String) -> Result<(), DisplayError> {
        let indicator = self.indicator.as_ref().ok_or(DisplayError::NotRunning)?;

        self.remaining = self.remaining.saturating_sub(1);
        indicator.set_progress(self.remaining as f64 / self.total as f64);
        indicator.set_title(&title_for(self.remaining));
        indicator.attach_online();
        Ok(())
    }

    /// Stops the display: hides the indicator, detaches all observers, and
    /// resets the counters.
    ///
    /// # Errors
    /// [`DisplayError::NotRunning`] if called while stopped.
    pub fn stop(&mut self) -> Result<(), DisplayError> {
        let indicator = self.indicator.take().ok_or(DisplayError::NotRunning)?;

        indicator.set_visible(false);
        indicator.detach_all();
        self.total = 0;
        self.remaining = 0;
        Ok(())
    }

    /// Returns whether the display is currently running.
    pub fn is_running(&self) -> bool {
        self.indicator.is_some()
    }

    /// Seconds left on the display (0 while stopped).
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Countdown length the display was started with (0 while stopped).
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockBridge;

    #[test]
    fn start_rejects_zero_total() {
        let bridge = MockBridge::arc();
        let mut bar = BarTimer::new(bridge);
        assert_eq!(bar.start(0, "t"), Err(DisplayError::InvalidTotal { total: 0 }));
        assert!(!bar.is_running());
    }

    #[test]
    fn start_twice_is_rejected() {
        let bridge = MockBridge::arc();
        let mut bar = BarTimer::new(bridge);
        bar.start(5, "t").unwrap();
        assert_eq!(bar.start(5, "t"), Err(DisplayError::AlreadyRunning));
    }

    #[test]
    fn update_and_stop_require_running() {
        let bridge = MockBridge::arc();
        let mut bar = BarTimer::new(bridge);
        assert_eq!(bar.update(|_| String::new()), Err(DisplayError::NotRunning));
        assert_eq!(bar.stop(), Err(DisplayError::NotRunning));
    }

    #[test]
    fn update_walks_remaining_from_total_to_zero() {
        let bridge = MockBridge::arc();
        let mut bar = BarTimer::new(Arc::clone(&bridge) as _);
        bar.start(3, "3 left").unwrap();
        assert_eq!(bar.remaining(), 3);

        for expected in (0..3).rev() {
            bar.update(|rem| format!("{rem} left")).unwrap();
            assert_eq!(bar.remaining(), expected);
        }

        let state = bridge.last_indicator().unwrap();
        let progress = state.progress.lock().unwrap().clone();
        assert_eq!(progress, vec![2.0 / 3.0, 1.0 / 3.0, 0.0]);
        assert_eq!(*state.title.lock().unwrap(), "0 left");

        bar.stop().unwrap();
        assert!(!bar.is_running());
        assert_eq!(bar.remaining(), 0);
        assert_eq!(bar.update(|_| String::new()), Err(DisplayError::NotRunning));
    }

    #[test]
    fn stop_hides_and_detaches() {
        let bridge = MockBridge::arc();
        let mut bar = BarTimer::new(Arc::clone(&bridge) as _);
        bar.start(2, "t").unwrap();

        let state = bridge.last_indicator().unwrap();
        assert!(*state.visible.lock().unwrap());

        bar.stop().unwrap();
        assert!(!*state.visible.lock().unwrap());
        assert!(state.detached.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn updates_reattach_late_observers() {
        let bridge = MockBridge::arc();
        let mut bar = BarTimer::new(Arc::clone(&bridge) as _);
        bar.start(2, "t").unwrap();
        bar.update(|_| "t".to_string()).unwrap();
        bar.update(|_| "t".to_string()).unwrap();

        let state = bridge.last_indicator().unwrap();
        // one attach on start, one per update
        assert_eq!(state.attach_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    }
}
