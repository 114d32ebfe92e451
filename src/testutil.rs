//! Shared mocks for unit tests: a recording server bridge, indicator, and
//! command sender.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::bridge::{Indicator, ServerBridge};
use crate::command::CommandSender;

/// Observable state of one mock indicator, shared with the test body.
#[derive(Default)]
pub(crate) struct IndicatorState {
    pub title: Mutex<String>,
    pub progress: Mutex<Vec<f64>>,
    pub visible: Mutex<bool>,
    pub attach_calls: AtomicUsize,
    pub detached: AtomicBool,
}

pub(crate) struct MockIndicator(pub Arc<IndicatorState>);

impl Indicator for MockIndicator {
    fn set_title(&self, title: &str) {
        *self.0.title.lock().unwrap() = title.to_string();
    }

    fn set_progress(&self, fraction: f64) {
        self.0.progress.lock().unwrap().push(fraction);
    }

    fn set_visible(&self, visible: bool) {
        *self.0.visible.lock().unwrap() = visible;
    }

    fn attach_online(&self) {
        self.0.attach_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn detach_all(&self) {
        self.0.detached.store(true, Ordering::SeqCst);
    }
}

/// Recording [`ServerBridge`]: captures broadcasts, console commands, kicks,
/// and every indicator it hands out.
#[derive(Default)]
pub(crate) struct MockBridge {
    pub broadcasts: Mutex<Vec<String>>,
    pub commands: Mutex<Vec<String>>,
    pub kicks: Mutex<Vec<String>>,
    pub fail_commands: AtomicBool,
    pub indicators: Mutex<Vec<Arc<IndicatorState>>>,
}

impl MockBridge {
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn broadcast_log(&self) -> Vec<String> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn command_log(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn last_indicator(&self) -> Option<Arc<IndicatorState>> {
        self.indicators.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ServerBridge for MockBridge {
    fn broadcast(&self, message: &str) {
        self.broadcasts.lock().unwrap().push(message.to_string());
    }

    async fn run_console_command(&self, command: &str) -> bool {
        self.commands.lock().unwrap().push(command.to_string());
        !self.fail_commands.load(Ordering::SeqCst)
    }

    fn disconnect_all(&self, message: &str) {
        self.kicks.lock().unwrap().push(message.to_string());
    }

    fn create_indicator(&self, title: &str) -> Box<dyn Indicator> {
        let state = Arc::new(IndicatorState::default());
        *state.title.lock().unwrap() = title.to_string();
        self.indicators.lock().unwrap().push(Arc::clone(&state));
        Box::new(MockIndicator(state))
    }
}

/// [`CommandSender`] with a fixed permission answer and recorded replies.
pub(crate) struct MockSender {
    pub allow: bool,
    pub sent: Mutex<Vec<String>>,
}

impl MockSender {
    pub fn new(allow: bool) -> Self {
        Self {
            allow,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl CommandSender for MockSender {
    fn has_permission(&self, _permission: &str) -> bool {
        self.allow
    }

    fn send_message(&self, message: &str) {
        self.sent.lock().unwrap().push(message.to_string());
    }
}
