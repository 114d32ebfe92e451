//! Shared state bundle threaded through the scheduler, registry, countdown
//! ticks, and the terminal restart action.
//!
//! The context is the single ownership boundary for process-wide state:
//! the restart target, the progress display, and the live configuration. All
//! mutation goes through short lock sections with no `.await` while held;
//! `bar` and `target` are additionally shared with the registry so cancel-all
//! can reset them as one choke point.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::bridge::ServerBridge;
use crate::config::{GeneralConfig, MessageConfig};
use crate::core::display::BarTimer;
use crate::core::registry::TaskRegistry;
use crate::core::scheduler::RestartTarget;
use crate::events::Bus;

pub(crate) struct SchedulerContext {
    /// Live general configuration (replaced wholesale on reload).
    pub(crate) general: RwLock<GeneralConfig>,
    /// Live message templates (replaced wholesale on reload).
    pub(crate) messages: RwLock<MessageConfig>,
    /// Host-server integration.
    pub(crate) bridge: Arc<dyn ServerBridge>,
    /// The single progress display; shared with the registry.
    pub(crate) bar: Arc<Mutex<BarTimer>>,
    /// The single pending restart target; shared with the registry.
    pub(crate) target: Arc<Mutex<Option<RestartTarget>>>,
    /// Delayed-execution timeline and cancellation arena.
    pub(crate) registry: TaskRegistry,
    /// Runtime event bus.
    pub(crate) bus: Bus,
}
