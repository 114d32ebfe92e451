//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [scheduled] at="2026-08-07 03:00:00" reason=Some("maintenance")
//! [countdown] remaining=30 reason=None
//! [cancelled]
//! [restarting-now]
//! [command-failed] command="save-all"
//! [reloaded]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use — implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::RestartScheduled => {
                println!(
                    "[scheduled] at={:?} reason={:?}",
                    e.time.as_deref().unwrap_or(""),
                    e.reason
                );
            }
            EventKind::RestartNotScheduled => {
                println!("[not-scheduled]");
            }
            EventKind::RestartCancelled => {
                println!("[cancelled]");
            }
            EventKind::RestartingNow => {
                println!("[restarting-now]");
            }
            EventKind::CountdownBroadcast => {
                if let Some(remaining) = e.remaining {
                    println!("[countdown] remaining={remaining} reason={:?}", e.reason);
                }
            }
            EventKind::ConfigReloaded => {
                println!("[reloaded]");
            }
            EventKind::ConfigFault => {
                println!("[config-fault] detail={:?}", e.detail);
            }
            EventKind::CommandFailed => {
                println!("[command-failed] command={:?}", e.detail);
            }
            EventKind::DisplayFault => {
                println!("[display-fault] detail={:?}", e.detail);
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] detail={:?}", e.detail);
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] detail={:?}", e.detail);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
