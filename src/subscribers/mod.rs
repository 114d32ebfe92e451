//! # Event subscribers for the restartvisor runtime.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery for
//! handling runtime events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Scheduler/Registry ── publish(Event) ──► Bus ──► subscriber listener
//!                                                        │
//!                                                SubscriberSet::emit_arc
//!                                              ┌─────────┼─────────┐
//!                                              ▼         ▼         ▼
//!                                          LogWriter  Metrics   Custom ...
//! ```
//!
//! Subscribers are passive observers: logging, metrics, alerting. Anything
//! that needs to *drive* the scheduler should hold the scheduler handle
//! instead.

mod set;
mod subscriber;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscriber::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
