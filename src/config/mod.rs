//! File-backed configuration: general settings and message templates.
//!
//! Both configs are plain serde structs with per-field defaults, loaded from
//! TOML (`config.toml` / `messages.toml` under the builder's config dir). A
//! missing file means defaults; a malformed file is a hard error at the
//! boundary, never inside the tick loop.

mod general;
mod messages;

pub use general::GeneralConfig;
pub use messages::{colorize, MessageConfig};
