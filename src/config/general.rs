//! # General runtime configuration.
//!
//! Provides [`GeneralConfig`], the file-backed settings for the restart
//! scheduler: the restart command, pre-restart commands, broadcast thresholds,
//! notice time, display/kick toggles, and the recurring restart times.
//!
//! ## Sources
//! - `GeneralConfig::default()` — built-in defaults, used when no file exists.
//! - `GeneralConfig::load(path)` — TOML file with per-field defaults, so a
//!   partial file only overrides what it names.
//!
//! ## Recurring restart times
//! `auto-restart-times` holds `"HH:MM"` wall-clock entries. The helpers here
//! are pure in `now` so the wrap-to-tomorrow and soonest-wins rules are
//! testable without a real clock.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Duration as TimeDelta, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Seconds in one day, for wrapping past-due clock times to tomorrow.
const DAY_SECONDS: i64 = 86_400;

/// General configuration for the restart scheduler.
///
/// All fields are public and serde-defaulted; prefer the helper methods for
/// anything that needs interpretation (recurring times, next target).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneralConfig {
    /// Console command that performs the actual restart.
    pub restart_command: String,

    /// Console commands executed, in order, right before the restart command.
    pub commands_before_restart: Vec<String>,

    /// Remaining-seconds values at which a countdown broadcast is emitted.
    pub seconds_to_broadcast: BTreeSet<u64>,

    /// Countdown length (seconds) used when no explicit delay is given, and
    /// the maximum notice window for recurring restarts.
    pub default_notice_time: u64,

    /// Whether countdowns drive the visible progress indicator.
    pub enable_progress_display: bool,

    /// Whether all observers are disconnected before the restart command runs.
    pub kick_before_restart: bool,

    /// Recurring restart wall-clock times, `"HH:MM"`.
    pub auto_restart_times: Vec<String>,

    /// Capacity of the event bus ring buffer (min 1; clamped by the bus).
    pub bus_capacity: usize,
}

impl Default for GeneralConfig {
    /// Default configuration:
    ///
    /// - `restart-command = "restart"`
    /// - `commands-before-restart = []`
    /// - `seconds-to-broadcast = {1, 2, 3, 4, 5, 10, 30, 60}`
    /// - `default-notice-time = 60`
    /// - `enable-progress-display = true`
    /// - `kick-before-restart = true`
    /// - `auto-restart-times = []` (recurring restarts disabled)
    /// - `bus-capacity = 256`
    fn default() -> Self {
        Self {
            restart_command: "restart".to_string(),
            commands_before_restart: Vec::new(),
            seconds_to_broadcast: [1, 2, 3, 4, 5, 10, 30, 60].into_iter().collect(),
            default_notice_time: 60,
            enable_progress_display: true,
            kick_before_restart: true,
            auto_restart_times: Vec::new(),
            bus_capacity: 256,
        }
    }
}

impl GeneralConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// an error so a typo cannot silently drop the operator's settings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Splits `auto-restart-times` into parsed times and unusable entries.
    ///
    /// Entries must match `"HH:MM"`; anything else ends up in the second list
    /// so the caller can report it.
    pub fn restart_times(&self) -> (Vec<NaiveTime>, Vec<&str>) {
        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        for entry in &self.auto_restart_times {
            match NaiveTime::parse_from_str(entry, "%H:%M") {
                Ok(time) => valid.push(time),
                Err(_) => invalid.push(entry.as_str()),
            }
        }
        (valid, invalid)
    }

    /// Computes the next recurring restart target relative to `now`.
    ///
    /// Each configured time is projected onto today; targets less than one
    /// second away (or already past) wrap to tomorrow. The soonest target
    /// wins. Returns `None` when no usable time is configured.
    pub fn next_auto_restart_time(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let (times, _invalid) = self.restart_times();

        let mut soonest: Option<i64> = None;
        for time in times {
            let mut secs = (now.date().and_time(time) - now).num_seconds();
            if secs < 1 {
                secs += DAY_SECONDS;
            }
            soonest = Some(soonest.map_or(secs, |best| best.min(secs)));
        }

        soonest.map(|secs| now + TimeDelta::seconds(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use std::io::Write;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 7)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = GeneralConfig::default();
        assert_eq!(cfg.restart_command, "restart");
        assert_eq!(cfg.default_notice_time, 60);
        assert!(cfg.enable_progress_display);
        assert!(cfg.kick_before_restart);
        assert!(cfg.seconds_to_broadcast.contains(&60));
        assert!(cfg.auto_restart_times.is_empty());
    }

    #[test]
    fn partial_toml_only_overrides_named_fields() {
        let cfg: GeneralConfig = toml::from_str(
            r#"
            default-notice-time = 120
            auto-restart-times = ["03:00", "15:30"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.default_notice_time, 120);
        assert_eq!(cfg.auto_restart_times.len(), 2);
        assert_eq!(cfg.restart_command, "restart");
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = GeneralConfig::load(dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg.default_notice_time, 60);
    }

    #[test]
    fn load_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "kick-before-restart = false").unwrap();

        let cfg = GeneralConfig::load(&path).unwrap();
        assert!(!cfg.kick_before_restart);
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default-notice-time = \"soon\"").unwrap();
        assert!(GeneralConfig::load(&path).is_err());
    }

    #[test]
    fn restart_times_splits_invalid_entries() {
        let mut cfg = GeneralConfig::default();
        cfg.auto_restart_times = vec!["03:00".into(), "25:99".into(), "nope".into()];
        let (valid, invalid) = cfg.restart_times();
        assert_eq!(valid.len(), 1);
        assert_eq!(invalid, vec!["25:99", "nope"]);
    }

    #[test]
    fn next_time_picks_todays_future_slot() {
        let mut cfg = GeneralConfig::default();
        cfg.auto_restart_times = vec!["03:00".into()];
        let next = cfg.next_auto_restart_time(at(2, 0)).unwrap();
        assert_eq!(next, at(3, 0));
    }

    #[test]
    fn next_time_wraps_past_slot_to_tomorrow() {
        let mut cfg = GeneralConfig::default();
        cfg.auto_restart_times = vec!["01:00".into()];
        let next = cfg.next_auto_restart_time(at(2, 0)).unwrap();
        assert_eq!(next, at(1, 0) + TimeDelta::seconds(DAY_SECONDS));
    }

    #[test]
    fn next_time_soonest_slot_wins() {
        let mut cfg = GeneralConfig::default();
        cfg.auto_restart_times = vec!["23:00".into(), "04:30".into(), "01:00".into()];
        let next = cfg.next_auto_restart_time(at(2, 0)).unwrap();
        assert_eq!(next.hour(), 4);
        assert_eq!(next.minute(), 30);
    }

    #[test]
    fn next_time_ignores_invalid_and_empty() {
        let mut cfg = GeneralConfig::default();
        assert!(cfg.next_auto_restart_time(at(2, 0)).is_none());

        cfg.auto_restart_times = vec!["banana".into()];
        assert!(cfg.next_auto_restart_time(at(2, 0)).is_none());
    }
}
