//! # User-facing message templates.
//!
//! Provides [`MessageConfig`]: every string the scheduler shows to observers
//! or command senders, file-backed so operators can re-word or translate them.
//!
//! Templates carry `%time%`, `%reason%`, `%perm%`, and `%arg%` placeholders,
//! plus `&`-prefixed color markup translated to ANSI escapes by [`colorize`].
//! Reasons are raw keys (e.g. `"maintenance"`) looked up in the `reasons`
//! table; unknown keys fall back to the key itself so ad-hoc reasons still
//! read sensibly.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Message templates for broadcasts, the progress display, and command replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MessageConfig {
    /// Prefix applied to broadcasts and command replies.
    pub prefix: String,
    /// Disconnect message used when observers are kicked before a restart.
    pub kick: String,
    /// Countdown broadcast; `%time%` = remaining seconds, `%reason%` = reason.
    pub countdown_message: String,
    /// Progress indicator title; `%time%` = remaining seconds.
    pub countdown_bar_title: String,
    /// Wrapper for a present reason; `%reason%` = translated reason phrase.
    pub reason_format: String,
    /// Reason key → user-facing phrase. Unknown keys fall back to the key.
    pub reasons: HashMap<String, String>,

    pub command_cancel: String,
    pub command_check_scheduled: String,
    pub command_check_not_scheduled: String,
    pub command_now: String,
    pub command_reload: String,
    pub command_reload_failed: String,
    pub command_second: String,
    pub command_time: String,
    pub command_no_permission: String,
    pub command_invalid_arg: String,
    pub help: Vec<String>,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            prefix: "&8[&6restartvisor&8]&7 ".to_string(),
            kick: "Server is restarting. Please wait a little...".to_string(),
            countdown_message: "The server will restart in &b%time%&7 seconds.%reason%"
                .to_string(),
            countdown_bar_title: "&eThe server will restart in %time% seconds".to_string(),
            reason_format: " &7(%reason%&7)".to_string(),
            reasons: HashMap::new(),
            command_cancel: "Restart has been cancelled.".to_string(),
            command_check_scheduled: "Restart has been scheduled at &b%time%".to_string(),
            command_check_not_scheduled: "&7Restart is not scheduled.".to_string(),
            command_now: "Restarting the server now.".to_string(),
            command_reload: "&brestartvisor is reloading... Please check the server console."
                .to_string(),
            command_reload_failed: "&cReload failed: %arg%".to_string(),
            command_second: "&cThe server will restart in &b%time%&c seconds.%reason%"
                .to_string(),
            command_time: "&cThe server will restart at &b%time%&c.%reason%".to_string(),
            command_no_permission: "&cYou don't have permission: &b%perm%".to_string(),
            command_invalid_arg: "Invalid argument: &b%arg%".to_string(),
            help: vec![
                "&8&m===========&e restartvisor &8&m===========".to_string(),
                "&b restart cancel&8: &7Cancel the pending restart".to_string(),
                "&b restart check&8: &7Check the next restart".to_string(),
                "&b restart help&8: &7Show this help".to_string(),
                "&b restart now&8: &7Restart the server now".to_string(),
                "&b restart reload&8: &7Reload config.toml and messages.toml".to_string(),
                "&b restart reschedule&8: &7Schedule the next recurring restart".to_string(),
                "&b restart restart {seconds} [reason]&8: &7Schedule a restart".to_string(),
                "&b restart time {HH:MM} [reason]&8: &7Schedule a restart".to_string(),
            ],
        }
    }
}

impl MessageConfig {
    /// Loads message templates from a TOML file.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Disconnect message shown to kicked observers.
    pub fn kick(&self) -> String {
        colorize(&self.kick)
    }

    /// Countdown broadcast for `remaining` seconds.
    pub fn countdown(&self, remaining: u64, reason: Option<&str>) -> String {
        let body = self
            .countdown_message
            .replace("%time%", &remaining.to_string())
            .replace("%reason%", &self.formatted_reason(reason));
        colorize(&format!("{}{}", self.prefix, body))
    }

    /// Progress indicator title for `remaining` seconds.
    pub fn countdown_bar_title(&self, remaining: u64, reason: Option<&str>) -> String {
        let body = self
            .countdown_bar_title
            .replace("%time%", &remaining.to_string())
            .replace("%reason%", &self.formatted_reason(reason));
        colorize(&body)
    }

    /// Translates a raw reason key into its wrapped, user-facing form.
    ///
    /// `None` yields the empty string so templates can inline `%reason%`
    /// unconditionally.
    pub fn formatted_reason(&self, reason: Option<&str>) -> String {
        match reason {
            None => String::new(),
            Some(key) => {
                let phrase = self.reasons.get(key).map(String::as_str).unwrap_or(key);
                self.reason_format.replace("%reason%", phrase)
            }
        }
    }

    /// Reply to a successful `cancel`.
    pub fn cancel(&self) -> String {
        colorize(&format!("{}{}", self.prefix, self.command_cancel))
    }

    /// Reply to `check`: scheduled-at or not-scheduled, based on `time_text`.
    pub fn check(&self, time_text: &str) -> String {
        let body = if time_text.is_empty() {
            self.command_check_not_scheduled.clone()
        } else {
            self.command_check_scheduled.replace("%time%", time_text)
        };
        colorize(&format!("{}{}", self.prefix, body))
    }

    /// Reply to `now`.
    pub fn now(&self) -> String {
        colorize(&format!("{}{}", self.prefix, self.command_now))
    }

    /// Reply sent before a reload begins.
    pub fn reload(&self) -> String {
        colorize(&format!("{}{}", self.prefix, self.command_reload))
    }

    /// Reply sent when a reload fails; `error` replaces `%arg%`.
    pub fn reload_failed(&self, error: &str) -> String {
        let body = self.command_reload_failed.replace("%arg%", error);
        colorize(&format!("{}{}", self.prefix, body))
    }

    /// Confirmation broadcast for a restart scheduled in `seconds` seconds.
    pub fn scheduled_in(&self, seconds: u64, reason: Option<&str>) -> String {
        let body = self
            .command_second
            .replace("%time%", &seconds.to_string())
            .replace("%reason%", &self.formatted_reason(reason));
        colorize(&format!("{}{}", self.prefix, body))
    }

    /// Confirmation broadcast for a restart scheduled at `time_text`.
    pub fn scheduled_at(&self, time_text: &str, reason: Option<&str>) -> String {
        let body = self
            .command_time
            .replace("%time%", time_text)
            .replace("%reason%", &self.formatted_reason(reason));
        colorize(&format!("{}{}", self.prefix, body))
    }

    /// Reply to a sender missing `perm`.
    pub fn no_permission(&self, perm: &str) -> String {
        let body = self.command_no_permission.replace("%perm%", perm);
        colorize(&format!("{}{}", self.prefix, body))
    }

    /// Reply to an unparseable argument.
    pub fn invalid_arg(&self, arg: &str) -> String {
        let body = self.command_invalid_arg.replace("%arg%", arg);
        colorize(&format!("{}{}", self.prefix, body))
    }

    /// The joined help text.
    pub fn help(&self) -> String {
        colorize(&self.help.join("\n"))
    }
}

/// Translates `&`-prefixed color markup into ANSI escape sequences.
///
/// Unknown codes are left untouched so templates degrade readably.
pub fn colorize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        match chars.peek().and_then(|code| ansi(*code)) {
            Some(escape) => {
                out.push_str(escape);
                chars.next();
            }
            None => out.push('&'),
        }
    }
    out
}

/// ANSI escape for one markup code, or `None` for unrecognized codes.
fn ansi(code: char) -> Option<&'static str> {
    Some(match code {
        '0' => "\x1b[30m",
        '1' => "\x1b[34m",
        '2' => "\x1b[32m",
        '3' => "\x1b[36m",
        '4' => "\x1b[31m",
        '5' => "\x1b[35m",
        '6' => "\x1b[33m",
        '7' => "\x1b[37m",
        '8' => "\x1b[90m",
        '9' => "\x1b[94m",
        'a' => "\x1b[92m",
        'b' => "\x1b[96m",
        'c' => "\x1b[91m",
        'd' => "\x1b[95m",
        'e' => "\x1b[93m",
        'f' => "\x1b[97m",
        'k' => "\x1b[8m",
        'l' => "\x1b[1m",
        'm' => "\x1b[9m",
        'n' => "\x1b[4m",
        'o' => "\x1b[3m",
        'r' => "\x1b[0m",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_translates_known_codes() {
        assert_eq!(colorize("&cred&r"), "\x1b[91mred\x1b[0m");
    }

    #[test]
    fn colorize_keeps_unknown_codes_and_trailing_ampersand() {
        assert_eq!(colorize("a&zb&"), "a&zb&");
    }

    #[test]
    fn countdown_substitutes_time_and_omits_absent_reason() {
        let msgs = MessageConfig::default();
        let text = msgs.countdown(30, None);
        assert!(text.contains("30"));
        assert!(!text.contains("%time%"));
        assert!(!text.contains("%reason%"));
    }

    #[test]
    fn reason_table_translates_known_keys_and_falls_back() {
        let mut msgs = MessageConfig::default();
        msgs.reasons
            .insert("maintenance".to_string(), "Scheduled maintenance".to_string());

        assert!(msgs
            .formatted_reason(Some("maintenance"))
            .contains("Scheduled maintenance"));
        assert!(msgs.formatted_reason(Some("hotfix")).contains("hotfix"));
        assert_eq!(msgs.formatted_reason(None), "");
    }

    #[test]
    fn check_switches_on_empty_time_text() {
        let msgs = MessageConfig::default();
        assert!(msgs.check("").contains("not scheduled"));
        assert!(msgs.check("2026-08-07 03:00:00").contains("03:00:00"));
    }

    #[test]
    fn placeholders_in_command_replies() {
        let msgs = MessageConfig::default();
        assert!(msgs.no_permission("restartvisor.cancel").contains("restartvisor.cancel"));
        assert!(msgs.invalid_arg("abc").contains("abc"));
        assert!(msgs.scheduled_in(90, Some("maintenance")).contains("90"));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let msgs: MessageConfig = toml::from_str(
            r#"
            kick = "Back in five."
            "#,
        )
        .unwrap();
        assert_eq!(msgs.kick(), "Back in five.");
        assert!(msgs.help().contains("restartvisor"));
    }
}
