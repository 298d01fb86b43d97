// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley inbox.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use parley_core::Channel;
use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Which helpdesk account and operator this inbox acts for.
    #[serde(default)]
    pub account: AccountConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Poll intervals and response-ordering policy.
    #[serde(default)]
    pub poll: PollConfig,

    /// Typing indicator and read receipt windows.
    #[serde(default)]
    pub presence: PresenceConfig,

    /// Dashboard backend connection.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Per-channel toggles and endpoint overrides.
    #[serde(default)]
    pub channels: ChannelsConfig,
}

impl ParleyConfig {
    /// Base URL for a channel: its override if set, the backend URL otherwise.
    pub fn channel_base_url(&self, channel: Channel) -> &str {
        self.channels
            .get(channel)
            .base_url
            .as_deref()
            .unwrap_or(&self.backend.base_url)
    }

    /// Channels with `enabled = true`, in display order.
    pub fn enabled_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.channels.get(*c).enabled)
            .collect()
    }
}

/// Account identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    /// Helpdesk account whose conversations are shown.
    #[serde(default)]
    pub account_id: String,

    /// Operator identity used for read-state markers.
    #[serde(default = "default_operator_id")]
    pub operator_id: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            operator_id: default_operator_id(),
        }
    }
}

fn default_operator_id() -> String {
    "operator".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Poll scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    /// Seconds between conversation list refreshes.
    #[serde(default = "default_list_interval_secs")]
    pub list_interval_secs: u64,

    /// Seconds between refreshes of the selected conversation's messages.
    #[serde(default = "default_message_interval_secs")]
    pub message_interval_secs: u64,

    /// Maximum messages fetched per conversation.
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,

    /// Drop responses that arrive after a newer request was already applied.
    /// Off reproduces plain last-arrival-wins.
    #[serde(default = "default_true")]
    pub discard_stale_responses: bool,

    /// Retry delay suggested on HTTP 429 when the server sends no `Retry-After`.
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            list_interval_secs: default_list_interval_secs(),
            message_interval_secs: default_message_interval_secs(),
            message_limit: default_message_limit(),
            discard_stale_responses: true,
            default_retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl PollConfig {
    pub fn list_interval(&self) -> Duration {
        Duration::from_secs(self.list_interval_secs)
    }

    pub fn message_interval(&self) -> Duration {
        Duration::from_secs(self.message_interval_secs)
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }
}

fn default_list_interval_secs() -> u64 {
    5
}

fn default_message_interval_secs() -> u64 {
    3
}

fn default_message_limit() -> usize {
    100
}

fn default_retry_after_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Presence signaling configuration (widget channel).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceConfig {
    /// Minimum milliseconds between two operator typing pings.
    #[serde(default = "default_typing_throttle_ms")]
    pub typing_throttle_ms: u64,

    /// A customer typing marker older than this is ignored.
    #[serde(default = "default_typing_stale_secs")]
    pub typing_stale_secs: u64,

    /// A customer read receipt older than this is shown as stale.
    #[serde(default = "default_read_receipt_stale_secs")]
    pub read_receipt_stale_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            typing_throttle_ms: default_typing_throttle_ms(),
            typing_stale_secs: default_typing_stale_secs(),
            read_receipt_stale_secs: default_read_receipt_stale_secs(),
        }
    }
}

fn default_typing_throttle_ms() -> u64 {
    2000
}

fn default_typing_stale_secs() -> u64 {
    6
}

fn default_read_receipt_stale_secs() -> u64 {
    600
}

/// Dashboard backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the dashboard API. Channel endpoints hang off it unless overridden.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request. `None` sends no Authorization header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Channel toggles.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub sms: ChannelConfig,
    #[serde(default)]
    pub widget: ChannelConfig,
    #[serde(default)]
    pub messenger: ChannelConfig,
    #[serde(default)]
    pub instagram: ChannelConfig,
    #[serde(default)]
    pub email: ChannelConfig,
}

impl ChannelsConfig {
    pub fn get(&self, channel: Channel) -> &ChannelConfig {
        match channel {
            Channel::Sms => &self.sms,
            Channel::Widget => &self.widget,
            Channel::Messenger => &self.messenger,
            Channel::Instagram => &self.instagram,
            Channel::Email => &self.email,
        }
    }
}

/// Settings for a single channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Include this channel in the inbox.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Endpoint override for this channel's API.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_base_url_prefers_override() {
        let mut config = ParleyConfig::default();
        config.channels.sms.base_url = Some("https://sms.example.com".into());
        assert_eq!(config.channel_base_url(Channel::Sms), "https://sms.example.com");
        assert_eq!(
            config.channel_base_url(Channel::Email),
            "http://127.0.0.1:8080/api"
        );
    }

    #[test]
    fn disabled_channels_are_skipped() {
        let mut config = ParleyConfig::default();
        config.channels.instagram.enabled = false;
        assert_eq!(
            config.enabled_channels(),
            vec![Channel::Sms, Channel::Widget, Channel::Messenger, Channel::Email]
        );
    }
}
