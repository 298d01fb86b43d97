// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: positive intervals, bounded
//! message limits, URL shapes, and an account id when channels are enabled.

use parley_core::Channel;

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Upper bound on `poll.message_limit`.
pub const MAX_MESSAGE_LIMIT: usize = 1000;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.poll.list_interval_secs == 0 {
        fail("poll.list_interval_secs must be greater than 0".to_string());
    }
    if config.poll.message_interval_secs == 0 {
        fail("poll.message_interval_secs must be greater than 0".to_string());
    }
    if !(1..=MAX_MESSAGE_LIMIT).contains(&config.poll.message_limit) {
        fail(format!(
            "poll.message_limit must be between 1 and {MAX_MESSAGE_LIMIT}, got {}",
            config.poll.message_limit
        ));
    }
    if config.presence.typing_stale_secs == 0 {
        fail("presence.typing_stale_secs must be greater than 0".to_string());
    }
    if config.backend.timeout_secs == 0 {
        fail("backend.timeout_secs must be greater than 0".to_string());
    }

    if !is_http_url(&config.backend.base_url) {
        fail(format!(
            "backend.base_url `{}` must be an http(s) URL",
            config.backend.base_url
        ));
    }
    for channel in Channel::ALL {
        if let Some(url) = &config.channels.get(channel).base_url
            && !is_http_url(url)
        {
            fail(format!("channels.{channel}.base_url `{url}` must be an http(s) URL"));
        }
    }

    if !config.enabled_channels().is_empty() && config.account.account_id.trim().is_empty() {
        fail("account.account_id must be set when any channel is enabled".to_string());
    }
    if config.account.operator_id.trim().is_empty() {
        fail("account.operator_id must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ParleyConfig {
        let mut config = ParleyConfig::default();
        config.account.account_id = "acct-1".to_string();
        config
    }

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn config_with_account_validates() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn missing_account_id_fails_when_channels_enabled() {
        let errors = validate_config(&ParleyConfig::default()).unwrap_err();
        assert!(has_message(&errors, "account.account_id"));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let mut config = valid_config();
        config.poll.list_interval_secs = 0;
        config.poll.message_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn message_limit_bounds() {
        let mut config = valid_config();
        config.poll.message_limit = MAX_MESSAGE_LIMIT + 1;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "poll.message_limit"));
    }

    #[test]
    fn bad_channel_url_is_reported_with_its_key() {
        let mut config = valid_config();
        config.channels.widget.base_url = Some("ftp://example.com".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "channels.widget.base_url"));
    }

    #[test]
    fn url_shapes() {
        assert!(is_http_url("https://api.example.com/v1"));
        assert!(is_http_url("http://127.0.0.1:8080"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("example.com"));
    }
}
