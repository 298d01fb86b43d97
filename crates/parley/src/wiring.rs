// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds channel adapters and the inbox session from configuration.

use std::sync::Arc;

use parley_backend::BackendClient;
use parley_config::ParleyConfig;
use parley_core::{Channel, ParleyError, PluginAdapter};
use parley_inbox::{InboxSession, InboxSettings};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A session plus every adapter behind it, for health checks.
pub struct Wiring {
    pub session: InboxSession,
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
}

/// Creates one adapter per enabled channel and wires them into a session
/// that stops when `shutdown` is cancelled.
pub fn build(config: &ParleyConfig, shutdown: CancellationToken) -> Result<Wiring, ParleyError> {
    let mut builder = InboxSession::builder(InboxSettings::from(config)).shutdown_token(shutdown);
    let mut adapters: Vec<Arc<dyn PluginAdapter>> = Vec::new();

    let backend = Arc::new(BackendClient::from_config(config)?);
    builder = builder
        .escalations(backend.clone())
        .read_state(backend.clone());
    adapters.push(backend);

    for channel in config.enabled_channels() {
        match channel {
            #[cfg(feature = "sms")]
            Channel::Sms => {
                let sms = Arc::new(parley_sms::SmsChannel::from_config(config)?);
                builder = builder.channel(sms.clone());
                adapters.push(sms);
            }
            #[cfg(feature = "widget")]
            Channel::Widget => {
                let widget = Arc::new(parley_widget::WidgetChannel::from_config(config)?);
                builder = builder.channel(widget.clone()).presence(widget.clone());
                adapters.push(widget);
            }
            #[cfg(feature = "meta")]
            Channel::Messenger | Channel::Instagram => {
                let platform = if channel == Channel::Messenger {
                    parley_meta::Platform::Messenger
                } else {
                    parley_meta::Platform::Instagram
                };
                let meta = Arc::new(parley_meta::MetaChannel::from_config(config, platform)?);
                builder = builder.channel(meta.clone());
                adapters.push(meta);
            }
            #[cfg(feature = "email")]
            Channel::Email => {
                let email = Arc::new(parley_email::EmailChannel::from_config(config)?);
                let assistant = Arc::new(parley_email::EmailAssistant::from_config(config)?);
                builder = builder.channel(email.clone()).assistant(assistant.clone());
                adapters.push(email);
                adapters.push(assistant);
            }
            #[allow(unreachable_patterns)]
            other => {
                warn!(channel = %other, "channel enabled in config but not compiled in");
            }
        }
    }

    info!(adapters = adapters.len(), "adapters initialized");
    Ok(Wiring {
        session: builder.build(),
        adapters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> ParleyConfig {
        parley_config::load_config_from_str(toml).unwrap()
    }

    #[tokio::test]
    async fn disabled_channels_get_no_adapter() {
        let config = config(
            r#"
            [account]
            account_id = "acct-1"

            [channels.messenger]
            enabled = false

            [channels.instagram]
            enabled = false
            "#,
        );
        let wiring = build(&config, CancellationToken::new()).unwrap();

        let names: Vec<&str> = wiring.adapters.iter().map(|a| a.name()).collect();
        assert!(!names.contains(&"messenger"));
        assert!(!names.contains(&"instagram"));
        assert!(names.contains(&"sms"));
        assert!(names.contains(&"email-assistant"));
        wiring.session.shutdown().await;
    }

    #[tokio::test]
    async fn cancelled_token_stops_the_session() {
        let config = config("[account]\naccount_id = \"acct-1\"\n");
        let token = CancellationToken::new();
        let wiring = build(&config, token.clone()).unwrap();
        assert!(wiring.session.is_running());

        token.cancel();
        assert!(!wiring.session.is_running());
    }
}
