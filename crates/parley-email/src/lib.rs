// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email channel adapter and reply assistant for the Parley inbox.
//!
//! Email threads are keyed by the lowercased customer address and carry a
//! subject. Email has no automated replier, so manual mode is not a concept
//! here and [`EmailChannel::set_manual_mode`] reports
//! [`ParleyError::Unsupported`].

pub mod assistant;
pub mod normalize;

use async_trait::async_trait;
use parley_backend::HttpTransport;
use parley_config::ParleyConfig;
use parley_core::{
    Channel, ChannelAdapter, ChannelCapabilities, Conversation, DeliveryStatus, HealthStatus,
    Message, ParleyError, PluginAdapter, SendResult,
};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info};

use crate::normalize::{EmailRecord, EmailThread};

pub use assistant::EmailAssistant;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendReplyRequest<'a> {
    account_id: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Email implementation of [`ChannelAdapter`].
pub struct EmailChannel {
    transport: HttpTransport,
}

impl EmailChannel {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(HttpTransport::from_config(config, Some(Channel::Email))?))
    }
}

#[async_trait]
impl PluginAdapter for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(self.transport.probe("email/health").await)
    }
}

#[async_trait]
impl ChannelAdapter for EmailChannel {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_manual_mode: false,
            supports_presence: false,
            reports_delivery_status: false,
            optimistic_send: false,
        }
    }

    async fn list_conversations(&self, account_id: &str) -> Result<Vec<Conversation>, ParleyError> {
        let threads: Vec<EmailThread> = self
            .transport
            .get_json("email/conversations", &[("accountId", account_id)])
            .await?;
        let conversations: Vec<Conversation> = threads
            .into_iter()
            .filter_map(normalize::to_conversation)
            .collect();
        debug!(count = conversations.len(), "email threads fetched");
        Ok(conversations)
    }

    async fn list_messages(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError> {
        let limit = limit.to_string();
        let records: Vec<EmailRecord> = self
            .transport
            .get_json(
                "email/messages",
                &[
                    ("accountId", account_id),
                    ("email", counterpart_ref),
                    ("limit", &limit),
                ],
            )
            .await?;
        let mut messages: Vec<Message> = records.into_iter().map(normalize::to_message).collect();
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn send(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        body: &str,
    ) -> Result<SendResult, ParleyError> {
        self.send_reply(account_id, counterpart_ref, None, body).await
    }

    async fn send_reply(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        subject: Option<&str>,
        body: &str,
    ) -> Result<SendResult, ParleyError> {
        let subject = normalize::reply_subject(subject);
        self.transport
            .send_ack(
                Method::POST,
                "email/send-reply",
                &SendReplyRequest {
                    account_id,
                    to: counterpart_ref,
                    subject: &subject,
                    body,
                },
            )
            .await?;
        info!(to = %counterpart_ref, subject = %subject, "email reply sent");
        Ok(SendResult {
            status: DeliveryStatus::Sent,
            provider_message_id: None,
        })
    }

    async fn set_manual_mode(
        &self,
        _account_id: &str,
        _counterpart_ref: &str,
        _is_manual: bool,
    ) -> Result<(), ParleyError> {
        Err(ParleyError::Unsupported {
            channel: Channel::Email,
            operation: "manual mode",
        })
    }
}
