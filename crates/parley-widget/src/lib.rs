// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Website widget channel adapter for the Parley inbox.
//!
//! Widget threads are keyed by the visitor's session id. Operator replies go
//! through the manual-reply endpoint and are appended optimistically by the
//! inbox. This is the only channel with presence signaling (typing markers
//! and read receipts), exposed through [`PresenceAdapter`].

pub mod normalize;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_backend::HttpTransport;
use parley_config::ParleyConfig;
use parley_core::{
    Channel, ChannelAdapter, ChannelCapabilities, Conversation, DeliveryStatus, HealthStatus,
    Message, ParleyError, PluginAdapter, PresenceAdapter, PresenceSnapshot, SendResult,
};
use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::normalize::{WidgetMessage, WidgetPresence, WidgetSession};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManualReplyRequest<'a> {
    account_id: &'a str,
    session_id: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManualModeRequest<'a> {
    account_id: &'a str,
    session_id: &'a str,
    is_manual: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TypingRequest<'a> {
    account_id: &'a str,
    session_id: &'a str,
    is_typing: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadReceiptRequest<'a> {
    account_id: &'a str,
    session_id: &'a str,
    read_at: DateTime<Utc>,
}

/// Widget implementation of [`ChannelAdapter`] and [`PresenceAdapter`].
pub struct WidgetChannel {
    transport: HttpTransport,
}

impl WidgetChannel {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(HttpTransport::from_config(
            config,
            Some(Channel::Widget),
        )?))
    }
}

#[async_trait]
impl PluginAdapter for WidgetChannel {
    fn name(&self) -> &str {
        "widget"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(self.transport.probe("widget/health").await)
    }
}

#[async_trait]
impl ChannelAdapter for WidgetChannel {
    fn channel(&self) -> Channel {
        Channel::Widget
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_manual_mode: true,
            supports_presence: true,
            reports_delivery_status: false,
            optimistic_send: true,
        }
    }

    async fn list_conversations(&self, account_id: &str) -> Result<Vec<Conversation>, ParleyError> {
        let sessions: Vec<WidgetSession> = self
            .transport
            .get_json("widget/conversations", &[("accountId", account_id)])
            .await?;
        let conversations: Vec<Conversation> = sessions
            .into_iter()
            .filter_map(normalize::to_conversation)
            .collect();
        debug!(count = conversations.len(), "widget conversations fetched");
        Ok(conversations)
    }

    async fn list_messages(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError> {
        let limit = limit.to_string();
        let messages: Vec<WidgetMessage> = self
            .transport
            .get_json(
                "widget/messages",
                &[
                    ("accountId", account_id),
                    ("sessionId", counterpart_ref),
                    ("limit", &limit),
                ],
            )
            .await?;
        let mut messages: Vec<Message> = messages.into_iter().map(normalize::to_message).collect();
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn send(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        body: &str,
    ) -> Result<SendResult, ParleyError> {
        self.transport
            .send_ack(
                Method::POST,
                "widget/manual-reply",
                &ManualReplyRequest {
                    account_id,
                    session_id: counterpart_ref,
                    content: body,
                },
            )
            .await?;
        Ok(SendResult {
            status: DeliveryStatus::Sent,
            provider_message_id: None,
        })
    }

    async fn set_manual_mode(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        is_manual: bool,
    ) -> Result<(), ParleyError> {
        self.transport
            .send_ack(
                Method::PUT,
                "widget/manual-mode",
                &ManualModeRequest {
                    account_id,
                    session_id: counterpart_ref,
                    is_manual,
                },
            )
            .await
    }
}

#[async_trait]
impl PresenceAdapter for WidgetChannel {
    async fn send_typing(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        is_typing: bool,
    ) -> Result<(), ParleyError> {
        self.transport
            .send_ack(
                Method::PUT,
                "widget/typing",
                &TypingRequest {
                    account_id,
                    session_id: counterpart_ref,
                    is_typing,
                },
            )
            .await
    }

    async fn send_read_receipt(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        read_at: DateTime<Utc>,
    ) -> Result<(), ParleyError> {
        self.transport
            .send_ack(
                Method::PUT,
                "widget/read-receipt",
                &ReadReceiptRequest {
                    account_id,
                    session_id: counterpart_ref,
                    read_at,
                },
            )
            .await
    }

    async fn fetch_presence(
        &self,
        account_id: &str,
        counterpart_ref: &str,
    ) -> Result<PresenceSnapshot, ParleyError> {
        let presence: WidgetPresence = self
            .transport
            .get_json(
                "widget/presence",
                &[("accountId", account_id), ("sessionId", counterpart_ref)],
            )
            .await?;
        Ok(presence.into())
    }
}
