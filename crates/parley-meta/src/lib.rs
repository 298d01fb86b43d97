// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messenger and Instagram channel adapters for the Parley inbox.
//!
//! The two platforms expose identical endpoints under different path
//! prefixes, so a single [`MetaChannel`] serves both, parameterized by
//! [`Platform`]. Threads are keyed by the platform-scoped sender id.

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
use strum::Display;
use tracing::debug;

use crate::normalize::{MetaMessage, MetaThread};

/// Which Meta platform a [`MetaChannel`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Messenger,
    Instagram,
}

impl Platform {
    pub fn channel(self) -> Channel {
        match self {
            Platform::Messenger => Channel::Messenger,
            Platform::Instagram => Channel::Instagram,
        }
    }

    fn path(self, endpoint: &str) -> String {
        format!("{self}/{endpoint}")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManualReplyRequest<'a> {
    account_id: &'a str,
    sender_id: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManualModeRequest<'a> {
    account_id: &'a str,
    sender_id: &'a str,
    is_manual: bool,
}

/// Messenger or Instagram implementation of [`ChannelAdapter`].
pub struct MetaChannel {
    platform: Platform,
    transport: HttpTransport,
}

impl MetaChannel {
    pub fn new(platform: Platform, transport: HttpTransport) -> Self {
        Self {
            platform,
            transport,
        }
    }

    pub fn from_config(config: &ParleyConfig, platform: Platform) -> Result<Self, ParleyError> {
        let transport = HttpTransport::from_config(config, Some(platform.channel()))?;
        Ok(Self::new(platform, transport))
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

#[async_trait]
impl PluginAdapter for MetaChannel {
    fn name(&self) -> &str {
        match self.platform {
            Platform::Messenger => "messenger",
            Platform::Instagram => "instagram",
        }
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(self.transport.probe(&self.platform.path("health")).await)
    }
}

#[async_trait]
impl ChannelAdapter for MetaChannel {
    fn channel(&self) -> Channel {
        self.platform.channel()
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_manual_mode: true,
            supports_presence: false,
            reports_delivery_status: false,
            optimistic_send: true,
        }
    }

    async fn list_conversations(&self, account_id: &str) -> Result<Vec<Conversation>, ParleyError> {
        let threads: Vec<MetaThread> = self
            .transport
            .get_json(
                &self.platform.path("conversations"),
                &[("accountId", account_id)],
            )
            .await?;
        let channel = self.channel();
        let conversations: Vec<Conversation> = threads
            .into_iter()
            .filter_map(|t| normalize::to_conversation(channel, t))
            .collect();
        debug!(platform = %self.platform, count = conversations.len(), "threads fetched");
        Ok(conversations)
    }

    async fn list_messages(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError> {
        let limit = limit.to_string();
        let messages: Vec<MetaMessage> = self
            .transport
            .get_json(
                &self.platform.path("messages"),
                &[
                    ("accountId", account_id),
                    ("senderId", counterpart_ref),
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
                &self.platform.path("manual-reply"),
                &ManualReplyRequest {
                    account_id,
                    sender_id: counterpart_ref,
                    message: body,
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
                &self.platform.path("manual-mode"),
                &ManualModeRequest {
                    account_id,
                    sender_id: counterpart_ref,
                    is_manual,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(server: &MockServer, platform: Platform) -> MetaChannel {
        MetaChannel::new(
            platform,
            HttpTransport::new(&server.uri(), None, Duration::from_secs(5), Duration::from_secs(30))
                .unwrap(),
        )
    }

    #[test]
    fn platform_maps_to_channel_and_prefix() {
        assert_eq!(Platform::Messenger.channel(), Channel::Messenger);
        assert_eq!(Platform::Instagram.path("messages"), "instagram/messages");
    }

    #[tokio::test]
    async fn instagram_threads_use_instagram_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instagram/conversations"))
            .and(query_param("accountId", "acct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"senderId": "ig-1", "lastMessage": "hei", "lastMessageTime": 1772355600000i64}
            ])))
            .mount(&server)
            .await;

        let conversations = channel(&server, Platform::Instagram)
            .list_conversations("acct")
            .await
            .unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id.as_str(), "instagram-ig-1");
    }

    #[tokio::test]
    async fn messenger_reply_is_keyed_by_sender() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messenger/manual-reply"))
            .and(body_json(serde_json::json!({
                "accountId": "acct", "senderId": "psid-9", "message": "Hei!"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let result = channel(&server, Platform::Messenger)
            .send("acct", "psid-9", "Hei!")
            .await
            .unwrap();
        assert_eq!(result.status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn messages_are_sorted_by_created_time() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messenger/messages"))
            .and(query_param("senderId", "psid-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "b", "from": "page", "text": "svar", "createdTime": "2026-03-01T09:01:00Z"},
                {"id": "a", "from": "user", "text": "spm", "createdTime": "2026-03-01T09:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let messages = channel(&server, Platform::Messenger)
            .list_messages("acct", "psid-9", 100)
            .await
            .unwrap();
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn rate_limit_surfaces_as_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/instagram/manual-mode"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let err = channel(&server, Platform::Instagram)
            .set_manual_mode("acct", "ig-1", true)
            .await
            .unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }
}
