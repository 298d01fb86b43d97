// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS channel adapter for the Parley inbox.
//!
//! Threads are keyed by phone number. Outbound messages go through the SMS
//! provider and are persisted by the backend as outbound records; the send
//! response carries the provider's delivery status.

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

use crate::normalize::{SmsRecord, SmsSendResponse, SmsThread};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    account_id: &'a str,
    to: &'a str,
    body: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManualModeRequest<'a> {
    account_id: &'a str,
    phone: &'a str,
    is_manual: bool,
}

/// SMS implementation of [`ChannelAdapter`].
pub struct SmsChannel {
    transport: HttpTransport,
}

impl SmsChannel {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(HttpTransport::from_config(config, Some(Channel::Sms))?))
    }
}

#[async_trait]
impl PluginAdapter for SmsChannel {
    fn name(&self) -> &str {
        "sms"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(self.transport.probe("sms/health").await)
    }
}

#[async_trait]
impl ChannelAdapter for SmsChannel {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_manual_mode: true,
            supports_presence: false,
            reports_delivery_status: true,
            optimistic_send: false,
        }
    }

    async fn list_conversations(&self, account_id: &str) -> Result<Vec<Conversation>, ParleyError> {
        let threads: Vec<SmsThread> = self
            .transport
            .get_json("sms/conversations", &[("accountId", account_id)])
            .await?;
        let conversations: Vec<Conversation> = threads
            .into_iter()
            .filter_map(normalize::to_conversation)
            .collect();
        debug!(count = conversations.len(), "sms conversations fetched");
        Ok(conversations)
    }

    async fn list_messages(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError> {
        let limit = limit.to_string();
        let records: Vec<SmsRecord> = self
            .transport
            .get_json(
                "sms/messages",
                &[
                    ("accountId", account_id),
                    ("phone", counterpart_ref),
                    ("limit", &limit),
                ],
            )
            .await?;
        let mut messages: Vec<Message> = records.into_iter().map(normalize::to_message).collect();
        // The provider log is not guaranteed to be sorted.
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn send(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        body: &str,
    ) -> Result<SendResult, ParleyError> {
        let response: SmsSendResponse = self
            .transport
            .send_json(
                Method::POST,
                "sms/send",
                &SendRequest {
                    account_id,
                    to: counterpart_ref,
                    body,
                },
            )
            .await?;

        if !response.success {
            return Err(ParleyError::channel(format!(
                "SMS provider rejected the message: {}",
                response.error.unwrap_or_else(|| "no reason given".to_string())
            )));
        }

        let status = response
            .status
            .as_deref()
            .and_then(normalize::map_provider_status)
            .unwrap_or(DeliveryStatus::Sent);
        info!(to = %counterpart_ref, status = %status, "sms sent");
        Ok(SendResult {
            status,
            provider_message_id: response.message_id,
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
                "sms/manual-mode",
                &ManualModeRequest {
                    account_id,
                    phone: counterpart_ref,
                    is_manual,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Role;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(server: &MockServer) -> SmsChannel {
        SmsChannel::new(
            HttpTransport::new(&server.uri(), None, Duration::from_secs(5), Duration::from_secs(30))
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn lists_conversations_skipping_bad_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sms/conversations"))
            .and(query_param("accountId", "acct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"phoneNumber": "+4790000001", "lastMessage": "a", "lastMessageAt": "2026-03-01T09:00:00Z"},
                {"phoneNumber": "", "lastMessage": "b", "lastMessageAt": "2026-03-01T09:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let conversations = channel(&server).list_conversations("acct").await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id.as_str(), "sms-+4790000001");
    }

    #[tokio::test]
    async fn messages_come_back_oldest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sms/messages"))
            .and(query_param("phone", "+4790000001"))
            .and(query_param("limit", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "2", "direction": "outbound", "body": "svar", "createdAt": "2026-03-01T09:05:00Z", "status": "delivered"},
                {"id": "1", "direction": "inbound", "body": "hei", "createdAt": "2026-03-01T09:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let messages = channel(&server)
            .list_messages("acct", "+4790000001", 50)
            .await
            .unwrap();
        assert_eq!(messages[0].id, "1");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].status, Some(DeliveryStatus::Delivered));
    }

    #[tokio::test]
    async fn send_reports_provider_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sms/send"))
            .and(body_json(serde_json::json!({
                "accountId": "acct", "to": "+4790000001", "body": "Takk!"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true, "messageId": "SM123", "status": "queued"
            })))
            .mount(&server)
            .await;

        let result = channel(&server)
            .send("acct", "+4790000001", "Takk!")
            .await
            .unwrap();
        assert_eq!(result.status, DeliveryStatus::Pending);
        assert_eq!(result.provider_message_id.as_deref(), Some("SM123"));
    }

    #[tokio::test]
    async fn send_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sms/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false, "error": "invalid number"
            })))
            .mount(&server)
            .await;

        let err = channel(&server).send("acct", "+1", "x").await.unwrap_err();
        assert!(err.to_string().contains("invalid number"));
    }

    #[tokio::test]
    async fn manual_mode_is_keyed_by_phone() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/sms/manual-mode"))
            .and(body_json(serde_json::json!({
                "accountId": "acct", "phone": "+4790000001", "isManual": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        channel(&server)
            .set_manual_mode("acct", "+4790000001", true)
            .await
            .unwrap();
    }
}
