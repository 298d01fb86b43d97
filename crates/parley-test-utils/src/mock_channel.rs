// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable channel adapter for deterministic inbox tests.
//!
//! `MockChannel` serves canned conversations and messages, captures sends,
//! manual-mode toggles and presence signals, and can be told to fail or to
//! hold sends until released.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_core::{
    Channel, ChannelAdapter, ChannelCapabilities, Conversation, DeliveryStatus, HealthStatus,
    Message, ParleyError, PluginAdapter, PresenceAdapter, PresenceSnapshot, Role, SendResult,
};
use tokio::sync::{Mutex, watch};

/// How a scripted call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Transport-level channel error.
    Error,
    /// HTTP 429 with the given retry delay.
    RateLimited(Duration),
}

impl Failure {
    fn to_error(self, channel: Channel) -> ParleyError {
        match self {
            Failure::Error => ParleyError::channel(format!("{channel} backend unavailable")),
            Failure::RateLimited(retry_after) => ParleyError::RateLimited { retry_after },
        }
    }
}

/// One captured outbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub counterpart_ref: String,
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct State {
    conversations: Vec<Conversation>,
    messages: HashMap<String, Vec<Message>>,
    list_failure: Option<Failure>,
    send_failure: Option<Failure>,
    manual_mode_failure: Option<Failure>,
    send_status: Option<DeliveryStatus>,
    echo_sends: bool,
    sent: Vec<SentMessage>,
    manual_mode_calls: Vec<(String, bool)>,
    typing_calls: Vec<(String, bool)>,
    read_receipts: Vec<(String, DateTime<Utc>)>,
    presence: PresenceSnapshot,
    message_delays: HashMap<String, Duration>,
}

/// A mock [`ChannelAdapter`] (and [`PresenceAdapter`]) for one channel.
pub struct MockChannel {
    channel: Channel,
    capabilities: ChannelCapabilities,
    state: Arc<Mutex<State>>,
    send_gate: watch::Sender<bool>,
    list_calls: AtomicUsize,
    message_calls: AtomicUsize,
}

impl MockChannel {
    /// Creates a mock with the real capability set of `channel`.
    pub fn new(channel: Channel) -> Self {
        let capabilities = match channel {
            Channel::Sms => ChannelCapabilities {
                supports_manual_mode: true,
                supports_presence: false,
                reports_delivery_status: true,
                optimistic_send: false,
            },
            Channel::Widget => ChannelCapabilities {
                supports_manual_mode: true,
                supports_presence: true,
                reports_delivery_status: false,
                optimistic_send: true,
            },
            Channel::Messenger | Channel::Instagram => ChannelCapabilities {
                supports_manual_mode: true,
                supports_presence: false,
                reports_delivery_status: false,
                optimistic_send: true,
            },
            Channel::Email => ChannelCapabilities {
                supports_manual_mode: false,
                supports_presence: false,
                reports_delivery_status: false,
                optimistic_send: false,
            },
        };
        let (send_gate, _) = watch::channel(true);
        Self {
            channel,
            capabilities,
            state: Arc::new(Mutex::new(State::default())),
            send_gate,
            list_calls: AtomicUsize::new(0),
            message_calls: AtomicUsize::new(0),
        }
    }

    pub async fn set_conversations(&self, conversations: Vec<Conversation>) {
        self.state.lock().await.conversations = conversations;
    }

    pub async fn push_conversation(&self, conversation: Conversation) {
        self.state.lock().await.conversations.push(conversation);
    }

    pub async fn set_messages(&self, counterpart_ref: &str, messages: Vec<Message>) {
        self.state
            .lock()
            .await
            .messages
            .insert(counterpart_ref.to_string(), messages);
    }

    pub async fn push_message(&self, counterpart_ref: &str, message: Message) {
        self.state
            .lock()
            .await
            .messages
            .entry(counterpart_ref.to_string())
            .or_default()
            .push(message);
    }

    /// Makes `list_messages` for `counterpart_ref` sleep before answering.
    pub async fn delay_messages(&self, counterpart_ref: &str, delay: Duration) {
        self.state
            .lock()
            .await
            .message_delays
            .insert(counterpart_ref.to_string(), delay);
    }

    pub async fn fail_lists(&self, failure: Option<Failure>) {
        self.state.lock().await.list_failure = failure;
    }

    pub async fn fail_sends(&self, failure: Option<Failure>) {
        self.state.lock().await.send_failure = failure;
    }

    pub async fn fail_manual_mode(&self, failure: Option<Failure>) {
        self.state.lock().await.manual_mode_failure = failure;
    }

    /// Status reported by successful sends (defaults to `Sent`).
    pub async fn set_send_status(&self, status: DeliveryStatus) {
        self.state.lock().await.send_status = Some(status);
    }

    /// When enabled, every successful send is also stored as a server message.
    pub async fn echo_sends(&self, enabled: bool) {
        self.state.lock().await.echo_sends = enabled;
    }

    pub async fn set_presence(&self, presence: PresenceSnapshot) {
        self.state.lock().await.presence = presence;
    }

    /// Holds every send until [`release_sends`](Self::release_sends).
    pub fn hold_sends(&self) {
        self.send_gate.send_replace(false);
    }

    pub fn release_sends(&self) {
        self.send_gate.send_replace(true);
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.state.lock().await.sent.clone()
    }

    pub async fn manual_mode_calls(&self) -> Vec<(String, bool)> {
        self.state.lock().await.manual_mode_calls.clone()
    }

    pub async fn typing_calls(&self) -> Vec<(String, bool)> {
        self.state.lock().await.typing_calls.clone()
    }

    pub async fn read_receipts(&self) -> Vec<(String, DateTime<Utc>)> {
        self.state.lock().await.read_receipts.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn message_calls(&self) -> usize {
        self.message_calls.load(Ordering::SeqCst)
    }

    async fn wait_for_gate(&self) {
        let mut gate = self.send_gate.subscribe();
        // The sender lives as long as `self`, so this only errs during teardown.
        let _ = gate.wait_for(|open| *open).await;
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn capabilities(&self) -> ChannelCapabilities {
        self.capabilities
    }

    async fn list_conversations(&self, _account_id: &str) -> Result<Vec<Conversation>, ParleyError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        if let Some(failure) = state.list_failure {
            return Err(failure.to_error(self.channel));
        }
        Ok(state.conversations.clone())
    }

    async fn list_messages(
        &self,
        _account_id: &str,
        counterpart_ref: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError> {
        self.message_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, result) = {
            let state = self.state.lock().await;
            let result = match state.list_failure {
                Some(failure) => Err(failure.to_error(self.channel)),
                None => {
                    let messages = state
                        .messages
                        .get(counterpart_ref)
                        .cloned()
                        .unwrap_or_default();
                    let skip = messages.len().saturating_sub(limit);
                    Ok(messages.into_iter().skip(skip).collect())
                }
            };
            (state.message_delays.get(counterpart_ref).copied(), result)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
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
        _account_id: &str,
        counterpart_ref: &str,
        subject: Option<&str>,
        body: &str,
    ) -> Result<SendResult, ParleyError> {
        self.wait_for_gate().await;
        let mut state = self.state.lock().await;
        if let Some(failure) = state.send_failure {
            return Err(failure.to_error(self.channel));
        }
        state.sent.push(SentMessage {
            counterpart_ref: counterpart_ref.to_string(),
            subject: subject.map(str::to_string),
            body: body.to_string(),
        });
        let provider_message_id = format!("mock-msg-{}", state.sent.len());
        let status = state.send_status.unwrap_or(DeliveryStatus::Sent);
        if state.echo_sends {
            state
                .messages
                .entry(counterpart_ref.to_string())
                .or_default()
                .push(Message {
                    id: provider_message_id.clone(),
                    role: Role::Assistant,
                    content: body.to_string(),
                    timestamp: Utc::now(),
                    status: Some(status),
                    is_manual: Some(true),
                });
        }
        Ok(SendResult {
            status,
            provider_message_id: Some(provider_message_id),
        })
    }

    async fn set_manual_mode(
        &self,
        _account_id: &str,
        counterpart_ref: &str,
        is_manual: bool,
    ) -> Result<(), ParleyError> {
        if !self.capabilities.supports_manual_mode {
            return Err(ParleyError::Unsupported {
                channel: self.channel,
                operation: "manual mode",
            });
        }
        let mut state = self.state.lock().await;
        if let Some(failure) = state.manual_mode_failure {
            return Err(failure.to_error(self.channel));
        }
        state
            .manual_mode_calls
            .push((counterpart_ref.to_string(), is_manual));
        Ok(())
    }
}

#[async_trait]
impl PresenceAdapter for MockChannel {
    async fn send_typing(
        &self,
        _account_id: &str,
        counterpart_ref: &str,
        is_typing: bool,
    ) -> Result<(), ParleyError> {
        self.state
            .lock()
            .await
            .typing_calls
            .push((counterpart_ref.to_string(), is_typing));
        Ok(())
    }

    async fn send_read_receipt(
        &self,
        _account_id: &str,
        counterpart_ref: &str,
        read_at: DateTime<Utc>,
    ) -> Result<(), ParleyError> {
        self.state
            .lock()
            .await
            .read_receipts
            .push((counterpart_ref.to_string(), read_at));
        Ok(())
    }

    async fn fetch_presence(
        &self,
        _account_id: &str,
        _counterpart_ref: &str,
    ) -> Result<PresenceSnapshot, ParleyError> {
        Ok(self.state.lock().await.presence.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{conversation, message};

    #[tokio::test]
    async fn serves_scripted_conversations() {
        let mock = MockChannel::new(Channel::Sms);
        mock.push_conversation(conversation(Channel::Sms, "+4790000001").build())
            .await;
        let list = mock.list_conversations("acct").await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(mock.list_calls(), 1);
    }

    #[tokio::test]
    async fn scripted_failure_is_returned() {
        let mock = MockChannel::new(Channel::Messenger);
        mock.fail_lists(Some(Failure::RateLimited(Duration::from_secs(9))))
            .await;
        let err = mock.list_conversations("acct").await.unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(9)));
    }

    #[tokio::test]
    async fn messages_respect_limit_keeping_newest() {
        let mock = MockChannel::new(Channel::Widget);
        mock.set_messages(
            "s1",
            vec![
                message("1", Role::User, "a", 0),
                message("2", Role::User, "b", 1),
                message("3", Role::User, "c", 2),
            ],
        )
        .await;
        let messages = mock.list_messages("acct", "s1", 2).await.unwrap();
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["2", "3"]);
    }

    #[tokio::test]
    async fn sends_are_captured_and_echoed() {
        let mock = MockChannel::new(Channel::Widget);
        mock.echo_sends(true).await;
        mock.send("acct", "s1", "hello").await.unwrap();

        assert_eq!(mock.sent_messages().await[0].body, "hello");
        let stored = mock.list_messages("acct", "s1", 10).await.unwrap();
        assert_eq!(stored[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn email_mock_refuses_manual_mode() {
        let mock = MockChannel::new(Channel::Email);
        assert!(mock.set_manual_mode("acct", "a@b.c", true).await.is_err());
        assert!(mock.manual_mode_calls().await.is_empty());
    }
}
