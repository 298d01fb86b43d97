// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator replies: validation, optimistic append, dispatch, and
//! reconciliation with re-fetched server messages.
//!
//! Widget, Messenger and Instagram replies appear in the thread before the
//! network call returns. SMS and email replies are appended only after the
//! channel confirms them, with the status the provider reported.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parley_core::{
    ChannelAdapter, Conversation, ConversationId, DeliveryStatus, Message, Role,
    LOCAL_MESSAGE_PREFIX,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::error::SendError;
use crate::events::InboxEvent;
use crate::registry::ChannelRegistry;
use crate::state::SharedState;

/// The message a successful send added to the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub conversation_id: ConversationId,
    pub message: Message,
}

/// Placeholder for an operator reply that has not been confirmed yet.
pub fn pending_message(body: &str, at: DateTime<Utc>) -> Message {
    Message {
        id: format!("{LOCAL_MESSAGE_PREFIX}{}", uuid::Uuid::new_v4()),
        role: Role::Assistant,
        content: body.to_string(),
        timestamp: at,
        status: Some(DeliveryStatus::Pending),
        is_manual: Some(true),
    }
}

/// Combines a fresh server fetch with the local thread.
///
/// The fetched list is taken as is and never reordered. A local placeholder
/// that is pending or sent is dropped when the fetch contains a newly seen
/// assistant message with the same content; each server message absorbs at
/// most one placeholder, oldest first. Remaining placeholders (including
/// failed ones) are inserted at their timestamp position.
pub fn merge_messages(current: &[Message], fetched: Vec<Message>) -> Vec<Message> {
    let known: HashSet<&str> = current
        .iter()
        .filter(|m| !m.is_local())
        .map(|m| m.id.as_str())
        .collect();
    let mut claimed = vec![false; fetched.len()];
    let mut kept = Vec::new();

    for local in current.iter().filter(|m| m.is_local()) {
        let replaceable = local.status != Some(DeliveryStatus::Failed);
        let matched = replaceable
            .then(|| {
                fetched.iter().enumerate().position(|(i, m)| {
                    !claimed[i]
                        && m.role == Role::Assistant
                        && !known.contains(m.id.as_str())
                        && m.content == local.content
                })
            })
            .flatten();
        match matched {
            Some(i) => claimed[i] = true,
            None => kept.push(local.clone()),
        }
    }

    let mut merged = fetched;
    for local in kept {
        let at = merged.partition_point(|m| m.timestamp <= local.timestamp);
        merged.insert(at, local);
    }
    merged
}

/// Clears the in-flight flag when the send that set it finishes.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sends operator replies for one inbox session.
///
/// At most one send runs at a time; a second call while one is in flight
/// fails with [`SendError::InFlight`].
#[derive(Clone)]
pub struct OutboundPipeline {
    account_id: String,
    registry: ChannelRegistry,
    state: SharedState,
    events: broadcast::Sender<InboxEvent>,
    in_flight: Arc<AtomicBool>,
}

impl OutboundPipeline {
    pub(crate) fn new(
        account_id: impl Into<String>,
        registry: ChannelRegistry,
        state: SharedState,
        events: broadcast::Sender<InboxEvent>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            registry,
            state,
            events,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn send_message(
        &self,
        conversation_id: &ConversationId,
        body: &str,
    ) -> Result<SendReceipt, SendError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(SendError::EmptyBody);
        }
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SendError::InFlight)?;

        let conversation = self
            .state
            .lock()
            .await
            .conversation(conversation_id)
            .cloned()
            .ok_or_else(|| SendError::NoSuchConversation(conversation_id.clone()))?;
        let adapter = self.adapter_for(&conversation)?;

        if adapter.capabilities().optimistic_send {
            self.send_optimistic(adapter, &conversation, body).await
        } else {
            self.send_confirmed(adapter, &conversation, body).await
        }
    }

    /// Re-dispatches a failed optimistic message in place.
    pub async fn retry_send(&self, local_id: &str) -> Result<SendReceipt, SendError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SendError::InFlight)?;

        let (conversation, body) = {
            let mut state = self.state.lock().await;
            let selected = state
                .selected
                .clone()
                .ok_or_else(|| SendError::UnknownMessage(local_id.to_string()))?;
            let conversation = state
                .conversation(&selected)
                .cloned()
                .ok_or(SendError::NoSuchConversation(selected))?;
            let message = state
                .messages
                .iter_mut()
                .find(|m| m.id == local_id && m.is_local() && m.status == Some(DeliveryStatus::Failed))
                .ok_or_else(|| SendError::UnknownMessage(local_id.to_string()))?;
            message.status = Some(DeliveryStatus::Pending);
            (conversation, message.content.clone())
        };

        let adapter = self.adapter_for(&conversation)?;
        self.dispatch_local(adapter, &conversation, local_id.to_string(), &body)
            .await
    }

    fn adapter_for(&self, conversation: &Conversation) -> Result<Arc<dyn ChannelAdapter>, SendError> {
        self.registry
            .get(conversation.channel)
            .cloned()
            .ok_or(SendError::ChannelUnavailable(conversation.channel))
    }

    async fn send_optimistic(
        &self,
        adapter: Arc<dyn ChannelAdapter>,
        conversation: &Conversation,
        body: &str,
    ) -> Result<SendReceipt, SendError> {
        let now = Utc::now();
        let local = pending_message(body, now);
        let local_id = local.id.clone();
        {
            let mut state = self.state.lock().await;
            if state.is_selected(&conversation.id) {
                state.messages.push(local);
            }
            if let Some(c) = state.conversation_mut(&conversation.id) {
                c.record_outbound(body, now);
            }
        }
        self.dispatch_local(adapter, conversation, local_id, body).await
    }

    async fn dispatch_local(
        &self,
        adapter: Arc<dyn ChannelAdapter>,
        conversation: &Conversation,
        local_id: String,
        body: &str,
    ) -> Result<SendReceipt, SendError> {
        let result = adapter
            .send_reply(
                &self.account_id,
                &conversation.counterpart.address,
                conversation.subject.as_deref(),
                body,
            )
            .await;

        match result {
            Ok(sent) => {
                let message = self
                    .set_local_status(&local_id, sent.status)
                    .await
                    .unwrap_or_else(|| Message {
                        id: local_id,
                        status: Some(sent.status),
                        ..pending_message(body, Utc::now())
                    });
                info!(conversation = %conversation.id, channel = %conversation.channel, "reply sent");
                Ok(SendReceipt {
                    conversation_id: conversation.id.clone(),
                    message,
                })
            }
            Err(e) => {
                self.set_local_status(&local_id, DeliveryStatus::Failed).await;
                self.report_failure(&conversation.id, Some(&local_id), &e.to_string());
                Err(SendError::failed(Some(local_id), e))
            }
        }
    }

    async fn send_confirmed(
        &self,
        adapter: Arc<dyn ChannelAdapter>,
        conversation: &Conversation,
        body: &str,
    ) -> Result<SendReceipt, SendError> {
        let result = adapter
            .send_reply(
                &self.account_id,
                &conversation.counterpart.address,
                conversation.subject.as_deref(),
                body,
            )
            .await;

        let sent = match result {
            Ok(sent) => sent,
            Err(e) => {
                self.report_failure(&conversation.id, None, &e.to_string());
                return Err(SendError::failed(None, e));
            }
        };

        let now = Utc::now();
        let mut message = pending_message(body, now);
        message.status = Some(sent.status);
        if let Some(id) = sent.provider_message_id {
            message.id = id;
        }
        {
            let mut state = self.state.lock().await;
            if state.is_selected(&conversation.id) {
                state.messages.push(message.clone());
            }
            if let Some(c) = state.conversation_mut(&conversation.id) {
                c.record_outbound(body, now);
            }
        }
        info!(
            conversation = %conversation.id,
            channel = %conversation.channel,
            status = %sent.status,
            "reply sent"
        );
        Ok(SendReceipt {
            conversation_id: conversation.id.clone(),
            message,
        })
    }

    async fn set_local_status(&self, local_id: &str, status: DeliveryStatus) -> Option<Message> {
        let mut state = self.state.lock().await;
        let message = state.messages.iter_mut().find(|m| m.id == local_id)?;
        message.status = Some(status);
        Some(message.clone())
    }

    fn report_failure(&self, conversation_id: &ConversationId, local_id: Option<&str>, error: &str) {
        warn!(conversation = %conversation_id, error = %error, "reply failed");
        let _ = self.events.send(InboxEvent::SendFailed {
            conversation_id: conversation_id.clone(),
            local_id: local_id.map(str::to_string),
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Channel;
    use parley_test_utils::fixtures::{at, conversation, message};
    use parley_test_utils::{Failure, MockChannel};
    use tokio::sync::Mutex;

    use crate::state::InboxState;

    fn local(content: &str, minutes: i64, status: DeliveryStatus) -> Message {
        Message {
            status: Some(status),
            ..pending_message(content, at(minutes))
        }
    }

    async fn pipeline(
        mock: Arc<MockChannel>,
        conv: Conversation,
    ) -> (OutboundPipeline, SharedState) {
        let mut registry = ChannelRegistry::new();
        registry.register(mock);
        let state: SharedState = Arc::new(Mutex::new(InboxState {
            selected: Some(conv.id.clone()),
            conversations: vec![conv],
            ..Default::default()
        }));
        let (tx, _) = broadcast::channel(16);
        (
            OutboundPipeline::new("acct", registry, Arc::clone(&state), tx),
            state,
        )
    }

    #[test]
    fn fetched_echo_replaces_pending_placeholder() {
        let current = vec![
            message("m1", Role::User, "hei", 0),
            local("Hei! Hva kan jeg hjelpe med?", 1, DeliveryStatus::Sent),
        ];
        let fetched = vec![
            message("m1", Role::User, "hei", 0),
            message("m2", Role::Assistant, "Hei! Hva kan jeg hjelpe med?", 1),
        ];
        let merged = merge_messages(&current, fetched);
        let ids: Vec<_> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);
    }

    #[test]
    fn old_identical_reply_does_not_absorb_placeholder() {
        let current = vec![
            message("m1", Role::Assistant, "Takk!", 0),
            local("Takk!", 5, DeliveryStatus::Pending),
        ];
        let fetched = vec![message("m1", Role::Assistant, "Takk!", 0)];
        let merged = merge_messages(&current, fetched);
        assert_eq!(merged.len(), 2);
        assert!(merged[1].is_local());
    }

    #[test]
    fn failed_placeholder_survives_and_keeps_position() {
        let current = vec![
            message("m1", Role::User, "a", 0),
            local("retry me", 2, DeliveryStatus::Failed),
        ];
        let fetched = vec![
            message("m1", Role::User, "a", 0),
            message("m3", Role::User, "b", 4),
        ];
        let merged = merge_messages(&current, fetched);
        let contents: Vec<_> = merged.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["a", "retry me", "b"]);
    }

    #[test]
    fn one_server_message_absorbs_one_placeholder() {
        let current = vec![
            local("ok", 1, DeliveryStatus::Sent),
            local("ok", 2, DeliveryStatus::Pending),
        ];
        let fetched = vec![message("s1", Role::Assistant, "ok", 1)];
        let merged = merge_messages(&current, fetched);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "s1");
        assert!(merged[1].is_local());
    }

    #[tokio::test]
    async fn empty_body_is_rejected_without_dispatch() {
        let mock = Arc::new(MockChannel::new(Channel::Widget));
        let conv = conversation(Channel::Widget, "s1").build();
        let id = conv.id.clone();
        let (pipeline, _) = pipeline(Arc::clone(&mock), conv).await;

        assert!(matches!(
            pipeline.send_message(&id, "  \n\t").await,
            Err(SendError::EmptyBody)
        ));
        assert!(mock.sent_messages().await.is_empty());
    }

    #[tokio::test]
    async fn optimistic_failure_keeps_failed_message_for_retry() {
        let mock = Arc::new(MockChannel::new(Channel::Messenger));
        mock.fail_sends(Some(Failure::Error)).await;
        let conv = conversation(Channel::Messenger, "psid").build();
        let id = conv.id.clone();
        let (pipeline, state) = pipeline(Arc::clone(&mock), conv).await;

        let err = pipeline.send_message(&id, "Hallo").await.unwrap_err();
        let SendError::Failed {
            local_id: Some(local_id),
            retryable,
            ..
        } = err
        else {
            panic!("expected a failed optimistic send");
        };
        assert!(retryable);
        assert_eq!(
            state.lock().await.messages[0].status,
            Some(DeliveryStatus::Failed)
        );

        mock.fail_sends(None).await;
        let receipt = pipeline.retry_send(&local_id).await.unwrap();
        assert_eq!(receipt.message.id, local_id);
        assert_eq!(receipt.message.status, Some(DeliveryStatus::Sent));
        assert_eq!(state.lock().await.messages.len(), 1);
    }

    #[tokio::test]
    async fn sms_is_appended_after_dispatch_with_provider_status() {
        let mock = Arc::new(MockChannel::new(Channel::Sms));
        mock.set_send_status(DeliveryStatus::Pending).await;
        let conv = conversation(Channel::Sms, "+4790000001").build();
        let id = conv.id.clone();
        let (pipeline, state) = pipeline(Arc::clone(&mock), conv).await;

        let receipt = pipeline.send_message(&id, "Hei").await.unwrap();

        assert_eq!(receipt.message.status, Some(DeliveryStatus::Pending));
        assert_eq!(receipt.message.id, "mock-msg-1");
        let state = state.lock().await;
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.conversations[0].last_message, "Hei");
    }

    #[tokio::test]
    async fn failed_sms_appends_nothing() {
        let mock = Arc::new(MockChannel::new(Channel::Sms));
        mock.fail_sends(Some(Failure::Error)).await;
        let conv = conversation(Channel::Sms, "+4790000001").build();
        let id = conv.id.clone();
        let (pipeline, state) = pipeline(Arc::clone(&mock), conv).await;

        let err = pipeline.send_message(&id, "Hei").await.unwrap_err();
        assert!(matches!(err, SendError::Failed { local_id: None, .. }));
        assert!(state.lock().await.messages.is_empty());
    }

    #[tokio::test]
    async fn email_reply_carries_thread_subject() {
        let mock = Arc::new(MockChannel::new(Channel::Email));
        let conv = conversation(Channel::Email, "kari@example.no")
            .subject("Faktura")
            .build();
        let id = conv.id.clone();
        let (pipeline, _) = pipeline(Arc::clone(&mock), conv).await;

        pipeline.send_message(&id, "Vedlagt.").await.unwrap();

        let sent = mock.sent_messages().await;
        assert_eq!(sent[0].subject.as_deref(), Some("Faktura"));
    }

    #[tokio::test]
    async fn second_send_while_in_flight_is_rejected() {
        let mock = Arc::new(MockChannel::new(Channel::Widget));
        mock.hold_sends();
        let conv = conversation(Channel::Widget, "s1").build();
        let id = conv.id.clone();
        let (pipeline, _) = pipeline(Arc::clone(&mock), conv).await;

        let first = {
            let pipeline = pipeline.clone();
            let id = id.clone();
            tokio::spawn(async move { pipeline.send_message(&id, "one").await })
        };
        while !pipeline.is_sending() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            pipeline.send_message(&id, "two").await,
            Err(SendError::InFlight)
        ));

        mock.release_sends();
        first.await.unwrap().unwrap();
        assert!(!pipeline.is_sending());
    }
}
