// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messenger and Instagram thread documents.
//!
//! Both platforms share one wire shape; only the path prefix and the
//! resulting [`Channel`] differ.

use chrono::{DateTime, Utc};
use parley_backend::wire;
use parley_core::{Channel, Conversation, ConversationId, Counterpart, Message, Role};
use serde::Deserialize;
use tracing::warn;

/// Author of a platform message: the customer or the business page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Page,
}

impl From<Sender> for Role {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => Role::User,
            Sender::Page => Role::Assistant,
        }
    }
}

/// One row of `GET /<platform>/conversations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaThread {
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub last_message_time: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub is_manual_mode: bool,
    #[serde(default)]
    pub last_message_from: Option<Sender>,
}

/// One row of `GET /<platform>/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaMessage {
    pub id: String,
    pub from: Sender,
    #[serde(default)]
    pub text: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub is_manual: Option<bool>,
}

pub fn to_conversation(channel: Channel, thread: MetaThread) -> Option<Conversation> {
    let sender_id = thread.sender_id.trim();
    if sender_id.is_empty() {
        warn!(channel = %channel, "skipping thread without a sender id");
        return None;
    }

    Some(Conversation {
        id: ConversationId::derive(channel, sender_id),
        channel,
        counterpart: Counterpart::new(thread.sender_name, sender_id),
        last_message: thread.last_message,
        last_message_at: thread.last_message_time,
        message_count: thread.message_count,
        is_manual_mode: thread.is_manual_mode,
        last_message_role: thread.last_message_from.map(Role::from),
        subject: None,
        escalation: None,
    })
}

pub fn to_message(message: MetaMessage) -> Message {
    let role = Role::from(message.from);
    Message {
        id: message.id,
        role,
        content: message.text,
        timestamp: message.created_time,
        status: None,
        is_manual: match role {
            Role::Assistant => message.is_manual,
            Role::User => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_millis_thread_is_normalized() {
        let thread: MetaThread = serde_json::from_value(serde_json::json!({
            "senderId": " 2710345 ",
            "senderName": "Kari N.",
            "lastMessage": "Er dere åpne?",
            "lastMessageTime": 1772355600000i64,
            "isManualMode": true,
            "lastMessageFrom": "user"
        }))
        .unwrap();

        let conv = to_conversation(Channel::Instagram, thread).unwrap();
        assert_eq!(conv.id.as_str(), "instagram-2710345");
        assert_eq!(conv.channel, Channel::Instagram);
        assert_eq!(conv.counterpart.display_name, "Kari N.");
        assert!(conv.awaiting_reply());
    }

    #[test]
    fn page_messages_map_to_assistant() {
        let message: MetaMessage = serde_json::from_value(serde_json::json!({
            "id": "mid.1",
            "from": "page",
            "text": "Ja, til 17.",
            "createdTime": "2026-03-01T09:00:00Z",
            "isManual": true
        }))
        .unwrap();

        let message = to_message(message);
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.is_manual, Some(true));
    }

    #[test]
    fn missing_sender_is_skipped() {
        let thread: MetaThread = serde_json::from_value(serde_json::json!({
            "senderId": "",
            "lastMessageTime": "2026-03-01T09:00:00Z"
        }))
        .unwrap();
        assert!(to_conversation(Channel::Messenger, thread).is_none());
    }
}
