// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email thread documents and their translation into the common shapes.

use chrono::{DateTime, Utc};
use parley_backend::wire;
use parley_core::{Channel, Conversation, ConversationId, Counterpart, Message, Role};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl From<Direction> for Role {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Inbound => Role::User,
            Direction::Outbound => Role::Assistant,
        }
    }
}

/// One row of `GET /email/conversations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailThread {
    pub email: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub last_direction: Option<Direction>,
}

/// One row of `GET /email/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub id: String,
    pub direction: Direction,
    #[serde(default)]
    pub body: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub sent_at: DateTime<Utc>,
}

pub fn to_conversation(thread: EmailThread) -> Option<Conversation> {
    let id = ConversationId::derive(Channel::Email, &thread.email);
    let Some((_, address)) = id.parse() else {
        warn!("skipping email thread without an address");
        return None;
    };
    let address = address.to_string();
    let subject = thread
        .subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Some(Conversation {
        id,
        channel: Channel::Email,
        counterpart: Counterpart::new(thread.customer_name, address),
        last_message: thread.last_message,
        last_message_at: thread.last_message_at,
        message_count: thread.message_count,
        // No automated replier on email: every thread is operator-handled.
        is_manual_mode: true,
        last_message_role: thread.last_direction.map(Role::from),
        subject,
        escalation: None,
    })
}

pub fn to_message(record: EmailRecord) -> Message {
    let role = Role::from(record.direction);
    Message {
        id: record.id,
        role,
        content: record.body,
        timestamp: record.sent_at,
        status: None,
        is_manual: match role {
            Role::Assistant => Some(true),
            Role::User => None,
        },
    }
}

/// Subject line for a reply: the thread subject with a single `Re:` prefix.
pub fn reply_subject(subject: Option<&str>) -> String {
    let subject = subject.map(str::trim).unwrap_or_default();
    if subject.is_empty() {
        return "Re:".to_string();
    }
    let has_prefix = subject
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"));
    if has_prefix {
        subject.to_string()
    } else {
        format!("Re: {subject}")
    }
}
