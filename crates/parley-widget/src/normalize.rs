// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Widget session documents and their translation into the common shapes.

use chrono::{DateTime, Utc};
use parley_backend::wire;
use parley_core::{
    Channel, Conversation, ConversationId, Counterpart, Message, PresenceSnapshot, Role,
};
use serde::Deserialize;
use tracing::warn;

/// A widget chat session as stored by the dashboard.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSession {
    pub session_id: String,
    #[serde(default)]
    pub visitor_name: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub last_message_time: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub is_manual_mode: bool,
    #[serde(default)]
    pub last_message_role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_manual: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetPresence {
    #[serde(default, deserialize_with = "wire::optional_timestamp")]
    pub customer_typing_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "wire::optional_timestamp")]
    pub customer_read_at: Option<DateTime<Utc>>,
}

pub fn to_conversation(session: WidgetSession) -> Option<Conversation> {
    let session_id = session.session_id.trim();
    if session_id.is_empty() {
        warn!("skipping widget session without an id");
        return None;
    }

    // Anonymous visitors get a short label instead of the raw session id.
    let display_name = session.visitor_name.or_else(|| {
        let short: String = session_id.chars().take(6).collect();
        Some(format!("Visitor {short}"))
    });

    Some(Conversation {
        id: ConversationId::derive(Channel::Widget, session_id),
        channel: Channel::Widget,
        counterpart: Counterpart::new(display_name, session_id),
        last_message: session.last_message,
        last_message_at: session.last_message_time,
        message_count: session.message_count,
        is_manual_mode: session.is_manual_mode,
        last_message_role: session.last_message_role,
        subject: None,
        escalation: None,
    })
}

pub fn to_message(message: WidgetMessage) -> Message {
    Message {
        id: message.id,
        role: message.role,
        content: message.content,
        timestamp: message.timestamp,
        status: None,
        is_manual: message.is_manual,
    }
}

impl From<WidgetPresence> for PresenceSnapshot {
    fn from(p: WidgetPresence) -> Self {
        PresenceSnapshot {
            customer_typing_at: p.customer_typing_at,
            customer_read_at: p.customer_read_at,
        }
    }
}
