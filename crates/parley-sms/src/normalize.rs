// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS provider payloads and their translation into the common shapes.

use chrono::{DateTime, Utc};
use parley_backend::wire;
use parley_core::{
    Channel, Conversation, ConversationId, Counterpart, DeliveryStatus, Message, Role,
};
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

/// One row of `GET /sms/conversations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsThread {
    pub phone_number: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub is_manual_mode: bool,
    #[serde(default)]
    pub last_direction: Option<Direction>,
}

/// One row of `GET /sms/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsRecord {
    pub id: String,
    pub direction: Direction,
    pub body: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sent_by_operator: Option<bool>,
}

/// Response of `POST /sms/send`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsSendResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Maps the SMS provider's status vocabulary onto [`DeliveryStatus`].
pub fn map_provider_status(status: &str) -> Option<DeliveryStatus> {
    match status.trim().to_ascii_lowercase().as_str() {
        "queued" | "accepted" | "scheduled" | "sending" | "pending" => {
            Some(DeliveryStatus::Pending)
        }
        "sent" => Some(DeliveryStatus::Sent),
        "delivered" | "read" => Some(DeliveryStatus::Delivered),
        "failed" | "undelivered" | "canceled" => Some(DeliveryStatus::Failed),
        _ => None,
    }
}

pub fn to_conversation(thread: SmsThread) -> Option<Conversation> {
    let id = ConversationId::derive(Channel::Sms, &thread.phone_number);
    let Some((_, phone)) = id.parse() else {
        warn!(raw = %thread.phone_number, "skipping SMS thread without a usable phone number");
        return None;
    };
    let phone = phone.to_string();

    Some(Conversation {
        id,
        channel: Channel::Sms,
        counterpart: Counterpart::new(thread.customer_name, phone),
        last_message: thread.last_message,
        last_message_at: thread.last_message_at,
        message_count: thread.message_count,
        is_manual_mode: thread.is_manual_mode,
        last_message_role: thread.last_direction.map(Role::from),
        subject: None,
        escalation: None,
    })
}

pub fn to_message(record: SmsRecord) -> Message {
    let role = Role::from(record.direction);
    Message {
        id: record.id,
        role,
        content: record.body,
        timestamp: record.created_at,
        status: record.status.as_deref().and_then(map_provider_status),
        is_manual: match role {
            Role::Assistant => record.sent_by_operator,
            Role::User => None,
        },
    }
}
