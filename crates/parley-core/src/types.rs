// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by channel adapters and the inbox core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::id::ConversationId;

/// A messaging surface the inbox ingests from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Sms,
    Widget,
    Messenger,
    Instagram,
    Email,
}

impl Channel {
    /// All channels in display order.
    pub const ALL: [Channel; 5] = [
        Channel::Sms,
        Channel::Widget,
        Channel::Messenger,
        Channel::Instagram,
        Channel::Email,
    ];
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// The customer.
    User,
    /// The automated agent or a human operator replying on its behalf.
    Assistant,
}

/// Delivery state of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
}

/// Who is authoritative for replies in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ControlMode {
    Automated,
    Manual,
}

/// The other party of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterpart {
    /// Human-readable name; falls back to the address when the provider has none.
    pub display_name: String,
    /// Channel routing reference: phone number, widget session id, sender id or email.
    pub address: String,
}

impl Counterpart {
    pub fn new(display_name: Option<String>, address: impl Into<String>) -> Self {
        let address = address.into();
        let display_name = display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| address.clone());
        Self {
            display_name,
            address,
        }
    }
}

/// Backend record marking that a customer asked to speak to a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub id: String,
    pub conversation_id: ConversationId,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A normalized thread with one counterpart on one channel.
///
/// Adapters produce conversations with `escalation` unset; the aggregator
/// attaches unresolved escalations after merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub channel: Channel,
    pub counterpart: Counterpart,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub message_count: u32,
    pub is_manual_mode: bool,
    pub last_message_role: Option<Role>,
    /// Email subject line; `None` for chat channels.
    pub subject: Option<String>,
    pub escalation: Option<Escalation>,
}

impl Conversation {
    /// The customer sent the last message while a human is in charge.
    ///
    /// Always derived from `is_manual_mode` and `last_message_role`, never stored.
    pub fn awaiting_reply(&self) -> bool {
        self.is_manual_mode && self.last_message_role == Some(Role::User)
    }

    /// Effective control mode. A pending escalation forces manual semantics
    /// even when the stored flag has not caught up yet.
    pub fn control_mode(&self) -> ControlMode {
        if self.is_manual_mode || self.escalation.is_some() {
            ControlMode::Manual
        } else {
            ControlMode::Automated
        }
    }

    /// Records an outbound reply in the conversation summary.
    pub fn record_outbound(&mut self, body: &str, at: DateTime<Utc>) {
        self.last_message = body.to_string();
        self.last_message_at = at;
        self.last_message_role = Some(Role::Assistant);
        self.message_count = self.message_count.saturating_add(1);
    }
}

/// Prefix of ids assigned to optimistic, not yet confirmed messages.
pub const LOCAL_MESSAGE_PREFIX: &str = "local-";

/// One inbound or outbound item within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: Option<DeliveryStatus>,
    /// `Some(true)` when a human operator authored the message.
    pub is_manual: Option<bool>,
}

impl Message {
    /// Whether this message was appended locally and has no server id yet.
    pub fn is_local(&self) -> bool {
        self.id.starts_with(LOCAL_MESSAGE_PREFIX)
    }
}

/// Outcome of an outbound send as reported by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub status: DeliveryStatus,
    pub provider_message_id: Option<String>,
}

/// Operations and behaviors a channel offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCapabilities {
    /// Supports toggling between automated and manual replies.
    pub supports_manual_mode: bool,
    /// Propagates typing indicators and read receipts.
    pub supports_presence: bool,
    /// Send results carry a meaningful delivery status.
    pub reports_delivery_status: bool,
    /// Outbound messages are appended locally before the network confirms them.
    pub optimistic_send: bool,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Customer-side presence markers for a widget conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    pub customer_typing_at: Option<DateTime<Utc>>,
    pub customer_read_at: Option<DateTime<Utc>>,
}

/// Persisted read marker for one operator on one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadState {
    pub conversation_id: ConversationId,
    pub operator_id: String,
    pub last_read_at: DateTime<Utc>,
}

/// Which part of an email thread to summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum SummaryMode {
    /// Only the most recent inbound message.
    #[serde(rename = "last")]
    #[strum(serialize = "last")]
    LastInbound,
    /// The whole thread.
    #[serde(rename = "conversation")]
    #[strum(serialize = "conversation")]
    WholeThread,
}

/// Conversation context handed to the reply assistant.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    pub conversation_id: ConversationId,
    pub address: String,
    pub subject: Option<String>,
    pub messages: Vec<Message>,
}
