// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for normalized conversations and messages.

use chrono::{DateTime, Duration, TimeZone, Utc};
use parley_core::{
    Channel, Conversation, ConversationId, Counterpart, DeliveryStatus, Escalation, Message, Role,
};

/// Fixed reference instant so fixtures sort deterministically.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `base_time()` plus `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(minutes)
}

/// Builder for a [`Conversation`] fixture.
#[derive(Debug, Clone)]
pub struct ConversationBuilder {
    conversation: Conversation,
}

impl ConversationBuilder {
    pub fn new(channel: Channel, counterpart_ref: &str) -> Self {
        let id = ConversationId::derive(channel, counterpart_ref);
        let address = id
            .parse()
            .map(|(_, r)| r.to_string())
            .unwrap_or_else(|| counterpart_ref.to_string());
        Self {
            conversation: Conversation {
                id,
                channel,
                counterpart: Counterpart::new(None, address),
                last_message: String::new(),
                last_message_at: base_time(),
                message_count: 0,
                is_manual_mode: false,
                last_message_role: None,
                subject: None,
                escalation: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.conversation.counterpart.display_name = name.to_string();
        self
    }

    pub fn last_message(mut self, text: &str, role: Role, minutes: i64) -> Self {
        self.conversation.last_message = text.to_string();
        self.conversation.last_message_role = Some(role);
        self.conversation.last_message_at = at(minutes);
        self.conversation.message_count = self.conversation.message_count.max(1);
        self
    }

    pub fn manual(mut self, is_manual: bool) -> Self {
        self.conversation.is_manual_mode = is_manual;
        self
    }

    /// Manual mode with the customer speaking last.
    pub fn awaiting(self, text: &str, minutes: i64) -> Self {
        self.manual(true).last_message(text, Role::User, minutes)
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.conversation.subject = Some(subject.to_string());
        self
    }

    pub fn message_count(mut self, count: u32) -> Self {
        self.conversation.message_count = count;
        self
    }

    pub fn build(self) -> Conversation {
        self.conversation
    }
}

pub fn conversation(channel: Channel, counterpart_ref: &str) -> ConversationBuilder {
    ConversationBuilder::new(channel, counterpart_ref)
}

pub fn message(id: &str, role: Role, content: &str, minutes: i64) -> Message {
    Message {
        id: id.to_string(),
        role,
        content: content.to_string(),
        timestamp: at(minutes),
        status: match role {
            Role::Assistant => Some(DeliveryStatus::Sent),
            Role::User => None,
        },
        is_manual: None,
    }
}

pub fn escalation(conversation_id: &ConversationId, minutes: i64) -> Escalation {
    Escalation {
        id: format!("esc-{conversation_id}"),
        conversation_id: conversation_id.clone(),
        reason: Some("customer asked for a human".to_string()),
        created_at: at(minutes),
    }
}
