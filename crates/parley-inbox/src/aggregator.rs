// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out over all channel adapters, merged into one ordered list.
//!
//! Every adapter is queried concurrently together with the escalation
//! backend. A failing channel contributes nothing and is reported in
//! [`RefreshReport::failures`]; the remaining channels are still merged.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parley_core::{Channel, Conversation, ConversationId, Escalation, EscalationBackend};
use tracing::{debug, warn};

use crate::registry::ChannelRegistry;

/// One channel that failed during a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFailure {
    pub channel: Channel,
    pub error: String,
    /// Set when the failure was an upstream rate limit.
    pub retry_after: Option<Duration>,
}

/// Result of one aggregated refresh.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Merged conversations, newest first.
    pub conversations: Vec<Conversation>,
    pub failures: Vec<ChannelFailure>,
    /// Largest retry delay requested by any rate-limited channel.
    pub rate_limited: Option<Duration>,
}

impl RefreshReport {
    /// Whether every channel failed.
    pub fn is_total_failure(&self, channels: usize) -> bool {
        channels > 0 && self.failures.len() >= channels
    }
}

/// Queries every registered channel and merges their threads.
#[derive(Clone)]
pub struct Aggregator {
    registry: ChannelRegistry,
    escalations: Option<Arc<dyn EscalationBackend>>,
}

impl Aggregator {
    pub fn new(registry: ChannelRegistry, escalations: Option<Arc<dyn EscalationBackend>>) -> Self {
        Self {
            registry,
            escalations,
        }
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub async fn refresh(&self, account_id: &str) -> RefreshReport {
        let lists = join_all(self.registry.adapters().map(|adapter| {
            let adapter = Arc::clone(adapter);
            async move {
                let channel = adapter.channel();
                (channel, adapter.list_conversations(account_id).await)
            }
        }));
        let escalations = async {
            match &self.escalations {
                Some(backend) => match backend.list_escalations(account_id).await {
                    Ok(escalations) => escalations,
                    Err(e) => {
                        warn!(error = %e, "escalation lookup failed, continuing without");
                        Vec::new()
                    }
                },
                None => Vec::new(),
            }
        };
        let (lists, escalations) = futures::join!(lists, escalations);

        let mut report = RefreshReport::default();
        let mut all = Vec::new();
        for (channel, result) in lists {
            match result {
                Ok(conversations) => {
                    debug!(channel = %channel, count = conversations.len(), "channel refreshed");
                    all.extend(conversations);
                }
                Err(e) => {
                    warn!(channel = %channel, error = %e, "channel refresh failed");
                    let retry_after = e.retry_after();
                    if let Some(delay) = retry_after {
                        report.rate_limited = Some(report.rate_limited.map_or(delay, |d| d.max(delay)));
                    }
                    report.failures.push(ChannelFailure {
                        channel,
                        error: e.to_string(),
                        retry_after,
                    });
                }
            }
        }

        report.conversations = merge(all, escalations);
        report
    }
}

/// Attaches escalations, removes duplicate ids and orders the list.
///
/// An attached escalation puts its conversation in manual mode even when
/// the channel's own flag has not caught up yet. For duplicate ids the entry with the newest `last_message_at` wins. The
/// result is sorted newest first with ties broken by id.
pub fn merge(conversations: Vec<Conversation>, escalations: Vec<Escalation>) -> Vec<Conversation> {
    let mut by_id: HashMap<ConversationId, Conversation> = HashMap::with_capacity(conversations.len());
    for conversation in conversations {
        match by_id.get(&conversation.id) {
            Some(existing) if existing.last_message_at >= conversation.last_message_at => {}
            _ => {
                by_id.insert(conversation.id.clone(), conversation);
            }
        }
    }

    for escalation in escalations {
        match by_id.get_mut(&escalation.conversation_id) {
            Some(conversation) => {
                // Keep the most recent open escalation.
                let newer = conversation
                    .escalation
                    .as_ref()
                    .is_none_or(|e| e.created_at < escalation.created_at);
                if newer {
                    conversation.escalation = Some(escalation);
                }
                conversation.is_manual_mode = true;
            }
            None => {
                debug!(conversation = %escalation.conversation_id, "escalation for unknown conversation");
            }
        }
    }

    let mut merged: Vec<Conversation> = by_id.into_values().collect();
    merged.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    merged
}
