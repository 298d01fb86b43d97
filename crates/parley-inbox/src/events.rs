// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifications broadcast by an [`InboxSession`](crate::InboxSession).

use std::time::Duration;

use parley_core::{Channel, ConversationId};

/// Whether a refresh was requested by the operator or by a poll tick.
///
/// Explicit refreshes raise the loading flags; silent ones never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Explicit,
    Silent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboxEvent {
    /// The conversation list was replaced.
    ListRefreshed {
        conversations: usize,
        mode: RefreshMode,
    },
    /// The selected conversation's messages were replaced.
    MessagesRefreshed {
        conversation_id: ConversationId,
        messages: usize,
    },
    /// An upstream API asked us to back off.
    RateLimited { retry_after: Duration },
    /// One channel failed during a refresh; the others were still applied.
    ChannelDegraded { channel: Channel, error: String },
    SendFailed {
        conversation_id: ConversationId,
        local_id: Option<String>,
        error: String,
    },
    EscalationResolveFailed {
        conversation_id: ConversationId,
        error: String,
    },
}
