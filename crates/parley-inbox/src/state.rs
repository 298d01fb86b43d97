// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mutable state shared between the session, its poll tasks and the
//! outbound pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_core::{Conversation, ConversationId, Message};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Loading and error flags for UI consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadState {
    /// An explicit list refresh is running.
    pub list_loading: bool,
    /// An explicit message fetch for the selected conversation is running.
    pub messages_loading: bool,
    /// Error text of the last refresh in which every channel failed.
    pub last_error: Option<String>,
    /// Retry delay from the most recent rate-limited refresh, if still active.
    pub rate_limited: Option<Duration>,
}

#[derive(Debug, Default)]
pub(crate) struct InboxState {
    pub conversations: Vec<Conversation>,
    pub selected: Option<ConversationId>,
    /// Messages of the selected conversation, oldest first.
    pub messages: Vec<Message>,
    pub load: LoadState,
    pub read_marks: HashMap<ConversationId, DateTime<Utc>>,
    /// Sequence numbers of the last applied responses.
    pub list_applied: u64,
    pub messages_applied: u64,
    /// Silent polls are skipped until this instant after a rate limit.
    pub backoff_until: Option<Instant>,
}

impl InboxState {
    pub fn conversation(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn conversation_mut(&mut self, id: &ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| &c.id == id)
    }

    pub fn is_selected(&self, id: &ConversationId) -> bool {
        self.selected.as_ref() == Some(id)
    }
}

pub(crate) type SharedState = Arc<Mutex<InboxState>>;
