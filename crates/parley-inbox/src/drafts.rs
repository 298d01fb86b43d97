// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation drafting aid for email replies.
//!
//! A desk keeps every suggestion the assistant produced, a cursor into that
//! history, an operator-written draft, and cached thread summaries. It never
//! touches the conversation list or sends anything; the composed text goes
//! through the outbound pipeline like any other reply.

use std::collections::HashMap;

use parley_core::{
    Channel, Conversation, ConversationId, Message, ReplyAssistant, ReplyContext, SummaryMode,
};
use tracing::debug;

use crate::error::InboxError;

/// Which text [`EmailDraftDesk::compose`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DraftMode {
    #[default]
    Suggested,
    Manual,
}

#[derive(Debug, Clone)]
struct CachedSummary {
    /// Id of the newest message the summary covered.
    through: Option<String>,
    text: String,
}

#[derive(Debug, Clone)]
pub struct EmailDraftDesk {
    conversation_id: ConversationId,
    suggestions: Vec<String>,
    cursor: Option<usize>,
    mode: DraftMode,
    manual_text: String,
    summaries: HashMap<SummaryMode, CachedSummary>,
}

impl EmailDraftDesk {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            suggestions: Vec::new(),
            cursor: None,
            mode: DraftMode::default(),
            manual_text: String::new(),
            summaries: HashMap::new(),
        }
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Requests a new suggestion and appends it to the history.
    ///
    /// The cursor moves to the new entry. Earlier suggestions stay reachable
    /// through [`previous`](Self::previous).
    pub async fn suggest(
        &mut self,
        assistant: &dyn ReplyAssistant,
        account_id: &str,
        conversation: &Conversation,
        messages: &[Message],
    ) -> Result<&str, InboxError> {
        let context = Self::reply_context(conversation, messages)?;
        let suggestion = assistant.suggest_reply(account_id, &context).await?;
        Ok(self.add_suggestion(suggestion))
    }

    /// Appends a suggestion obtained elsewhere and moves the cursor to it.
    pub fn add_suggestion(&mut self, suggestion: String) -> &str {
        self.suggestions.push(suggestion);
        let index = self.suggestions.len() - 1;
        self.cursor = Some(index);
        debug!(conversation = %self.conversation_id, index, "suggestion added");
        &self.suggestions[index]
    }

    pub fn current(&self) -> Option<&str> {
        self.cursor
            .and_then(|i| self.suggestions.get(i))
            .map(String::as_str)
    }

    /// Steps back one suggestion. Stays on the first entry.
    pub fn previous(&mut self) -> Option<&str> {
        if let Some(i) = self.cursor {
            self.cursor = Some(i.saturating_sub(1));
        }
        self.current()
    }

    /// Steps forward one suggestion. Stays on the last entry.
    pub fn next(&mut self) -> Option<&str> {
        if let Some(i) = self.cursor
            && i + 1 < self.suggestions.len()
        {
            self.cursor = Some(i + 1);
        }
        self.current()
    }

    pub fn history_len(&self) -> usize {
        self.suggestions.len()
    }

    /// 1-based position of the cursor, for "2 of 3" style labels.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.cursor.map(|i| (i + 1, self.suggestions.len()))
    }

    pub fn mode(&self) -> DraftMode {
        self.mode
    }

    pub fn switch_mode(&mut self, mode: DraftMode) {
        self.mode = mode;
    }

    pub fn set_manual_text(&mut self, text: impl Into<String>) {
        self.manual_text = text.into();
    }

    pub fn manual_text(&self) -> &str {
        &self.manual_text
    }

    /// Text to send for the current mode, or `None` if there is nothing to send.
    pub fn compose(&self) -> Option<String> {
        let text = match self.mode {
            DraftMode::Suggested => self.current()?,
            DraftMode::Manual => self.manual_text.as_str(),
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Summarizes the thread. Cached per mode until a newer message arrives.
    pub async fn summarize(
        &mut self,
        assistant: &dyn ReplyAssistant,
        account_id: &str,
        conversation: &Conversation,
        messages: &[Message],
        mode: SummaryMode,
    ) -> Result<&str, InboxError> {
        if self.cached_summary(mode, messages).is_none() {
            let context = Self::reply_context(conversation, messages)?;
            let text = assistant.summarize(account_id, &context, mode).await?;
            self.store_summary(mode, messages, text);
        }
        Ok(self.cached_summary(mode, messages).unwrap_or_default())
    }

    /// The cached summary for `mode`, if it still covers the newest message.
    pub fn cached_summary(&self, mode: SummaryMode, messages: &[Message]) -> Option<&str> {
        let through = messages.last().map(|m| m.id.as_str());
        self.summaries
            .get(&mode)
            .filter(|cached| cached.through.as_deref() == through)
            .map(|cached| cached.text.as_str())
    }

    pub fn store_summary(&mut self, mode: SummaryMode, messages: &[Message], text: String) {
        let through = messages.last().map(|m| m.id.clone());
        self.summaries.insert(mode, CachedSummary { through, text });
    }

    /// Assistant input for an email thread. Other channels are unsupported.
    pub fn reply_context(
        conversation: &Conversation,
        messages: &[Message],
    ) -> Result<ReplyContext, InboxError> {
        if conversation.channel != Channel::Email {
            return Err(InboxError::Unsupported {
                channel: conversation.channel,
                operation: "reply assistance",
            });
        }
        Ok(ReplyContext {
            conversation_id: conversation.id.clone(),
            address: conversation.counterpart.address.clone(),
            subject: conversation.subject.clone(),
            // Unconfirmed local replies are not part of the thread yet.
            messages: messages.iter().filter(|m| !m.is_local()).cloned().collect(),
        })
    }
}
