// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The inbox session: one operator's live view over all channels.
//!
//! A session owns the conversation list, the selected conversation and its
//! messages, loading flags, read marks, email draft desks, and the poll
//! loops that keep all of it fresh. Consumers read snapshots and subscribe
//! to [`InboxEvent`]s.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_config::ParleyConfig;
use parley_core::{
    Channel, ChannelAdapter, Conversation, ConversationId, EscalationBackend, Message, PresenceAdapter,
    ReadState, ReadStateStore, ReplyAssistant, Role, SummaryMode,
};
use tokio::sync::{Mutex, broadcast};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::{Aggregator, RefreshReport};
use crate::drafts::EmailDraftDesk;
use crate::error::{InboxError, SendError};
use crate::events::{InboxEvent, RefreshMode};
use crate::filter::ConversationFilter;
use crate::manual_mode::{ManualModeMachine, ResolveHandle};
use crate::outbound::{OutboundPipeline, SendReceipt, merge_messages};
use crate::poller::PollScheduler;
use crate::presence::{PresenceSettings, PresenceTracker};
use crate::registry::ChannelRegistry;
use crate::state::{InboxState, LoadState, SharedState};

const EVENT_CAPACITY: usize = 64;

/// Session parameters, usually derived from [`ParleyConfig`].
#[derive(Debug, Clone)]
pub struct InboxSettings {
    pub account_id: String,
    pub operator_id: String,
    pub list_interval: Duration,
    pub message_interval: Duration,
    pub message_limit: usize,
    /// Drop poll responses that were issued before the last applied one.
    pub discard_stale_responses: bool,
    pub presence: PresenceSettings,
}

impl InboxSettings {
    /// Default settings for `account_id`.
    pub fn new(account_id: impl Into<String>) -> Self {
        let mut config = ParleyConfig::default();
        config.account.account_id = account_id.into();
        Self::from(&config)
    }
}

impl From<&ParleyConfig> for InboxSettings {
    fn from(config: &ParleyConfig) -> Self {
        Self {
            account_id: config.account.account_id.clone(),
            operator_id: config.account.operator_id.clone(),
            list_interval: config.poll.list_interval(),
            message_interval: config.poll.message_interval(),
            message_limit: config.poll.message_limit,
            discard_stale_responses: config.poll.discard_stale_responses,
            presence: PresenceSettings::from(&config.presence),
        }
    }
}

/// Collects adapters for an [`InboxSession`].
pub struct InboxBuilder {
    settings: InboxSettings,
    registry: ChannelRegistry,
    presence: Option<Arc<dyn PresenceAdapter>>,
    escalations: Option<Arc<dyn EscalationBackend>>,
    read_store: Option<Arc<dyn ReadStateStore>>,
    assistant: Option<Arc<dyn ReplyAssistant>>,
    shutdown: Option<CancellationToken>,
}

impl InboxBuilder {
    pub fn channel(mut self, adapter: Arc<dyn ChannelAdapter>) -> Self {
        self.registry.register(adapter);
        self
    }

    /// Presence adapter for the widget channel.
    pub fn presence(mut self, adapter: Arc<dyn PresenceAdapter>) -> Self {
        self.presence = Some(adapter);
        self
    }

    pub fn escalations(mut self, backend: Arc<dyn EscalationBackend>) -> Self {
        self.escalations = Some(backend);
        self
    }

    pub fn read_state(mut self, store: Arc<dyn ReadStateStore>) -> Self {
        self.read_store = Some(store);
        self
    }

    pub fn assistant(mut self, assistant: Arc<dyn ReplyAssistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    /// Stops the session's poll loops when `token` is cancelled.
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn build(self) -> InboxSession {
        let settings = self.settings;
        let parent = self.shutdown.unwrap_or_default();
        let scheduler = PollScheduler::new(&parent, settings.list_interval, settings.message_interval);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let state: SharedState = Arc::new(Mutex::new(InboxState::default()));

        let manual = ManualModeMachine::new(
            settings.account_id.clone(),
            self.registry.clone(),
            self.escalations.clone(),
            events.clone(),
            scheduler.tracker().clone(),
        );
        let outbound = OutboundPipeline::new(
            settings.account_id.clone(),
            self.registry.clone(),
            Arc::clone(&state),
            events.clone(),
        );
        let presence = PresenceTracker::new(settings.account_id.clone(), self.presence, settings.presence);

        InboxSession {
            inner: Arc::new(Inner {
                aggregator: Aggregator::new(self.registry.clone(), self.escalations),
                registry: self.registry,
                manual,
                outbound,
                presence,
                read_store: self.read_store,
                assistant: self.assistant,
                drafts: Mutex::new(HashMap::new()),
                state,
                events,
                scheduler,
                list_seq: AtomicU64::new(0),
                message_seq: AtomicU64::new(0),
                settings,
            }),
        }
    }
}

struct Inner {
    settings: InboxSettings,
    registry: ChannelRegistry,
    aggregator: Aggregator,
    manual: ManualModeMachine,
    outbound: OutboundPipeline,
    presence: PresenceTracker,
    read_store: Option<Arc<dyn ReadStateStore>>,
    assistant: Option<Arc<dyn ReplyAssistant>>,
    drafts: Mutex<HashMap<ConversationId, EmailDraftDesk>>,
    state: SharedState,
    events: broadcast::Sender<InboxEvent>,
    scheduler: PollScheduler,
    list_seq: AtomicU64,
    message_seq: AtomicU64,
}

/// Handle to a running inbox. Cheap to clone.
#[derive(Clone)]
pub struct InboxSession {
    inner: Arc<Inner>,
}

impl InboxSession {
    pub fn builder(settings: InboxSettings) -> InboxBuilder {
        InboxBuilder {
            settings,
            registry: ChannelRegistry::new(),
            presence: None,
            escalations: None,
            read_store: None,
            assistant: None,
            shutdown: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InboxEvent> {
        self.inner.events.subscribe()
    }

    pub fn settings(&self) -> &InboxSettings {
        &self.inner.settings
    }

    /// Loads read marks, performs the first explicit refresh and starts the
    /// list poll loop.
    pub async fn start(&self) -> Result<RefreshReport, InboxError> {
        self.ensure_running()?;
        self.load_read_marks().await;
        let report = self.refresh(RefreshMode::Explicit).await?;

        let weak = Arc::downgrade(&self.inner);
        self.inner.scheduler.start_list_loop(move |token| {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    InboxSession { inner }.poll_list(token).await;
                }
            }
        });
        info!(
            channels = self.inner.registry.len(),
            conversations = report.conversations.len(),
            "inbox session started"
        );
        Ok(report)
    }

    /// Stops all loops and waits for in-flight fetches and resolves.
    pub async fn shutdown(&self) {
        self.inner.scheduler.shutdown().await;
        info!("inbox session stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.inner.scheduler.is_stopped()
    }

    /// Re-fetches every channel and replaces the conversation list.
    pub async fn refresh(&self, mode: RefreshMode) -> Result<RefreshReport, InboxError> {
        self.refresh_list(mode, None).await
    }

    /// Selects a conversation, fetches its messages and starts its poll loop.
    ///
    /// Opening a conversation that awaits a reply marks it as handled and
    /// resolves its escalation in the background; the returned handle
    /// reports the outcome of that resolve.
    pub async fn select(&self, id: &ConversationId) -> Result<Option<ResolveHandle>, InboxError> {
        self.ensure_running()?;
        let now = Utc::now();
        let (conversation, handle) = {
            let mut state = self.inner.state.lock().await;
            let switching = !state.is_selected(id);
            let conversation = state
                .conversation_mut(id)
                .ok_or_else(|| InboxError::NoSuchConversation(id.clone()))?;
            let handle = self.inner.manual.open(conversation);
            let snapshot = conversation.clone();
            if switching {
                state.messages.clear();
            }
            state.selected = Some(id.clone());
            state.load.messages_loading = true;
            state.read_marks.insert(id.clone(), now);
            (snapshot, handle)
        };
        self.record_read(conversation, now);

        if let Err(e) = self.fetch_messages(id, RefreshMode::Explicit, None).await {
            warn!(conversation = %id, error = %e, "initial message fetch failed");
        }
        // Another selection may have landed while the first fetch ran.
        if !self.inner.state.lock().await.is_selected(id) {
            return Ok(handle);
        }

        let weak = Arc::downgrade(&self.inner);
        let selected = id.clone();
        self.inner.scheduler.start_message_loop(move |token| {
            let weak = weak.clone();
            let selected = selected.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    InboxSession { inner }.poll_messages(&selected, token).await;
                }
            }
        });
        Ok(handle)
    }

    pub async fn deselect(&self) {
        self.inner.scheduler.stop_message_loop();
        let mut state = self.inner.state.lock().await;
        state.selected = None;
        state.messages.clear();
        state.load.messages_loading = false;
    }

    /// Re-fetches the selected conversation's messages.
    pub async fn refresh_messages(&self, mode: RefreshMode) -> Result<usize, InboxError> {
        self.ensure_running()?;
        let selected = self.inner.state.lock().await.selected.clone();
        match selected {
            Some(id) => self.fetch_messages(&id, mode, None).await,
            None => Ok(0),
        }
    }

    /// Hands a conversation to a human (`true`) or back to automation.
    pub async fn toggle_manual_mode(&self, id: &ConversationId, is_manual: bool) -> Result<(), InboxError> {
        self.ensure_running()?;
        let conversation = self.conversation(id).await?;
        self.inner.manual.toggle(&conversation, is_manual).await?;
        if let Some(c) = self.inner.state.lock().await.conversation_mut(id) {
            c.is_manual_mode = is_manual;
        }
        Ok(())
    }

    pub async fn send_message(&self, id: &ConversationId, body: &str) -> Result<SendReceipt, SendError> {
        if !self.is_running() {
            return Err(SendError::ShuttingDown);
        }
        self.inner.outbound.send_message(id, body).await
    }

    pub async fn retry_send(&self, local_id: &str) -> Result<SendReceipt, SendError> {
        if !self.is_running() {
            return Err(SendError::ShuttingDown);
        }
        self.inner.outbound.retry_send(local_id).await
    }

    /// Signals operator typing on a widget conversation (throttled).
    pub async fn operator_typing(&self, id: &ConversationId) -> Result<(), InboxError> {
        let conversation = self.conversation(id).await?;
        self.inner.presence.note_operator_typing(&conversation).await;
        Ok(())
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.inner.presence
    }

    /// Conversations matching `filter`, newest first.
    pub async fn visible(&self, filter: &ConversationFilter) -> Vec<Conversation> {
        let state = self.inner.state.lock().await;
        crate::filter::filter(&state.conversations, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.inner.state.lock().await.conversations.clone()
    }

    pub async fn conversation(&self, id: &ConversationId) -> Result<Conversation, InboxError> {
        self.inner
            .state
            .lock()
            .await
            .conversation(id)
            .cloned()
            .ok_or_else(|| InboxError::NoSuchConversation(id.clone()))
    }

    pub async fn selected(&self) -> Option<ConversationId> {
        self.inner.state.lock().await.selected.clone()
    }

    /// Messages of the selected conversation, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.inner.state.lock().await.messages.clone()
    }

    pub async fn load_state(&self) -> LoadState {
        self.inner.state.lock().await.load.clone()
    }

    /// When this operator last opened the conversation.
    pub async fn read_state(&self, id: &ConversationId) -> Option<DateTime<Utc>> {
        self.inner.state.lock().await.read_marks.get(id).copied()
    }

    /// The customer wrote after this operator last opened the conversation.
    pub async fn has_unread(&self, id: &ConversationId) -> bool {
        let state = self.inner.state.lock().await;
        let Some(conversation) = state.conversation(id) else {
            return false;
        };
        conversation.last_message_role == Some(Role::User)
            && state
                .read_marks
                .get(id)
                .is_none_or(|read| *read < conversation.last_message_at)
    }

    /// Asks the reply assistant for another suggestion for an email thread.
    ///
    /// The assistant call runs without holding the draft desks, so other
    /// desks stay editable while a suggestion is pending.
    pub async fn suggest_reply(&self, id: &ConversationId) -> Result<String, InboxError> {
        let (assistant, conversation, messages) = self.assistant_inputs(id).await?;
        let context = EmailDraftDesk::reply_context(&conversation, &messages)?;
        let suggestion = assistant
            .suggest_reply(&self.inner.settings.account_id, &context)
            .await?;

        let mut drafts = self.inner.drafts.lock().await;
        let desk = drafts
            .entry(id.clone())
            .or_insert_with(|| EmailDraftDesk::new(id.clone()));
        Ok(desk.add_suggestion(suggestion).to_string())
    }

    pub async fn summarize(&self, id: &ConversationId, mode: SummaryMode) -> Result<String, InboxError> {
        let (assistant, conversation, messages) = self.assistant_inputs(id).await?;
        if let Some(cached) = self
            .inner
            .drafts
            .lock()
            .await
            .get(id)
            .and_then(|desk| desk.cached_summary(mode, &messages))
        {
            return Ok(cached.to_string());
        }

        let context = EmailDraftDesk::reply_context(&conversation, &messages)?;
        let text = assistant
            .summarize(&self.inner.settings.account_id, &context, mode)
            .await?;

        let mut drafts = self.inner.drafts.lock().await;
        drafts
            .entry(id.clone())
            .or_insert_with(|| EmailDraftDesk::new(id.clone()))
            .store_summary(mode, &messages, text.clone());
        Ok(text)
    }

    /// Snapshot of a conversation's draft desk, if one exists.
    pub async fn draft(&self, id: &ConversationId) -> Option<EmailDraftDesk> {
        self.inner.drafts.lock().await.get(id).cloned()
    }

    /// Edits a conversation's draft desk, creating it when missing.
    pub async fn update_draft<R>(&self, id: &ConversationId, edit: impl FnOnce(&mut EmailDraftDesk) -> R) -> R {
        let mut drafts = self.inner.drafts.lock().await;
        let desk = drafts
            .entry(id.clone())
            .or_insert_with(|| EmailDraftDesk::new(id.clone()));
        edit(desk)
    }

    /// Sends the composed draft of a conversation.
    pub async fn send_draft(&self, id: &ConversationId) -> Result<SendReceipt, SendError> {
        let body = self
            .draft(id)
            .await
            .and_then(|desk| desk.compose())
            .ok_or(SendError::EmptyBody)?;
        self.send_message(id, &body).await
    }

    fn ensure_running(&self) -> Result<(), InboxError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(InboxError::ShuttingDown)
        }
    }

    async fn assistant_inputs(
        &self,
        id: &ConversationId,
    ) -> Result<(Arc<dyn ReplyAssistant>, Conversation, Vec<Message>), InboxError> {
        let conversation = self.conversation(id).await?;
        let assistant = self.inner.assistant.clone().ok_or(InboxError::Unsupported {
            channel: conversation.channel,
            operation: "reply assistance",
        })?;
        if conversation.channel != Channel::Email {
            return Err(InboxError::Unsupported {
                channel: conversation.channel,
                operation: "reply assistance",
            });
        }
        let selected = {
            let state = self.inner.state.lock().await;
            state.is_selected(id).then(|| state.messages.clone())
        };
        let messages = match selected {
            Some(messages) => messages,
            None => {
                let adapter = self
                    .inner
                    .registry
                    .get(conversation.channel)
                    .cloned()
                    .ok_or(InboxError::ChannelUnavailable(conversation.channel))?;
                adapter
                    .list_messages(
                        &self.inner.settings.account_id,
                        &conversation.counterpart.address,
                        self.inner.settings.message_limit,
                    )
                    .await
                    .map_err(InboxError::from_adapter)?
            }
        };
        Ok((assistant, conversation, messages))
    }

    async fn poll_list(&self, token: CancellationToken) {
        let backing_off = self
            .inner
            .state
            .lock()
            .await
            .backoff_until
            .is_some_and(|until| Instant::now() < until);
        if backing_off {
            debug!("skipping list poll while rate limited");
            return;
        }
        if let Err(e) = self.refresh_list(RefreshMode::Silent, Some(&token)).await {
            debug!(error = %e, "list poll skipped");
        }
    }

    async fn poll_messages(&self, id: &ConversationId, token: CancellationToken) {
        if let Err(e) = self.fetch_messages(id, RefreshMode::Silent, Some(&token)).await {
            debug!(conversation = %id, error = %e, "message poll failed");
        }
        if let Ok(conversation) = self.conversation(id).await
            && !token.is_cancelled()
        {
            self.inner.presence.refresh(&conversation).await;
        }
    }

    async fn refresh_list(
        &self,
        mode: RefreshMode,
        token: Option<&CancellationToken>,
    ) -> Result<RefreshReport, InboxError> {
        self.ensure_running()?;
        let seq = self.inner.list_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if mode == RefreshMode::Explicit {
            self.inner.state.lock().await.load.list_loading = true;
        }

        let report = self.inner.aggregator.refresh(&self.inner.settings.account_id).await;

        let applied = {
            let mut state = self.inner.state.lock().await;
            if mode == RefreshMode::Explicit {
                state.load.list_loading = false;
            }
            if token.is_some_and(CancellationToken::is_cancelled) {
                false
            } else if self.inner.settings.discard_stale_responses && seq < state.list_applied {
                debug!(seq, applied = state.list_applied, "discarding stale list response");
                false
            } else {
                state.list_applied = seq;
                state.conversations = report.conversations.clone();
                state.load.last_error = report
                    .is_total_failure(self.inner.registry.len())
                    .then(|| {
                        report
                            .failures
                            .iter()
                            .map(|f| format!("{}: {}", f.channel, f.error))
                            .collect::<Vec<_>>()
                            .join("; ")
                    });
                state.load.rate_limited = report.rate_limited;
                state.backoff_until = report.rate_limited.map(|delay| Instant::now() + delay);
                true
            }
        };

        if applied {
            for failure in &report.failures {
                let _ = self.inner.events.send(InboxEvent::ChannelDegraded {
                    channel: failure.channel,
                    error: failure.error.clone(),
                });
            }
            if let Some(retry_after) = report.rate_limited {
                let _ = self.inner.events.send(InboxEvent::RateLimited { retry_after });
            }
            let _ = self.inner.events.send(InboxEvent::ListRefreshed {
                conversations: report.conversations.len(),
                mode,
            });
        }
        Ok(report)
    }

    async fn fetch_messages(
        &self,
        id: &ConversationId,
        mode: RefreshMode,
        token: Option<&CancellationToken>,
    ) -> Result<usize, InboxError> {
        let seq = self.inner.message_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let conversation = self.conversation(id).await?;
        let adapter = self
            .inner
            .registry
            .get(conversation.channel)
            .cloned()
            .ok_or(InboxError::ChannelUnavailable(conversation.channel))?;

        let result = adapter
            .list_messages(
                &self.inner.settings.account_id,
                &conversation.counterpart.address,
                self.inner.settings.message_limit,
            )
            .await;

        let count = {
            let mut state = self.inner.state.lock().await;
            if !state.is_selected(id) || token.is_some_and(CancellationToken::is_cancelled) {
                debug!(conversation = %id, "discarding messages for deselected conversation");
                return Ok(0);
            }
            if mode == RefreshMode::Explicit {
                state.load.messages_loading = false;
            }
            let fetched = result.map_err(InboxError::from_adapter)?;
            if self.inner.settings.discard_stale_responses && seq < state.messages_applied {
                debug!(conversation = %id, seq, "discarding stale message response");
                return Ok(0);
            }
            state.messages_applied = seq;
            let merged = merge_messages(&state.messages, fetched);
            state.messages = merged;
            state.messages.len()
        };

        let _ = self.inner.events.send(InboxEvent::MessagesRefreshed {
            conversation_id: id.clone(),
            messages: count,
        });
        Ok(count)
    }

    async fn load_read_marks(&self) {
        let Some(store) = &self.inner.read_store else {
            return;
        };
        match store
            .list_read_states(&self.inner.settings.account_id, &self.inner.settings.operator_id)
            .await
        {
            Ok(states) => {
                let mut state = self.inner.state.lock().await;
                for read in states {
                    state.read_marks.insert(read.conversation_id, read.last_read_at);
                }
            }
            Err(e) => warn!(error = %e, "could not load read state"),
        }
    }

    /// Persists the read mark and sends a widget read receipt, in the background.
    fn record_read(&self, conversation: Conversation, at: DateTime<Utc>) {
        let inner = Arc::clone(&self.inner);
        self.inner.scheduler.tracker().spawn(async move {
            if let Some(store) = &inner.read_store {
                let read = ReadState {
                    conversation_id: conversation.id.clone(),
                    operator_id: inner.settings.operator_id.clone(),
                    last_read_at: at,
                };
                if let Err(e) = store.mark_read(&inner.settings.account_id, &read).await {
                    debug!(conversation = %conversation.id, error = %e, "read state not saved");
                }
            }
            inner.presence.mark_read(&conversation).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Channel;
    use parley_test_utils::MockChannel;
    use parley_test_utils::fixtures::conversation;
    use tracing_test::traced_test;

    fn sms_session(mock: &Arc<MockChannel>) -> InboxSession {
        InboxSession::builder(InboxSettings::new("acct"))
            .channel(Arc::clone(mock) as Arc<dyn ChannelAdapter>)
            .build()
    }

    #[tokio::test]
    #[traced_test]
    async fn start_is_logged_with_counts() {
        let mock = Arc::new(MockChannel::new(Channel::Sms));
        mock.set_conversations(vec![conversation(Channel::Sms, "+4790000001").build()])
            .await;
        let session = sms_session(&mock);

        session.start().await.unwrap();
        session.shutdown().await;

        assert!(logs_contain("inbox session started"));
        assert!(logs_contain("conversations=1"));
    }

    #[tokio::test]
    async fn settings_follow_config() {
        let mut config = ParleyConfig::default();
        config.account.account_id = "acct-9".into();
        config.poll.list_interval_secs = 7;
        config.poll.discard_stale_responses = false;

        let settings = InboxSettings::from(&config);
        assert_eq!(settings.account_id, "acct-9");
        assert_eq!(settings.list_interval, Duration::from_secs(7));
        assert!(!settings.discard_stale_responses);
    }

    #[tokio::test]
    async fn reply_assistance_needs_an_assistant() {
        let mock = Arc::new(MockChannel::new(Channel::Email));
        let conv = conversation(Channel::Email, "kari@example.no").build();
        mock.set_conversations(vec![conv.clone()]).await;
        let session = InboxSession::builder(InboxSettings::new("acct"))
            .channel(Arc::clone(&mock) as Arc<dyn ChannelAdapter>)
            .build();
        session.start().await.unwrap();

        let err = session.suggest_reply(&conv.id).await.unwrap_err();
        assert!(matches!(err, InboxError::Unsupported { .. }));
        session.shutdown().await;
    }

    #[tokio::test]
    async fn selecting_unknown_conversation_fails() {
        let mock = Arc::new(MockChannel::new(Channel::Sms));
        let session = sms_session(&mock);
        session.start().await.unwrap();

        let missing = conversation(Channel::Sms, "+4799999999").build().id;
        assert!(matches!(
            session.select(&missing).await,
            Err(InboxError::NoSuchConversation(_))
        ));
        assert_eq!(session.selected().await, None);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn explicit_refresh_clears_loading_flag() {
        let mock = Arc::new(MockChannel::new(Channel::Sms));
        let session = sms_session(&mock);

        session.refresh(RefreshMode::Explicit).await.unwrap();
        let load = session.load_state().await;
        assert!(!load.list_loading);
        assert!(load.last_error.is_none());
        session.shutdown().await;
    }
}
