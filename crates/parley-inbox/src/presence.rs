// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typing indicators and read receipts for widget conversations.
//!
//! Presence is best-effort: failures are logged at `debug` and never reach
//! the caller. Every operation on a non-widget conversation does nothing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_config::model::PresenceConfig;
use parley_core::{Channel, Conversation, ConversationId, PresenceAdapter, PresenceSnapshot};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Presence timing, resolved from [`PresenceConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceSettings {
    pub typing_throttle: Duration,
    pub typing_stale: Duration,
    pub read_receipt_stale: Duration,
}

impl From<&PresenceConfig> for PresenceSettings {
    fn from(config: &PresenceConfig) -> Self {
        Self {
            typing_throttle: Duration::from_millis(config.typing_throttle_ms),
            typing_stale: Duration::from_secs(config.typing_stale_secs),
            read_receipt_stale: Duration::from_secs(config.read_receipt_stale_secs),
        }
    }
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self::from(&PresenceConfig::default())
    }
}

/// Tracks operator typing pings and the customer's last known presence.
pub struct PresenceTracker {
    account_id: String,
    adapter: Option<Arc<dyn PresenceAdapter>>,
    settings: PresenceSettings,
    last_typing_sent: Mutex<HashMap<ConversationId, Instant>>,
    snapshots: Mutex<HashMap<ConversationId, PresenceSnapshot>>,
}

impl PresenceTracker {
    pub fn new(
        account_id: impl Into<String>,
        adapter: Option<Arc<dyn PresenceAdapter>>,
        settings: PresenceSettings,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            adapter,
            settings,
            last_typing_sent: Mutex::new(HashMap::new()),
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    fn adapter_for(&self, conversation: &Conversation) -> Option<&Arc<dyn PresenceAdapter>> {
        if conversation.channel == Channel::Widget {
            self.adapter.as_ref()
        } else {
            None
        }
    }

    /// Signals that the operator is typing, at most once per throttle window.
    pub async fn note_operator_typing(&self, conversation: &Conversation) {
        let Some(adapter) = self.adapter_for(conversation) else {
            return;
        };
        {
            let mut last = self.last_typing_sent.lock().await;
            let now = Instant::now();
            if let Some(sent) = last.get(&conversation.id)
                && now.duration_since(*sent) < self.settings.typing_throttle
            {
                return;
            }
            last.insert(conversation.id.clone(), now);
        }
        if let Err(e) = adapter
            .send_typing(&self.account_id, &conversation.counterpart.address, true)
            .await
        {
            debug!(conversation = %conversation.id, error = %e, "typing signal failed");
        }
    }

    pub async fn stop_typing(&self, conversation: &Conversation) {
        let Some(adapter) = self.adapter_for(conversation) else {
            return;
        };
        self.last_typing_sent.lock().await.remove(&conversation.id);
        if let Err(e) = adapter
            .send_typing(&self.account_id, &conversation.counterpart.address, false)
            .await
        {
            debug!(conversation = %conversation.id, error = %e, "typing stop failed");
        }
    }

    /// Tells the customer the operator has read the conversation.
    pub async fn mark_read(&self, conversation: &Conversation) {
        let Some(adapter) = self.adapter_for(conversation) else {
            return;
        };
        if let Err(e) = adapter
            .send_read_receipt(&self.account_id, &conversation.counterpart.address, Utc::now())
            .await
        {
            debug!(conversation = %conversation.id, error = %e, "read receipt failed");
        }
    }

    /// Fetches the customer's presence markers. On failure the last known
    /// snapshot is kept and returned.
    pub async fn refresh(&self, conversation: &Conversation) -> PresenceSnapshot {
        let Some(adapter) = self.adapter_for(conversation) else {
            return PresenceSnapshot::default();
        };
        match adapter
            .fetch_presence(&self.account_id, &conversation.counterpart.address)
            .await
        {
            Ok(snapshot) => {
                self.snapshots
                    .lock()
                    .await
                    .insert(conversation.id.clone(), snapshot.clone());
                snapshot
            }
            Err(e) => {
                debug!(conversation = %conversation.id, error = %e, "presence fetch failed");
                self.snapshots
                    .lock()
                    .await
                    .get(&conversation.id)
                    .cloned()
                    .unwrap_or_default()
            }
        }
    }

    /// Whether the customer typed within the staleness window before `now`.
    pub async fn customer_typing(&self, id: &ConversationId, now: DateTime<Utc>) -> bool {
        let snapshots = self.snapshots.lock().await;
        snapshots
            .get(id)
            .and_then(|s| s.customer_typing_at)
            .is_some_and(|at| is_fresh(at, now, self.settings.typing_stale))
    }

    /// The customer's last read receipt, if recent enough to show.
    pub async fn customer_read_at(&self, id: &ConversationId, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let snapshots = self.snapshots.lock().await;
        snapshots
            .get(id)
            .and_then(|s| s.customer_read_at)
            .filter(|at| is_fresh(*at, now, self.settings.read_receipt_stale))
    }
}

fn is_fresh(at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    match (now - at).to_std() {
        Ok(age) => age <= window,
        // Marker slightly ahead of our clock.
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_test_utils::MockChannel;
    use parley_test_utils::fixtures::conversation;

    fn tracker(mock: &Arc<MockChannel>) -> PresenceTracker {
        PresenceTracker::new(
            "acct",
            Some(Arc::clone(mock) as Arc<dyn PresenceAdapter>),
            PresenceSettings::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn typing_is_throttled_per_conversation() {
        let mock = Arc::new(MockChannel::new(Channel::Widget));
        let presence = tracker(&mock);
        let conv = conversation(Channel::Widget, "s1").build();

        presence.note_operator_typing(&conv).await;
        presence.note_operator_typing(&conv).await;
        tokio::time::advance(Duration::from_millis(1_500)).await;
        presence.note_operator_typing(&conv).await;
        assert_eq!(mock.typing_calls().await.len(), 1);

        tokio::time::advance(Duration::from_millis(600)).await;
        presence.note_operator_typing(&conv).await;
        assert_eq!(mock.typing_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn stop_typing_sends_false_and_resets_throttle() {
        let mock = Arc::new(MockChannel::new(Channel::Widget));
        let presence = tracker(&mock);
        let conv = conversation(Channel::Widget, "s1").build();

        presence.note_operator_typing(&conv).await;
        presence.stop_typing(&conv).await;
        presence.note_operator_typing(&conv).await;

        let calls: Vec<bool> = mock.typing_calls().await.into_iter().map(|(_, t)| t).collect();
        assert_eq!(calls, [true, false, true]);
    }

    #[tokio::test]
    async fn non_widget_conversations_are_ignored() {
        let mock = Arc::new(MockChannel::new(Channel::Widget));
        let presence = tracker(&mock);
        let conv = conversation(Channel::Sms, "+4790000001").build();

        presence.note_operator_typing(&conv).await;
        presence.mark_read(&conv).await;
        assert_eq!(presence.refresh(&conv).await, PresenceSnapshot::default());

        assert!(mock.typing_calls().await.is_empty());
        assert!(mock.read_receipts().await.is_empty());
    }

    #[tokio::test]
    async fn customer_markers_expire() {
        let mock = Arc::new(MockChannel::new(Channel::Widget));
        let now = Utc::now();
        mock.set_presence(PresenceSnapshot {
            customer_typing_at: Some(now - chrono::Duration::seconds(3)),
            customer_read_at: Some(now - chrono::Duration::minutes(20)),
        })
        .await;
        let presence = tracker(&mock);
        let conv = conversation(Channel::Widget, "s1").build();

        presence.refresh(&conv).await;

        assert!(presence.customer_typing(&conv.id, now).await);
        assert!(!presence.customer_typing(&conv.id, now + chrono::Duration::seconds(4)).await);
        assert!(presence.customer_read_at(&conv.id, now).await.is_none());
    }

    #[tokio::test]
    async fn mark_read_sends_receipt() {
        let mock = Arc::new(MockChannel::new(Channel::Widget));
        let presence = tracker(&mock);
        let conv = conversation(Channel::Widget, "s1").build();

        presence.mark_read(&conv).await;

        let receipts = mock.read_receipts().await;
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].0, "s1");
    }
}
