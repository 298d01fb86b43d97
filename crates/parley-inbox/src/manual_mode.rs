// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automated/manual control of a conversation.
//!
//! The machine owns no conversation state. It routes toggles to the right
//! channel adapter and performs the local bookkeeping for opening a
//! conversation that awaits a reply. Two operators toggling or replying to
//! the same conversation at once are not detected; the last write wins.

use std::sync::Arc;

use parley_core::{ControlMode, Conversation, EscalationBackend};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::error::InboxError;
use crate::events::InboxEvent;
use crate::registry::ChannelRegistry;

/// Handle to a background escalation resolve started by
/// [`ManualModeMachine::open`]. Await it to observe the outcome, or drop it.
pub type ResolveHandle = JoinHandle<Result<(), InboxError>>;

/// Something that changes who is in control of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    /// An operator takes the conversation over.
    TakeOver,
    /// The operator hands the conversation back to automation.
    HandBack,
    /// The customer asked for a human.
    EscalationRaised,
    /// The escalation record was closed. Control stays where it is.
    EscalationResolved,
}

pub fn transition(from: ControlMode, event: ModeEvent) -> ControlMode {
    match event {
        ModeEvent::TakeOver | ModeEvent::EscalationRaised => ControlMode::Manual,
        ModeEvent::HandBack => ControlMode::Automated,
        ModeEvent::EscalationResolved => from,
    }
}

/// Routes manual-mode operations to channel adapters and the escalation backend.
#[derive(Clone)]
pub struct ManualModeMachine {
    account_id: String,
    registry: ChannelRegistry,
    escalations: Option<Arc<dyn EscalationBackend>>,
    events: broadcast::Sender<InboxEvent>,
    tracker: TaskTracker,
}

impl ManualModeMachine {
    pub fn new(
        account_id: impl Into<String>,
        registry: ChannelRegistry,
        escalations: Option<Arc<dyn EscalationBackend>>,
        events: broadcast::Sender<InboxEvent>,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            registry,
            escalations,
            events,
            tracker,
        }
    }

    /// Switches a conversation to manual (`true`) or automated (`false`).
    ///
    /// Only the adapter call happens here; the caller patches its local copy
    /// once this returns `Ok`.
    pub async fn toggle(&self, conversation: &Conversation, is_manual: bool) -> Result<(), InboxError> {
        let adapter = self
            .registry
            .get(conversation.channel)
            .ok_or(InboxError::ChannelUnavailable(conversation.channel))?;
        if !adapter.capabilities().supports_manual_mode {
            return Err(InboxError::Unsupported {
                channel: conversation.channel,
                operation: "manual mode",
            });
        }

        adapter
            .set_manual_mode(&self.account_id, &conversation.counterpart.address, is_manual)
            .await
            .map_err(InboxError::from_adapter)?;

        let mode = transition(
            conversation.control_mode(),
            if is_manual {
                ModeEvent::TakeOver
            } else {
                ModeEvent::HandBack
            },
        );
        info!(conversation = %conversation.id, mode = %mode, "control mode changed");
        Ok(())
    }

    /// Bookkeeping for selecting a conversation.
    ///
    /// When the conversation awaits a reply it is marked as being handled:
    /// `is_manual_mode` drops to `false` and the local escalation is cleared
    /// immediately. Channels without manual mode (email) keep their flag and
    /// only lose the escalation. The backend resolve runs in the background;
    /// failures are logged and broadcast, and the next poll restores the
    /// server's view. Returns `None` when no resolve was started.
    pub fn open(&self, conversation: &mut Conversation) -> Option<ResolveHandle> {
        let awaiting = conversation.awaiting_reply();
        if !awaiting && conversation.escalation.is_none() {
            return None;
        }
        let supports_manual_mode = self
            .registry
            .get(conversation.channel)
            .is_none_or(|adapter| adapter.capabilities().supports_manual_mode);
        if !supports_manual_mode && conversation.escalation.is_none() {
            return None;
        }

        if awaiting && supports_manual_mode {
            conversation.is_manual_mode = false;
        }
        conversation.escalation = None;
        debug!(conversation = %conversation.id, "awaiting conversation opened");

        let backend = Arc::clone(self.escalations.as_ref()?);
        let account_id = self.account_id.clone();
        let conversation_id = conversation.id.clone();
        let events = self.events.clone();

        Some(self.tracker.spawn(async move {
            match backend.resolve_escalation(&account_id, &conversation_id).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    warn!(conversation = %conversation_id, error = %e, "escalation resolve failed");
                    let _ = events.send(InboxEvent::EscalationResolveFailed {
                        conversation_id,
                        error: e.to_string(),
                    });
                    Err(InboxError::Adapter(e))
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{Channel, ChannelAdapter};
    use parley_test_utils::fixtures::{conversation, escalation};
    use parley_test_utils::{Failure, MockBackend, MockChannel};

    fn machine(
        channels: Vec<Arc<MockChannel>>,
        backend: Option<MockBackend>,
    ) -> (ManualModeMachine, broadcast::Receiver<InboxEvent>) {
        let mut registry = ChannelRegistry::new();
        for channel in channels {
            registry.register(channel as Arc<dyn ChannelAdapter>);
        }
        let (tx, rx) = broadcast::channel(16);
        let backend = backend.map(|b| Arc::new(b) as Arc<dyn EscalationBackend>);
        (
            ManualModeMachine::new("acct", registry, backend, tx, TaskTracker::new()),
            rx,
        )
    }

    #[test]
    fn transitions() {
        use ControlMode::*;
        assert_eq!(transition(Automated, ModeEvent::TakeOver), Manual);
        assert_eq!(transition(Manual, ModeEvent::HandBack), Automated);
        assert_eq!(transition(Automated, ModeEvent::EscalationRaised), Manual);
        assert_eq!(transition(Manual, ModeEvent::EscalationResolved), Manual);
        assert_eq!(transition(Automated, ModeEvent::EscalationResolved), Automated);
    }

    #[tokio::test]
    async fn toggle_routes_by_counterpart_address() {
        let sms = Arc::new(MockChannel::new(Channel::Sms));
        let (machine, _rx) = machine(vec![Arc::clone(&sms)], None);
        let conv = conversation(Channel::Sms, "+47 900 00 001").build();

        machine.toggle(&conv, true).await.unwrap();

        assert_eq!(sms.manual_mode_calls().await, vec![("+4790000001".to_string(), true)]);
    }

    #[tokio::test]
    async fn toggle_on_email_is_unsupported() {
        let email = Arc::new(MockChannel::new(Channel::Email));
        let (machine, _rx) = machine(vec![email], None);
        let conv = conversation(Channel::Email, "kari@example.no").build();

        let err = machine.toggle(&conv, true).await.unwrap_err();
        assert!(matches!(err, InboxError::Unsupported { channel: Channel::Email, .. }));
    }

    #[tokio::test]
    async fn toggle_failure_is_returned() {
        let widget = Arc::new(MockChannel::new(Channel::Widget));
        widget.fail_manual_mode(Some(Failure::Error)).await;
        let (machine, _rx) = machine(vec![widget], None);
        let conv = conversation(Channel::Widget, "s1").build();

        assert!(matches!(
            machine.toggle(&conv, false).await,
            Err(InboxError::Adapter(_))
        ));
    }

    #[tokio::test]
    async fn open_flips_local_state_before_resolve_completes() {
        let backend = MockBackend::new();
        backend.delay_resolve(std::time::Duration::from_secs(60)).await;
        let (machine, _rx) = machine(vec![], Some(backend.clone()));
        let mut conv = conversation(Channel::Widget, "s1").awaiting("hjelp", 0).build();
        conv.escalation = Some(escalation(&conv.id, 0));

        let handle = machine.open(&mut conv).expect("resolve spawned");

        assert!(!conv.is_manual_mode);
        assert!(conv.escalation.is_none());
        assert!(!conv.awaiting_reply());
        assert!(backend.resolve_calls().await.is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn open_is_noop_when_not_awaiting() {
        let (machine, _rx) = machine(vec![], Some(MockBackend::new()));
        let mut conv = conversation(Channel::Sms, "+1").manual(true).build();
        assert!(machine.open(&mut conv).is_none());
        assert!(conv.is_manual_mode);
    }

    #[tokio::test]
    async fn open_on_email_clears_escalation_but_stays_manual() {
        let backend = MockBackend::new();
        let email = Arc::new(MockChannel::new(Channel::Email));
        let (machine, _rx) = machine(vec![email], Some(backend.clone()));
        let mut conv = conversation(Channel::Email, "kari@example.no")
            .awaiting("Hei?", 0)
            .build();
        conv.escalation = Some(escalation(&conv.id, 0));

        machine.open(&mut conv).expect("resolve spawned").await.unwrap().unwrap();

        assert!(conv.is_manual_mode);
        assert!(conv.escalation.is_none());
        assert_eq!(backend.resolve_calls().await, vec![conv.id.clone()]);

        // Without an escalation there is nothing to resolve on email.
        assert!(machine.open(&mut conv).is_none());
    }

    #[tokio::test]
    async fn failed_resolve_is_reported() {
        let backend = MockBackend::new();
        backend.fail_resolve(true).await;
        let (machine, mut rx) = machine(vec![], Some(backend));
        let mut conv = conversation(Channel::Messenger, "psid").awaiting("?", 0).build();

        let result = machine.open(&mut conv).unwrap().await.unwrap();

        assert!(result.is_err());
        assert!(matches!(
            rx.recv().await.unwrap(),
            InboxEvent::EscalationResolveFailed { .. }
        ));
    }
}
