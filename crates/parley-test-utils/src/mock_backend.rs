// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory escalation and read-state backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::{
    ConversationId, Escalation, EscalationBackend, HealthStatus, ParleyError, PluginAdapter,
    ReadState, ReadStateStore,
};
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    escalations: Vec<Escalation>,
    resolve_calls: Vec<ConversationId>,
    read_states: Vec<ReadState>,
    fail_list: bool,
    fail_resolve: bool,
    resolve_delay: Option<Duration>,
}

/// Mock [`EscalationBackend`] and [`ReadStateStore`].
///
/// Resolving removes the conversation's escalations, mirroring the server.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_escalations(&self, escalations: Vec<Escalation>) {
        self.state.lock().await.escalations = escalations;
    }

    pub async fn fail_list(&self, fail: bool) {
        self.state.lock().await.fail_list = fail;
    }

    pub async fn fail_resolve(&self, fail: bool) {
        self.state.lock().await.fail_resolve = fail;
    }

    pub async fn delay_resolve(&self, delay: Duration) {
        self.state.lock().await.resolve_delay = Some(delay);
    }

    pub async fn resolve_calls(&self) -> Vec<ConversationId> {
        self.state.lock().await.resolve_calls.clone()
    }

    pub async fn escalations(&self) -> Vec<Escalation> {
        self.state.lock().await.escalations.clone()
    }

    pub async fn read_states(&self) -> Vec<ReadState> {
        self.state.lock().await.read_states.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EscalationBackend for MockBackend {
    async fn list_escalations(&self, _account_id: &str) -> Result<Vec<Escalation>, ParleyError> {
        let state = self.state.lock().await;
        if state.fail_list {
            return Err(ParleyError::channel("escalation backend unavailable"));
        }
        Ok(state.escalations.clone())
    }

    async fn resolve_escalation(
        &self,
        _account_id: &str,
        conversation_id: &ConversationId,
    ) -> Result<(), ParleyError> {
        let delay = self.state.lock().await.resolve_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().await;
        state.resolve_calls.push(conversation_id.clone());
        if state.fail_resolve {
            return Err(ParleyError::channel("resolve refused"));
        }
        state
            .escalations
            .retain(|e| &e.conversation_id != conversation_id);
        Ok(())
    }
}

#[async_trait]
impl ReadStateStore for MockBackend {
    async fn mark_read(&self, _account_id: &str, read_state: &ReadState) -> Result<(), ParleyError> {
        let mut state = self.state.lock().await;
        state.read_states.retain(|r| {
            r.conversation_id != read_state.conversation_id || r.operator_id != read_state.operator_id
        });
        state.read_states.push(read_state.clone());
        Ok(())
    }

    async fn list_read_states(
        &self,
        _account_id: &str,
        operator_id: &str,
    ) -> Result<Vec<ReadState>, ParleyError> {
        Ok(self
            .state
            .lock()
            .await
            .read_states
            .iter()
            .filter(|r| r.operator_id == operator_id)
            .cloned()
            .collect())
    }
}
