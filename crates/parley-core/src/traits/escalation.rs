// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalation records owned by the dashboard backend.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::id::ConversationId;
use crate::traits::adapter::PluginAdapter;
use crate::types::Escalation;

#[async_trait]
pub trait EscalationBackend: PluginAdapter {
    /// Lists unresolved escalations for the account.
    async fn list_escalations(&self, account_id: &str) -> Result<Vec<Escalation>, ParleyError>;

    /// Resolves every open escalation of a conversation.
    async fn resolve_escalation(
        &self,
        account_id: &str,
        conversation_id: &ConversationId,
    ) -> Result<(), ParleyError>;
}
