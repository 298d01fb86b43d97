// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI drafting for email replies.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ReplyContext, SummaryMode};

/// Drafts replies and summaries. Both calls are idempotent reads with no
/// effect on the conversation.
#[async_trait]
pub trait ReplyAssistant: PluginAdapter {
    async fn suggest_reply(
        &self,
        account_id: &str,
        context: &ReplyContext,
    ) -> Result<String, ParleyError>;

    async fn summarize(
        &self,
        account_id: &str,
        context: &ReplyContext,
        mode: SummaryMode,
    ) -> Result<String, ParleyError>;
}
