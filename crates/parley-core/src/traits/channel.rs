// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the five messaging surfaces.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Channel, ChannelCapabilities, Conversation, Message, SendResult};

/// Adapter translating one channel's storage/API into the common shapes.
///
/// `counterpart_ref` is opaque to callers: a phone number for SMS, a session
/// id for the widget, a sender id for Messenger/Instagram and an address for
/// email. Key-shape differences between channels stay inside the adapter.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// The channel this adapter serves.
    fn channel(&self) -> Channel;

    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Lists the account's open threads, normalized. Escalations are not attached.
    async fn list_conversations(&self, account_id: &str)
        -> Result<Vec<Conversation>, ParleyError>;

    /// Fetches up to `limit` messages for one counterpart, oldest first.
    async fn list_messages(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError>;

    /// Sends an operator-authored message through the channel's transport.
    async fn send(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        body: &str,
    ) -> Result<SendResult, ParleyError>;

    /// Sends a reply that belongs to a subject-bearing thread.
    ///
    /// Channels without subjects ignore `subject` and behave like [`send`](Self::send).
    async fn send_reply(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        subject: Option<&str>,
        body: &str,
    ) -> Result<SendResult, ParleyError> {
        let _ = subject;
        self.send(account_id, counterpart_ref, body).await
    }

    /// Switches the conversation between automated and manual replies.
    async fn set_manual_mode(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        is_manual: bool,
    ) -> Result<(), ParleyError>;
}
