// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typing indicators and read receipts (widget channel only).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ParleyError;
use crate::types::PresenceSnapshot;

/// Best-effort presence transport. No call requires an acknowledgement.
#[async_trait]
pub trait PresenceAdapter: Send + Sync + 'static {
    async fn send_typing(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        is_typing: bool,
    ) -> Result<(), ParleyError>;

    async fn send_read_receipt(
        &self,
        account_id: &str,
        counterpart_ref: &str,
        read_at: DateTime<Utc>,
    ) -> Result<(), ParleyError>;

    async fn fetch_presence(
        &self,
        account_id: &str,
        counterpart_ref: &str,
    ) -> Result<PresenceSnapshot, ParleyError>;
}
