// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-side read markers per (conversation, operator).

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ReadState;

#[async_trait]
pub trait ReadStateStore: PluginAdapter {
    async fn mark_read(&self, account_id: &str, state: &ReadState) -> Result<(), ParleyError>;

    async fn list_read_states(
        &self,
        account_id: &str,
        operator_id: &str,
    ) -> Result<Vec<ReadState>, ParleyError>;
}
