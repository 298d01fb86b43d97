// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors surfaced by inbox operations.
//!
//! Adapter failures during polling never reach the caller as errors; they
//! are folded into refresh reports and events. Operator actions (toggling,
//! sending) return these types directly.

use parley_core::{Channel, ConversationId, ParleyError};
use thiserror::Error;

/// Error returned by session-level inbox operations.
#[derive(Debug, Error)]
pub enum InboxError {
    #[error(transparent)]
    Adapter(#[from] ParleyError),

    #[error("no conversation with id {0}")]
    NoSuchConversation(ConversationId),

    #[error("{operation} is not supported on the {channel} channel")]
    Unsupported {
        channel: Channel,
        operation: &'static str,
    },

    #[error("no adapter registered for the {0} channel")]
    ChannelUnavailable(Channel),

    #[error("inbox session is shutting down")]
    ShuttingDown,
}

impl InboxError {
    /// Unwraps an adapter-level `Unsupported` into the inbox variant.
    pub(crate) fn from_adapter(err: ParleyError) -> Self {
        match err {
            ParleyError::Unsupported { channel, operation } => {
                InboxError::Unsupported { channel, operation }
            }
            other => InboxError::Adapter(other),
        }
    }
}

/// Error returned by the outbound pipeline.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("message body is empty")]
    EmptyBody,

    #[error("another send is still in flight")]
    InFlight,

    #[error("no conversation with id {0}")]
    NoSuchConversation(ConversationId),

    #[error("no failed message with id {0}")]
    UnknownMessage(String),

    #[error("no adapter registered for the {0} channel")]
    ChannelUnavailable(Channel),

    /// Dispatch failed. Optimistic channels keep the local message, marked
    /// failed, under `local_id` so it can be retried.
    #[error("send failed: {source}")]
    Failed {
        local_id: Option<String>,
        #[source]
        source: ParleyError,
        retryable: bool,
    },

    #[error("inbox session is shutting down")]
    ShuttingDown,
}

impl SendError {
    pub(crate) fn failed(local_id: Option<String>, source: ParleyError) -> Self {
        let retryable = source.is_retryable();
        SendError::Failed {
            local_id,
            source,
            retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SendError::Failed { retryable: true, .. })
    }
}
