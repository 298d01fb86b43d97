// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley inbox.
//!
//! This crate provides the normalized data model shared by all five channels,
//! deterministic conversation ids, the error type, and the adapter traits the
//! channel crates implement.

pub mod error;
pub mod id;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use id::ConversationId;
pub use types::{
    Channel, ChannelCapabilities, ControlMode, Conversation, Counterpart, DeliveryStatus,
    Escalation, HealthStatus, LOCAL_MESSAGE_PREFIX, Message, PresenceSnapshot, ReadState,
    ReplyContext, Role, SendResult, SummaryMode,
};

pub use traits::{
    ChannelAdapter, EscalationBackend, PluginAdapter, PresenceAdapter, ReadStateStore,
    ReplyAssistant,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parley_error_has_all_variants() {
        let _config = ParleyError::Config("test".into());
        let _channel = ParleyError::Channel {
            message: "test".into(),
            source: None,
        };
        let _rate = ParleyError::RateLimited {
            retry_after: std::time::Duration::from_secs(1),
        };
        let _unsupported = ParleyError::Unsupported {
            channel: Channel::Email,
            operation: "manual mode",
        };
        let _not_found = ParleyError::NotFound("conv".into());
        let _decode = ParleyError::Decode {
            message: "bad json".into(),
            source: None,
        };
        let _timeout = ParleyError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = ParleyError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_escalation_backend<T: EscalationBackend>() {}
        fn _assert_presence_adapter<T: PresenceAdapter>() {}
        fn _assert_read_state_store<T: ReadStateStore>() {}
        fn _assert_reply_assistant<T: ReplyAssistant>() {}
    }

    #[test]
    fn local_prefix_is_exported_at_root() {
        let message = Message {
            id: format!("{LOCAL_MESSAGE_PREFIX}1"),
            role: Role::Assistant,
            content: "Takk".into(),
            timestamp: chrono::Utc::now(),
            status: None,
            is_manual: Some(true),
        };
        assert!(message.is_local());
    }
}
