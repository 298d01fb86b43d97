// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the inbox's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod assistant;
pub mod channel;
pub mod escalation;
pub mod presence;
pub mod read_state;

pub use adapter::PluginAdapter;
pub use assistant::ReplyAssistant;
pub use channel::ChannelAdapter;
pub use escalation::EscalationBackend;
pub use presence::PresenceAdapter;
pub use read_state::ReadStateStore;
