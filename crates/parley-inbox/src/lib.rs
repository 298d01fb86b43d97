// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unified inbox core for Parley.
//!
//! Merges conversations from every registered channel into one list, keeps
//! it fresh with background polling, and drives the operator-facing actions:
//! opening conversations, toggling manual mode, sending replies, presence,
//! and email drafting. [`InboxSession`] is the entry point.

pub mod aggregator;
pub mod drafts;
pub mod error;
pub mod events;
pub mod filter;
pub mod manual_mode;
pub mod outbound;
pub mod poller;
pub mod presence;
pub mod registry;
pub mod session;
pub mod shutdown;
mod state;

pub use aggregator::{Aggregator, ChannelFailure, RefreshReport, merge};
pub use drafts::{DraftMode, EmailDraftDesk};
pub use error::{InboxError, SendError};
pub use events::{InboxEvent, RefreshMode};
pub use filter::ConversationFilter;
pub use manual_mode::{ManualModeMachine, ModeEvent, ResolveHandle, transition};
pub use outbound::{SendReceipt, merge_messages};
pub use presence::{PresenceSettings, PresenceTracker};
pub use registry::ChannelRegistry;
pub use session::{InboxBuilder, InboxSession, InboxSettings};
pub use shutdown::{install_signal_handler, shutdown_within};
pub use state::LoadState;
