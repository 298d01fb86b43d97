// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic conversation identifiers.
//!
//! A conversation id is `<channel>-<normalized counterpart ref>`. The same
//! inputs always produce the same id, so consecutive polls can be merged
//! by id without any server-issued key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Channel;

/// Stable identifier of a normalized conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Derives the id for a counterpart on a channel.
    pub fn derive(channel: Channel, counterpart_ref: &str) -> Self {
        ConversationId(format!(
            "{channel}-{}",
            normalize_ref(channel, counterpart_ref)
        ))
    }

    /// Splits an id back into its channel and normalized counterpart ref.
    pub fn parse(&self) -> Option<(Channel, &str)> {
        let (prefix, rest) = self.0.split_once('-')?;
        let channel = Channel::from_str(prefix).ok()?;
        if rest.is_empty() {
            return None;
        }
        Some((channel, rest))
    }

    /// Channel encoded in the id, if the id is well formed.
    pub fn channel(&self) -> Option<Channel> {
        self.parse().map(|(channel, _)| channel)
    }

    /// Wraps an id string received from elsewhere (CLI argument, backend record).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        ConversationId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes a channel-specific routing reference.
///
/// - SMS: optional leading `+`, then digits only.
/// - Email: trimmed and ASCII-lowercased.
/// - Widget, Messenger, Instagram: trimmed opaque id.
///
/// Normalizing an already-normalized ref returns it unchanged.
pub fn normalize_ref(channel: Channel, counterpart_ref: &str) -> String {
    let trimmed = counterpart_ref.trim();
    match channel {
        Channel::Sms => {
            let mut out = String::with_capacity(trimmed.len());
            if trimmed.starts_with('+') {
                out.push('+');
            }
            out.extend(trimmed.chars().filter(|c| c.is_ascii_digit()));
            out
        }
        Channel::Email => trimmed.to_ascii_lowercase(),
        Channel::Widget | Channel::Messenger | Channel::Instagram => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn sms_ids_strip_formatting() {
        let id = ConversationId::derive(Channel::Sms, " +47 (912) 34-567 ");
        assert_eq!(id.as_str(), "sms-+4791234567");
    }

    #[test]
    fn email_ids_are_case_insensitive() {
        let a = ConversationId::derive(Channel::Email, "Kari.Nordmann@Example.NO ");
        let b = ConversationId::derive(Channel::Email, "kari.nordmann@example.no");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "email-kari.nordmann@example.no");
    }

    #[test]
    fn parse_round_trips_channel_and_ref() {
        let id = ConversationId::derive(Channel::Messenger, "psid-123");
        assert_eq!(id.parse(), Some((Channel::Messenger, "psid-123")));
        assert_eq!(id.channel(), Some(Channel::Messenger));
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!(ConversationId::from_raw("telegram-1").parse().is_none());
        assert!(ConversationId::from_raw("sms-").parse().is_none());
        assert!(ConversationId::from_raw("nodash").parse().is_none());
    }

    proptest! {
        #[test]
        fn derivation_is_idempotent(r in "[ +()0-9a-zA-Z.@_-]{1,40}") {
            for channel in Channel::ALL {
                let first = ConversationId::derive(channel, &r);
                let second = ConversationId::derive(channel, &r);
                prop_assert_eq!(&first, &second);

                // Re-deriving from the normalized ref is stable too.
                let normalized = normalize_ref(channel, &r);
                prop_assert_eq!(first, ConversationId::derive(channel, &normalized));
            }
        }
    }
}
