// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure filtering and badge counts over the conversation list.

use std::collections::BTreeMap;

use parley_core::{Channel, Conversation};

/// Criteria for the visible conversation list. All criteria must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationFilter {
    /// `None` means all channels.
    pub channel: Option<Channel>,
    /// Case-insensitive substring over display name, address and last message.
    pub search: String,
    /// Keep only conversations awaiting an operator reply.
    pub unread_only: bool,
}

impl ConversationFilter {
    pub fn channel(channel: Channel) -> Self {
        Self {
            channel: Some(channel),
            ..Self::default()
        }
    }

    pub fn matches(&self, conversation: &Conversation) -> bool {
        if let Some(channel) = self.channel
            && conversation.channel != channel
        {
            return false;
        }
        if self.unread_only && !conversation.awaiting_reply() {
            return false;
        }
        let needle = self.search.trim();
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        [
            conversation.counterpart.display_name.as_str(),
            conversation.counterpart.address.as_str(),
            conversation.last_message.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Conversations matching `filter`, in list order.
pub fn filter<'a>(conversations: &'a [Conversation], filter: &ConversationFilter) -> Vec<&'a Conversation> {
    conversations.iter().filter(|c| filter.matches(c)).collect()
}

/// Number of conversations per channel. Channels without any are omitted.
pub fn counts_by_channel(conversations: &[Conversation]) -> BTreeMap<Channel, usize> {
    let mut counts = BTreeMap::new();
    for conversation in conversations {
        *counts.entry(conversation.channel).or_insert(0) += 1;
    }
    counts
}

pub fn awaiting_count(conversations: &[Conversation]) -> usize {
    conversations.iter().filter(|c| c.awaiting_reply()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Role;
    use parley_test_utils::fixtures::conversation;

    fn sample() -> Vec<Conversation> {
        vec![
            conversation(Channel::Sms, "+4790000001")
                .name("Ola Nordmann")
                .awaiting("Når åpner dere?", 10)
                .build(),
            conversation(Channel::Sms, "+4790000002")
                .name("Per")
                .last_message("Takk for hjelpen", Role::Assistant, 8)
                .build(),
            conversation(Channel::Widget, "sess-abc")
                .awaiting("Pris på frakt?", 5)
                .build(),
            conversation(Channel::Email, "kari@example.no")
                .name("Kari")
                .last_message("Faktura vedlagt", Role::User, 3)
                .build(),
        ]
    }

    #[test]
    fn default_filter_keeps_everything() {
        let list = sample();
        assert_eq!(filter(&list, &ConversationFilter::default()).len(), 4);
    }

    #[test]
    fn channel_and_unread_compose_as_intersection() {
        let list = sample();
        let f = ConversationFilter {
            channel: Some(Channel::Sms),
            unread_only: true,
            ..Default::default()
        };
        let visible = filter(&list, &f);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].counterpart.display_name, "Ola Nordmann");
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let list = sample();
        let by_name = ConversationFilter {
            search: "OLA".into(),
            ..Default::default()
        };
        assert_eq!(filter(&list, &by_name).len(), 1);

        let by_address = ConversationFilter {
            search: "example.NO".into(),
            ..Default::default()
        };
        assert_eq!(filter(&list, &by_address)[0].channel, Channel::Email);

        let by_message = ConversationFilter {
            search: "frakt".into(),
            ..Default::default()
        };
        assert_eq!(filter(&list, &by_message)[0].channel, Channel::Widget);
    }

    #[test]
    fn search_combined_with_channel_can_match_nothing() {
        let list = sample();
        let f = ConversationFilter {
            channel: Some(Channel::Widget),
            search: "Kari".into(),
            unread_only: false,
        };
        assert!(filter(&list, &f).is_empty());
    }

    #[test]
    fn badge_counts() {
        let list = sample();
        let counts = counts_by_channel(&list);
        assert_eq!(counts.get(&Channel::Sms), Some(&2));
        assert_eq!(counts.get(&Channel::Messenger), None);
        assert_eq!(awaiting_count(&list), 2);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn any_channel() -> impl Strategy<Value = Channel> {
            prop::sample::select(Channel::ALL.to_vec())
        }

        fn any_conversation() -> impl Strategy<Value = Conversation> {
            (any_channel(), "[a-z0-9]{1,6}", any::<bool>(), any::<bool>(), 0i64..100).prop_map(
                |(channel, reference, manual, inbound, minutes)| {
                    let role = if inbound { Role::User } else { Role::Assistant };
                    conversation(channel, &reference)
                        .manual(manual)
                        .last_message("hei", role, minutes)
                        .build()
                },
            )
        }

        proptest! {
            #[test]
            fn combined_filter_is_intersection_of_single_filters(
                list in prop::collection::vec(any_conversation(), 0..20),
                channel in prop::option::of(any_channel()),
                unread_only in any::<bool>(),
            ) {
                let combined = ConversationFilter { channel, search: String::new(), unread_only };
                let by_channel = ConversationFilter { channel, ..Default::default() };
                let by_unread = ConversationFilter { unread_only, ..Default::default() };

                let expected: Vec<&Conversation> = list
                    .iter()
                    .filter(|c| by_channel.matches(c) && by_unread.matches(c))
                    .collect();
                prop_assert_eq!(filter(&list, &combined), expected);
            }
        }
    }
}
