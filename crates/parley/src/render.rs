// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal rendering of conversations, messages and inbox events.
//!
//! With `color` off every function returns plain ASCII-tagged text, which is
//! what the tests compare against.

use colored::Colorize;
use parley_core::{Conversation, DeliveryStatus, Message, Role};
use parley_inbox::InboxEvent;
use parley_inbox::filter::{awaiting_count, counts_by_channel};

const PREVIEW_CHARS: usize = 48;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One line of the conversation list.
pub fn conversation_row(conversation: &Conversation, color: bool) -> String {
    let marker = if conversation.escalation.is_some() {
        "!"
    } else if conversation.awaiting_reply() {
        "*"
    } else {
        " "
    };
    let name = if conversation.counterpart.display_name.is_empty() {
        conversation.counterpart.address.as_str()
    } else {
        conversation.counterpart.display_name.as_str()
    };
    let preview = match &conversation.subject {
        Some(subject) => format!("[{subject}] {}", conversation.last_message),
        None => conversation.last_message.clone(),
    };
    let line = format!(
        "{marker} {:<9} {:<22} {}  {}",
        conversation.channel.to_string(),
        truncate(name, 22),
        conversation.last_message_at.format(TIME_FORMAT),
        truncate(&preview, PREVIEW_CHARS),
    );
    if !color {
        return line;
    }
    match marker {
        "!" => line.red().bold().to_string(),
        "*" => line.yellow().to_string(),
        _ => line,
    }
}

/// One line of a message history.
pub fn message_line(message: &Message, color: bool) -> String {
    let who = match (message.role, message.is_manual) {
        (Role::User, _) => "customer",
        (Role::Assistant, Some(true)) => "operator",
        (Role::Assistant, _) => "agent",
    };
    let status = match message.status {
        Some(DeliveryStatus::Pending) => " (sending)",
        Some(DeliveryStatus::Failed) => " (failed)",
        Some(DeliveryStatus::Delivered) => " (delivered)",
        _ => "",
    };
    let stamp = message.timestamp.format(TIME_FORMAT).to_string();
    if !color {
        return format!("{stamp} {who:<8} {}{status}", message.content);
    }
    let who = match message.role {
        Role::User => who.cyan().to_string(),
        Role::Assistant => who.green().to_string(),
    };
    let status = if message.status == Some(DeliveryStatus::Failed) {
        status.red().to_string()
    } else {
        status.dimmed().to_string()
    };
    format!("{} {who:<8} {}{status}", stamp.dimmed(), message.content)
}

/// A status line for events worth surfacing while watching.
///
/// List and message refreshes are rendered by redrawing, so they return `None`.
pub fn event_line(event: &InboxEvent, color: bool) -> Option<String> {
    let text = match event {
        InboxEvent::ListRefreshed { .. } | InboxEvent::MessagesRefreshed { .. } => return None,
        InboxEvent::RateLimited { retry_after } => {
            format!("rate limited, backing off for {}s", retry_after.as_secs())
        }
        InboxEvent::ChannelDegraded { channel, error } => format!("{channel} unavailable: {error}"),
        InboxEvent::SendFailed {
            conversation_id,
            error,
            ..
        } => format!("send to {conversation_id} failed: {error}"),
        InboxEvent::EscalationResolveFailed {
            conversation_id,
            error,
        } => format!("could not resolve escalation on {conversation_id}: {error}"),
    };
    Some(if color {
        format!("{} {}", "!".yellow(), text.yellow())
    } else {
        format!("[WARN] {text}")
    })
}

/// Badge header: per-channel totals and how many await a reply.
pub fn badge_line(conversations: &[Conversation], color: bool) -> String {
    let counts = counts_by_channel(conversations)
        .into_iter()
        .map(|(channel, count)| format!("{channel} {count}"))
        .collect::<Vec<_>>()
        .join("  ");
    let awaiting = awaiting_count(conversations);
    let awaiting = if color && awaiting > 0 {
        format!("{awaiting} awaiting").yellow().bold().to_string()
    } else {
        format!("{awaiting} awaiting")
    };
    if counts.is_empty() {
        awaiting
    } else {
        format!("{counts}  |  {awaiting}")
    }
}

/// Cuts `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let keep = max.saturating_sub(3);
    let mut out: String = single_line.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Channel;
    use parley_test_utils::fixtures::{conversation, escalation, message};
    use std::time::Duration;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Hei på deg", 20), "Hei på deg");
        assert_eq!(truncate("æøåæøåæøå", 6), "æøå...");
        assert_eq!(truncate("line one\nline two", 40), "line one line two");
    }

    #[test]
    fn awaiting_and_escalated_rows_are_marked() {
        let awaiting = conversation(Channel::Sms, "+4790000001")
            .name("Kari")
            .awaiting("Hallo?", 0)
            .build();
        assert!(conversation_row(&awaiting, false).starts_with("* sms"));

        let mut escalated = awaiting.clone();
        escalated.escalation = Some(escalation(&escalated.id, 0));
        assert!(conversation_row(&escalated, false).starts_with("! sms"));
    }

    #[test]
    fn email_row_shows_subject() {
        let conv = conversation(Channel::Email, "kari@example.no")
            .subject("Faktura")
            .last_message("Se vedlegg", Role::User, 0)
            .build();
        assert!(conversation_row(&conv, false).contains("[Faktura] Se vedlegg"));
    }

    #[test]
    fn message_lines_name_the_author() {
        let mut reply = message("m2", Role::Assistant, "Takk", 1);
        reply.is_manual = Some(true);
        reply.status = Some(DeliveryStatus::Failed);
        let line = message_line(&reply, false);
        assert!(line.contains("operator"));
        assert!(line.ends_with("Takk (failed)"));

        let inbound = message_line(&message("m1", Role::User, "Hei", 0), false);
        assert!(inbound.contains("customer"));
    }

    #[test]
    fn badge_line_counts_channels_and_awaiting() {
        let list = vec![
            conversation(Channel::Sms, "+4790000001").awaiting("Hallo?", 0).build(),
            conversation(Channel::Sms, "+4790000002").build(),
            conversation(Channel::Widget, "s1").build(),
        ];
        assert_eq!(badge_line(&list, false), "sms 2  widget 1  |  1 awaiting");
        assert_eq!(badge_line(&[], false), "0 awaiting");
    }

    #[test]
    fn refresh_events_are_not_printed() {
        let event = InboxEvent::ListRefreshed {
            conversations: 3,
            mode: parley_inbox::RefreshMode::Silent,
        };
        assert_eq!(event_line(&event, false), None);

        let limited = InboxEvent::RateLimited {
            retry_after: Duration::from_secs(30),
        };
        assert_eq!(
            event_line(&limited, false).as_deref(),
            Some("[WARN] rate limited, backing off for 30s")
        );
    }
}
