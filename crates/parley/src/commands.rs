// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Implementations of the `watch`, `list`, `show`, `send` and `mode` commands.

use std::time::Duration;

use clap::Args;
use parley_core::{Channel, ConversationId, ParleyError};
use parley_inbox::{
    ConversationFilter, InboxError, InboxSession, RefreshMode, RefreshReport, SendError,
    shutdown_within,
};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::render;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Inbox(#[from] InboxError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error(transparent)]
    Adapter(#[from] ParleyError),

    #[error("could not encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} checks failed")]
    Unhealthy { failed: usize, total: usize },
}

/// Conversation list filter flags shared by `watch` and `list`.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Only show one channel (sms, widget, messenger, instagram, email).
    #[arg(long, value_parser = parse_channel)]
    pub channel: Option<Channel>,

    /// Case-insensitive match on name, address or last message.
    #[arg(long, default_value = "")]
    pub search: String,

    /// Only show conversations awaiting an operator reply.
    #[arg(long)]
    pub unread: bool,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ConversationFilter {
        ConversationFilter {
            channel: self.channel,
            search: self.search.clone(),
            unread_only: self.unread,
        }
    }
}

pub fn parse_channel(raw: &str) -> Result<Channel, String> {
    raw.trim()
        .to_lowercase()
        .parse()
        .map_err(|_| format!("unknown channel `{raw}`"))
}

/// Runs a live session, redrawing the list on every refresh until `stop` fires.
pub async fn run_watch(
    session: &InboxSession,
    filter: &FilterArgs,
    color: bool,
    stop: CancellationToken,
) -> Result<(), CliError> {
    let mut events = session.subscribe();
    let report = session.start().await?;
    report_failures(&report, color);
    print_list(session, filter, color).await;

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            event = events.recv() => match event {
                Ok(parley_inbox::InboxEvent::ListRefreshed { .. }) => {
                    print_list(session, filter, color).await;
                }
                Ok(event) => {
                    if let Some(line) = render::event_line(&event, color) {
                        eprintln!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "event receiver lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    shutdown_within(session, DRAIN_TIMEOUT).await;
    Ok(())
}

/// One refresh, then print the filtered list.
pub async fn run_list(
    session: &InboxSession,
    filter: &FilterArgs,
    json: bool,
    color: bool,
) -> Result<(), CliError> {
    let report = session.refresh(RefreshMode::Explicit).await?;
    report_failures(&report, color);
    if json {
        let visible = session.visible(&filter.to_filter()).await;
        println!("{}", serde_json::to_string_pretty(&visible)?);
    } else {
        print_list(session, filter, color).await;
    }
    shutdown_within(session, DRAIN_TIMEOUT).await;
    Ok(())
}

/// Opens a conversation and prints its history.
///
/// Opening counts as reading: an awaiting conversation is marked handled and
/// its escalation resolved, exactly as in the live inbox.
pub async fn run_show(session: &InboxSession, id: &str, color: bool) -> Result<(), CliError> {
    let result = show_lines(session, &ConversationId::from_raw(id), color).await;
    shutdown_within(session, DRAIN_TIMEOUT).await;

    for line in result? {
        println!("{line}");
    }
    Ok(())
}

/// The conversation row as it stands after opening, then its messages.
async fn show_lines(
    session: &InboxSession,
    id: &ConversationId,
    color: bool,
) -> Result<Vec<String>, CliError> {
    session.refresh(RefreshMode::Explicit).await?;
    if let Some(handle) = session.select(id).await? {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!("escalation not resolved: {e}"),
            Err(e) => eprintln!("escalation resolve aborted: {e}"),
        }
    }
    let conversation = session.conversation(id).await?;

    let mut lines = vec![render::conversation_row(&conversation, color), String::new()];
    lines.extend(
        session
            .messages()
            .await
            .iter()
            .map(|message| format!("  {}", render::message_line(message, color))),
    );
    Ok(lines)
}

pub async fn run_send(session: &InboxSession, id: &str, body: &str, color: bool) -> Result<(), CliError> {
    let id = ConversationId::from_raw(id);
    session.refresh(RefreshMode::Explicit).await?;
    let result = session.send_message(&id, body).await;
    shutdown_within(session, DRAIN_TIMEOUT).await;

    let receipt = result?;
    println!("{}", render::message_line(&receipt.message, color));
    Ok(())
}

pub async fn run_mode(session: &InboxSession, id: &str, manual: bool) -> Result<(), CliError> {
    let id = ConversationId::from_raw(id);
    session.refresh(RefreshMode::Explicit).await?;
    let result = session.toggle_manual_mode(&id, manual).await;
    shutdown_within(session, DRAIN_TIMEOUT).await;

    result?;
    println!(
        "{id}: {}",
        if manual { "manual (operator replies)" } else { "automated" }
    );
    Ok(())
}

async fn print_list(session: &InboxSession, filter: &FilterArgs, color: bool) {
    println!("{}", render::badge_line(&session.conversations().await, color));
    let visible = session.visible(&filter.to_filter()).await;
    if visible.is_empty() {
        println!("(no conversations)");
        return;
    }
    for conversation in &visible {
        println!("{}", render::conversation_row(conversation, color));
    }
}

fn report_failures(report: &RefreshReport, color: bool) {
    for failure in &report.failures {
        let event = parley_inbox::InboxEvent::ChannelDegraded {
            channel: failure.channel,
            error: failure.error.clone(),
        };
        if let Some(line) = render::event_line(&event, color) {
            eprintln!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parley_core::{ChannelAdapter, EscalationBackend, Role};
    use parley_inbox::InboxSettings;
    use parley_test_utils::fixtures::{conversation, escalation, message};
    use parley_test_utils::{MockBackend, MockChannel};

    #[tokio::test]
    async fn show_prints_the_conversation_as_opened() {
        let sms = Arc::new(MockChannel::new(Channel::Sms));
        let backend = MockBackend::new();
        let conv = conversation(Channel::Sms, "+4790000001")
            .awaiting("Hallo?", 0)
            .build();
        sms.set_conversations(vec![conv.clone()]).await;
        sms.set_messages("+4790000001", vec![message("m1", Role::User, "Hallo?", 0)])
            .await;
        backend.set_escalations(vec![escalation(&conv.id, 0)]).await;
        let session = InboxSession::builder(InboxSettings::new("acct-1"))
            .channel(sms as Arc<dyn ChannelAdapter>)
            .escalations(Arc::new(backend.clone()) as Arc<dyn EscalationBackend>)
            .build();

        let lines = show_lines(&session, &conv.id, false).await.unwrap();

        assert!(lines[0].starts_with("  sms"), "got: {}", lines[0]);
        assert!(lines[2].contains("Hallo?"));
        assert_eq!(backend.resolve_calls().await, vec![conv.id.clone()]);
        session.shutdown().await;
    }

    #[test]
    fn channel_names_parse_case_insensitively() {
        assert_eq!(parse_channel("SMS"), Ok(Channel::Sms));
        assert_eq!(parse_channel(" instagram "), Ok(Channel::Instagram));
        assert!(parse_channel("fax").is_err());
    }

    #[test]
    fn filter_args_map_to_filter() {
        let args = FilterArgs {
            channel: Some(Channel::Email),
            search: "kari".into(),
            unread: true,
        };
        assert_eq!(
            args.to_filter(),
            ConversationFilter {
                channel: Some(Channel::Email),
                search: "kari".into(),
                unread_only: true,
            }
        );
    }
}
