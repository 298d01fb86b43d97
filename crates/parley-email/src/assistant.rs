// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend-hosted reply suggestions and thread summaries for email.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_backend::HttpTransport;
use parley_config::ParleyConfig;
use parley_core::{
    Channel, HealthStatus, Message, ParleyError, PluginAdapter, ReplyAssistant, ReplyContext,
    Role, SummaryMode,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct ThreadMessage<'a> {
    role: Role,
    content: &'a str,
    timestamp: DateTime<Utc>,
}

impl<'a> From<&'a Message> for ThreadMessage<'a> {
    fn from(message: &'a Message) -> Self {
        ThreadMessage {
            role: message.role,
            content: &message.content,
            timestamp: message.timestamp,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestRequest<'a> {
    account_id: &'a str,
    email: &'a str,
    subject: Option<&'a str>,
    messages: Vec<ThreadMessage<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummarizeRequest<'a> {
    account_id: &'a str,
    email: &'a str,
    mode: SummaryMode,
    messages: Vec<ThreadMessage<'a>>,
}

#[derive(Deserialize)]
struct SuggestResponse {
    suggestion: String,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// [`ReplyAssistant`] backed by the email assistant endpoints.
pub struct EmailAssistant {
    transport: HttpTransport,
}

impl EmailAssistant {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(HttpTransport::from_config(config, Some(Channel::Email))?))
    }
}

/// Messages the summary should cover for `mode`.
///
/// `LastInbound` keeps only the most recent customer message; an empty
/// selection means there is nothing to summarize.
pub fn summary_window(messages: &[Message], mode: SummaryMode) -> Vec<&Message> {
    match mode {
        SummaryMode::WholeThread => messages.iter().collect(),
        SummaryMode::LastInbound => messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .into_iter()
            .collect(),
    }
}

#[async_trait]
impl PluginAdapter for EmailAssistant {
    fn name(&self) -> &str {
        "email-assistant"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(self.transport.probe("email/health").await)
    }
}

#[async_trait]
impl ReplyAssistant for EmailAssistant {
    async fn suggest_reply(
        &self,
        account_id: &str,
        context: &ReplyContext,
    ) -> Result<String, ParleyError> {
        let request = SuggestRequest {
            account_id,
            email: &context.address,
            subject: context.subject.as_deref(),
            messages: context.messages.iter().map(ThreadMessage::from).collect(),
        };
        let response: SuggestResponse = self
            .transport
            .send_json(Method::POST, "email/suggest-reply", &request)
            .await?;
        debug!(conversation = %context.conversation_id, "reply suggestion received");
        Ok(response.suggestion)
    }

    async fn summarize(
        &self,
        account_id: &str,
        context: &ReplyContext,
        mode: SummaryMode,
    ) -> Result<String, ParleyError> {
        let window = summary_window(&context.messages, mode);
        if window.is_empty() {
            return Err(ParleyError::NotFound(format!(
                "no messages to summarize in {}",
                context.conversation_id
            )));
        }
        let request = SummarizeRequest {
            account_id,
            email: &context.address,
            mode,
            messages: window.into_iter().map(ThreadMessage::from).collect(),
        };
        let response: SummarizeResponse = self
            .transport
            .send_json(Method::POST, "email/summarize", &request)
            .await?;
        Ok(response.summary)
    }
}
