// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock reply assistant with queued suggestions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parley_core::{
    HealthStatus, ParleyError, PluginAdapter, ReplyAssistant, ReplyContext, SummaryMode,
};
use tokio::sync::Mutex;

/// Mock [`ReplyAssistant`].
///
/// Suggestions are returned in the order they were queued; when the queue is
/// empty a numbered placeholder is returned. Summaries echo the mode and the
/// number of messages they covered.
#[derive(Clone, Default)]
pub struct MockAssistant {
    suggestions: Arc<Mutex<VecDeque<String>>>,
    suggest_calls: Arc<AtomicUsize>,
    summarize_calls: Arc<AtomicUsize>,
    fail: Arc<Mutex<bool>>,
    delay: Arc<Mutex<Option<Duration>>>,
    last_context: Arc<Mutex<Option<ReplyContext>>>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suggestions<I, S>(suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::default();
        if let Ok(mut queue) = mock.suggestions.try_lock() {
            queue.extend(suggestions.into_iter().map(Into::into));
        }
        mock
    }

    pub async fn fail(&self, fail: bool) {
        *self.fail.lock().await = fail;
    }

    /// Delays every suggestion and summary by `delay`.
    pub async fn delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// Context of the most recent call.
    pub async fn last_context(&self) -> Option<ReplyContext> {
        self.last_context.lock().await.clone()
    }

    async fn record(&self, context: &ReplyContext) {
        *self.last_context.lock().await = Some(context.clone());
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn suggest_calls(&self) -> usize {
        self.suggest_calls.load(Ordering::SeqCst)
    }

    pub fn summarize_calls(&self) -> usize {
        self.summarize_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockAssistant {
    fn name(&self) -> &str {
        "mock-assistant"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ReplyAssistant for MockAssistant {
    async fn suggest_reply(
        &self,
        _account_id: &str,
        context: &ReplyContext,
    ) -> Result<String, ParleyError> {
        let n = self.suggest_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(context).await;
        if *self.fail.lock().await {
            return Err(ParleyError::channel("assistant unavailable"));
        }
        Ok(self
            .suggestions
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| format!("suggestion {n}")))
    }

    async fn summarize(
        &self,
        _account_id: &str,
        context: &ReplyContext,
        mode: SummaryMode,
    ) -> Result<String, ParleyError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        self.record(context).await;
        if *self.fail.lock().await {
            return Err(ParleyError::channel("assistant unavailable"));
        }
        Ok(format!("{mode} summary of {} messages", context.messages.len()))
    }
}
