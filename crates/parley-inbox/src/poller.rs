// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interval-driven refresh loops.
//!
//! The scheduler runs one list loop for the whole session and at most one
//! message loop, scoped to the selected conversation. Each tick spawns its
//! fetch as a separate task, so a slow fetch never delays the next tick and
//! fetches may overlap. All tasks are tracked and awaited on shutdown.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Owns the poll loops of one inbox session.
pub struct PollScheduler {
    root: CancellationToken,
    tracker: TaskTracker,
    list_interval: Duration,
    message_interval: Duration,
    list_loop: Mutex<Option<CancellationToken>>,
    message_loop: Mutex<Option<CancellationToken>>,
}

impl PollScheduler {
    /// Creates a scheduler whose loops stop when `parent` is cancelled.
    pub fn new(parent: &CancellationToken, list_interval: Duration, message_interval: Duration) -> Self {
        Self {
            root: parent.child_token(),
            tracker: TaskTracker::new(),
            list_interval,
            message_interval,
            list_loop: Mutex::new(None),
            message_loop: Mutex::new(None),
        }
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    pub fn is_stopped(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Starts (or restarts) the list loop. The first tick fires one
    /// interval from now; the initial load is the caller's job.
    pub fn start_list_loop<F, Fut>(&self, tick: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.spawn_loop("list", self.list_interval, tick);
        replace_loop(&self.list_loop, token);
    }

    /// Starts the message loop for a newly selected conversation, cancelling
    /// the loop of the previous one.
    pub fn start_message_loop<F, Fut>(&self, tick: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = self.spawn_loop("messages", self.message_interval, tick);
        replace_loop(&self.message_loop, token);
    }

    pub fn stop_message_loop(&self) {
        replace_loop(&self.message_loop, None);
    }

    /// Cancels every loop and waits for in-flight fetches to finish.
    pub async fn shutdown(&self) {
        self.root.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        info!("poll scheduler stopped");
    }

    fn spawn_loop<F, Fut>(&self, name: &'static str, period: Duration, tick: F) -> Option<CancellationToken>
    where
        F: Fn(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.root.is_cancelled() {
            return None;
        }
        let token = self.root.child_token();
        let loop_token = token.clone();
        let tracker = self.tracker.clone();

        self.tracker.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticks.tick() => {
                        let fetch = tick(loop_token.clone());
                        let fetch_token = loop_token.clone();
                        tracker.spawn(async move {
                            tokio::select! {
                                _ = fetch_token.cancelled() => {}
                                _ = fetch => {}
                            }
                        });
                    }
                }
            }
            debug!(poll_loop = name, "poll loop stopped");
        });
        Some(token)
    }
}

fn replace_loop(slot: &Mutex<Option<CancellationToken>>, token: Option<CancellationToken>) {
    let previous = match slot.lock() {
        Ok(mut guard) => std::mem::replace(&mut *guard, token),
        Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), token),
    };
    if let Some(previous) = previous {
        previous.cancel();
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
