// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lookup table from [`Channel`] to its adapter.

use std::collections::BTreeMap;
use std::sync::Arc;

use parley_core::{Channel, ChannelAdapter};
use tracing::warn;

/// Registered channel adapters, at most one per channel.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    adapters: BTreeMap<Channel, Arc<dyn ChannelAdapter>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under the channel it reports. A later
    /// registration for the same channel replaces the earlier one.
    pub fn register(&mut self, adapter: Arc<dyn ChannelAdapter>) {
        let channel = adapter.channel();
        if self.adapters.insert(channel, adapter).is_some() {
            warn!(channel = %channel, "replacing previously registered adapter");
        }
    }

    pub fn get(&self, channel: Channel) -> Option<&Arc<dyn ChannelAdapter>> {
        self.adapters.get(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.adapters.keys().copied()
    }

    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn ChannelAdapter>> {
        self.adapters.values()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
