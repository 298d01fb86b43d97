// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides mock adapters and fixtures for fast, deterministic tests
//! without a running dashboard backend.
//!
//! # Components
//!
//! - [`MockChannel`] - Scriptable channel adapter with send capture and failure injection
//! - [`MockBackend`] - In-memory escalations and read state
//! - [`MockAssistant`] - Queued reply suggestions and canned summaries
//! - [`fixtures`] - Conversation and message builders on a fixed clock

pub mod fixtures;
pub mod mock_assistant;
pub mod mock_backend;
pub mod mock_channel;

pub use mock_assistant::MockAssistant;
pub use mock_backend::MockBackend;
pub use mock_channel::{Failure, MockChannel, SentMessage};
