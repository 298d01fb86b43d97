// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP plumbing for the Parley inbox.
//!
//! - [`HttpTransport`]: JSON-over-HTTP client with status-to-error mapping,
//!   shared by every channel adapter.
//! - [`BackendClient`]: escalation records and per-operator read state.
//! - [`wire`]: serde helpers for provider timestamp formats.

pub mod client;
pub mod transport;
pub mod wire;

pub use client::BackendClient;
pub use transport::HttpTransport;
