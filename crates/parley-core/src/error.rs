// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley inbox.

use std::time::Duration;

use thiserror::Error;

use crate::types::Channel;

/// The primary error type used across all Parley adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, missing required fields, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Channel adapter errors (transport failure, non-2xx response, refused operation).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The upstream API asked us to slow down (HTTP 429).
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// The channel does not offer this operation (e.g. manual mode on email).
    #[error("{operation} is not supported on the {channel} channel")]
    Unsupported {
        channel: Channel,
        operation: &'static str,
    },

    /// A referenced conversation, message or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A provider payload could not be decoded into the common shape.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Shorthand for a [`ParleyError::Channel`] without a source error.
    pub fn channel(message: impl Into<String>) -> Self {
        ParleyError::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// Suggested retry delay when this is a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ParleyError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Whether retrying the same request later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ParleyError::Channel { .. } | ParleyError::RateLimited { .. } | ParleyError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_exposes_retry_after() {
        let err = ParleyError::RateLimited {
            retry_after: Duration::from_secs(12),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
        assert!(err.is_retryable());
        assert!(ParleyError::channel("boom").retry_after().is_none());
    }

    #[test]
    fn unsupported_is_not_retryable() {
        let err = ParleyError::Unsupported {
            channel: Channel::Email,
            operation: "manual mode",
        };
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "manual mode is not supported on the email channel"
        );
    }
}
