// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-over-HTTP transport shared by the backend client and channel adapters.
//!
//! Maps HTTP status codes into [`ParleyError`]: 429 becomes
//! [`ParleyError::RateLimited`] with the server's `Retry-After` (or the
//! configured default), every other non-2xx becomes a channel error carrying
//! the status and body.

use std::time::Duration;

use parley_config::ParleyConfig;
use parley_core::{Channel, HealthStatus, ParleyError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Acknowledgement body returned by write endpoints.
#[derive(Debug, Deserialize)]
pub struct Ack {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

/// HTTP client bound to one base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    default_retry_after: Duration,
}

impl HttpTransport {
    /// Creates a transport for `base_url`.
    ///
    /// `api_key`, when present, is sent as a bearer token on every request.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
        default_retry_after: Duration,
    ) -> Result<Self, ParleyError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| ParleyError::Config(format!("invalid API key header value: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ParleyError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        // Validate once so request paths can be joined without re-checking.
        Url::parse(base_url)
            .map_err(|e| ParleyError::Config(format!("invalid base URL `{base_url}`: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_retry_after,
        })
    }

    /// Transport for the dashboard backend (`channel = None`) or one channel.
    pub fn from_config(config: &ParleyConfig, channel: Option<Channel>) -> Result<Self, ParleyError> {
        let base_url = match channel {
            Some(channel) => config.channel_base_url(channel),
            None => &config.backend.base_url,
        };
        Self::new(
            base_url,
            config.backend.api_key.as_deref(),
            config.backend.timeout(),
            config.poll.default_retry_after(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds `<base>/<path>?<query>`.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ParleyError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw)
            .map_err(|e| ParleyError::Internal(format!("invalid request URL `{raw}`: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// `GET` a JSON document.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ParleyError> {
        let url = self.url(path, query)?;
        let response = self.execute(self.client.get(url)).await?;
        decode(response).await
    }

    /// Sends a JSON body and decodes a JSON response.
    pub async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ParleyError> {
        let url = self.url(path, &[])?;
        let response = self
            .execute(self.client.request(method, url).json(body))
            .await?;
        decode(response).await
    }

    /// Sends a JSON body to a write endpoint and checks its acknowledgement.
    ///
    /// An empty body counts as success; `{"success": false}` is an error.
    pub async fn send_ack<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ParleyError> {
        let url = self.url(path, &[])?;
        let response = self
            .execute(self.client.request(method, url).json(body))
            .await?;
        let text = read_body(response).await?;
        if text.trim().is_empty() {
            return Ok(());
        }
        let ack: Ack = serde_json::from_str(&text).map_err(|e| ParleyError::Decode {
            message: format!("invalid acknowledgement from {path}: {e}"),
            source: Some(Box::new(e)),
        })?;
        if ack.success {
            Ok(())
        } else {
            Err(ParleyError::channel(format!(
                "{path} refused the request: {}",
                ack.error.unwrap_or_else(|| "no reason given".to_string())
            )))
        }
    }

    /// Reachability probe used by adapter health checks.
    pub async fn probe(&self, path: &str) -> HealthStatus {
        let url = match self.url(path, &[]) {
            Ok(url) => url,
            Err(e) => return HealthStatus::Unhealthy(e.to_string()),
        };
        match self.execute(self.client.get(url)).await {
            Ok(_) => HealthStatus::Healthy,
            Err(ParleyError::RateLimited { .. }) => {
                HealthStatus::Degraded("rate limited".to_string())
            }
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ParleyError> {
        let response = request.send().await.map_err(|e| {
            let kind = if e.is_timeout() { "timed out" } else { "failed" };
            ParleyError::Channel {
                message: format!("HTTP request {kind}: {e}"),
                source: Some(Box::new(e)),
            }
        })?;

        let status = response.status();
        debug!(status = %status, url = %response.url(), "response received");
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after =
                parse_retry_after(response.headers()).unwrap_or(self.default_retry_after);
            warn!(url = %response.url(), retry_after = ?retry_after, "rate limited");
            return Err(ParleyError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();
        Err(ParleyError::channel(format!("API returned {status}: {body}")))
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, ParleyError> {
    response.text().await.map_err(|e| ParleyError::Channel {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ParleyError> {
    let url = response.url().clone();
    let body = read_body(response).await?;
    serde_json::from_str(&body).map_err(|e| ParleyError::Decode {
        message: format!("failed to parse response from {}: {e}", url.path()),
        source: Some(Box::new(e)),
    })
}

/// `Retry-After` in delta-seconds form. HTTP-date values fall back to the default.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
