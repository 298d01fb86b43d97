// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard backend client: escalation records and operator read state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_config::ParleyConfig;
use parley_core::{
    ConversationId, Escalation, EscalationBackend, HealthStatus, ParleyError, PluginAdapter,
    ReadState, ReadStateStore,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::transport::HttpTransport;
use crate::wire;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EscalationRecord {
    id: String,
    conversation_id: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(deserialize_with = "wire::timestamp")]
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveRequest<'a> {
    account_id: &'a str,
    conversation_id: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadStateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    conversation_id: String,
    operator_id: String,
    #[serde(deserialize_with = "wire::timestamp")]
    last_read_at: DateTime<Utc>,
}

/// Client for the backend-owned records the inbox core depends on.
pub struct BackendClient {
    transport: HttpTransport,
}

impl BackendClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ParleyError> {
        Ok(Self::new(HttpTransport::from_config(config, None)?))
    }
}

#[async_trait]
impl PluginAdapter for BackendClient {
    fn name(&self) -> &str {
        "backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(self.transport.probe("health").await)
    }
}

#[async_trait]
impl EscalationBackend for BackendClient {
    async fn list_escalations(&self, account_id: &str) -> Result<Vec<Escalation>, ParleyError> {
        let records: Vec<EscalationRecord> = self
            .transport
            .get_json("escalations", &[("accountId", account_id)])
            .await?;
        debug!(count = records.len(), "escalations fetched");
        Ok(records
            .into_iter()
            .map(|r| Escalation {
                id: r.id,
                conversation_id: ConversationId::from_raw(r.conversation_id),
                reason: r.reason,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn resolve_escalation(
        &self,
        account_id: &str,
        conversation_id: &ConversationId,
    ) -> Result<(), ParleyError> {
        self.transport
            .send_ack(
                Method::PATCH,
                "escalations/resolve",
                &ResolveRequest {
                    account_id,
                    conversation_id: conversation_id.as_str(),
                },
            )
            .await?;
        info!(conversation = %conversation_id, "escalation resolved");
        Ok(())
    }
}

#[async_trait]
impl ReadStateStore for BackendClient {
    async fn mark_read(&self, account_id: &str, state: &ReadState) -> Result<(), ParleyError> {
        let record = ReadStateRecord {
            account_id: Some(account_id.to_string()),
            conversation_id: state.conversation_id.to_string(),
            operator_id: state.operator_id.clone(),
            last_read_at: state.last_read_at,
        };
        self.transport
            .send_ack(Method::PUT, "read-state", &record)
            .await
    }

    async fn list_read_states(
        &self,
        account_id: &str,
        operator_id: &str,
    ) -> Result<Vec<ReadState>, ParleyError> {
        let records: Vec<ReadStateRecord> = self
            .transport
            .get_json(
                "read-state",
                &[("accountId", account_id), ("operatorId", operator_id)],
            )
            .await?;
        Ok(records
            .into_iter()
            .map(|r| ReadState {
                conversation_id: ConversationId::from_raw(r.conversation_id),
                operator_id: r.operator_id,
                last_read_at: r.last_read_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> BackendClient {
        BackendClient::new(
            HttpTransport::new(
                &server.uri(),
                None,
                Duration::from_secs(5),
                Duration::from_secs(30),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn lists_escalations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/escalations"))
            .and(query_param("accountId", "acct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": "esc-1",
                    "conversationId": "sms-+4790000000",
                    "reason": "wants a human",
                    "createdAt": "2026-03-01T09:00:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let escalations = client(&server).await.list_escalations("acct").await.unwrap();
        assert_eq!(escalations.len(), 1);
        assert_eq!(escalations[0].conversation_id.as_str(), "sms-+4790000000");
        assert_eq!(escalations[0].reason.as_deref(), Some("wants a human"));
    }

    #[tokio::test]
    async fn resolves_escalation_by_conversation_id() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/escalations/resolve"))
            .and(body_partial_json(serde_json::json!({
                "accountId": "acct",
                "conversationId": "widget-s1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .resolve_escalation("acct", &ConversationId::from_raw("widget-s1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn read_state_round_trips_through_backend() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/read-state"))
            .and(body_partial_json(serde_json::json!({
                "conversationId": "email-kari@example.no",
                "operatorId": "op-1"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/read-state"))
            .and(query_param("operatorId", "op-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "conversationId": "email-kari@example.no",
                    "operatorId": "op-1",
                    "lastReadAt": 1772355600000i64
                }
            ])))
            .mount(&server)
            .await;

        let backend = client(&server).await;
        let state = ReadState {
            conversation_id: ConversationId::from_raw("email-kari@example.no"),
            operator_id: "op-1".into(),
            last_read_at: Utc::now(),
        };
        backend.mark_read("acct", &state).await.unwrap();

        let states = backend.list_read_states("acct", "op-1").await.unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].conversation_id, state.conversation_id);
    }

    #[tokio::test]
    async fn health_check_reports_unreachable_backend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let status = client(&server).await.health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(_)));
    }
}
