//! accsyn REST client
//!
//! Implements [`ApiSession`] over HTTPS + JSON. Every response body is an
//! envelope `{"result": ...}`; failures come back as non-2xx statuses.

use crate::api::query::{EntityKind, Query};
use crate::api::session::{ApiError, ApiSession, Record};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, Instrument};
use url::Url;

/// Client configuration
#[derive(Debug, Clone)]
pub struct AccsynConfig {
    pub base_url: String,
    pub user: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for AccsynConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user: String::new(),
            api_key: String::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// REST implementation of the accsyn session
pub struct AccsynClient {
    config: AccsynConfig,
    base_url: Url,
    client: Client,
}

impl AccsynClient {
    /// Create a new client
    pub fn new(config: AccsynConfig) -> Result<Self, ApiError> {
        if config.user.is_empty() || config.api_key.is_empty() {
            return Err(ApiError::NotConfigured(
                "accsyn API user and key are required".to_string(),
            ));
        }

        // A trailing slash makes Url::join append instead of replacing the last segment
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .map_err(|e| {
                ApiError::NotConfigured(format!("Invalid base URL '{}': {e}", config.base_url))
            })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::NotConfigured(format!("Invalid endpoint '{path}': {e}")))
    }

    fn authorization(&self) -> String {
        format!(
            "ASCredentials username={};apikey={}",
            self.config.user, self.config.api_key
        )
    }

    /// Send a request and unwrap the `result` envelope
    async fn execute(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request
            .header("Authorization", self.authorization())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, error_text));
        }

        let envelope: ResultEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        Ok(envelope.result)
    }

    async fn query(&self, query: &Query, limit: Option<usize>) -> Result<Vec<Record>, ApiError> {
        let url = self.endpoint(&format!("{}/find", query.entity()))?;
        let mut params = vec![("query", query.to_string())];
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }

        let result = self.execute(self.client.get(url).query(&params)).await?;
        match result {
            Value::Array(items) => Ok(items.into_iter().map(Record::new).collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(ApiError::InvalidResponse(format!(
                "Expected a list of records, got: {other}"
            ))),
        }
    }
}

fn map_status_error(status: StatusCode, error_text: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::AuthenticationFailed(
            format!("accsyn rejected credentials: {status} - {error_text}"),
        ),
        _ => ApiError::Http {
            status: status.as_u16(),
            message: error_text,
        },
    }
}

#[async_trait]
impl ApiSession for AccsynClient {
    async fn find_one(&self, query: &Query) -> Result<Option<Record>, ApiError> {
        let span = crate::api_span!(call = "find_one", query = %query);
        let records = self.query(query, Some(1)).instrument(span).await?;
        Ok(records.into_iter().next())
    }

    async fn find(&self, query: &Query) -> Result<Vec<Record>, ApiError> {
        let span = crate::api_span!(call = "find", query = %query);
        let records = self.query(query, None).instrument(span).await?;
        debug!("Query '{}' returned {} record(s)", query, records.len());
        Ok(records)
    }

    async fn create(
        &self,
        kind: EntityKind,
        data: Value,
        parent_id: Option<&str>,
    ) -> Result<Value, ApiError> {
        let span = crate::api_span!(call = "create", kind = %kind, parent = ?parent_id);
        let url = self.endpoint(kind.as_str())?;
        let body = WriteRequest { data, parent_id };
        self.execute(self.client.post(url).json(&body))
            .instrument(span)
            .await
    }

    async fn update_many(
        &self,
        kind: EntityKind,
        data: Value,
        parent_id: &str,
    ) -> Result<Value, ApiError> {
        let span = crate::api_span!(call = "update_many", kind = %kind, parent = parent_id);
        let url = self.endpoint(kind.as_str())?;
        let body = WriteRequest {
            data,
            parent_id: Some(parent_id),
        };
        self.execute(self.client.put(url).json(&body))
            .instrument(span)
            .await
    }

    async fn update_one(
        &self,
        kind: EntityKind,
        id: &str,
        data: Value,
    ) -> Result<Value, ApiError> {
        let span = crate::api_span!(call = "update_one", kind = %kind, id = id);
        let url = self.endpoint(&format!("{}/{}", kind.as_str(), id))?;
        let body = WriteRequest {
            data,
            parent_id: None,
        };
        self.execute(self.client.put(url).json(&body))
            .instrument(span)
            .await
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        let span = crate::api_span!(call = "health_check");
        let url = self.endpoint("user/me")?;
        self.execute(self.client.get(url))
            .instrument(span)
            .await
            .map(|_| ())
    }
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    #[serde(default)]
    result: Value,
}
