//! accsyn session abstraction and record types
//!
//! The remote service is reached through five opaque calls (find one, find,
//! create, update many, update one). This module defines them as a trait so
//! the reconciliation flow can run against the real REST client or a mock.

use crate::api::query::{EntityKind, Query};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A record returned by the service, kept as raw JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Value);

impl Record {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up a field, accepting flat keys ("source.path") and nested objects
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value);
        }
        path.split('.')
            .try_fold(&self.0, |current, segment| current.get(segment))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Record id; numeric ids are rendered as strings
    pub fn id(&self) -> Option<String> {
        match self.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.get_str("status")
    }

    pub fn code(&self) -> Option<&str> {
        self.get_str("code")
    }

    pub fn uri(&self) -> Option<&str> {
        self.get_str("uri")
    }

    /// Source path of a task, either `source.path` or a plain `source` string
    pub fn source_path(&self) -> Option<&str> {
        self.get_str("source.path")
            .or_else(|| self.get("source").and_then(Value::as_str))
    }
}

/// Session trait for dependency injection and testing
#[async_trait]
pub trait ApiSession: Send + Sync {
    /// First record matching the query, if any
    async fn find_one(&self, query: &Query) -> Result<Option<Record>, ApiError>;

    /// All records matching the query
    async fn find(&self, query: &Query) -> Result<Vec<Record>, ApiError>;

    /// Create one entity, or child entities under `parent_id`
    async fn create(
        &self,
        kind: EntityKind,
        data: Value,
        parent_id: Option<&str>,
    ) -> Result<Value, ApiError>;

    /// Update several child entities of `parent_id` in one call
    async fn update_many(
        &self,
        kind: EntityKind,
        data: Value,
        parent_id: &str,
    ) -> Result<Value, ApiError>;

    /// Update a single entity by id
    async fn update_one(&self, kind: EntityKind, id: &str, data: Value)
        -> Result<Value, ApiError>;

    /// Check that the session is configured and the credentials are accepted
    async fn health_check(&self) -> Result<(), ApiError>;
}

/// accsyn API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Session not configured: {0}")]
    NotConfigured(String),
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("API error: {status} - {message}")]
    Http { status: u16, message: String },
}
