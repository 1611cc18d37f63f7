//! Mock implementations for testing
//!
//! Provides an in-memory accsyn session that records every call and behaves
//! like the service for the handful of operations the sync flow uses.

use crate::api::{ApiError, ApiSession, EntityKind, Query, Record};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A call made against the mock session
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    FindOne(String),
    Find(String),
    Create {
        kind: EntityKind,
        data: Value,
        parent_id: Option<String>,
    },
    UpdateMany {
        kind: EntityKind,
        data: Value,
        parent_id: String,
    },
    UpdateOne {
        kind: EntityKind,
        id: String,
        data: Value,
    },
}

impl RecordedCall {
    /// True for calls that change remote state
    pub fn is_write(&self) -> bool {
        !matches!(self, RecordedCall::FindOne(_) | RecordedCall::Find(_))
    }
}

/// In-memory job/task store
#[derive(Debug, Default)]
pub struct MockSession {
    pub jobs: Arc<Mutex<Vec<Record>>>,
    pub tasks: Arc<Mutex<Vec<(String, Record)>>>,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
    pub should_fail: bool,
    next_id: AtomicU64,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Seed a job; returns its id
    pub async fn add_job(&self, code: &str, status: &str) -> String {
        let id = self.next_id("job");
        self.jobs
            .lock()
            .await
            .push(Record::new(json!({"id": id, "code": code, "status": status})));
        id
    }

    /// Seed a task under a job; returns its id
    pub async fn add_task(&self, job_id: &str, uri: &str, status: &str) -> String {
        let id = self.next_id("task");
        let task = json!({
            "id": id,
            "uri": uri,
            "status": status,
            "source": {"path": format!("/projects/{uri}")},
        });
        self.tasks
            .lock()
            .await
            .push((job_id.to_string(), Record::new(task)));
        id
    }

    pub async fn get_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn get_write_calls(&self) -> Vec<RecordedCall> {
        self.get_calls()
            .await
            .into_iter()
            .filter(RecordedCall::is_write)
            .collect()
    }

    pub async fn get_job(&self, code: &str) -> Option<Record> {
        self.jobs
            .lock()
            .await
            .iter()
            .find(|job| job.code() == Some(code))
            .cloned()
    }

    /// Status of the task with the given uri in the given job
    pub async fn task_status(&self, job_id: &str, uri: &str) -> Option<String> {
        self.tasks
            .lock()
            .await
            .iter()
            .find(|(job, task)| job == job_id && task.uri() == Some(uri))
            .and_then(|(_, task)| task.status().map(str::to_string))
    }

    pub async fn clear_history(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: RecordedCall) -> Result<(), ApiError> {
        self.calls.lock().await.push(call);
        if self.should_fail {
            Err(ApiError::NetworkError("Mock session failure".to_string()))
        } else {
            Ok(())
        }
    }

    fn set_fields(record: &mut Record, data: &Value) {
        if let (Value::Object(target), Value::Object(fields)) = (&mut record.0, data) {
            for (key, value) in fields {
                if key != "id" {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Add tasks from a `{uri: {source, ...}}` map; existing uris are re-queued
    async fn upsert_tasks(&self, job_id: &str, tasks: &Map<String, Value>) -> Vec<Value> {
        let mut created = Vec::new();
        for (uri, spec) in tasks {
            let mut store = self.tasks.lock().await;
            if let Some((_, task)) = store
                .iter_mut()
                .find(|(job, task)| job == job_id && task.uri() == Some(uri.as_str()))
            {
                Self::set_fields(task, &json!({"status": "queued"}));
                created.push(task.0.clone());
                continue;
            }
            let task = json!({
                "id": self.next_id("task"),
                "uri": uri,
                "status": "queued",
                "source": {"path": spec.get("source").cloned().unwrap_or(Value::Null)},
                "destination": spec.get("destination").cloned().unwrap_or(Value::Null),
            });
            created.push(task.clone());
            store.push((job_id.to_string(), Record::new(task)));
        }
        created
    }

    /// Evaluate a query the way the service would for the queries this crate builds
    async fn lookup(&self, query: &Query) -> Vec<Record> {
        let rendered = query.to_string();
        match query.entity() {
            EntityKind::Job => {
                let jobs = self.jobs.lock().await;
                jobs.iter()
                    .filter(|job| {
                        job.code()
                            .is_some_and(|code| Query::job_by_code(code).to_string() == rendered)
                    })
                    .cloned()
                    .collect()
            }
            EntityKind::Task => {
                let tasks = self.tasks.lock().await;
                tasks
                    .iter()
                    .filter(|(job_id, _)| Query::tasks_of_job(job_id).to_string() == rendered)
                    .map(|(_, task)| task.clone())
                    .collect()
            }
            EntityKind::User => Vec::new(),
        }
    }
}

#[async_trait]
impl ApiSession for MockSession {
    async fn find_one(&self, query: &Query) -> Result<Option<Record>, ApiError> {
        self.record(RecordedCall::FindOne(query.to_string())).await?;
        Ok(self.lookup(query).await.into_iter().next())
    }

    async fn find(&self, query: &Query) -> Result<Vec<Record>, ApiError> {
        self.record(RecordedCall::Find(query.to_string())).await?;
        Ok(self.lookup(query).await)
    }

    async fn create(
        &self,
        kind: EntityKind,
        data: Value,
        parent_id: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.record(RecordedCall::Create {
            kind,
            data: data.clone(),
            parent_id: parent_id.map(str::to_string),
        })
        .await?;

        let empty = Map::new();
        let tasks = data.get("tasks").and_then(Value::as_object).unwrap_or(&empty);

        match (kind, parent_id) {
            (EntityKind::Job, None) => {
                let id = self.next_id("job");
                let mut job = data.clone();
                if let Value::Object(fields) = &mut job {
                    fields.remove("tasks");
                    fields.insert("id".to_string(), json!(id));
                    fields.insert("status".to_string(), json!("queued"));
                }
                self.jobs.lock().await.push(Record::new(job.clone()));
                self.upsert_tasks(&id, tasks).await;
                Ok(job)
            }
            (EntityKind::Task, Some(job_id)) => {
                let tasks = data.as_object().cloned().unwrap_or_default();
                Ok(Value::Array(self.upsert_tasks(job_id, &tasks).await))
            }
            _ => Err(ApiError::Http {
                status: 400,
                message: format!("Mock cannot create {kind} with parent {parent_id:?}"),
            }),
        }
    }

    async fn update_many(
        &self,
        kind: EntityKind,
        data: Value,
        parent_id: &str,
    ) -> Result<Value, ApiError> {
        self.record(RecordedCall::UpdateMany {
            kind,
            data: data.clone(),
            parent_id: parent_id.to_string(),
        })
        .await?;

        let mut store = self.tasks.lock().await;
        for update in data.as_array().into_iter().flatten() {
            let Some(id) = update.get("id").and_then(Value::as_str) else {
                continue;
            };
            if let Some((_, task)) = store
                .iter_mut()
                .find(|(job, task)| job == parent_id && task.id().as_deref() == Some(id))
            {
                Self::set_fields(task, update);
            }
        }
        Ok(json!({"updated": data.as_array().map(Vec::len).unwrap_or(0)}))
    }

    async fn update_one(
        &self,
        kind: EntityKind,
        id: &str,
        data: Value,
    ) -> Result<Value, ApiError> {
        self.record(RecordedCall::UpdateOne {
            kind,
            id: id.to_string(),
            data: data.clone(),
        })
        .await?;

        let updated = match kind {
            EntityKind::Job => {
                let mut jobs = self.jobs.lock().await;
                jobs.iter_mut()
                    .find(|job| job.id().as_deref() == Some(id))
                    .map(|job| {
                        Self::set_fields(job, &data);
                        job.0.clone()
                    })
            }
            EntityKind::Task => {
                let mut tasks = self.tasks.lock().await;
                tasks
                    .iter_mut()
                    .find(|(_, task)| task.id().as_deref() == Some(id))
                    .map(|(_, task)| {
                        Self::set_fields(task, &data);
                        task.0.clone()
                    })
            }
            EntityKind::User => None,
        };

        updated.ok_or_else(|| ApiError::Http {
            status: 404,
            message: format!("{kind} {id} not found"),
        })
    }

    async fn health_check(&self) -> Result<(), ApiError> {
        if self.should_fail {
            Err(ApiError::AuthenticationFailed(
                "Mock health check failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
