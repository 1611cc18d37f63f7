//! Reconciliation of the local inventory against a remote job
//!
//! Planning is pure: it takes the inventory and whatever the service reported
//! about the job and decides which calls to make. Applying the plan is the
//! runner's business.

use crate::api::Record;
use crate::config::{JobSection, JobSettings};
use crate::inventory::Inventory;
use crate::reconcile::status::Status;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::warn;

/// A task to submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSpec {
    pub uri: String,
    pub source: String,
}

/// An existing remote task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRef {
    pub id: String,
    pub uri: String,
    pub status: Status,
}

/// A new backup job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSpec {
    pub code: String,
    pub destination: String,
    pub mirror_paths: bool,
    pub settings: JobSettings,
    pub tasks: Vec<TaskSpec>,
}

impl JobSpec {
    /// Payload for `create("job", ...)`; tasks are keyed by uri
    pub fn to_payload(&self) -> Value {
        let mut tasks = Map::new();
        for task in &self.tasks {
            tasks.insert(
                task.uri.clone(),
                json!({"source": task.source, "destination": self.destination}),
            );
        }
        json!({
            "code": self.code,
            "tasks": tasks,
            "mirror_paths": self.mirror_paths,
            "settings": self.settings,
        })
    }
}

/// What the service reported about the job
#[derive(Debug, Clone)]
pub struct RemoteJob {
    pub id: String,
    pub status: Status,
    pub tasks: Vec<Record>,
}

/// Calls to make to bring the job in line with the inventory
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncPlan {
    /// Existing job, if any
    pub job_id: Option<String>,
    pub create_job: Option<JobSpec>,
    pub create_tasks: Vec<TaskSpec>,
    pub requeue: Vec<TaskRef>,
    pub exclude: Vec<TaskRef>,
    /// Candidates already pending at the remote end
    pub matched: Vec<String>,
    pub resume_job: bool,
}

impl SyncPlan {
    pub fn is_noop(&self) -> bool {
        self.create_job.is_none()
            && self.create_tasks.is_empty()
            && self.requeue.is_empty()
            && self.exclude.is_empty()
            && !self.resume_job
    }

    /// Payload for `create("task", ..., job_id)`; tasks are keyed by uri
    pub fn create_tasks_payload(&self) -> Value {
        let tasks: Map<String, Value> = self
            .create_tasks
            .iter()
            .map(|task| (task.uri.clone(), json!({"source": task.source})))
            .collect();
        Value::Object(tasks)
    }

    /// Payload for `update_many("task", ..., job_id)`
    pub fn exclude_payload(&self) -> Value {
        Value::Array(
            self.exclude
                .iter()
                .map(|task| json!({"id": task.id, "status": Status::Excluded}))
                .collect(),
        )
    }
}

/// Name a remote task is matched by: its uri, else the last component of its source path
pub fn task_name(task: &Record) -> Option<String> {
    if let Some(uri) = task.uri().filter(|uri| !uri.is_empty()) {
        return Some(uri.to_string());
    }
    // Sources may come from Windows hosts, so split on both separators
    task.source_path()
        .map(|p| p.trim_end_matches(['/', '\\']))
        .and_then(|p| p.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn task_ref(task: &Record) -> Option<TaskRef> {
    let Some(id) = task.id() else {
        warn!("Ignoring remote task without id: {}", task.0);
        return None;
    };
    let Some(uri) = task_name(task) else {
        warn!("Ignoring remote task {} without uri or source path", id);
        return None;
    };
    Some(TaskRef {
        id,
        uri,
        status: Status::parse(task.status().unwrap_or_default()),
    })
}

/// Decide which calls bring the remote job in line with the inventory
///
/// Nothing is planned when there are no candidates, so that an unreachable
/// projects share never excludes every remote task.
pub fn plan_sync(inventory: &Inventory, job: &JobSection, remote: Option<&RemoteJob>) -> SyncPlan {
    if inventory.is_empty() {
        return SyncPlan {
            job_id: remote.map(|r| r.id.clone()),
            ..Default::default()
        };
    }

    let specs: Vec<TaskSpec> = inventory
        .candidates
        .iter()
        .map(|entry| TaskSpec {
            uri: entry.name.clone(),
            source: entry.source_path().to_string(),
        })
        .collect();

    let Some(remote) = remote else {
        return SyncPlan {
            create_job: Some(JobSpec {
                code: job.code.clone(),
                destination: format!("site={}", job.backup_site),
                mirror_paths: job.mirror_paths,
                settings: job.settings.clone(),
                tasks: specs,
            }),
            ..Default::default()
        };
    };

    let tasks: Vec<TaskRef> = remote.tasks.iter().filter_map(task_ref).collect();

    // First task wins when the service holds duplicates
    let mut by_name: HashMap<&str, &TaskRef> = HashMap::new();
    for task in &tasks {
        by_name.entry(task.uri.as_str()).or_insert(task);
    }

    let mut plan = SyncPlan {
        job_id: Some(remote.id.clone()),
        ..Default::default()
    };

    for spec in specs {
        match by_name.get(spec.uri.as_str()) {
            None => plan.create_tasks.push(spec),
            Some(task) if task.status.is_finished() => plan.requeue.push((*task).clone()),
            Some(_) => plan.matched.push(spec.uri),
        }
    }

    plan.exclude = tasks
        .iter()
        .filter(|task| !inventory.is_active(&task.uri) && task.status != Status::Excluded)
        .cloned()
        .collect();

    let submitted = !plan.create_tasks.is_empty() || !plan.requeue.is_empty();
    plan.resume_job = job.resume && submitted && remote.status.is_finished();

    plan
}
