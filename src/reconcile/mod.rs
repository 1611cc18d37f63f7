//! Reconciliation between the local inventory and the remote backup job

pub mod plan;
pub mod status;

pub use plan::{plan_sync, task_name, JobSpec, RemoteJob, SyncPlan, TaskRef, TaskSpec};
pub use status::Status;
