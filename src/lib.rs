//! backup-sync
//!
//! Keeps the task list of an accsyn backup job in line with the project
//! folders that exist on disk (or in a project manifest).
//!
//! # Overview
//!
//! A run goes through four steps:
//! - build the inventory of project folders to back up
//! - find the backup job and its tasks through the accsyn API
//! - plan the reconciliation (create, re-queue, exclude)
//! - submit the planned calls
//!
//! # Quick Start
//!
//! ```rust
//! use backup_sync::api::{EntityKind, Query};
//! use backup_sync::reconcile::Status;
//!
//! // Queries are rendered the way the accsyn API expects them
//! let query = Query::tasks_of_job("5f1a").ne_bare("status", "excluded");
//! assert_eq!(query.to_string(), "task WHERE job.id=5f1a AND status!=excluded");
//! assert_eq!(query.entity(), EntityKind::Task);
//!
//! // Finished tasks are the ones a run re-queues
//! assert!(Status::parse("done").is_finished());
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod inventory;
pub mod observability;
pub mod reconcile;
pub mod sync;
pub mod testing;

pub use api::{AccsynClient, AccsynConfig, ApiError, ApiSession};
pub use config::*;
pub use error::{BackupError, BackupResult};
pub use inventory::{Entry, Inventory};
pub use reconcile::{SyncPlan, Status};
pub use sync::{BackupSync, SyncReport};
