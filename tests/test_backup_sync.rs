//! Sync flow tests
//!
//! Drives full runs against the in-memory session and real project folders,
//! checking the calls submitted and the resulting remote state.

mod test_helpers;

use backup_sync::api::EntityKind;
use backup_sync::error::BackupError;
use backup_sync::sync::BackupSync;
use backup_sync::testing::{MockSession, RecordedCall};
use serde_json::json;
use tempfile::TempDir;
use test_helpers::{make_empty_project, make_project, manifest_config, test_config};

#[tokio::test]
async fn test_first_run_creates_job_with_non_empty_projects() {
    let root = TempDir::new().unwrap();
    make_project(root.path(), "PR01");
    make_project(root.path(), "PR02");
    make_empty_project(root.path(), "PR03");
    make_project(root.path(), ".cache");

    let sync = BackupSync::new(test_config(root.path()), MockSession::new());
    let report = sync.run().await.unwrap();

    assert!(report.job_created);
    assert_eq!(report.candidates, 2);
    assert_eq!(report.tasks_created, 2);
    assert!(report.job_id.is_some());

    let writes = sync.session().get_write_calls().await;
    assert_eq!(writes.len(), 1);
    match &writes[0] {
        RecordedCall::Create {
            kind,
            data,
            parent_id,
        } => {
            assert_eq!(*kind, EntityKind::Job);
            assert!(parent_id.is_none());
            assert_eq!(data["code"], "Daily Backup");
            assert_eq!(data["mirror_paths"], true);
            assert_eq!(data["settings"]["transfer_mode"], "onewaysync");
            assert_eq!(data["settings"]["job_done_actions"], "delete_excluded");

            let tasks = data["tasks"].as_object().unwrap();
            assert_eq!(tasks.len(), 2);
            assert_eq!(tasks["PR01"]["destination"], "site=backup");
            assert_eq!(
                tasks["PR01"]["source"],
                root.path().join("PR01").to_str().unwrap()
            );
            assert!(!tasks.contains_key("PR03"), "empty folders are not submitted");
            assert!(!tasks.contains_key(".cache"), "hidden folders are skipped");
        }
        other => panic!("Expected job creation, got {other:?}"),
    }

    assert!(sync.session().get_job("Daily Backup").await.is_some());
}

#[tokio::test]
async fn test_existing_job_is_reconciled_with_projects_on_disk() {
    let root = TempDir::new().unwrap();
    make_project(root.path(), "PR01");
    make_project(root.path(), "PR02");
    make_project(root.path(), "PR04");

    let session = MockSession::new();
    let job_id = session.add_job("Daily Backup", "done").await;
    let pr01 = session.add_task(&job_id, "PR01", "done").await;
    session.add_task(&job_id, "PR02", "queued").await;
    let old = session.add_task(&job_id, "OLD", "done").await;
    session.add_task(&job_id, "GONE", "excluded").await;

    let sync = BackupSync::new(test_config(root.path()), session);
    let report = sync.run().await.unwrap();

    assert!(!report.job_created);
    assert_eq!(report.job_id.as_deref(), Some(job_id.as_str()));
    assert_eq!(report.tasks_created, 1);
    assert_eq!(report.tasks_requeued, 1);
    assert_eq!(report.tasks_excluded, 1);
    assert_eq!(report.tasks_matched, 1);
    assert!(report.job_resumed);

    let writes = sync.session().get_write_calls().await;
    assert_eq!(writes.len(), 4);
    assert_eq!(
        writes[0],
        RecordedCall::Create {
            kind: EntityKind::Task,
            data: json!({"PR04": {"source": root.path().join("PR04").to_str().unwrap()}}),
            parent_id: Some(job_id.clone()),
        }
    );
    assert_eq!(
        writes[1],
        RecordedCall::UpdateOne {
            kind: EntityKind::Task,
            id: pr01,
            data: json!({"status": "queued"}),
        }
    );
    assert_eq!(
        writes[2],
        RecordedCall::UpdateMany {
            kind: EntityKind::Task,
            data: json!([{"id": old, "status": "excluded"}]),
            parent_id: job_id.clone(),
        }
    );
    assert_eq!(
        writes[3],
        RecordedCall::UpdateOne {
            kind: EntityKind::Job,
            id: job_id.clone(),
            data: json!({"status": "queued"}),
        }
    );

    let session = sync.session();
    assert_eq!(session.task_status(&job_id, "PR01").await.as_deref(), Some("queued"));
    assert_eq!(session.task_status(&job_id, "PR04").await.as_deref(), Some("queued"));
    assert_eq!(session.task_status(&job_id, "OLD").await.as_deref(), Some("excluded"));
    assert_eq!(session.task_status(&job_id, "GONE").await.as_deref(), Some("excluded"));
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let root = TempDir::new().unwrap();
    make_project(root.path(), "PR01");
    make_project(root.path(), "PR02");

    let sync = BackupSync::new(test_config(root.path()), MockSession::new());
    sync.run().await.unwrap();
    sync.session().clear_history().await;

    let report = sync.run().await.unwrap();

    assert!(!report.changed_anything());
    assert_eq!(report.tasks_matched, 2);
    assert!(sync.session().get_write_calls().await.is_empty());
}

#[tokio::test]
async fn test_dry_run_plans_but_submits_nothing() {
    let root = TempDir::new().unwrap();
    make_project(root.path(), "PR01");

    let session = MockSession::new();
    let job_id = session.add_job("Daily Backup", "done").await;
    session.add_task(&job_id, "OLD", "done").await;

    let sync = BackupSync::new(test_config(root.path()), session).with_dry_run(true);
    let report = sync.run().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.tasks_created, 1);
    assert_eq!(report.tasks_excluded, 1);
    assert!(report.summary().starts_with("[dry-run] "));

    let session = sync.session();
    assert!(session.get_write_calls().await.is_empty());
    assert_eq!(session.get_calls().await.len(), 2, "job lookup and task list");
    assert_eq!(session.task_status(&job_id, "OLD").await.as_deref(), Some("done"));
}

#[tokio::test]
async fn test_empty_inventory_makes_no_calls() {
    let root = TempDir::new().unwrap();
    make_empty_project(root.path(), "PR01");

    let session = MockSession::new();
    let job_id = session.add_job("Daily Backup", "done").await;
    session.add_task(&job_id, "PR09", "done").await;

    let sync = BackupSync::new(test_config(root.path()), session);
    let report = sync.run().await.unwrap();

    assert_eq!(report.candidates, 0);
    assert!(!report.changed_anything());
    assert!(sync.session().get_calls().await.is_empty());
    assert_eq!(
        sync.session().task_status(&job_id, "PR09").await.as_deref(),
        Some("done"),
        "remote tasks are left alone when nothing is on disk"
    );
}

#[tokio::test]
async fn test_resume_disabled_leaves_job_status() {
    let root = TempDir::new().unwrap();
    make_project(root.path(), "PR01");

    let session = MockSession::new();
    let job_id = session.add_job("Daily Backup", "done").await;

    let mut config = test_config(root.path());
    config.job.resume = false;

    let sync = BackupSync::new(config, session);
    let report = sync.run().await.unwrap();

    assert!(!report.job_resumed);
    let writes = sync.session().get_write_calls().await;
    assert_eq!(writes.len(), 1);
    assert!(matches!(
        &writes[0],
        RecordedCall::Create {
            kind: EntityKind::Task,
            ..
        }
    ));
    let job = sync.session().get_job("Daily Backup").await.unwrap();
    assert_eq!(job.status(), Some("done"));
    assert_eq!(job.id().as_deref(), Some(job_id.as_str()));
}

#[tokio::test]
async fn test_running_job_is_not_resumed() {
    let root = TempDir::new().unwrap();
    make_project(root.path(), "PR01");

    let session = MockSession::new();
    session.add_job("Daily Backup", "executing").await;

    let sync = BackupSync::new(test_config(root.path()), session);
    let report = sync.run().await.unwrap();

    assert_eq!(report.tasks_created, 1);
    assert!(!report.job_resumed);
}

#[tokio::test]
async fn test_manifest_excludes_inactive_projects_even_when_on_disk() {
    let root = TempDir::new().unwrap();
    make_project(root.path(), "PR01");
    make_project(root.path(), "PR03");

    let session = MockSession::new();
    let job_id = session.add_job("Daily Backup", "queued").await;
    session.add_task(&job_id, "PR01", "queued").await;

    let config = manifest_config(root.path(), &[("PR01", "inactive"), ("PR03", "active")]);
    let sync = BackupSync::new(config, session);
    let report = sync.run().await.unwrap();

    assert_eq!(report.candidates, 1);
    assert_eq!(report.tasks_created, 1);
    assert_eq!(report.tasks_excluded, 1);

    let session = sync.session();
    assert_eq!(session.task_status(&job_id, "PR01").await.as_deref(), Some("excluded"));
    assert_eq!(session.task_status(&job_id, "PR03").await.as_deref(), Some("queued"));
}

#[tokio::test]
async fn test_exclude_patterns_keep_folders_out_of_the_job() {
    let root = TempDir::new().unwrap();
    make_project(root.path(), "PR01");
    make_project(root.path(), "_archive");

    let mut config = test_config(root.path());
    config.source.exclude = vec!["^_".to_string()];

    let sync = BackupSync::new(config, MockSession::new());
    let (inventory, plan) = sync.plan().await.unwrap();

    assert_eq!(inventory.candidates.len(), 1);
    assert!(!inventory.is_active("_archive"));
    let job = plan.create_job.expect("a new job should be planned");
    assert_eq!(job.tasks.len(), 1);
    assert_eq!(job.tasks[0].uri, "PR01");
}

#[tokio::test]
async fn test_api_failure_propagates() {
    let root = TempDir::new().unwrap();
    make_project(root.path(), "PR01");

    let sync = BackupSync::new(test_config(root.path()), MockSession::with_failure());
    let result = sync.run().await;

    assert!(matches!(result, Err(BackupError::Api(_))));
}

#[tokio::test]
async fn test_missing_projects_root_is_an_inventory_error() {
    let root = TempDir::new().unwrap();
    let config = test_config(&root.path().join("does-not-exist"));

    let sync = BackupSync::new(config, MockSession::new());
    let result = sync.run().await;

    assert!(matches!(result, Err(BackupError::Inventory(_))));
    assert!(sync.session().get_calls().await.is_empty());
}
