//! Sync run orchestration
//!
//! Builds the inventory, asks the service about the job, plans the
//! reconciliation and submits the resulting calls.

use crate::api::{ApiSession, EntityKind, Query, Record};
use crate::config::BackupConfig;
use crate::error::{BackupError, BackupResult};
use crate::inventory::{build_inventory, Inventory};
use crate::reconcile::{plan_sync, RemoteJob, Status, SyncPlan};
use crate::sync::report::SyncReport;
use serde_json::json;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Backup job synchronizer with an injected API session
pub struct BackupSync<S>
where
    S: ApiSession,
{
    config: BackupConfig,
    session: S,
    dry_run: bool,
}

impl<S> BackupSync<S>
where
    S: ApiSession,
{
    /// Create a new synchronizer with an injected session
    pub fn new(config: BackupConfig, session: S) -> Self {
        Self {
            config,
            session,
            dry_run: false,
        }
    }

    /// Plan and report without submitting any write call
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Get the session for testing
    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Run one full sync
    pub async fn run(&self) -> BackupResult<SyncReport> {
        let run_id = Uuid::new_v4();
        let span = crate::sync_span!(run_id = %run_id, job = %self.config.job.code);
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid) -> BackupResult<SyncReport> {
        let mut report = SyncReport::new(run_id, &self.config.job.code, self.dry_run);

        let (inventory, plan) = self.plan().await?;
        report.candidates = inventory.candidates.len();
        report.record_plan(&plan);

        if inventory.is_empty() {
            warn!("No projects to back up!");
        } else if plan.is_noop() {
            info!("Backup job is up to date, nothing to submit");
        } else if self.dry_run {
            info!("Dry run, not submitting changes");
        } else {
            report.job_id = self.apply(&plan).await?;
        }

        report.finish();
        info!("{}", report.summary());
        Ok(report)
    }

    /// Build the inventory and plan against the current remote state, without writing
    pub async fn plan(&self) -> BackupResult<(Inventory, SyncPlan)> {
        let inventory = build_inventory(&self.config.source, &self.config.projects)?;
        debug!(
            "Inventory: {} candidate(s), {} active name(s)",
            inventory.candidates.len(),
            inventory.active.len()
        );

        // No candidates means no remote call at all
        if inventory.is_empty() {
            return Ok((inventory, SyncPlan::default()));
        }

        let remote = self.fetch_remote_job().await?;
        let plan = plan_sync(&inventory, &self.config.job, remote.as_ref());
        Ok((inventory, plan))
    }

    /// Find the job by code and load its tasks
    async fn fetch_remote_job(&self) -> BackupResult<Option<RemoteJob>> {
        let Some(job) = self
            .session
            .find_one(&Query::job_by_code(&self.config.job.code))
            .await?
        else {
            info!("No existing job '{}' found", self.config.job.code);
            return Ok(None);
        };

        let id = job.id().ok_or_else(|| {
            BackupError::unexpected_response(format!(
                "job '{}' returned without an id",
                self.config.job.code
            ))
        })?;
        let status = Status::parse(job.status().unwrap_or_default());
        debug!("Found job '{}' ({}) with status {}", self.config.job.code, id, status);

        let tasks = self.session.find(&Query::tasks_of_job(&id)).await?;
        info!("Job '{}' holds {} task(s)", self.config.job.code, tasks.len());

        Ok(Some(RemoteJob { id, status, tasks }))
    }

    /// Submit the plan; returns the id of the job that was touched
    async fn apply(&self, plan: &SyncPlan) -> BackupResult<Option<String>> {
        if let Some(job) = &plan.create_job {
            let created = self
                .session
                .create(EntityKind::Job, job.to_payload(), None)
                .await?;
            let job_id = Record::new(created).id();
            info!(
                "Successfully submitted new backup job '{}' with {} task(s)",
                job.code,
                job.tasks.len()
            );
            return Ok(job_id);
        }

        let job_id = plan
            .job_id
            .as_deref()
            .ok_or_else(|| BackupError::internal_error("plan updates a job without an id"))?;

        if !plan.create_tasks.is_empty() {
            self.session
                .create(EntityKind::Task, plan.create_tasks_payload(), Some(job_id))
                .await?;
            info!(
                "Successfully added {} task(s) to existing backup job",
                plan.create_tasks.len()
            );
        }

        for task in &plan.requeue {
            self.session
                .update_one(EntityKind::Task, &task.id, json!({"status": Status::Queued}))
                .await?;
            info!("Re-queued {} task: {}", task.status, task.uri);
        }

        if !plan.exclude.is_empty() {
            for task in &plan.exclude {
                info!("Excluding inactive project: {}", task.uri);
            }
            self.session
                .update_many(EntityKind::Task, plan.exclude_payload(), job_id)
                .await?;
            info!(
                "Successfully excluded {} inactive project task(s) from job",
                plan.exclude.len()
            );
        }

        if plan.resume_job {
            self.session
                .update_one(EntityKind::Job, job_id, json!({"status": Status::Queued}))
                .await?;
            info!("Resumed finished backup job {}", job_id);
        }

        Ok(Some(job_id.to_string()))
    }
}
