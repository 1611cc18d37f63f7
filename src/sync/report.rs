//! Summary of a sync run

use crate::reconcile::SyncPlan;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// What a run did (or, in dry-run mode, would have done)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub job_code: String,
    pub job_id: Option<String>,
    pub dry_run: bool,
    pub candidates: usize,
    pub job_created: bool,
    pub tasks_created: usize,
    pub tasks_requeued: usize,
    pub tasks_excluded: usize,
    pub tasks_matched: usize,
    pub job_resumed: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    pub fn new(run_id: Uuid, job_code: &str, dry_run: bool) -> Self {
        Self {
            run_id,
            job_code: job_code.to_string(),
            job_id: None,
            dry_run,
            candidates: 0,
            job_created: false,
            tasks_created: 0,
            tasks_requeued: 0,
            tasks_excluded: 0,
            tasks_matched: 0,
            job_resumed: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Fill the counters from a plan
    pub fn record_plan(&mut self, plan: &SyncPlan) {
        if let Some(job) = &plan.create_job {
            self.job_created = true;
            self.tasks_created = job.tasks.len();
        } else {
            self.tasks_created = plan.create_tasks.len();
        }
        self.job_id = plan.job_id.clone();
        self.tasks_requeued = plan.requeue.len();
        self.tasks_excluded = plan.exclude.len();
        self.tasks_matched = plan.matched.len();
        self.job_resumed = plan.resume_job;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// True when the run changed (or would change) something remotely
    pub fn changed_anything(&self) -> bool {
        self.job_created
            || self.tasks_created > 0
            || self.tasks_requeued > 0
            || self.tasks_excluded > 0
            || self.job_resumed
    }

    /// One-line summary for the log
    pub fn summary(&self) -> String {
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        format!(
            "{prefix}job '{}': {} candidate(s), {} created{}, {} re-queued, {} excluded, {} unchanged{}",
            self.job_code,
            self.candidates,
            self.tasks_created,
            if self.job_created { " with new job" } else { "" },
            self.tasks_requeued,
            self.tasks_excluded,
            self.tasks_matched,
            if self.job_resumed { ", job resumed" } else { "" },
        )
    }
}
