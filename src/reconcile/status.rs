//! Job and task statuses as reported by accsyn

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a job or task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Init,
    Queued,
    Booting,
    Executing,
    Paused,
    Done,
    Failed,
    Aborted,
    Excluded,
    /// Anything this tool does not know about; treated as pending
    Other(String),
}

impl Status {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "init" => Status::Init,
            "queued" => Status::Queued,
            "booting" => Status::Booting,
            "executing" => Status::Executing,
            "paused" => Status::Paused,
            "done" => Status::Done,
            "failed" => Status::Failed,
            "aborted" => Status::Aborted,
            "excluded" => Status::Excluded,
            _ => Status::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Init => "init",
            Status::Queued => "queued",
            Status::Booting => "booting",
            Status::Executing => "executing",
            Status::Paused => "paused",
            Status::Done => "done",
            Status::Failed => "failed",
            Status::Aborted => "aborted",
            Status::Excluded => "excluded",
            Status::Other(s) => s,
        }
    }

    /// The service will not transfer this again unless re-queued
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            Status::Done | Status::Failed | Status::Aborted | Status::Excluded
        )
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Status::parse(&s)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
