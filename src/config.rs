//! Configuration system for backup-sync
//!
//! Loads a TOML file describing where the projects live, how to pick the ones
//! to back up, which accsyn job holds them and how to reach the API.
//! Credentials are never read from the file: only the names of the
//! environment variables holding them are, and those are resolved at runtime.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupConfig {
    #[serde(default)]
    pub api: ApiSection,
    pub source: SourceSection,
    pub job: JobSection,
    /// Inline manifest, used when `source.kind = "manifest"` and no manifest file is given
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

/// API section - where and as whom to talk to accsyn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSection {
    /// Explicit API base URL; derived from the domain when absent
    pub base_url: Option<String>,
    /// Environment variable containing the accsyn domain
    #[serde(default = "default_domain_env")]
    pub domain_env: String,
    /// Environment variable containing the API user (e-mail)
    #[serde(default = "default_user_env")]
    pub user_env: String,
    /// Environment variable containing the API key
    #[serde(default = "default_key_env")]
    pub key_env: String,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: None,
            domain_env: default_domain_env(),
            user_env: default_user_env(),
            key_env: default_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_domain_env() -> String {
    "ACCSYN_API_DOMAIN".to_string()
}

fn default_user_env() -> String {
    "ACCSYN_API_USER".to_string()
}

fn default_key_env() -> String {
    "ACCSYN_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// How the list of backup candidates is built
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Every sub-directory of the projects root
    Directory,
    /// Project records with an active/inactive status
    Manifest,
}

/// Source section - where the projects live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSection {
    pub kind: SourceKind,
    /// Projects root, as seen by the accsyn root share
    pub root: PathBuf,
    /// JSON manifest file (manifest kind only)
    pub manifest: Option<PathBuf>,
    /// Regexes matched against entry names; a match excludes the entry
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Skip names starting with '.'
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
    /// Only back up folders that exist and have contents
    #[serde(default = "default_true")]
    pub require_contents: bool,
}

/// A project record from the inline or file manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    pub name: String,
    #[serde(default = "default_project_status")]
    pub status: String,
}

impl ProjectRecord {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

fn default_project_status() -> String {
    "active".to_string()
}

/// Job section - the remote backup job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSection {
    /// Job code, used to find the job again on later runs
    pub code: String,
    /// Name of the remote site serving the backup root share
    pub backup_site: String,
    /// Keep paths identical relative to the root share at the remote end
    #[serde(default = "default_true")]
    pub mirror_paths: bool,
    /// Re-queue a finished job after tasks were added or re-queued
    #[serde(default = "default_true")]
    pub resume: bool,
    #[serde(default)]
    pub settings: JobSettings,
}

/// Transfer settings applied when the job is created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSettings {
    /// Delete remote files that no longer exist on-prem
    #[serde(default = "default_transfer_mode")]
    pub transfer_mode: String,
    /// Transfer one project at a time
    #[serde(default = "default_task_bucketsize")]
    pub task_bucketsize: String,
    /// Comma separated file patterns never transferred
    #[serde(default = "default_transfer_exclude")]
    pub transfer_exclude: String,
    /// Delete excluded tasks at the backup site when the job finishes
    #[serde(default = "default_job_done_actions")]
    pub job_done_actions: String,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            transfer_mode: default_transfer_mode(),
            task_bucketsize: default_task_bucketsize(),
            transfer_exclude: default_transfer_exclude(),
            job_done_actions: default_job_done_actions(),
        }
    }
}

fn default_transfer_mode() -> String {
    "onewaysync".to_string()
}

fn default_task_bucketsize() -> String {
    "1".to_string()
}

fn default_transfer_exclude() -> String {
    "*.tmp,.*".to_string()
}

fn default_job_done_actions() -> String {
    "delete_excluded".to_string()
}

fn default_true() -> bool {
    true
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid job code: {0}")]
    InvalidJobCode(String),
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BackupConfig {
    /// Load configuration from a TOML file and validate it
    ///
    /// A relative `source.manifest` is taken relative to the file's directory.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(dir) = path.parent() {
            config.resolve_relative_paths(dir);
        }
        Ok(config)
    }

    /// Anchor a relative manifest path at `base_dir`
    pub fn resolve_relative_paths(&mut self, base_dir: &Path) {
        if let Some(manifest) = &self.source.manifest {
            if manifest.is_relative() {
                self.source.manifest = Some(base_dir.join(manifest));
            }
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BackupConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_job_code(&self.job.code)?;

        if self.job.backup_site.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "job.backup_site must not be empty".to_string(),
            ));
        }

        for pattern in &self.source.exclude {
            regex::Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }

        if self.source.kind == SourceKind::Manifest
            && self.source.manifest.is_none()
            && self.projects.is_empty()
        {
            return Err(ConfigError::InvalidConfig(
                "manifest source requires [[projects]] entries or source.manifest".to_string(),
            ));
        }

        Ok(())
    }

    /// Helper method to get environment variable with error propagation
    fn get_env_var_required(env_var_name: &str) -> Result<String, ConfigError> {
        std::env::var(env_var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::EnvVarNotFound(env_var_name.to_string()))
    }

    /// Get the API user from its environment variable
    pub fn get_api_user(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.api.user_env)
    }

    /// Get the API key from its environment variable
    pub fn get_api_key(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.api.key_env)
    }

    /// Get the accsyn domain from its environment variable
    pub fn get_domain(&self) -> Result<String, ConfigError> {
        Self::get_env_var_required(&self.api.domain_env)
    }

    /// Resolve the API base URL, preferring an explicit `api.base_url`
    pub fn resolve_base_url(&self) -> Result<String, ConfigError> {
        if let Some(base_url) = &self.api.base_url {
            return Ok(base_url.trim_end_matches('/').to_string());
        }
        let domain = self.get_domain()?;
        Ok(format!("https://{}.accsyn.com/api/v3", domain.trim()))
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[source]
kind = "manifest"
root = "/srv/projects"

[[projects]]
name = "PR03"
status = "active"

[[projects]]
name = "PR01"
status = "inactive"

[job]
code = "Daily Backup"
backup_site = "backup"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Job codes end up quoted inside query filters
fn validate_job_code(code: &str) -> Result<(), ConfigError> {
    if code.trim().is_empty() {
        return Err(ConfigError::InvalidJobCode(
            "job code must not be empty".to_string(),
        ));
    }
    if code.contains('"') || code.contains('\n') {
        return Err(ConfigError::InvalidJobCode(format!(
            "job code '{code}' must not contain quotes or newlines"
        )));
    }
    Ok(())
}
