//! Test helpers and utilities for integration tests

use backup_sync::config::{
    ApiSection, BackupConfig, JobSection, JobSettings, ProjectRecord, SourceKind, SourceSection,
};
use std::fs;
use std::path::Path;

/// Create a test configuration scanning `root` as a projects directory
#[allow(dead_code)]
pub fn test_config(root: &Path) -> BackupConfig {
    BackupConfig {
        api: ApiSection::default(),
        source: SourceSection {
            kind: SourceKind::Directory,
            root: root.to_path_buf(),
            manifest: None,
            exclude: Vec::new(),
            skip_hidden: true,
            require_contents: true,
        },
        job: JobSection {
            code: "Daily Backup".to_string(),
            backup_site: "backup".to_string(),
            mirror_paths: true,
            resume: true,
            settings: JobSettings::default(),
        },
        projects: Vec::new(),
    }
}

/// Same as [`test_config`], but driven by inline project records
#[allow(dead_code)]
pub fn manifest_config(root: &Path, projects: &[(&str, &str)]) -> BackupConfig {
    let mut config = test_config(root);
    config.source.kind = SourceKind::Manifest;
    config.projects = projects
        .iter()
        .map(|(name, status)| ProjectRecord {
            name: name.to_string(),
            status: status.to_string(),
        })
        .collect();
    config
}

/// Create a project folder holding one file
#[allow(dead_code)]
pub fn make_project(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("edit.prproj"), b"project data").unwrap();
}

/// Create an empty project folder
#[allow(dead_code)]
pub fn make_empty_project(root: &Path, name: &str) {
    fs::create_dir_all(root.join(name)).unwrap();
}
