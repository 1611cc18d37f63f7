//! Backup inventory
//!
//! Builds the list of project folders that should be backed up, either from a
//! live scan of the projects root or from a manifest of project records.

pub mod directory;
pub mod filter;
pub mod manifest;

use crate::config::{ProjectRecord, SourceKind, SourceSection};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use directory::scan_directory;
pub use filter::ExcludeFilter;
pub use manifest::{collect_candidates, load_manifest};

/// A project folder to back up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Folder name, also the task uri on the remote job
    pub name: String,
    pub path: PathBuf,
}

impl Entry {
    /// Create an entry; the path must be valid UTF-8 to be sent to the API
    pub fn new(name: String, path: PathBuf) -> Result<Self, InventoryError> {
        if path.to_str().is_none() {
            return Err(InventoryError::NonUtf8Path(path));
        }
        Ok(Self { name, path })
    }

    /// Source path as sent to the API
    pub fn source_path(&self) -> &str {
        self.path.to_str().unwrap_or_default()
    }
}

/// Result of building the inventory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Folders to submit, in a stable order
    pub candidates: Vec<Entry>,
    /// Names whose remote tasks must not be excluded
    pub active: BTreeSet<String>,
}

impl Inventory {
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Inventory errors
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Projects root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to parse manifest {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },
    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(String),
    #[error("Path is not valid UTF-8: {0:?}")]
    NonUtf8Path(PathBuf),
}

/// True when the folder holds at least one entry
pub(crate) fn has_contents(path: &Path) -> Result<bool, InventoryError> {
    let mut entries = std::fs::read_dir(path).map_err(|source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(entries.next().is_some())
}

/// Build the inventory described by the source section
pub fn build_inventory(
    source: &SourceSection,
    inline_projects: &[ProjectRecord],
) -> Result<Inventory, InventoryError> {
    let filter = ExcludeFilter::new(&source.exclude, source.skip_hidden)?;

    match source.kind {
        SourceKind::Directory => scan_directory(&source.root, &filter, source.require_contents),
        SourceKind::Manifest => {
            let records = match &source.manifest {
                Some(path) => load_manifest(path)?,
                None => inline_projects.to_vec(),
            };
            collect_candidates(&records, &source.root, &filter, source.require_contents)
        }
    }
}
