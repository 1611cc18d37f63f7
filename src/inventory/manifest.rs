//! Project manifests
//!
//! A manifest lists project folders with an active/inactive status, typically
//! exported from a project management system. The JSON file may be either a
//! bare array of records or an object with a `projects` array.

use crate::config::ProjectRecord;
use crate::inventory::filter::ExcludeFilter;
use crate::inventory::{has_contents, Entry, Inventory, InventoryError};
use serde::Deserialize;
use std::path::{Component, Path};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    Records(Vec<ProjectRecord>),
    Wrapped { projects: Vec<ProjectRecord> },
}

/// Read project records from a JSON manifest
pub fn load_manifest(path: &Path) -> Result<Vec<ProjectRecord>, InventoryError> {
    let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&content).map_err(|reason| InventoryError::ManifestParse {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_manifest(content: &str) -> Result<Vec<ProjectRecord>, String> {
    let manifest: ManifestFile = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(match manifest {
        ManifestFile::Records(records) | ManifestFile::Wrapped { projects: records } => records,
    })
}

/// A project name must be a single folder right under the projects root
fn is_folder_name(name: &str) -> bool {
    !name.contains(['/', '\\'])
        && matches!(
            Path::new(name).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(part)] if *part == name
        )
}

/// Turn manifest records into an inventory rooted at `root`
///
/// Every active record counts as active for the exclusion step, whether or not
/// its folder exists. Only active records whose folder exists (and has
/// contents, when required) become candidates. Names that are not a plain
/// folder name are skipped, as are repeated names.
pub fn collect_candidates(
    records: &[ProjectRecord],
    root: &Path,
    filter: &ExcludeFilter,
    require_contents: bool,
) -> Result<Inventory, InventoryError> {
    let mut inventory = Inventory::default();

    for record in records {
        if !record.is_active() {
            debug!("Project {} is {}, not backing up", record.name, record.status);
            continue;
        }
        if !is_folder_name(&record.name) {
            warn!("Skipping project with invalid folder name: {:?}", record.name);
            continue;
        }
        if filter.is_excluded(&record.name) {
            debug!("Project {} matches an exclude pattern", record.name);
            continue;
        }
        if inventory.is_active(&record.name) {
            warn!("Skipping duplicate project record: {}", record.name);
            continue;
        }

        inventory.active.insert(record.name.clone());

        // Project folder on disk has the same name as the project
        let path = root.join(&record.name);
        let usable = path.is_dir() && (!require_contents || has_contents(&path)?);
        if !usable {
            warn!(
                "Skipping non existing or empty project folder: {}",
                path.display()
            );
            continue;
        }

        info!("Project folder to be backed up: {}", path.display());
        inventory.candidates.push(Entry::new(record.name.clone(), path)?);
    }

    Ok(inventory)
}
