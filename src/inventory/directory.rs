//! Live directory scan of the projects root

use crate::inventory::filter::ExcludeFilter;
use crate::inventory::{has_contents, Entry, Inventory, InventoryError};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// List the sub-directories of `root` as backup entries
///
/// Plain files are ignored. Filtered names are neither candidates nor active,
/// so their remote tasks get excluded. Empty folders stay active but are not
/// submitted, so an accidentally emptied folder never wipes its remote copy.
pub fn scan_directory(
    root: &Path,
    filter: &ExcludeFilter,
    require_contents: bool,
) -> Result<Inventory, InventoryError> {
    if !root.is_dir() {
        return Err(InventoryError::NotADirectory(root.to_path_buf()));
    }

    let read_dir = fs::read_dir(root).map_err(|source| InventoryError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut dirs = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|source| InventoryError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path = dir_entry.path();
        if !path.is_dir() {
            continue;
        }
        match dir_entry.file_name().into_string() {
            Ok(name) => dirs.push((name, path)),
            Err(raw) => warn!("Skipping folder with non UTF-8 name: {:?}", raw),
        }
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut inventory = Inventory::default();
    for (name, path) in dirs {
        if filter.is_excluded(&name) {
            debug!(
                "Excluding folder {} (pattern: {})",
                name,
                filter.matching_pattern(&name).unwrap_or("hidden")
            );
            continue;
        }

        inventory.active.insert(name.clone());

        if require_contents && !has_contents(&path)? {
            warn!("Skipping empty project folder: {}", path.display());
            continue;
        }

        info!("Project folder to be backed up: {}", path.display());
        inventory.candidates.push(Entry::new(name, path)?);
    }

    Ok(inventory)
}
