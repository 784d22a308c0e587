//! Remove files and units the new config no longer declares
//!
//! Cleanup is best effort: every failure is logged and skipped, and the
//! collector always walks the whole old config.

use ignition::MachineConfig;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::paths::SystemPaths;
use crate::resource::{Host, unit};

/// What a cleanup pass removed and what it failed to remove
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    fn record(&mut self, path: PathBuf, result: super::Result<()>) {
        match result {
            Ok(()) => {
                log::debug!("Removed stale {}", path.display());
                self.removed.push(path);
            }
            Err(e) => {
                log::warn!("Failed to remove stale {}: {}", path.display(), e);
                self.failed.push((path, e.to_string()));
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete everything `old` wrote that `new` does not declare
pub fn delete_stale_data(host: &Host, old: &MachineConfig, new: &MachineConfig) -> CleanupReport {
    log::info!("Deleting stale data");
    let mut report = CleanupReport::default();
    let old = &old.spec.config;
    let new = &new.spec.config;

    let new_files: HashSet<&Path> = new
        .storage
        .files
        .iter()
        .map(|f| Path::new(f.path.as_str()))
        .collect();

    log::debug!("Removing stale config storage files");
    for file in &old.storage.files {
        let path = Path::new(&file.path);
        // An empty path would resolve to the root mount itself.
        if file.path.is_empty() {
            log::warn!("Skipping stale file entry with an empty path");
            continue;
        }
        if !new_files.contains(path) {
            report.record(path.to_path_buf(), host.remove_all(path));
        }
    }

    log::debug!("Removing stale config systemd units");
    let mut new_units = HashSet::new();
    let mut new_dropins = HashSet::new();
    for unit in &new.systemd.units {
        new_units.insert(SystemPaths::unit(&unit.name));
        for dropin in &unit.dropins {
            new_dropins.insert(SystemPaths::dropin(&unit.name, &dropin.name));
        }
    }

    for old_unit in &old.systemd.units {
        let mut removed_dropin = false;
        for dropin in &old_unit.dropins {
            let path = SystemPaths::dropin(&old_unit.name, &dropin.name);
            if !new_dropins.contains(&path) {
                report.record(path.clone(), host.remove_all(&path));
                removed_dropin = true;
            }
        }

        let path = SystemPaths::unit(&old_unit.name);
        if !new_units.contains(&path) {
            if let Err(e) = unit::disable(host, &old_unit.name) {
                log::warn!("Unable to disable {}: {}", old_unit.name, e);
            }
            report.record(path.clone(), host.remove_all(&path));
        }

        if removed_dropin {
            remove_if_empty(host, &SystemPaths::dropin_dir(&old_unit.name), &mut report);
        }
    }

    report
}

/// Drop a unit's `.d` directory once its last drop-in is gone
fn remove_if_empty(host: &Host, dir: &Path, report: &mut CleanupReport) {
    if !host.exists(dir) {
        return;
    }
    match host.is_empty_dir(dir) {
        Ok(true) => report.record(dir.to_path_buf(), host.remove(dir)),
        Ok(false) => {}
        Err(e) => log::warn!("Failed to inspect {}: {}", dir.display(), e),
    }
}
