//! Systemd unit resource - unit file, drop-ins, mask and enablement
//!
//! Enablement is managed the way `systemctl enable` would for units wanted by
//! `multi-user.target`: a symlink in the target's wants directory pointing at
//! the unit file. Masking replaces the unit file with a link to `/dev/null`.

use declarative::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::path::Path;

use super::Host;
use crate::daemon::{Error, Result};
use crate::paths::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEV_NULL, SystemPaths};

/// Enable a unit by linking it into the wants directory
///
/// Returns whether a link was created; an existing link is left alone.
pub fn enable(host: &Host, name: &str) -> Result<bool> {
    let link = SystemPaths::wants_link(name);
    if host.exists(&link) {
        log::info!("{} already exists. Not making a new symlink", link.display());
        return Ok(false);
    }
    if let Some(parent) = link.parent() {
        host.create_dir_all(parent, DEFAULT_DIR_MODE)?;
    }
    host.symlink(&SystemPaths::unit(name), &link)?;
    log::info!("Enabled {}", name);
    Ok(true)
}

/// Disable a unit by removing its wants link
///
/// Returns whether a link was removed; a missing link is not an error.
pub fn disable(host: &Host, name: &str) -> Result<bool> {
    let link = SystemPaths::wants_link(name);
    if !host.exists(&link) {
        log::info!("{} was not present. No need to remove", link.display());
        return Ok(false);
    }
    log::debug!("Disabling unit at {}", link.display());
    host.remove(&link)?;
    Ok(true)
}

/// A unit from the config's systemd section
#[derive(Debug)]
pub struct ManagedUnit {
    unit: ignition::Unit,
    host: Host,
}

impl ManagedUnit {
    pub fn new(unit: ignition::Unit, host: Host) -> Self {
        Self { unit, host }
    }

    fn name(&self) -> &str {
        &self.unit.name
    }

    /// Final enablement once both flags are applied in order
    ///
    /// The legacy flag can only enable; a non-null `enabled` is applied after
    /// it and therefore decides.
    fn wanted(&self) -> Option<bool> {
        self.unit
            .enabled
            .or(if self.unit.enable { Some(true) } else { None })
    }

    fn label(&self) -> String {
        if self.unit.contents.is_empty() {
            return format!("{} drop-in(s)", self.unit.dropins.len());
        }
        if self.unit.mask {
            return "masked".to_string();
        }
        match self.wanted() {
            Some(true) => "enabled".to_string(),
            Some(false) => "disabled".to_string(),
            None => "written".to_string(),
        }
    }

    fn write_dropins(&self) -> Result<()> {
        for dropin in &self.unit.dropins {
            log::info!("Writing systemd unit dropin {:?}", dropin.name);
            let path = SystemPaths::dropin(self.name(), &dropin.name);
            self.host
                .write(&path, dropin.contents.as_bytes(), DEFAULT_FILE_MODE)?;
        }
        Ok(())
    }

    fn mask(&self, unit_path: &Path) -> Result<()> {
        log::debug!("Systemd unit {} masked", self.name());
        self.host.remove_all(unit_path)?;
        self.host.symlink(Path::new(DEV_NULL), unit_path)
    }

    fn write_unit(&self) -> Result<()> {
        self.write_dropins()?;

        if self.unit.contents.is_empty() {
            return Ok(());
        }

        log::info!("Writing systemd unit {:?}", self.name());
        let unit_path = SystemPaths::unit(self.name());
        if let Some(parent) = unit_path.parent() {
            self.host.create_dir_all(parent, DEFAULT_DIR_MODE)?;
        }

        if self.unit.mask {
            return self.mask(&unit_path);
        }

        // Writing through a mask link would hit /dev/null itself.
        if self.host.read_link(&unit_path).is_some() {
            log::debug!("Unmasking systemd unit {}", self.name());
            self.host.remove(&unit_path)?;
        }
        self.host
            .write(&unit_path, self.unit.contents.as_bytes(), DEFAULT_FILE_MODE)?;

        // Both flags are honored, in this order.
        if self.unit.enable {
            enable(&self.host, self.name())?;
        }
        match self.unit.enabled {
            Some(true) => {
                enable(&self.host, self.name())?;
            }
            Some(false) => {
                disable(&self.host, self.name())?;
            }
            None => {}
        }
        Ok(())
    }

    /// Differences between the live unit and the desired one
    fn drift(&self) -> Result<Vec<String>> {
        let mut drift = Vec::new();

        for dropin in &self.unit.dropins {
            let path = SystemPaths::dropin(self.name(), &dropin.name);
            match self.host.read(&path)? {
                None => drift.push(format!("drop-in {} missing", dropin.name)),
                Some(data) if data != dropin.contents.as_bytes() => {
                    drift.push(format!("drop-in {} differs", dropin.name));
                }
                Some(_) => {}
            }
        }

        if self.unit.contents.is_empty() {
            return Ok(drift);
        }

        let unit_path = SystemPaths::unit(self.name());
        if self.unit.mask {
            if self.host.read_link(&unit_path).as_deref() != Some(Path::new(DEV_NULL)) {
                drift.push("not masked".to_string());
            }
            return Ok(drift);
        }

        if self.host.read_link(&unit_path).is_some() {
            drift.push("unit is a symlink".to_string());
        } else if self.host.read(&unit_path)?.as_deref() != Some(self.unit.contents.as_bytes()) {
            drift.push("unit contents differ".to_string());
        }

        let linked = self.host.exists(&SystemPaths::wants_link(self.name()));
        match self.wanted() {
            Some(true) if !linked => drift.push("not enabled".to_string()),
            Some(false) if linked => drift.push("enabled".to_string()),
            _ => {}
        }
        Ok(drift)
    }
}

impl Resource for ManagedUnit {
    type Error = Error;

    fn id(&self) -> String {
        self.unit.name.clone()
    }

    fn description(&self) -> String {
        format!("Systemd unit {} ({})", self.unit.name, self.label())
    }

    fn resource_type(&self) -> &'static str {
        "unit"
    }

    fn current_state(&self) -> Result<ResourceState> {
        let unit_path = SystemPaths::unit(self.name());
        if !self.unit.contents.is_empty() && !self.unit.mask && !self.host.exists(&unit_path) {
            return Ok(ResourceState::Absent);
        }

        let drift = self.drift()?;
        if drift.is_empty() {
            Ok(self.desired_state())
        } else {
            Ok(ResourceState::Modified {
                from: drift.join(", "),
                to: self.label(),
            })
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(self.label()),
        }
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let existed = self.host.exists(&SystemPaths::unit(self.name()));
        self.write_unit()?;
        Ok(if existed || self.unit.contents.is_empty() {
            ApplyResult::Modified
        } else {
            ApplyResult::Created
        })
    }
}
