//! The update cycle

use declarative::{
    ApplyResult, ExecuteOptions, ExecuteSummary, ExecutionPlan, ProgressCallback, execute,
};
use ignition::MachineConfig;

use super::stale::delete_stale_data;
use super::{Daemon, Error, NodeContext, OperatingSystem, Result, RunMode, classify};
use crate::clients::{EventType, ObjectRef};
use crate::resource::{AuthorizedKeys, ManagedFile, ManagedUnit};

/// Image reference used by configs that do not pin an OS image
const DUMMY_IMAGE: &str = "://dummy";

/// Knobs for a single update cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Report what would be written; skip cleanup, OS update, drain and reboot
    pub dry_run: bool,
    pub verbose: bool,
}

fn is_unspecified(image: &str) -> bool {
    image.is_empty() || image == DUMMY_IMAGE
}

/// Reports plan execution through the log
struct LogProgress;

impl ProgressCallback for LogProgress {
    fn on_batch_start(&mut self, count: usize) {
        log::debug!("Applying {} resource(s)", count);
    }

    fn on_resource_start(&mut self, _id: &str, description: &str) {
        log::debug!("{}", description);
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        match result {
            ApplyResult::Skipped { reason } => log::info!("{}: skipped ({})", id, reason),
            other => log::debug!("{}: {:?}", id, other),
        }
    }

    fn on_resource_failed(&mut self, id: &str, error: &str) {
        log::error!("{}: {}", id, error);
    }

    fn on_batch_complete(&mut self) {}
}

impl Daemon {
    /// Run one update cycle from `old` to `new`
    ///
    /// On success the node reboots and this never returns; every return is
    /// an error. Files and units already written by a failed cycle stay
    /// written.
    pub fn update(&self, ctx: &NodeContext, old: &MachineConfig, new: &MachineConfig) -> Result<()> {
        self.update_with(ctx, old, new, &UpdateOptions::default())
    }

    /// [`Daemon::update`] with explicit options
    ///
    /// A dry run returns `Ok` after reporting the file, unit and key changes.
    pub fn update_with(
        &self,
        ctx: &NodeContext,
        old: &MachineConfig,
        new: &MachineConfig,
        opts: &UpdateOptions,
    ) -> Result<()> {
        let verdict = classify(ctx, old, new);
        if !verdict.reconcilable {
            self.node_api.record_event(
                &ObjectRef::machine_config(new.display_name()),
                EventType::Warning,
                "FailedToReconcile",
                "New config could not be reconciled.",
            );
            return Err(Error::Irreconcilable {
                reason: verdict.reason,
            });
        }

        let exec = ExecuteOptions {
            dry_run: opts.dry_run,
            verbose: opts.verbose,
        };

        log::info!("Updating files");
        let summary = execute(&self.plan(new), &exec, &mut LogProgress)?;
        log::debug!("Files and units: {} change(s)", summary.total_changes());

        if opts.dry_run {
            log::info!("Dry run: not deleting stale data");
        } else {
            let report = delete_stale_data(&self.host, old, new);
            if !report.is_clean() {
                log::warn!(
                    "{} stale path(s) could not be removed",
                    report.failed.len()
                );
            }
        }

        self.update_ssh_keys(old, new, &verdict.ssh_changed_users, &exec)?;

        if opts.dry_run {
            log::info!("Dry run: skipping OS update, drain and reboot");
            return Ok(());
        }

        self.update_os(ctx, new)?;

        if ctx.run_mode == RunMode::Cluster {
            self.drain(&ctx.node_name)?;
        }

        Err(self.reboot(
            &ctx.node_name,
            &format!("Node will reboot into config {}", new.display_name()),
        ))
    }

    /// Files, then units, in config order
    pub fn plan(&self, new: &MachineConfig) -> ExecutionPlan<Error> {
        let mut plan = ExecutionPlan::new();
        for file in &new.spec.config.storage.files {
            plan.add_resource(Box::new(ManagedFile::new(
                file.clone(),
                self.host.clone(),
                self.identity.clone(),
            )));
        }
        for unit in &new.spec.config.systemd.units {
            plan.add_resource(Box::new(ManagedUnit::new(unit.clone(), self.host.clone())));
        }
        plan
    }

    /// Install the new key lists of users whose only change is their keys
    fn update_ssh_keys(
        &self,
        old: &MachineConfig,
        new: &MachineConfig,
        indices: &[usize],
        exec: &ExecuteOptions,
    ) -> Result<ExecuteSummary> {
        log::info!("Updating passwd");
        let old_users = &old.spec.config.passwd.users;
        let new_users = &new.spec.config.passwd.users;

        let mut plan = ExecutionPlan::new();
        for &i in indices {
            let (Some(old_user), Some(new_user)) = (old_users.get(i), new_users.get(i)) else {
                log::warn!("No user at index {}; skipping SSH keys", i);
                continue;
            };
            plan.add_resource(Box::new(AuthorizedKeys::for_change(
                old_user,
                new_user,
                self.host.clone(),
            )?));
        }
        execute(&plan, exec, &mut LogProgress)
    }

    /// Pivot to the new OS image when it is set and not already booted
    fn update_os(&self, ctx: &NodeContext, new: &MachineConfig) -> Result<()> {
        if ctx.operating_system != OperatingSystem::Rhcos {
            log::info!(
                "Updating of {} nodes is not supported; skipping OS update",
                ctx.operating_system
            );
            return Ok(());
        }

        let image = &new.spec.os_image_url;
        if is_unspecified(image) {
            log::info!("No target OS image specified; skipping OS update");
            return Ok(());
        }
        let Some(booted) = ctx.booted_os_image_url.as_deref() else {
            log::warn!("Booted OS image is unknown; skipping OS update to {}", image);
            return Ok(());
        };
        if image == booted {
            log::info!("Already in desired image {}", image);
            return Ok(());
        }

        log::info!("Updating OS to {}", image);
        self.os_updater
            .apply_image(image)
            .map_err(|source| Error::OsUpdate {
                image: image.clone(),
                source,
            })
    }
}
