pub mod check;
pub mod diff;
pub mod update;

use anyhow::{Context as AnyhowContext, Result};
use ignition::MachineConfig;
use std::path::Path;
use std::sync::Arc;

use crate::Context;
use crate::cli::Snapshots;
use crate::clients::{Kubectl, LogRecorder, NodeApi, RpmOstree, Systemctl};
use crate::daemon::{Collaborators, Daemon, RunMode};
use crate::fs::HostFilesystem;
use crate::ownership::SystemIdentity;
use crate::paths::SystemPaths;

/// Load and validate one MachineConfig snapshot
fn load_snapshot(path: &Path) -> Result<MachineConfig> {
    let config = MachineConfig::from_path(path)
        .with_context(|| format!("Could not load {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    Ok(config)
}

/// Load the old and new configs of a transition
pub(crate) fn load_snapshots(snapshots: &Snapshots) -> Result<(MachineConfig, MachineConfig)> {
    Ok((load_snapshot(&snapshots.old)?, load_snapshot(&snapshots.new)?))
}

/// Wire the daemon to the real host and cluster tooling
pub(crate) fn build_daemon(ctx: &Context, run_mode: RunMode) -> Daemon {
    let config = &ctx.config;
    let kubectl = Arc::new(Kubectl::new(config.kubectl.clone()));
    let node_api: Arc<dyn NodeApi> = match run_mode {
        RunMode::Cluster => kubectl.clone(),
        RunMode::Once => Arc::new(LogRecorder),
    };

    let collaborators = Collaborators {
        fs: Arc::new(HostFilesystem),
        identity: Arc::new(SystemIdentity),
        node_api,
        drainer: kubectl,
        os_updater: Arc::new(RpmOstree::new(config.pivot.clone())),
        login: Arc::new(Systemctl),
    };

    Daemon::new(paths(ctx), collaborators).with_reboot_guard(config.reboot_guard())
}

pub(crate) fn paths(ctx: &Context) -> SystemPaths {
    SystemPaths::new(ctx.config.root_mount.clone())
}

pub(crate) fn run_mode(once: bool) -> RunMode {
    if once { RunMode::Once } else { RunMode::Cluster }
}
