//! The node update pipeline
//!
//! One [`Daemon::update`] call is one update cycle: classify the transition,
//! apply files and units, clean up what the old config left behind, install
//! changed SSH keys, swap the OS image, drain and reboot. The cycle is
//! strictly sequential and stops at the first failure; nothing is rolled back.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::{Drainer, LoginClient, NodeApi, OsUpdater, RpmOstree};
use crate::fs::Filesystem;
use crate::ownership::IdentityLookup;
use crate::paths::{OS_RELEASE, SystemPaths};
use crate::resource::Host;

mod drain;
mod error;
pub mod reconcile;
pub mod stale;
mod update;

pub use drain::{DRAIN_GRACE_PERIOD_SECS, drain_options};
pub use error::{Error, ErrorCategory, Result};
pub use reconcile::{Verdict, classify};
pub use stale::CleanupReport;
pub use update::UpdateOptions;

/// How long to wait for a requested reboot before declaring it lost
pub const DEFAULT_REBOOT_GUARD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Whether the daemon runs against a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Managed by the cluster: events are recorded and the node is drained
    #[default]
    Cluster,
    /// One-shot run without a cluster (first boot, manual runs)
    Once,
}

/// The operating system the node booted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatingSystem {
    /// The image-based OS whose image the daemon can swap
    Rhcos,
    Other(String),
}

impl OperatingSystem {
    /// Map an os-release `ID`
    pub fn from_id(id: &str) -> Self {
        match id {
            "rhcos" => Self::Rhcos,
            other => Self::Other(other.to_string()),
        }
    }

    /// Parse the `ID=` line of an os-release file
    pub fn from_os_release(content: &str) -> Self {
        let id = content
            .lines()
            .find_map(|line| line.trim().strip_prefix("ID="))
            .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\''))
            .unwrap_or_default();
        Self::from_id(id)
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rhcos => f.write_str("rhcos"),
            Self::Other(id) if id.is_empty() => f.write_str("unknown"),
            Self::Other(id) => f.write_str(id),
        }
    }
}

/// Runtime facts about the node, read once per cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContext {
    pub node_name: String,
    /// `None` when the booted image could not be determined
    pub booted_os_image_url: Option<String>,
    pub operating_system: OperatingSystem,
    pub run_mode: RunMode,
}

impl NodeContext {
    /// Detect the OS and booted image of the node under `paths`
    ///
    /// Detection failures are logged and leave the fields at values that
    /// disable the OS update step.
    pub fn detect(
        node_name: &str,
        run_mode: RunMode,
        paths: &SystemPaths,
        rpm_ostree: &RpmOstree,
    ) -> Self {
        let os_release = paths.resolve(Path::new(OS_RELEASE));
        let operating_system = match std::fs::read_to_string(&os_release) {
            Ok(content) => OperatingSystem::from_os_release(&content),
            Err(e) => {
                log::warn!("Failed to read {}: {}", os_release.display(), e);
                OperatingSystem::Other(String::new())
            }
        };

        let booted_os_image_url = if operating_system == OperatingSystem::Rhcos {
            match rpm_ostree.booted_image_url() {
                Ok(url) => Some(url),
                Err(e) => {
                    log::warn!("Failed to detect booted OS image: {}", e);
                    None
                }
            }
        } else {
            None
        };

        log::debug!(
            "Node {}: os={}, booted image={:?}",
            node_name,
            operating_system,
            booted_os_image_url
        );

        Self {
            node_name: node_name.to_string(),
            booted_os_image_url,
            operating_system,
            run_mode,
        }
    }
}

/// Everything the pipeline talks to outside its own process
#[derive(Clone)]
pub struct Collaborators {
    pub fs: Arc<dyn Filesystem>,
    pub identity: Arc<dyn IdentityLookup>,
    pub node_api: Arc<dyn NodeApi>,
    pub drainer: Arc<dyn Drainer>,
    pub os_updater: Arc<dyn OsUpdater>,
    pub login: Arc<dyn LoginClient>,
}

/// Runs update cycles for one node
pub struct Daemon {
    host: Host,
    identity: Arc<dyn IdentityLookup>,
    node_api: Arc<dyn NodeApi>,
    drainer: Arc<dyn Drainer>,
    os_updater: Arc<dyn OsUpdater>,
    login: Arc<dyn LoginClient>,
    reboot_guard: Duration,
}

impl Daemon {
    pub fn new(paths: SystemPaths, collaborators: Collaborators) -> Self {
        Self {
            host: Host::new(paths, collaborators.fs),
            identity: collaborators.identity,
            node_api: collaborators.node_api,
            drainer: collaborators.drainer,
            os_updater: collaborators.os_updater,
            login: collaborators.login,
            reboot_guard: DEFAULT_REBOOT_GUARD,
        }
    }

    /// Override how long to wait for a reboot to take effect
    pub fn with_reboot_guard(mut self, guard: Duration) -> Self {
        self.reboot_guard = guard;
        self
    }
}
