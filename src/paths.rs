//! Centralized path resolution for mcd
//!
//! Configs always name host paths (`/etc/systemd/system/foo.service`). The
//! daemon may run with the host filesystem mounted somewhere else, so every
//! host path is mapped under a root mount before it is touched. Symlink
//! targets stay host paths: they are read by the host's systemd, not by us.
//!
//! # Environment Variables
//!
//! - `MCD_CONFIG` - Override the daemon config file location

use std::path::{Component, Path, PathBuf};

/// Environment variable for config file override
pub const ENV_CONFIG: &str = "MCD_CONFIG";

/// Default location of the daemon config
pub const DEFAULT_CONFIG_PATH: &str = "/etc/mcd/config.toml";

/// Default termination log consulted by the node supervisor
pub const DEFAULT_TERMINATION_LOG: &str = "/dev/termination-log";

/// Where unit files and drop-in directories live
pub const SYSTEMD_DIR: &str = "/etc/systemd/system";

/// Links that enable a unit for the default target
pub const WANTS_DIR: &str = "/etc/systemd/system/multi-user.target.wants";

/// Masked units point here
pub const DEV_NULL: &str = "/dev/null";

/// OS release information, relative to the root mount
pub const OS_RELEASE: &str = "/etc/os-release";

/// Default permissions for directories the daemon creates
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Default permissions for files the daemon writes
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Get the daemon config file path
///
/// Priority:
/// 1. `MCD_CONFIG` env var
/// 2. `/etc/mcd/config.toml`
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        log::debug!("Using config file from {}: {}", ENV_CONFIG, path);
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Maps host paths onto the mounted root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPaths {
    root: PathBuf,
}

impl Default for SystemPaths {
    fn default() -> Self {
        Self::new("/")
    }
}

impl SystemPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a host path under the root mount
    ///
    /// `..` components are dropped so a config can never reach outside the
    /// mount.
    pub fn resolve(&self, host_path: &Path) -> PathBuf {
        let mut out = self.root.clone();
        for component in host_path.components() {
            if let Component::Normal(part) = component {
                out.push(part);
            }
        }
        out
    }

    /// Host path of a unit file
    pub fn unit(name: &str) -> PathBuf {
        Path::new(SYSTEMD_DIR).join(name)
    }

    /// Host path of a unit's drop-in directory
    pub fn dropin_dir(unit: &str) -> PathBuf {
        Path::new(SYSTEMD_DIR).join(format!("{unit}.d"))
    }

    /// Host path of a single drop-in
    pub fn dropin(unit: &str, dropin: &str) -> PathBuf {
        Self::dropin_dir(unit).join(dropin)
    }

    /// Host path of the link that enables a unit
    pub fn wants_link(unit: &str) -> PathBuf {
        Path::new(WANTS_DIR).join(unit)
    }

    /// `authorized_keys` inside a home directory
    pub fn authorized_keys(home: &Path) -> PathBuf {
        home.join(".ssh").join("authorized_keys")
    }
}

// ============================================================================
// Tests
// ============================================================================
