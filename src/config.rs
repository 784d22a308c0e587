use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths::DEFAULT_TERMINATION_LOG;

/// Daemon settings, read from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Name of the node this daemon manages
    pub node_name: Option<String>,
    /// Where the host filesystem is mounted
    pub root_mount: PathBuf,
    pub termination_log: PathBuf,
    /// Seconds to wait for a requested reboot
    pub reboot_guard_secs: u64,
    /// kubectl binary used for node lookups, events and drains
    pub kubectl: String,
    /// Binary that rebases the node onto a new OS image
    pub pivot: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            node_name: None,
            root_mount: PathBuf::from("/"),
            termination_log: PathBuf::from(DEFAULT_TERMINATION_LOG),
            reboot_guard_secs: crate::daemon::DEFAULT_REBOOT_GUARD.as_secs(),
            kubectl: "kubectl".to_string(),
            pivot: "pivot".to_string(),
        }
    }
}

impl DaemonConfig {
    /// Load the config at `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.root_mount.as_os_str().is_empty() {
            bail!("root_mount must not be empty");
        }
        if !self.termination_log.is_absolute() {
            bail!(
                "termination_log must be an absolute path, got {}",
                self.termination_log.display()
            );
        }
        Ok(())
    }

    pub fn reboot_guard(&self) -> Duration {
        Duration::from_secs(self.reboot_guard_secs)
    }

    /// The node name, preferring `flag` (which also carries `NODE_NAME`)
    pub fn node_name(&self, flag: Option<&str>) -> Result<String> {
        flag.map(str::to_string)
            .or_else(|| self.node_name.clone())
            .filter(|name| !name.is_empty())
            .context("No node name: pass --node, set NODE_NAME or node_name in the config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = DaemonConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config, DaemonConfig::default());
        assert_eq!(config.root_mount, PathBuf::from("/"));
        assert_eq!(config.reboot_guard(), Duration::from_secs(604_800));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "node_name = \"worker-0\"\nroot_mount = \"/rootfs\"\n").unwrap();

        let config = DaemonConfig::load(&path).unwrap();
        assert_eq!(config.node_name.as_deref(), Some("worker-0"));
        assert_eq!(config.root_mount, PathBuf::from("/rootfs"));
        assert_eq!(config.kubectl, "kubectl");
        assert_eq!(config.termination_log, PathBuf::from("/dev/termination-log"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        fs::write(&path, "root_mount = \"\"\n").unwrap();
        assert!(DaemonConfig::load(&path).is_err());

        fs::write(&path, "termination_log = \"relative/log\"\n").unwrap();
        assert!(DaemonConfig::load(&path).is_err());

        fs::write(&path, "reboot_guard_secs = \"soon\"\n").unwrap();
        assert!(DaemonConfig::load(&path).is_err());
    }

    #[test]
    fn test_node_name_precedence() {
        let config = DaemonConfig {
            node_name: Some("from-config".into()),
            ..Default::default()
        };
        assert_eq!(config.node_name(Some("from-flag")).unwrap(), "from-flag");
        assert_eq!(config.node_name(None).unwrap(), "from-config");
        assert!(DaemonConfig::default().node_name(None).is_err());
    }
}
