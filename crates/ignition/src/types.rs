//! Data types for machine configurations
//!
//! Field names follow the JSON documents the cluster hands to the node
//! (camelCase). Lists compare index by index and `None` is never equal to
//! `Some(default)`, so derived `PartialEq` is the structural equality the
//! reconciliation logic relies on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::dataurl;
use crate::error::{Error, Result};

/// Compression value for gzip-compressed inline contents
pub const COMPRESSION_GZIP: &str = "gzip";

// ============================================================================
// MachineConfig envelope
// ============================================================================

/// A versioned machine configuration as stored by the cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MachineConfig {
    pub api_version: String,
    /// Empty when the snapshot carries no identifying metadata
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: MachineConfigSpec,
}

/// Object metadata (only the parts the node cares about)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    pub name: String,
}

/// The desired state carried by a MachineConfig
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfigSpec {
    /// Target OS image reference
    #[serde(rename = "osImageURL")]
    pub os_image_url: String,
    pub config: Config,
}

impl MachineConfig {
    /// Parse a MachineConfig from a JSON document
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a MachineConfig from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Name used when reporting about this config
    pub fn display_name(&self) -> &str {
        if self.metadata.name.is_empty() {
            "<unnamed>"
        } else {
            &self.metadata.name
        }
    }

    /// Validate the embedded config against its schema version
    pub fn validate(&self) -> Result<()> {
        crate::version::validate(&self.spec.config)
    }
}

// ============================================================================
// Config
// ============================================================================

/// The node configuration proper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ignition: Ignition,
    pub storage: Storage,
    pub systemd: Systemd,
    pub networkd: Networkd,
    pub passwd: Passwd,
}

impl Config {
    /// A config with no content at all (valid under every schema)
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The ignition section: only the format version matters on the node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ignition {
    pub version: String,
}

// ============================================================================
// Storage
// ============================================================================

/// Storage layout and files
///
/// Disks, filesystems and raid arrays are opaque here: the node never
/// changes them in place, it only needs to know whether they changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub disks: Vec<Value>,
    pub filesystems: Vec<Value>,
    pub raid: Vec<Value>,
    pub files: Vec<File>,
}

/// A file to write on the node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    pub filesystem: String,
    pub path: String,
    pub contents: FileContents,
    /// Permission bits; 0644 when unset
    pub mode: Option<u32>,
    pub user: Option<NodeUser>,
    pub group: Option<NodeGroup>,
    pub append: bool,
    pub overwrite: Option<bool>,
}

impl File {
    /// Decode the inline contents, decompressing if requested
    pub fn decoded_contents(&self) -> Result<Vec<u8>> {
        let data = dataurl::decode(&self.contents.source)?;
        match self.contents.compression.as_str() {
            "" => Ok(data),
            COMPRESSION_GZIP => dataurl::gunzip(&data),
            other => Err(Error::UnsupportedCompression(other.to_string())),
        }
    }

    /// Whether an owner or group was requested
    pub fn has_ownership(&self) -> bool {
        self.user.is_some() || self.group.is_some()
    }
}

/// Inline file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileContents {
    /// RFC 2397 data URL
    pub source: String,
    pub compression: String,
}

/// File owner, by id or by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeUser {
    pub id: Option<u32>,
    pub name: Option<String>,
}

/// File group, by id or by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeGroup {
    pub id: Option<u32>,
    pub name: Option<String>,
}

// ============================================================================
// Systemd
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Systemd {
    pub units: Vec<Unit>,
}

/// A systemd unit and its drop-ins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unit {
    pub name: String,
    pub contents: String,
    /// Legacy flag (2.x schemas); honored independently of `enabled`
    pub enable: bool,
    pub enabled: Option<bool>,
    pub mask: bool,
    pub dropins: Vec<Dropin>,
}

/// A drop-in fragment layered onto a unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dropin {
    pub name: String,
    pub contents: String,
}

// ============================================================================
// Networkd
// ============================================================================

/// Network units; opaque to the node, only compared for equality
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Networkd {
    pub units: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Passwd
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Passwd {
    pub users: Vec<PasswdUser>,
    pub groups: Vec<PasswdGroup>,
}

/// A user account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswdUser {
    pub name: String,
    pub password_hash: Option<String>,
    pub ssh_authorized_keys: Vec<String>,
    pub uid: Option<u32>,
    pub gecos: String,
    pub home_dir: String,
    pub no_create_home: bool,
    pub primary_group: String,
    pub groups: Vec<String>,
    pub no_user_group: bool,
    pub system: bool,
    pub no_log_init: bool,
    pub shell: String,
    /// Fields not modelled above (e.g. the 2.x `create` object)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PasswdUser {
    /// Home directory, falling back to `/home/<name>` when unset
    pub fn home(&self) -> PathBuf {
        if self.home_dir.is_empty() {
            Path::new("/home").join(&self.name)
        } else {
            PathBuf::from(&self.home_dir)
        }
    }
}

/// A group definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswdGroup {
    pub name: String,
    pub gid: Option<u32>,
    pub password_hash: Option<String>,
    pub system: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_machine_config() {
        let json = r#"{
            "apiVersion": "machineconfiguration.openshift.io/v1",
            "kind": "MachineConfig",
            "metadata": {"name": "rendered-worker-1"},
            "spec": {
                "osImageURL": "quay.io/os@sha256:abc",
                "config": {
                    "ignition": {"version": "2.2.0"},
                    "storage": {
                        "files": [{
                            "filesystem": "root",
                            "path": "/etc/motd",
                            "contents": {"source": "data:,hello"},
                            "mode": 420,
                            "user": {"name": "core"}
                        }]
                    },
                    "systemd": {
                        "units": [{"name": "kubelet.service", "enable": true, "contents": "[Unit]"}]
                    },
                    "passwd": {
                        "users": [{"name": "core", "sshAuthorizedKeys": ["ssh-ed25519 AAAA"]}]
                    }
                }
            }
        }"#;

        let mc = MachineConfig::from_json(json).unwrap();
        assert_eq!(mc.kind, "MachineConfig");
        assert_eq!(mc.display_name(), "rendered-worker-1");
        assert_eq!(mc.spec.os_image_url, "quay.io/os@sha256:abc");

        let config = &mc.spec.config;
        assert_eq!(config.ignition.version, "2.2.0");
        assert_eq!(config.storage.files[0].mode, Some(0o644));
        assert_eq!(
            config.storage.files[0].user.as_ref().unwrap().name.as_deref(),
            Some("core")
        );
        assert!(config.systemd.units[0].enable);
        assert_eq!(config.systemd.units[0].enabled, None);
        assert_eq!(
            config.passwd.users[0].ssh_authorized_keys,
            vec!["ssh-ed25519 AAAA".to_string()]
        );
    }

    #[test]
    fn test_missing_kind_is_empty() {
        let mc = MachineConfig::from_json("{}").unwrap();
        assert!(mc.kind.is_empty());
        assert!(mc.spec.config.is_empty());
        assert_eq!(mc.display_name(), "<unnamed>");
    }

    #[test]
    fn test_enabled_none_differs_from_false() {
        let a = Unit {
            name: "a.service".into(),
            ..Default::default()
        };
        let b = Unit {
            enabled: Some(false),
            ..a.clone()
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_list_equality_is_positional() {
        let a = PasswdUser {
            ssh_authorized_keys: vec!["k1".into(), "k2".into()],
            ..Default::default()
        };
        let b = PasswdUser {
            ssh_authorized_keys: vec!["k2".into(), "k1".into()],
            ..Default::default()
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_unmodelled_fields_take_part_in_equality() {
        let parse = |json: &str| serde_json::from_str::<PasswdUser>(json).unwrap();
        let a = parse(r#"{"name":"core","create":{"uid":1000}}"#);
        let b = parse(r#"{"name":"core","create":{"uid":2000}}"#);
        assert_eq!(a.extra["create"]["uid"], 1000);
        assert_ne!(a, b);

        let net = |json: &str| serde_json::from_str::<Networkd>(json).unwrap();
        assert_ne!(
            net(r#"{"units":[{"name":"eth0.network","dropins":[{"contents":"1"}]}]}"#),
            net(r#"{"units":[{"name":"eth0.network","dropins":[{"contents":"2"}]}]}"#)
        );
    }

    #[test]
    fn test_home_fallback() {
        let user = PasswdUser {
            name: "core".into(),
            ..Default::default()
        };
        assert_eq!(user.home(), PathBuf::from("/home/core"));

        let user = PasswdUser {
            home_dir: "/var/home/core".into(),
            ..user
        };
        assert_eq!(user.home(), PathBuf::from("/var/home/core"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mc.json");
        std::fs::write(&path, r#"{"kind": "MachineConfig"}"#).unwrap();
        assert_eq!(MachineConfig::from_path(&path).unwrap().kind, "MachineConfig");

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            MachineConfig::from_path(&missing),
            Err(Error::Read { .. })
        ));
    }

    #[test]
    fn test_decoded_contents_rejects_unknown_compression() {
        let file = File {
            contents: FileContents {
                source: "data:,x".into(),
                compression: "bzip2".into(),
            },
            ..Default::default()
        };
        assert!(matches!(
            file.decoded_contents(),
            Err(Error::UnsupportedCompression(_))
        ));
    }
}
