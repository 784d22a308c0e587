//! Supported config schema versions and their validators
//!
//! The schema is selected by the explicit `ignition.version` field. Each
//! version gets its own set of rules; a completely empty config is valid
//! under any of them.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::dataurl;
use crate::error::{Error, Result};
use crate::types::{Config, File, Unit};

static UNIT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9:_.\\-]+(@[A-Za-z0-9:_.\\-]*)?\.(service|socket|device|mount|automount|swap|target|path|timer|snapshot|slice|scope)$",
    )
    .expect("unit name pattern is valid")
});

/// A config schema version the node knows how to validate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    V2_2,
    V3_0,
}

impl SchemaVersion {
    /// The canonical version string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2_2 => "2.2.0",
            Self::V3_0 => "3.0.0",
        }
    }

    /// Validate a config under this schema's rules
    pub fn validate(&self, config: &Config) -> Result<()> {
        validate_common(*self, config)?;
        match self {
            Self::V2_2 => Ok(()),
            Self::V3_0 => validate_v3(config),
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "2.2.0" => Ok(Self::V2_2),
            "3.0.0" => Ok(Self::V3_0),
            other => Err(Error::UnsupportedVersion(other.to_string())),
        }
    }
}

/// Validate a config, choosing the rules from its declared version
pub fn validate(config: &Config) -> Result<()> {
    if config.is_empty() {
        return Ok(());
    }
    config.ignition.version.parse::<SchemaVersion>()?.validate(config)
}

fn invalid(version: SchemaVersion, message: impl Into<String>) -> Error {
    Error::Invalid {
        version: version.as_str(),
        message: message.into(),
    }
}

fn validate_common(version: SchemaVersion, config: &Config) -> Result<()> {
    for file in &config.storage.files {
        validate_file(version, file)?;
    }
    for unit in &config.systemd.units {
        validate_unit(version, unit)?;
    }
    for user in &config.passwd.users {
        if user.name.is_empty() {
            return Err(invalid(version, "user with empty name"));
        }
    }
    for group in &config.passwd.groups {
        if group.name.is_empty() {
            return Err(invalid(version, "group with empty name"));
        }
    }
    Ok(())
}

fn validate_file(version: SchemaVersion, file: &File) -> Result<()> {
    if !file.path.starts_with('/') {
        return Err(invalid(
            version,
            format!("file path {:?} is not absolute", file.path),
        ));
    }
    if let Some(mode) = file.mode
        && mode > 0o7777
    {
        return Err(invalid(
            version,
            format!("file {} has invalid mode {mode:o}", file.path),
        ));
    }
    dataurl::decode(&file.contents.source).map_err(|e| {
        invalid(
            version,
            format!("file {} has undecodable contents: {e}", file.path),
        )
    })?;
    Ok(())
}

fn validate_unit(version: SchemaVersion, unit: &Unit) -> Result<()> {
    if !UNIT_NAME.is_match(&unit.name) {
        return Err(invalid(
            version,
            format!("invalid systemd unit name {:?}", unit.name),
        ));
    }
    for dropin in &unit.dropins {
        if dropin.name.is_empty() || dropin.name.contains('/') {
            return Err(invalid(
                version,
                format!("unit {} has invalid drop-in name {:?}", unit.name, dropin.name),
            ));
        }
    }
    Ok(())
}

fn validate_v3(config: &Config) -> Result<()> {
    for unit in &config.systemd.units {
        if unit.enable {
            return Err(invalid(
                SchemaVersion::V3_0,
                format!("unit {} uses the legacy 'enable' flag", unit.name),
            ));
        }
    }
    for file in &config.storage.files {
        if file.append && file.overwrite == Some(true) {
            return Err(invalid(
                SchemaVersion::V3_0,
                format!("file {} sets both append and overwrite", file.path),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dropin, FileContents, PasswdUser};

    fn config(version: &str) -> Config {
        let mut config = Config::default();
        config.ignition.version = version.to_string();
        config
    }

    fn unit(name: &str) -> Unit {
        Unit {
            name: name.to_string(),
            contents: "[Unit]".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_versions() {
        assert_eq!("2.2.0".parse::<SchemaVersion>().unwrap(), SchemaVersion::V2_2);
        assert_eq!("3.0.0".parse::<SchemaVersion>().unwrap(), SchemaVersion::V3_0);
        assert!(matches!(
            "1.0".parse::<SchemaVersion>(),
            Err(Error::UnsupportedVersion(_))
        ));
        assert_eq!(SchemaVersion::V3_0.to_string(), "3.0.0");
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut config = config("9.9.9");
        config.systemd.units.push(unit("a.service"));
        assert!(matches!(
            validate(&config),
            Err(Error::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_legacy_enable_only_in_v2() {
        let mut legacy = unit("kubelet.service");
        legacy.enable = true;

        let mut v2 = config("2.2.0");
        v2.systemd.units.push(legacy.clone());
        assert!(validate(&v2).is_ok());

        let mut v3 = config("3.0.0");
        v3.systemd.units.push(legacy);
        assert!(matches!(validate(&v3), Err(Error::Invalid { version: "3.0.0", .. })));
    }

    #[test]
    fn test_unit_names() {
        for name in ["kubelet.service", "getty@tty1.service", "var-lib.mount"] {
            let mut c = config("2.2.0");
            c.systemd.units.push(unit(name));
            assert!(validate(&c).is_ok(), "{name} should be valid");
        }
        for name in ["", "kubelet", "../etc/passwd.service"] {
            let mut c = config("2.2.0");
            c.systemd.units.push(unit(name));
            assert!(validate(&c).is_err(), "{name} should be invalid");
        }
    }

    #[test]
    fn test_dropin_name_without_slash() {
        let mut u = unit("crio.service");
        u.dropins.push(Dropin {
            name: "../escape.conf".into(),
            contents: String::new(),
        });
        let mut c = config("2.2.0");
        c.systemd.units.push(u);
        assert!(validate(&c).is_err());
    }

    #[test]
    fn test_file_rules() {
        let good = File {
            path: "/etc/motd".into(),
            contents: FileContents {
                source: "data:,hi".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let mut c = config("2.2.0");
        c.storage.files.push(good.clone());
        assert!(validate(&c).is_ok());

        let mut c = config("2.2.0");
        c.storage.files.push(File {
            path: "etc/motd".into(),
            ..good.clone()
        });
        assert!(validate(&c).is_err());

        let mut c = config("2.2.0");
        c.storage.files.push(File {
            contents: FileContents {
                source: "http://example.com/motd".into(),
                ..Default::default()
            },
            ..good.clone()
        });
        assert!(validate(&c).is_err());

        let both = File {
            append: true,
            overwrite: Some(true),
            ..good
        };
        let mut c = config("2.2.0");
        c.storage.files.push(both.clone());
        assert!(validate(&c).is_ok());

        let mut c = config("3.0.0");
        c.storage.files.push(both);
        assert!(validate(&c).is_err());
    }

    #[test]
    fn test_empty_user_name_rejected() {
        let mut c = config("2.2.0");
        c.passwd.users.push(PasswdUser::default());
        assert!(validate(&c).is_err());
    }
}
