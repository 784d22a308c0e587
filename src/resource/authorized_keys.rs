//! SSH authorized keys resource

use declarative::{ApplyContext, ApplyResult, Resource, ResourceState};
use ignition::PasswdUser;
use std::path::PathBuf;

use super::Host;
use crate::daemon::{Error, Result};
use crate::paths::SystemPaths;

/// Mode of `~/.ssh`
const SSH_DIR_MODE: u32 = 0o700;

/// Mode of `authorized_keys`
const AUTHORIZED_KEYS_MODE: u32 = 0o600;

/// A user's `authorized_keys` file, replaced wholesale
#[derive(Debug)]
pub struct AuthorizedKeys {
    user: String,
    home: PathBuf,
    keys: Vec<String>,
    host: Host,
}

impl AuthorizedKeys {
    pub fn new(user: &PasswdUser, host: Host) -> Self {
        Self {
            user: user.name.clone(),
            home: user.home(),
            keys: user.ssh_authorized_keys.clone(),
            host,
        }
    }

    /// Keys to install for a user whose key list changed
    ///
    /// Fails when the two records carry the same keys: the user was
    /// scheduled for a key update that has nothing to do.
    pub fn for_change(old: &PasswdUser, new: &PasswdUser, host: Host) -> Result<Self> {
        if old.ssh_authorized_keys == new.ssh_authorized_keys {
            return Err(Error::SshKeysUnchanged {
                user: new.name.clone(),
            });
        }
        Ok(Self::new(new, host))
    }

    fn path(&self) -> PathBuf {
        SystemPaths::authorized_keys(&self.home)
    }

    /// One key per line, each line terminated
    fn contents(&self) -> String {
        self.keys.iter().map(|k| format!("{k}\n")).collect()
    }
}

impl Resource for AuthorizedKeys {
    type Error = Error;

    fn id(&self) -> String {
        self.path().to_string_lossy().to_string()
    }

    fn description(&self) -> String {
        format!("Write {} SSH key(s) for {}", self.keys.len(), self.user)
    }

    fn resource_type(&self) -> &'static str {
        "ssh_keys"
    }

    fn current_state(&self) -> Result<ResourceState> {
        match self.host.read(&self.path())? {
            None => Ok(ResourceState::Absent),
            Some(data) if data == self.contents().as_bytes() => Ok(self.desired_state()),
            Some(data) => Ok(ResourceState::Modified {
                from: String::from_utf8_lossy(&data).into_owned(),
                to: self.contents(),
            }),
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(format!("{} key(s)", self.keys.len())),
        }
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let path = self.path();
        log::info!("Writing SSH keys for {} at {}", self.user, path.display());
        let existed = self.host.exists(&path);
        if let Some(ssh_dir) = path.parent() {
            self.host.create_dir_all(ssh_dir, SSH_DIR_MODE)?;
        }
        self.host
            .write(&path, self.contents().as_bytes(), AUTHORIZED_KEYS_MODE)?;

        Ok(if existed {
            ApplyResult::Modified
        } else {
            ApplyResult::Created
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::temp_host;
    use std::fs;
    use std::os::unix::fs::MetadataExt;

    fn core(keys: &[&str]) -> PasswdUser {
        PasswdUser {
            name: "core".into(),
            ssh_authorized_keys: keys.iter().map(|k| (*k).to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_keys_replace_file() {
        let (tmp, host) = temp_host();
        let keys_file = tmp.path().join("home/core/.ssh/authorized_keys");
        fs::create_dir_all(keys_file.parent().unwrap()).unwrap();
        fs::write(&keys_file, "k1\n").unwrap();

        let resource = AuthorizedKeys::for_change(&core(&["k1"]), &core(&["k2", "k3"]), host).unwrap();
        assert!(matches!(
            resource.current_state().unwrap(),
            ResourceState::Modified { .. }
        ));

        assert_eq!(
            resource.apply(&ApplyContext::default()).unwrap(),
            ApplyResult::Modified
        );
        assert_eq!(fs::read_to_string(&keys_file).unwrap(), "k2\nk3\n");
        assert_eq!(fs::metadata(&keys_file).unwrap().mode() & 0o7777, 0o600);
        assert!(resource.current_state().unwrap().is_present());
    }

    #[test]
    fn test_explicit_home_dir() {
        let (tmp, host) = temp_host();
        let mut user = core(&["ssh-ed25519 AAAA"]);
        user.home_dir = "/var/home/core".into();

        AuthorizedKeys::new(&user, host)
            .apply(&ApplyContext::default())
            .unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join("var/home/core/.ssh/authorized_keys")).unwrap(),
            "ssh-ed25519 AAAA\n"
        );
    }

    #[test]
    fn test_unchanged_keys_rejected() {
        let (_tmp, host) = temp_host();
        let err = AuthorizedKeys::for_change(&core(&["k1"]), &core(&["k1"]), host).unwrap_err();
        assert!(matches!(err, Error::SshKeysUnchanged { ref user } if user == "core"));
    }

    #[test]
    fn test_empty_key_list_truncates() {
        let (tmp, host) = temp_host();
        AuthorizedKeys::for_change(&core(&["k1"]), &core(&[]), host)
            .unwrap()
            .apply(&ApplyContext::default())
            .unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join("home/core/.ssh/authorized_keys")).unwrap(),
            ""
        );
    }
}
