//! File resource - inline contents, mode and ownership

use declarative::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Host;
use crate::daemon::{Error, Result};
use crate::ownership::{self, IdentityLookup};
use crate::paths::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};

/// A file from the config's storage section
pub struct ManagedFile {
    spec: ignition::File,
    host: Host,
    identity: Arc<dyn IdentityLookup>,
}

impl std::fmt::Debug for ManagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedFile")
            .field("path", &self.spec.path)
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

impl ManagedFile {
    pub fn new(spec: ignition::File, host: Host, identity: Arc<dyn IdentityLookup>) -> Self {
        Self {
            spec,
            host,
            identity,
        }
    }

    fn host_path(&self) -> &Path {
        Path::new(&self.spec.path)
    }

    fn mode(&self) -> u32 {
        self.spec.mode.unwrap_or(DEFAULT_FILE_MODE)
    }

    fn decode(&self) -> Result<Vec<u8>> {
        self.spec.decoded_contents().map_err(|source| Error::Decode {
            path: PathBuf::from(&self.spec.path),
            source,
        })
    }

    /// Write contents, mode and ownership, then sync
    fn write(&self) -> Result<()> {
        let host_path = self.host_path();
        log::info!("Writing file {}", host_path.display());

        if let Some(parent) = host_path.parent() {
            self.host.create_dir_all(parent, DEFAULT_DIR_MODE)?;
        }

        let path = self.host.paths.resolve(host_path);
        let mut file = self
            .host
            .fs
            .create(&path)
            .map_err(Error::io("create", &path))?;

        let contents = self.decode()?;
        file.write_all(&contents)
            .map_err(Error::io("write inline contents to", &path))?;
        file.set_mode(self.mode())
            .map_err(Error::io("set file mode for", &path))?;

        if self.spec.has_ownership() {
            let (uid, gid) = ownership::resolve(
                self.identity.as_ref(),
                self.spec.user.as_ref(),
                self.spec.group.as_ref(),
            )
            .map_err(|source| Error::Ownership {
                path: host_path.to_path_buf(),
                source,
            })?;
            file.chown(uid, gid)
                .map_err(Error::io("set file ownership for", &path))?;
            log::debug!("Set owner of {} to {}:{}", path.display(), uid, gid);
        }

        file.sync().map_err(Error::io("sync", &path))?;
        file.close().map_err(Error::io("close", &path))
    }
}

impl Resource for ManagedFile {
    type Error = Error;

    fn id(&self) -> String {
        self.spec.path.clone()
    }

    fn description(&self) -> String {
        format!("Write {} (mode {:o})", self.spec.path, self.mode())
    }

    fn resource_type(&self) -> &'static str {
        "file"
    }

    fn current_state(&self) -> Result<ResourceState> {
        let Some(current) = self.host.read(self.host_path())? else {
            return Ok(ResourceState::Absent);
        };

        let desired = self.decode()?;
        if current != desired {
            return Ok(ResourceState::Modified {
                from: String::from_utf8_lossy(&current).into_owned(),
                to: String::from_utf8_lossy(&desired).into_owned(),
            });
        }

        let path = self.host.paths.resolve(self.host_path());
        let meta = self
            .host
            .fs
            .lstat(&path)
            .map_err(Error::io("stat", &path))?;
        let mode = meta.permissions().mode() & 0o7777;
        if mode == self.mode() {
            Ok(self.desired_state())
        } else {
            Ok(ResourceState::Modified {
                from: format!("mode {mode:o}"),
                to: format!("mode {:o}", self.mode()),
            })
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(format!("mode {:o}", self.mode())),
        }
    }

    fn apply(&self, ctx: &ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let existed = self.host.exists(self.host_path());
        self.write()?;
        Ok(if existed {
            ApplyResult::Modified
        } else {
            ApplyResult::Created
        })
    }
}
