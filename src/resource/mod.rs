//! Node resources managed by the update pipeline
//!
//! Each config entry becomes a [`declarative::Resource`]:
//! - State detection against the live filesystem (used by `mcd diff`)
//! - Apply function (converge current → desired)
//!
//! All three resource kinds share a [`Host`]: the root mount plus the
//! filesystem client every write goes through.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::daemon::{Error, Result};
use crate::fs::Filesystem;
use crate::paths::{DEFAULT_DIR_MODE, SystemPaths};

pub mod authorized_keys;
pub mod file;
pub mod unit;

pub use authorized_keys::AuthorizedKeys;
pub use file::ManagedFile;
pub use unit::ManagedUnit;

/// The node's filesystem as seen through the root mount
#[derive(Clone)]
pub struct Host {
    pub paths: SystemPaths,
    pub fs: Arc<dyn Filesystem>,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("root", &self.paths.root())
            .finish_non_exhaustive()
    }
}

impl Host {
    pub fn new(paths: SystemPaths, fs: Arc<dyn Filesystem>) -> Self {
        Self { paths, fs }
    }

    /// Whether anything exists at a host path
    pub fn exists(&self, host_path: &Path) -> bool {
        self.fs.exists(&self.paths.resolve(host_path))
    }

    /// Read a host path; `None` when it does not exist
    pub fn read(&self, host_path: &Path) -> Result<Option<Vec<u8>>> {
        let path = self.paths.resolve(host_path);
        match self.fs.read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io("read", &path)(e)),
        }
    }

    /// Create a host directory and its parents
    pub fn create_dir_all(&self, host_path: &Path, mode: u32) -> Result<()> {
        let path = self.paths.resolve(host_path);
        self.fs
            .create_dir_all(&path, mode)
            .map_err(Error::io("create directory", &path))
    }

    /// Write a whole file, creating its parent directory with the default mode
    pub fn write(&self, host_path: &Path, data: &[u8], mode: u32) -> Result<()> {
        if let Some(parent) = host_path.parent() {
            self.create_dir_all(parent, DEFAULT_DIR_MODE)?;
        }
        let path = self.paths.resolve(host_path);
        self.fs
            .write_file(&path, data, mode)
            .map_err(Error::io("write", &path))?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }

    /// Create a symlink at a host path; `target` is written as-is
    pub fn symlink(&self, target: &Path, host_link: &Path) -> Result<()> {
        let link = self.paths.resolve(host_link);
        self.fs
            .symlink(target, &link)
            .map_err(Error::io("create symlink", &link))?;
        log::debug!("Symlinked {} to {}", link.display(), target.display());
        Ok(())
    }

    /// Where a symlink at a host path points; `None` when it is not a link
    pub fn read_link(&self, host_path: &Path) -> Option<PathBuf> {
        self.fs.read_link(&self.paths.resolve(host_path)).ok()
    }

    /// Remove a file, link or empty directory at a host path
    pub fn remove(&self, host_path: &Path) -> Result<()> {
        let path = self.paths.resolve(host_path);
        self.fs.remove(&path).map_err(Error::io("remove", &path))
    }

    /// Remove a host path recursively; a missing path is fine
    pub fn remove_all(&self, host_path: &Path) -> Result<()> {
        let path = self.paths.resolve(host_path);
        self.fs.remove_all(&path).map_err(Error::io("remove", &path))
    }

    /// Whether a host directory has no entries
    pub fn is_empty_dir(&self, host_path: &Path) -> Result<bool> {
        let path = self.paths.resolve(host_path);
        self.fs
            .is_empty_dir(&path)
            .map_err(Error::io("read directory", &path))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for exercising resources against a temporary root

    use super::*;
    use crate::fs::{FileHandle, HostFilesystem};
    use std::fs::Metadata;
    use std::io::{self, Write};
    use tempfile::TempDir;

    pub(crate) fn temp_host() -> (TempDir, Host) {
        let tmp = TempDir::new().unwrap();
        let host = Host::new(SystemPaths::new(tmp.path()), Arc::new(HostFilesystem));
        (tmp, host)
    }

    /// Host filesystem that refuses to create anything under one path
    #[derive(Debug)]
    pub(crate) struct FailingFilesystem {
        pub fail_under: PathBuf,
    }

    impl FailingFilesystem {
        fn check(&self, path: &Path) -> io::Result<()> {
            if path.starts_with(&self.fail_under) {
                Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "read-only filesystem",
                ))
            } else {
                Ok(())
            }
        }
    }

    impl Filesystem for FailingFilesystem {
        fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
            self.check(path)?;
            HostFilesystem.create_dir_all(path, mode)
        }

        fn create(&self, path: &Path) -> io::Result<Box<dyn FileHandle>> {
            self.check(path)?;
            HostFilesystem.create(path)
        }

        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            HostFilesystem.read(path)
        }

        fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
            self.check(link)?;
            HostFilesystem.symlink(target, link)
        }

        fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
            HostFilesystem.read_link(path)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            self.check(path)?;
            HostFilesystem.remove(path)
        }

        fn remove_all(&self, path: &Path) -> io::Result<()> {
            self.check(path)?;
            HostFilesystem.remove_all(path)
        }

        fn lstat(&self, path: &Path) -> io::Result<Metadata> {
            HostFilesystem.lstat(path)
        }

        fn is_empty_dir(&self, path: &Path) -> io::Result<bool> {
            HostFilesystem.is_empty_dir(path)
        }
    }

    /// Host filesystem whose file handles fail to close
    #[derive(Debug)]
    pub(crate) struct FailingClose;

    struct CloseFails(Box<dyn FileHandle>);

    impl Write for CloseFails {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.0.flush()
        }
    }

    impl FileHandle for CloseFails {
        fn set_mode(&mut self, mode: u32) -> io::Result<()> {
            self.0.set_mode(mode)
        }

        fn chown(&mut self, uid: u32, gid: u32) -> io::Result<()> {
            self.0.chown(uid, gid)
        }

        fn sync(&mut self) -> io::Result<()> {
            self.0.sync()
        }

        fn close(self: Box<Self>) -> io::Result<()> {
            self.0.close()?;
            Err(io::Error::other("close failed"))
        }
    }

    impl Filesystem for FailingClose {
        fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
            HostFilesystem.create_dir_all(path, mode)
        }

        fn create(&self, path: &Path) -> io::Result<Box<dyn FileHandle>> {
            Ok(Box::new(CloseFails(HostFilesystem.create(path)?)))
        }

        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            HostFilesystem.read(path)
        }

        fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
            HostFilesystem.symlink(target, link)
        }

        fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
            HostFilesystem.read_link(path)
        }

        fn remove(&self, path: &Path) -> io::Result<()> {
            HostFilesystem.remove(path)
        }

        fn remove_all(&self, path: &Path) -> io::Result<()> {
            HostFilesystem.remove_all(path)
        }

        fn lstat(&self, path: &Path) -> io::Result<Metadata> {
            HostFilesystem.lstat(path)
        }

        fn is_empty_dir(&self, path: &Path) -> io::Result<bool> {
            HostFilesystem.is_empty_dir(path)
        }
    }
}
