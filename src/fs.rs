//! Filesystem access for the appliers
//!
//! Every mutation the daemon performs on the node goes through
//! [`Filesystem`]. Paths handed to it are already resolved under the root
//! mount; symlink targets are written verbatim.

use std::fs::{self, DirBuilder, Metadata, OpenOptions, Permissions};
use std::io::{self, Write};
use std::os::fd::IntoRawFd;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt, fchown, symlink};
use std::path::Path;

/// An open file being written by an applier
pub trait FileHandle: Write {
    /// Set the permission bits
    fn set_mode(&mut self, mode: u32) -> io::Result<()>;

    /// Change owner and group
    fn chown(&mut self, uid: u32, gid: u32) -> io::Result<()>;

    /// Flush data and metadata to stable storage
    fn sync(&mut self) -> io::Result<()>;

    /// Close the file, reporting errors a plain drop would swallow
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Filesystem operations used by the appliers and the stale collector
pub trait Filesystem: Send + Sync {
    /// Create a directory and all missing parents with `mode`
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Create or truncate a file for writing
    fn create(&self, path: &Path) -> io::Result<Box<dyn FileHandle>>;

    /// Read a whole file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create `link` pointing at `target`
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Read where a symlink points
    fn read_link(&self, path: &Path) -> io::Result<std::path::PathBuf>;

    /// Remove a file, a symlink or an empty directory
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Remove a path and everything below it; missing paths are not an error
    fn remove_all(&self, path: &Path) -> io::Result<()>;

    /// Metadata without following symlinks
    fn lstat(&self, path: &Path) -> io::Result<Metadata>;

    /// Whether a directory has no entries
    fn is_empty_dir(&self, path: &Path) -> io::Result<bool>;

    /// Whether anything (including a dangling symlink) exists at `path`
    fn exists(&self, path: &Path) -> bool {
        self.lstat(path).is_ok()
    }

    /// Create or truncate `path`, write `data` and set `mode`
    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        let mut file = self.create(path)?;
        file.write_all(data)?;
        file.set_mode(mode)?;
        file.sync()?;
        file.close()
    }
}

impl FileHandle for fs::File {
    fn set_mode(&mut self, mode: u32) -> io::Result<()> {
        self.set_permissions(Permissions::from_mode(mode))
    }

    fn chown(&mut self, uid: u32, gid: u32) -> io::Result<()> {
        fchown(&*self, Some(uid), Some(gid))
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        nix::unistd::close((*self).into_raw_fd()).map_err(io::Error::from)
    }
}

/// The host's real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFilesystem;

impl Filesystem for HostFilesystem {
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        DirBuilder::new().recursive(true).mode(mode).create(path)
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn FileHandle>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Box::new(file))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        symlink(target, link)
    }

    fn read_link(&self, path: &Path) -> io::Result<std::path::PathBuf> {
        fs::read_link(path)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if fs::symlink_metadata(path)?.is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn lstat(&self, path: &Path) -> io::Result<Metadata> {
        fs::symlink_metadata(path)
    }

    fn is_empty_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(fs::read_dir(path)?.next().is_none())
    }
}
