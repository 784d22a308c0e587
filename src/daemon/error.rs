//! Error types for the update pipeline.
//!
//! Errors are categorized so the caller can decide between marking the node
//! degraded, retrying the whole cycle later, or giving up on the process.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::clients::ClientError;
use crate::ownership::OwnershipError;

/// Categories of update failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The transition cannot be applied in place
    Irreconcilable,
    /// Local I/O, decoding or identity failure while applying
    Transient,
    /// A drain or OS update call failed
    External,
    /// The reboot request failed or never took effect
    Fatal,
}

impl ErrorCategory {
    /// Whether running the whole cycle again later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient | Self::External)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Irreconcilable => "Config change cannot be applied in place",
            Self::Transient => "Failed to apply config to the node",
            Self::External => "External operation failed",
            Self::Fatal => "Node failed to reboot",
        }
    }

    /// Process exit status for this category.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Irreconcilable => 2,
            Self::Transient | Self::External => 1,
            Self::Fatal => 255,
        }
    }
}

/// Errors that can occur while updating a node.
#[derive(Debug, Error)]
pub enum Error {
    /// The classifier rejected the transition
    #[error("machine config cannot be reconciled: {reason}")]
    Irreconcilable { reason: String },

    /// A filesystem operation failed
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Inline file contents could not be decoded
    #[error("failed to decode contents of {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ignition::Error,
    },

    /// A file's owner or group could not be resolved
    #[error("failed to resolve ownership of {}: {source}", path.display())]
    Ownership {
        path: PathBuf,
        #[source]
        source: OwnershipError,
    },

    /// A user was scheduled for a key update but its keys did not change
    #[error("SSH keys for user {user} already match")]
    SshKeysUnchanged { user: String },

    #[error("failed to get node {node}: {source}")]
    NodeLookup {
        node: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to drain node {node}: {source}")]
    Drain {
        node: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to update OS to {image}: {source}")]
    OsUpdate {
        image: String,
        #[source]
        source: ClientError,
    },

    #[error("reboot request failed: {0}")]
    Reboot(#[source] ClientError),

    /// The reboot was requested but the process kept running
    #[error("reboot failed to take effect after {0:?}; this should be unreachable")]
    RebootUnreachable(Duration),
}

impl Error {
    /// Get the error category for retry and exit-code decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Irreconcilable { .. } => ErrorCategory::Irreconcilable,
            Self::Io { .. }
            | Self::Decode { .. }
            | Self::Ownership { .. }
            | Self::SshKeysUnchanged { .. } => ErrorCategory::Transient,
            Self::NodeLookup { .. } | Self::Drain { .. } | Self::OsUpdate { .. } => {
                ErrorCategory::External
            }
            Self::Reboot(_) | Self::RebootUnreachable(_) => ErrorCategory::Fatal,
        }
    }

    /// Whether the process must stop after reporting this error.
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Fatal
    }

    /// Adapter for `map_err` on filesystem calls.
    pub(crate) fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let irreconcilable = Error::Irreconcilable {
            reason: "ignition version mismatch".into(),
        };
        assert_eq!(irreconcilable.category(), ErrorCategory::Irreconcilable);
        assert!(!irreconcilable.category().is_retryable());
        assert_eq!(irreconcilable.category().exit_code(), 2);

        let io = Error::io("write", Path::new("/etc/motd"))(io::Error::other("disk full"));
        assert_eq!(io.category(), ErrorCategory::Transient);
        assert!(io.category().is_retryable());
        assert_eq!(io.to_string(), "failed to write /etc/motd: disk full");

        let drain = Error::Drain {
            node: "worker-0".into(),
            source: ClientError::NotFound("node worker-0".into()),
        };
        assert_eq!(drain.category(), ErrorCategory::External);
        assert!(drain.category().is_retryable());

        let lost = Error::RebootUnreachable(Duration::from_secs(1));
        assert!(lost.is_fatal());
        assert_eq!(lost.category().exit_code(), 255);
        assert!(Error::Reboot(ClientError::NotFound("logind".into())).is_fatal());
    }
}
