//! External collaborators of the update pipeline
//!
//! The daemon only talks to the cluster, the OS image tooling and logind
//! through these traits. The default implementations shell out through
//! [`crate::runner`].

mod error;
mod events;
mod kubectl;
mod rpm_ostree;
mod systemctl;

pub use error::ClientError;
pub use events::LogRecorder;
pub use kubectl::Kubectl;
pub use rpm_ostree::RpmOstree;
pub use systemctl::Systemctl;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cluster node, as far as the daemon cares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub metadata: NodeMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMeta {
    pub name: String,
    pub uid: String,
}

impl Node {
    pub fn named(name: &str) -> Self {
        Self {
            metadata: NodeMeta {
                name: name.to_string(),
                uid: String::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// The object an event is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub kind: &'static str,
    pub name: String,
    pub uid: String,
}

impl ObjectRef {
    pub fn node(node: &Node) -> Self {
        Self {
            kind: "Node",
            name: node.metadata.name.clone(),
            uid: node.metadata.uid.clone(),
        }
    }

    pub fn machine_config(name: &str) -> Self {
        Self {
            kind: "MachineConfig",
            name: name.to_string(),
            uid: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Normal,
    Warning,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Warning => "Warning",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node lookups and event recording
pub trait NodeApi: Send + Sync {
    fn get_node(&self, name: &str) -> Result<Node, ClientError>;

    /// Fire and forget: recording failures are logged by the implementation
    fn record_event(&self, object: &ObjectRef, event_type: EventType, reason: &str, message: &str);

    /// Release held connections before the node goes down
    fn close(&self) {}
}

/// Drain policy handed to the drain client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainOptions {
    pub delete_local_data: bool,
    pub force: bool,
    pub grace_period_seconds: u32,
    pub ignore_daemonsets: bool,
}

pub trait Drainer: Send + Sync {
    fn drain(&self, nodes: &[Node], opts: &DrainOptions) -> Result<(), ClientError>;
}

/// Atomic OS image transitions
pub trait OsUpdater: Send + Sync {
    fn apply_image(&self, image: &str) -> Result<(), ClientError>;
}

/// The login manager; a successful reboot request does not come back
pub trait LoginClient: Send + Sync {
    fn reboot(&self, interactive: bool) -> Result<(), ClientError>;
}
