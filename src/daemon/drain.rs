//! Drain the node and reboot it into the new config

use std::thread;

use super::{Daemon, Error, Result};
use crate::clients::{DrainOptions, EventType, ObjectRef};

/// Seconds pods get to terminate during a drain
pub const DRAIN_GRACE_PERIOD_SECS: u32 = 600;

/// The fixed policy every drain uses
pub fn drain_options() -> DrainOptions {
    DrainOptions {
        delete_local_data: true,
        force: true,
        grace_period_seconds: DRAIN_GRACE_PERIOD_SECS,
        ignore_daemonsets: true,
    }
}

impl Daemon {
    /// Evict workloads from the node
    pub(super) fn drain(&self, node_name: &str) -> Result<()> {
        let node = self
            .node_api
            .get_node(node_name)
            .map_err(|source| Error::NodeLookup {
                node: node_name.to_string(),
                source,
            })?;

        log::info!("Update prepared; draining the node");
        self.node_api.record_event(
            &ObjectRef::node(&node),
            EventType::Normal,
            "Drain",
            "Draining node to update config.",
        );

        self.drainer
            .drain(std::slice::from_ref(&node), &drain_options())
            .map_err(|source| Error::Drain {
                node: node_name.to_string(),
                source,
            })?;
        log::info!("Node successfully drained");
        Ok(())
    }

    /// Reboot the node
    ///
    /// Never returns `Ok`: a successful request ends the process with the
    /// machine, so coming back at all is an error.
    pub(super) fn reboot(&self, node_name: &str, rationale: &str) -> Error {
        let node = ObjectRef::node(&crate::clients::Node::named(node_name));
        self.node_api
            .record_event(&node, EventType::Normal, "Reboot", rationale);
        log::info!("Initiating reboot: {}", rationale);

        if let Err(e) = self.login.reboot(false) {
            log::error!("Failed to request reboot: {}", e);
            return Error::Reboot(e);
        }

        self.node_api.close();

        // Wait for the shutdown to take us down.
        thread::sleep(self.reboot_guard);
        Error::RebootUnreachable(self.reboot_guard)
    }
}
