//! Decide whether a config transition can be applied in place
//!
//! Anything the node cannot change live (storage layout, network units,
//! groups, user accounts beyond their SSH keys, append-only files) forces a
//! reprovision instead. Lists are compared index by index.

use ignition::{MachineConfig, PasswdUser};

use super::{NodeContext, RunMode};

/// Outcome of [`classify`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub reconcilable: bool,
    /// Indices into the user list whose only change is their SSH keys
    pub ssh_changed_users: Vec<usize>,
    pub reason: String,
}

impl Verdict {
    pub fn reconcilable(ssh_changed_users: Vec<usize>) -> Self {
        let reason = if ssh_changed_users.is_empty() {
            "config can be applied in place".to_string()
        } else {
            format!(
                "config can be applied in place; SSH keys changed for {} user(s)",
                ssh_changed_users.len()
            )
        };
        Self {
            reconcilable: true,
            ssh_changed_users,
            reason,
        }
    }

    pub fn irreconcilable(reason: impl Into<String>) -> Self {
        Self {
            reconcilable: false,
            ssh_changed_users: Vec::new(),
            reason: reason.into(),
        }
    }
}

/// Classify the transition from `old` to `new`
pub fn classify(ctx: &NodeContext, old: &MachineConfig, new: &MachineConfig) -> Verdict {
    let verdict = check(ctx, old, new);
    if verdict.reconcilable {
        log::debug!("{}", verdict.reason);
    } else {
        log::warn!("Cannot reconcile {}: {}", new.display_name(), verdict.reason);
    }
    verdict
}

fn check(ctx: &NodeContext, old: &MachineConfig, new: &MachineConfig) -> Verdict {
    // Nothing was applied yet on a first boot without a cluster.
    if old.kind.is_empty() && ctx.run_mode == RunMode::Once {
        return Verdict::reconcilable(Vec::new());
    }

    let old = &old.spec.config;
    let new = &new.spec.config;

    if old.ignition.version != new.ignition.version {
        return Verdict::irreconcilable(format!(
            "ignition version changed from {:?} to {:?}",
            old.ignition.version, new.ignition.version
        ));
    }

    if old.networkd != new.networkd {
        return Verdict::irreconcilable("networkd section changed");
    }

    if old.passwd.groups != new.passwd.groups {
        return Verdict::irreconcilable("passwd groups changed");
    }

    let ssh_changed_users = if old.passwd.users == new.passwd.users {
        Vec::new()
    } else {
        match ssh_only_changes(&old.passwd.users, &new.passwd.users) {
            Ok(indices) => indices,
            Err(reason) => return Verdict::irreconcilable(reason),
        }
    };

    if old.storage.disks != new.storage.disks {
        return Verdict::irreconcilable("storage disks changed");
    }
    if old.storage.filesystems != new.storage.filesystems {
        return Verdict::irreconcilable("storage filesystems changed");
    }
    if old.storage.raid != new.storage.raid {
        return Verdict::irreconcilable("storage raid changed");
    }

    if let Some(file) = new.storage.files.iter().find(|f| f.append) {
        return Verdict::irreconcilable(format!("file {} requests append", file.path));
    }

    // Any systemd change can be applied live.
    Verdict::reconcilable(ssh_changed_users)
}

/// Indices of users whose only change is their SSH key list
///
/// The first index with any other change rejects the whole list.
pub fn ssh_only_changes(old: &[PasswdUser], new: &[PasswdUser]) -> Result<Vec<usize>, String> {
    if old.len() != new.len() {
        return Err(format!(
            "passwd users added or removed ({} -> {})",
            old.len(),
            new.len()
        ));
    }

    let mut changed = Vec::new();
    for (i, (old_user, new_user)) in old.iter().zip(new).enumerate() {
        if old_user.ssh_authorized_keys == new_user.ssh_authorized_keys {
            if old_user != new_user {
                return Err(format!("user {} changed beyond SSH keys", new_user.name));
            }
            continue;
        }

        let candidate = PasswdUser {
            ssh_authorized_keys: new_user.ssh_authorized_keys.clone(),
            ..old_user.clone()
        };
        if candidate != *new_user {
            return Err(format!(
                "user {} changed beyond SSH keys",
                new_user.name
            ));
        }
        changed.push(i);
    }
    Ok(changed)
}
