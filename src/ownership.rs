//! Resolve file owners against the local identity database

use ignition::{NodeGroup, NodeUser};
use nix::unistd::{Group, User};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("unknown group: {0}")]
    UnknownGroup(String),

    #[error("failed to look up {name}: {source}")]
    Lookup {
        name: String,
        #[source]
        source: nix::Error,
    },
}

/// Name-to-id lookups against the node's passwd and group databases
pub trait IdentityLookup: Send + Sync {
    fn lookup_user(&self, name: &str) -> Result<u32, OwnershipError>;
    fn lookup_group(&self, name: &str) -> Result<u32, OwnershipError>;
}

/// Lookups through the system's NSS (getpwnam/getgrnam)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl IdentityLookup for SystemIdentity {
    fn lookup_user(&self, name: &str) -> Result<u32, OwnershipError> {
        User::from_name(name)
            .map_err(|source| OwnershipError::Lookup {
                name: name.to_string(),
                source,
            })?
            .map(|user| user.uid.as_raw())
            .ok_or_else(|| OwnershipError::UnknownUser(name.to_string()))
    }

    fn lookup_group(&self, name: &str) -> Result<u32, OwnershipError> {
        Group::from_name(name)
            .map_err(|source| OwnershipError::Lookup {
                name: name.to_string(),
                source,
            })?
            .map(|group| group.gid.as_raw())
            .ok_or_else(|| OwnershipError::UnknownGroup(name.to_string()))
    }
}

/// Resolve a file's requested owner and group to numeric ids
///
/// Unset fields default to root (0). A numeric id is used as-is and wins
/// over a name.
pub fn resolve(
    lookup: &dyn IdentityLookup,
    user: Option<&NodeUser>,
    group: Option<&NodeGroup>,
) -> Result<(u32, u32), OwnershipError> {
    let uid = match user {
        Some(NodeUser { id: Some(id), .. }) => *id,
        Some(NodeUser {
            name: Some(name), ..
        }) if !name.is_empty() => lookup.lookup_user(name)?,
        _ => 0,
    };
    let gid = match group {
        Some(NodeGroup { id: Some(id), .. }) => *id,
        Some(NodeGroup {
            name: Some(name), ..
        }) if !name.is_empty() => lookup.lookup_group(name)?,
        _ => 0,
    };
    Ok((uid, gid))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory identity database
    #[derive(Debug, Default)]
    pub(crate) struct FakeIdentity {
        pub users: HashMap<String, u32>,
        pub groups: HashMap<String, u32>,
    }

    impl FakeIdentity {
        pub(crate) fn with(users: &[(&str, u32)], groups: &[(&str, u32)]) -> Self {
            Self {
                users: users.iter().map(|(n, id)| ((*n).into(), *id)).collect(),
                groups: groups.iter().map(|(n, id)| ((*n).into(), *id)).collect(),
            }
        }
    }

    impl IdentityLookup for FakeIdentity {
        fn lookup_user(&self, name: &str) -> Result<u32, OwnershipError> {
            self.users
                .get(name)
                .copied()
                .ok_or_else(|| OwnershipError::UnknownUser(name.into()))
        }

        fn lookup_group(&self, name: &str) -> Result<u32, OwnershipError> {
            self.groups
                .get(name)
                .copied()
                .ok_or_else(|| OwnershipError::UnknownGroup(name.into()))
        }
    }

    fn user_named(name: &str) -> NodeUser {
        NodeUser {
            id: None,
            name: Some(name.into()),
        }
    }

    #[test]
    fn test_defaults_to_root() {
        let ids = FakeIdentity::default();
        assert_eq!(resolve(&ids, None, None).unwrap(), (0, 0));
        assert_eq!(
            resolve(&ids, Some(&NodeUser::default()), Some(&NodeGroup::default())).unwrap(),
            (0, 0)
        );
    }

    #[test]
    fn test_numeric_id_wins_over_name() {
        let ids = FakeIdentity::with(&[("core", 1000)], &[]);
        let user = NodeUser {
            id: Some(42),
            name: Some("core".into()),
        };
        let group = NodeGroup {
            id: Some(7),
            name: None,
        };
        assert_eq!(resolve(&ids, Some(&user), Some(&group)).unwrap(), (42, 7));
    }

    #[test]
    fn test_names_are_looked_up() {
        let ids = FakeIdentity::with(&[("core", 1000)], &[("wheel", 10)]);
        let group = NodeGroup {
            id: None,
            name: Some("wheel".into()),
        };
        assert_eq!(
            resolve(&ids, Some(&user_named("core")), Some(&group)).unwrap(),
            (1000, 10)
        );
    }

    #[test]
    fn test_unknown_name_is_named_in_error() {
        let ids = FakeIdentity::default();
        let err = resolve(&ids, Some(&user_named("nobody-here")), None).unwrap_err();
        assert!(matches!(err, OwnershipError::UnknownUser(ref n) if n == "nobody-here"));
        assert!(err.to_string().contains("nobody-here"));

        let group = NodeGroup {
            id: None,
            name: Some("ghosts".into()),
        };
        let err = resolve(&ids, None, Some(&group)).unwrap_err();
        assert!(matches!(err, OwnershipError::UnknownGroup(_)));
    }

    #[test]
    fn test_system_identity_resolves_root() {
        assert_eq!(SystemIdentity.lookup_user("root").unwrap(), 0);
        assert_eq!(SystemIdentity.lookup_group("root").unwrap(), 0);
    }
}
