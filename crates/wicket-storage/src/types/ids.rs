//! Strongly-typed identifiers & names (avoid mixing strings/UUIDs arbitrarily).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Principal (user account) identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub Uuid);

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Group identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable string identifier for a grantable capability (e.g. `can_view_users`).
///
/// Opaque to the storage layer; the rights engine gives names meaning through
/// its hierarchy table and catalog.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(pub String);

impl PermissionName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PermissionName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PermissionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_id_display() {
        let uuid = Uuid::new_v4();
        let principal_id = PrincipalId(uuid);
        assert_eq!(principal_id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_typed_ids_equality() {
        let uuid = Uuid::new_v4();
        assert_eq!(PrincipalId(uuid), PrincipalId(uuid));
        assert_ne!(PrincipalId(uuid), PrincipalId(Uuid::new_v4()));
    }

    #[test]
    fn test_typed_ids_hash() {
        use std::collections::HashSet;

        let uuid = Uuid::new_v4();
        let mut set = HashSet::new();
        set.insert(GroupId(uuid));
        assert!(set.contains(&GroupId(uuid)));
    }

    #[test]
    fn test_permission_name_from_str() {
        let name = PermissionName::from("can_view_users");
        assert_eq!(name.as_str(), "can_view_users");
        assert_eq!(name.to_string(), "can_view_users");
    }

    #[test]
    fn test_permission_name_ordering() {
        use std::collections::BTreeSet;

        let mut set = BTreeSet::new();
        set.insert(PermissionName::from("b"));
        set.insert(PermissionName::from("a"));
        let ordered: Vec<_> = set.iter().map(|n| n.as_str()).collect();
        assert_eq!(ordered, vec!["a", "b"]);
    }

    #[test]
    fn test_permission_name_serde_transparent() {
        let name = PermissionName::from("can_access_data");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"can_access_data\"");
        let back: PermissionName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
