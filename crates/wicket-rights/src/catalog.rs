//! The permission catalog: every recognized codename with its label.
//!
//! Read-only reference data for the engine. Only names present in the
//! catalog are mirrored into a principal's grant relation; anything else is
//! silently skipped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wicket_storage::PermissionName;

/// Registry of grantable permission codenames and their human-readable
/// labels (e.g. `can_view_users` → "Can view users").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCatalog {
    entries: BTreeMap<PermissionName, String>,
}

impl PermissionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full standard catalog: one entry per recognized flag.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.insert("can_access_data", "Can access data management");
        catalog.insert("can_access_setup", "Can access setup");
        catalog.insert("can_access_user", "Can access user management");
        catalog.insert("can_access_report", "Can access reports");

        const PAGES: &[(&str, &str)] = &[
            ("data_entry", "data entry"),
            ("data_edit", "data edit"),
            ("enquiry", "enquiry"),
            ("department", "department"),
            ("sub_department", "sub department"),
            ("division_branch", "division branch"),
            ("branch_dep_link", "branch department link"),
            ("logo_upload", "logo upload"),
            ("bulk_upload", "bulk upload"),
            ("users", "users"),
            ("user_rights", "user rights"),
            ("password_change", "password change"),
            ("log_report", "log report"),
            ("register", "register"),
        ];
        for (page, label) in PAGES {
            catalog.insert(format!("can_access_{page}"), format!("Can access {label}"));
            for op in ["view", "create", "update", "delete"] {
                catalog.insert(format!("can_{op}_{page}"), format!("Can {op} {label}"));
            }
        }
        catalog
    }

    pub fn insert(&mut self, codename: impl Into<PermissionName>, label: impl Into<String>) {
        self.entries.insert(codename.into(), label.into());
    }

    /// Remove an entry. Returns whether it was present.
    pub fn remove(&mut self, name: &PermissionName) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn contains(&self, name: &PermissionName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn label(&self, name: &PermissionName) -> Option<&str> {
        self.entries.get(name).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PermissionName, &str)> {
        self.entries.iter().map(|(name, label)| (name, label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RightsHierarchy;
    use wicket_storage::RECOGNIZED_FLAGS;

    #[test]
    fn standard_catalog_matches_recognized_flags() {
        let catalog = PermissionCatalog::standard();
        assert_eq!(catalog.len(), RECOGNIZED_FLAGS.len());
        for name in RECOGNIZED_FLAGS {
            assert!(
                catalog.contains(&PermissionName::from(*name)),
                "missing catalog entry: {name}"
            );
        }
    }

    #[test]
    fn standard_catalog_covers_every_hierarchy_name() {
        let catalog = PermissionCatalog::standard();
        for (parent, kids) in RightsHierarchy::standard().edges() {
            assert!(catalog.contains(parent), "missing parent: {parent}");
            for child in kids {
                assert!(catalog.contains(child), "missing child: {child}");
            }
        }
    }

    #[test]
    fn labels_read_naturally() {
        let catalog = PermissionCatalog::standard();
        assert_eq!(
            catalog.label(&PermissionName::from("can_view_users")),
            Some("Can view users")
        );
        assert_eq!(
            catalog.label(&PermissionName::from("can_access_branch_dep_link")),
            Some("Can access branch department link")
        );
        assert_eq!(
            catalog.label(&PermissionName::from("can_access_data")),
            Some("Can access data management")
        );
        assert_eq!(catalog.label(&PermissionName::from("can_fly")), None);
    }

    #[test]
    fn insert_and_remove() {
        let mut catalog = PermissionCatalog::new();
        assert!(catalog.is_empty());
        catalog.insert("can_export_ledger", "Can export ledger");
        assert!(catalog.contains(&PermissionName::from("can_export_ledger")));
        assert!(catalog.remove(&PermissionName::from("can_export_ledger")));
        assert!(!catalog.remove(&PermissionName::from("can_export_ledger")));
    }

    #[test]
    fn serde_round_trip() {
        let catalog = PermissionCatalog::standard();
        let json = serde_json::to_string(&catalog).unwrap();
        let back: PermissionCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }
}
