//! The parent→children permission table and the ancestor closure over it.

use std::collections::{BTreeMap, BTreeSet};

use wicket_storage::PermissionName;

use crate::RightsError;

/// Safety cap on closure passes. The shipped forest settles in three; a walk
/// still adding ancestors after this many passes means the table is malformed
/// and is reported as a configuration error rather than looping.
const MAX_CLOSURE_PASSES: usize = 32;

/// Immutable permission hierarchy: each entry maps a parent permission to the
/// children that imply it.
///
/// The table is fixed domain configuration, not user data. It is defined once
/// here and injected wherever closure is needed, so call sites cannot drift
/// apart.
#[derive(Clone, Debug, Default)]
pub struct RightsHierarchy {
    children: BTreeMap<PermissionName, Vec<PermissionName>>,
}

impl RightsHierarchy {
    /// Build a hierarchy from `(parent, children)` edges.
    pub fn from_edges<I, P, C>(edges: I) -> Self
    where
        I: IntoIterator<Item = (P, Vec<C>)>,
        P: Into<PermissionName>,
        C: Into<PermissionName>,
    {
        let children = edges
            .into_iter()
            .map(|(parent, kids)| {
                (
                    parent.into(),
                    kids.into_iter().map(Into::into).collect::<Vec<_>>(),
                )
            })
            .collect();
        Self { children }
    }

    /// The standard table: four menu roots, fourteen pages, four operations
    /// per page.
    pub fn standard() -> Self {
        Self::from_edges([
            (
                "can_access_data",
                vec!["can_access_data_entry", "can_access_data_edit", "can_access_enquiry"],
            ),
            (
                "can_access_data_entry",
                vec![
                    "can_view_data_entry",
                    "can_create_data_entry",
                    "can_update_data_entry",
                    "can_delete_data_entry",
                ],
            ),
            (
                "can_access_data_edit",
                vec![
                    "can_view_data_edit",
                    "can_create_data_edit",
                    "can_update_data_edit",
                    "can_delete_data_edit",
                ],
            ),
            (
                "can_access_enquiry",
                vec![
                    "can_view_enquiry",
                    "can_create_enquiry",
                    "can_update_enquiry",
                    "can_delete_enquiry",
                ],
            ),
            (
                "can_access_setup",
                vec![
                    "can_access_department",
                    "can_access_sub_department",
                    "can_access_division_branch",
                    "can_access_branch_dep_link",
                    "can_access_logo_upload",
                    "can_access_bulk_upload",
                ],
            ),
            (
                "can_access_department",
                vec![
                    "can_view_department",
                    "can_create_department",
                    "can_update_department",
                    "can_delete_department",
                ],
            ),
            (
                "can_access_sub_department",
                vec![
                    "can_view_sub_department",
                    "can_create_sub_department",
                    "can_update_sub_department",
                    "can_delete_sub_department",
                ],
            ),
            (
                "can_access_division_branch",
                vec![
                    "can_view_division_branch",
                    "can_create_division_branch",
                    "can_update_division_branch",
                    "can_delete_division_branch",
                ],
            ),
            (
                "can_access_branch_dep_link",
                vec![
                    "can_view_branch_dep_link",
                    "can_create_branch_dep_link",
                    "can_update_branch_dep_link",
                    "can_delete_branch_dep_link",
                ],
            ),
            (
                "can_access_logo_upload",
                vec![
                    "can_view_logo_upload",
                    "can_create_logo_upload",
                    "can_update_logo_upload",
                    "can_delete_logo_upload",
                ],
            ),
            (
                "can_access_bulk_upload",
                vec![
                    "can_view_bulk_upload",
                    "can_create_bulk_upload",
                    "can_update_bulk_upload",
                    "can_delete_bulk_upload",
                ],
            ),
            (
                "can_access_user",
                vec!["can_access_users", "can_access_user_rights", "can_access_password_change"],
            ),
            (
                "can_access_users",
                vec!["can_view_users", "can_create_users", "can_update_users", "can_delete_users"],
            ),
            (
                "can_access_user_rights",
                vec![
                    "can_view_user_rights",
                    "can_create_user_rights",
                    "can_update_user_rights",
                    "can_delete_user_rights",
                ],
            ),
            (
                "can_access_password_change",
                vec![
                    "can_view_password_change",
                    "can_create_password_change",
                    "can_update_password_change",
                    "can_delete_password_change",
                ],
            ),
            (
                "can_access_report",
                vec!["can_access_log_report", "can_access_register"],
            ),
            (
                "can_access_log_report",
                vec![
                    "can_view_log_report",
                    "can_create_log_report",
                    "can_update_log_report",
                    "can_delete_log_report",
                ],
            ),
            (
                "can_access_register",
                vec![
                    "can_view_register",
                    "can_create_register",
                    "can_update_register",
                    "can_delete_register",
                ],
            ),
        ])
    }

    /// Children of a parent, if the parent has an entry.
    pub fn children_of(&self, parent: &PermissionName) -> Option<&[PermissionName]> {
        self.children.get(parent).map(|v| v.as_slice())
    }

    /// Parents whose child lists contain `name`.
    pub fn parents_of<'a>(&'a self, name: &'a PermissionName) -> Vec<&'a PermissionName> {
        self.children
            .iter()
            .filter(|(_, kids)| kids.contains(name))
            .map(|(parent, _)| parent)
            .collect()
    }

    /// All `(parent, children)` edges, in name order.
    pub fn edges(&self) -> impl Iterator<Item = (&PermissionName, &[PermissionName])> {
        self.children.iter().map(|(p, kids)| (p, kids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Ancestor closure of `requested`: the requested set plus every parent
    /// implied, transitively, by any member.
    ///
    /// Walks the table to a fixed point rather than a fixed number of levels,
    /// so the result is closed whatever the configured depth. Never removes a
    /// name: revoking a child does not retract its parent here; full resets
    /// happen at apply time.
    pub fn reconcile(
        &self,
        requested: &BTreeSet<PermissionName>,
    ) -> Result<BTreeSet<PermissionName>, RightsError> {
        let mut closed = requested.clone();
        for _ in 0..MAX_CLOSURE_PASSES {
            let added: Vec<PermissionName> = self
                .children
                .iter()
                .filter(|(parent, kids)| {
                    !closed.contains(*parent) && kids.iter().any(|c| closed.contains(c))
                })
                .map(|(parent, _)| parent.clone())
                .collect();
            if added.is_empty() {
                return Ok(closed);
            }
            closed.extend(added);
        }
        Err(RightsError::HierarchyDepthExceeded {
            passes: MAX_CLOSURE_PASSES,
        })
    }
}
