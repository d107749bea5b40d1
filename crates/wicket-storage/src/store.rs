//! The Store trait that backends implement.

use crate::types::*;
use crate::StoreError;

/// The storage trait the rights engine depends on.
///
/// Permission state on a principal is only ever rewritten through
/// [`apply_principal_rights`](Store::apply_principal_rights), which backends
/// must make atomic: either both the flag document and the grant relation are
/// replaced, or neither is.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Principals ─────────────────────────────────────

    /// Create a new principal (returns generated ID). Starts active with no
    /// permissions.
    async fn create_principal(
        &self,
        params: &CreatePrincipalParams,
    ) -> Result<PrincipalId, StoreError>;

    /// Get principal by ID.
    async fn get_principal(&self, principal_id: &PrincipalId) -> Result<Principal, StoreError>;

    /// Get principal by email.
    async fn get_principal_by_email(&self, email: &str) -> Result<Principal, StoreError>;

    /// List all principals.
    async fn list_principals(&self) -> Result<Vec<Principal>, StoreError>;

    /// Rename a principal.
    async fn rename_principal(
        &self,
        principal_id: &PrincipalId,
        new_name: &str,
    ) -> Result<(), StoreError>;

    /// Change a principal's account status.
    async fn set_principal_status(
        &self,
        principal_id: &PrincipalId,
        status: PrincipalStatus,
    ) -> Result<(), StoreError>;

    /// Delete a principal (and all its grants and group memberships).
    async fn delete_principal(&self, principal_id: &PrincipalId) -> Result<(), StoreError>;

    // ───────────────────────────────────── Rights ─────────────────────────────────────────

    /// Replace a principal's permission state: the flag document and the
    /// grant relation, in one atomic write. A failure partway through must
    /// leave the prior state untouched.
    async fn apply_principal_rights(
        &self,
        principal_id: &PrincipalId,
        flags: &PermissionFlags,
        grants: &[PermissionName],
    ) -> Result<(), StoreError>;

    /// List a principal's direct named grants.
    async fn list_principal_grants(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<PermissionName>, StoreError>;

    // ───────────────────────────────────── Groups ─────────────────────────────────────────

    /// Create a new group (returns generated ID).
    async fn create_group(&self, params: &CreateGroupParams) -> Result<GroupId, StoreError>;

    /// Get group by ID.
    async fn get_group(&self, group_id: &GroupId) -> Result<Group, StoreError>;

    /// Get group by name.
    async fn get_group_by_name(&self, name: &str) -> Result<Group, StoreError>;

    /// List all groups.
    async fn list_groups(&self) -> Result<Vec<Group>, StoreError>;

    /// Update group name and description.
    async fn update_group(
        &self,
        group_id: &GroupId,
        name: &str,
        description: Option<String>,
    ) -> Result<(), StoreError>;

    /// Delete a group (and all its memberships and grants).
    async fn delete_group(&self, group_id: &GroupId) -> Result<(), StoreError>;

    /// Add a principal to a group.
    async fn add_group_member(
        &self,
        group_id: &GroupId,
        principal_id: &PrincipalId,
    ) -> Result<(), StoreError>;

    /// Remove a principal from a group.
    async fn remove_group_member(
        &self,
        group_id: &GroupId,
        principal_id: &PrincipalId,
    ) -> Result<(), StoreError>;

    /// List all members of a group.
    async fn list_group_members(&self, group_id: &GroupId) -> Result<Vec<GroupMember>, StoreError>;

    /// List all groups a principal belongs to.
    async fn list_principal_groups(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<Group>, StoreError>;

    /// Add a named grant to a group.
    async fn add_group_grant(
        &self,
        group_id: &GroupId,
        permission: &PermissionName,
    ) -> Result<(), StoreError>;

    /// Remove a named grant from a group.
    async fn remove_group_grant(
        &self,
        group_id: &GroupId,
        permission: &PermissionName,
    ) -> Result<(), StoreError>;

    /// List a group's named grants.
    async fn list_group_grants(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<PermissionName>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    // Tiny compile-time smoke test for trait object usage.
    struct NoopStore;

    #[async_trait::async_trait]
    impl Store for NoopStore {
        async fn create_principal(
            &self,
            _params: &CreatePrincipalParams,
        ) -> Result<PrincipalId, StoreError> {
            Ok(PrincipalId(Uuid::new_v4()))
        }

        async fn get_principal(
            &self,
            _principal_id: &PrincipalId,
        ) -> Result<Principal, StoreError> {
            Err(StoreError::NotFound)
        }

        async fn get_principal_by_email(&self, _email: &str) -> Result<Principal, StoreError> {
            Err(StoreError::NotFound)
        }

        async fn list_principals(&self) -> Result<Vec<Principal>, StoreError> {
            Ok(vec![])
        }

        async fn rename_principal(
            &self,
            _principal_id: &PrincipalId,
            _new_name: &str,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn set_principal_status(
            &self,
            _principal_id: &PrincipalId,
            _status: PrincipalStatus,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete_principal(&self, _principal_id: &PrincipalId) -> Result<(), StoreError> {
            Ok(())
        }

        async fn apply_principal_rights(
            &self,
            _principal_id: &PrincipalId,
            _flags: &PermissionFlags,
            _grants: &[PermissionName],
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list_principal_grants(
            &self,
            _principal_id: &PrincipalId,
        ) -> Result<Vec<PermissionName>, StoreError> {
            Ok(vec![])
        }

        async fn create_group(&self, _params: &CreateGroupParams) -> Result<GroupId, StoreError> {
            Ok(GroupId(Uuid::new_v4()))
        }

        async fn get_group(&self, _group_id: &GroupId) -> Result<Group, StoreError> {
            Err(StoreError::NotFound)
        }

        async fn get_group_by_name(&self, _name: &str) -> Result<Group, StoreError> {
            Err(StoreError::NotFound)
        }

        async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
            Ok(vec![])
        }

        async fn update_group(
            &self,
            _group_id: &GroupId,
            _name: &str,
            _description: Option<String>,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete_group(&self, _group_id: &GroupId) -> Result<(), StoreError> {
            Ok(())
        }

        async fn add_group_member(
            &self,
            _group_id: &GroupId,
            _principal_id: &PrincipalId,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn remove_group_member(
            &self,
            _group_id: &GroupId,
            _principal_id: &PrincipalId,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list_group_members(
            &self,
            _group_id: &GroupId,
        ) -> Result<Vec<GroupMember>, StoreError> {
            Ok(vec![])
        }

        async fn list_principal_groups(
            &self,
            _principal_id: &PrincipalId,
        ) -> Result<Vec<Group>, StoreError> {
            Ok(vec![])
        }

        async fn add_group_grant(
            &self,
            _group_id: &GroupId,
            _permission: &PermissionName,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn remove_group_grant(
            &self,
            _group_id: &GroupId,
            _permission: &PermissionName,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list_group_grants(
            &self,
            _group_id: &GroupId,
        ) -> Result<Vec<PermissionName>, StoreError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn trait_smoke() {
        let s = NoopStore;

        let principal_id = s
            .create_principal(&CreatePrincipalParams {
                email: "test@example.com".to_string(),
                name: "Test".to_string(),
            })
            .await
            .unwrap();

        let group_id = s
            .create_group(&CreateGroupParams {
                name: "operators".to_string(),
                description: None,
            })
            .await
            .unwrap();

        // We can call rights and group methods without compile errors.
        s.apply_principal_rights(&principal_id, &PermissionFlags::default(), &[])
            .await
            .unwrap();
        let _ = s.list_principal_grants(&principal_id).await.unwrap();
        let _ = s.list_group_grants(&group_id).await.unwrap();
        let _ = s.list_principal_groups(&principal_id).await.unwrap();

        // Record types are usable as plain data.
        let _p = Principal {
            id: principal_id,
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
            status: PrincipalStatus::Active,
            flags: PermissionFlags::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
    }
}
