//! Rights application and effective-permission reads.

use std::collections::BTreeSet;

use wicket_audit::{AuditAction, AuditEvent, AuditLog, AuditResult};
use wicket_storage::{
    PermissionFlags, PermissionName, PrincipalId, Store, StoreError,
};

use crate::{PermissionCatalog, RightsError, RightsHierarchy};

/// The permission state applied to a principal: the boolean attribute set and
/// the catalog-filtered grant set. The two always agree for recognized names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrincipalRights {
    pub flags: PermissionFlags,
    pub grants: BTreeSet<PermissionName>,
}

/// The permission hierarchy engine.
///
/// Owns the hierarchy table and the catalog; every grant mutation and every
/// effective-permission read goes through here so the closure invariant holds
/// for any principal a backend hands back.
#[derive(Clone, Debug)]
pub struct RightsEngine {
    hierarchy: RightsHierarchy,
    catalog: PermissionCatalog,
}

impl RightsEngine {
    pub fn new(hierarchy: RightsHierarchy, catalog: PermissionCatalog) -> Self {
        Self { hierarchy, catalog }
    }

    /// Engine over the standard table and catalog.
    pub fn standard() -> Self {
        Self::new(RightsHierarchy::standard(), PermissionCatalog::standard())
    }

    pub fn hierarchy(&self) -> &RightsHierarchy {
        &self.hierarchy
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Ancestor closure of a requested grant set. See
    /// [`RightsHierarchy::reconcile`].
    pub fn reconcile(
        &self,
        requested: &BTreeSet<PermissionName>,
    ) -> Result<BTreeSet<PermissionName>, RightsError> {
        self.hierarchy.reconcile(requested)
    }

    /// Replace a principal's permission state with the closure of
    /// `requested`.
    ///
    /// Flags are rebuilt from scratch (full reset, then exactly the
    /// recognized names in the closed set), and the grant relation is
    /// replaced with the closed names present in the catalog. Both land in
    /// one atomic store write, so readers never observe a half-applied
    /// state. Requesting the empty set revokes everything.
    pub async fn apply<S>(
        &self,
        store: &S,
        principal_id: &PrincipalId,
        requested: &BTreeSet<PermissionName>,
    ) -> Result<PrincipalRights, RightsError>
    where
        S: Store + ?Sized,
    {
        let closed = self.reconcile(requested)?;

        let mut flags = PermissionFlags::default();
        for name in &closed {
            // Unrecognized attribute names are skipped, not an error.
            flags.set(name.as_str(), true);
        }

        let grants: Vec<PermissionName> = closed
            .iter()
            .filter(|name| self.catalog.contains(name))
            .cloned()
            .collect();

        tracing::debug!(
            principal = %principal_id,
            requested = requested.len(),
            closed = closed.len(),
            grants = grants.len(),
            "applying principal rights"
        );

        store
            .apply_principal_rights(principal_id, &flags, &grants)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => RightsError::PrincipalNotFound(principal_id.clone()),
                other => RightsError::Store(other),
            })?;

        Ok(PrincipalRights {
            flags,
            grants: grants.into_iter().collect(),
        })
    }

    /// [`apply`](Self::apply), recording a `rights.apply` / `rights.reset`
    /// audit event attributed to `actor`. Audit failures are logged and never
    /// fail the grant itself.
    pub async fn apply_audited<S, A>(
        &self,
        store: &S,
        audit: &A,
        actor: &PrincipalId,
        principal_id: &PrincipalId,
        requested: &BTreeSet<PermissionName>,
    ) -> Result<PrincipalRights, RightsError>
    where
        S: Store + ?Sized,
        A: AuditLog + ?Sized,
    {
        let action = if requested.is_empty() {
            AuditAction::RightsReset
        } else {
            AuditAction::RightsApply
        };

        let outcome = self.apply(store, principal_id, requested).await;

        let result = match &outcome {
            Ok(_) => AuditResult::Success,
            Err(RightsError::PrincipalNotFound(_)) => AuditResult::NotFound,
            Err(_) => AuditResult::Error,
        };
        let mut event = AuditEvent::builder(actor, action)
            .resource("principal", principal_id.to_string())
            .result(result);
        if let Ok(rights) = &outcome {
            event = event.details(serde_json::json!({ "granted": rights.grants }));
        }
        if let Err(e) = audit.record(event.build()).await {
            tracing::warn!(error = %e, "failed to record rights audit event");
        }

        outcome
    }

    /// Everything a principal can currently do: true flags, direct grants,
    /// and the grants of every group it belongs to.
    ///
    /// No closure is applied here. Writes already closed the stored state, so
    /// the read is a plain union over what the backend returns.
    pub async fn effective_permissions<S>(
        &self,
        store: &S,
        principal_id: &PrincipalId,
    ) -> Result<BTreeSet<PermissionName>, RightsError>
    where
        S: Store + ?Sized,
    {
        let principal = store.get_principal(principal_id).await.map_err(|e| match e {
            StoreError::NotFound => RightsError::PrincipalNotFound(principal_id.clone()),
            other => RightsError::Store(other),
        })?;

        let mut effective = principal.flags.granted();
        effective.extend(store.list_principal_grants(principal_id).await?);
        for group in store.list_principal_groups(principal_id).await? {
            effective.extend(store.list_group_grants(&group.id).await?);
        }
        Ok(effective)
    }
}
