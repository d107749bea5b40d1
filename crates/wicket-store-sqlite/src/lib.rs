//! SQLite storage backend.
//!
//! Implements [`wicket_storage::Store`] and [`wicket_audit::AuditLog`] over a
//! single `sqlx` pool. The rights rewrite runs inside one transaction so a
//! failure partway through never leaves the flag document and the grant
//! relation disagreeing.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;
use wicket_audit::{
    AuditAction, AuditEvent, AuditLog, AuditLogError, AuditLogFilter, AuditLogId, AuditResult,
};
use wicket_storage::{
    CreateGroupParams, CreatePrincipalParams, Group, GroupId, GroupMember, PermissionFlags,
    PermissionName, Principal, PrincipalId, PrincipalStatus, Store, StoreError,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn backend_err<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn unique_err<E: std::fmt::Display>(e: E) -> StoreError {
    let s = e.to_string();
    if s.contains("UNIQUE") {
        StoreError::AlreadyExists
    } else {
        StoreError::Backend(s)
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(backend_err)
}

fn parse_timestamp(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StoreError::Backend(format!("invalid timestamp: {secs}")))
}

type PrincipalRow = (String, String, String, String, String, i64, i64);

fn principal_from_row(row: PrincipalRow) -> Result<Principal, StoreError> {
    let (id, email, name, status, flags, created_at, updated_at) = row;
    Ok(Principal {
        id: PrincipalId(parse_uuid(&id)?),
        email,
        name,
        status: status.parse::<PrincipalStatus>().map_err(backend_err)?,
        flags: serde_json::from_str::<PermissionFlags>(&flags).map_err(backend_err)?,
        created_at: parse_timestamp(created_at)?,
        updated_at: parse_timestamp(updated_at)?,
    })
}

type GroupRow = (String, String, Option<String>, i64, i64);

fn group_from_row(row: GroupRow) -> Result<Group, StoreError> {
    let (id, name, description, created_at, updated_at) = row;
    Ok(Group {
        id: GroupId(parse_uuid(&id)?),
        name,
        description,
        created_at: parse_timestamp(created_at)?,
        updated_at: parse_timestamp(updated_at)?,
    })
}

const PRINCIPAL_COLS: &str = "id,email,name,status,flags,created_at,updated_at";
const GROUP_COLS: &str = "id,name,description,created_at,updated_at";

#[async_trait::async_trait]
impl Store for SqliteStore {
    // ───────────────────────────── Principals ─────────────────────────────

    async fn create_principal(
        &self,
        params: &CreatePrincipalParams,
    ) -> Result<PrincipalId, StoreError> {
        let id = Uuid::now_v7();
        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO principals(id,email,name,status,flags,created_at,updated_at)
             VALUES(?,?,?,?,?,?,?)",
        )
        .bind(id.to_string())
        .bind(&params.email)
        .bind(&params.name)
        .bind(PrincipalStatus::Active.as_str())
        .bind("{}")
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(unique_err)?;
        Ok(PrincipalId(id))
    }

    async fn get_principal(&self, principal_id: &PrincipalId) -> Result<Principal, StoreError> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {PRINCIPAL_COLS} FROM principals WHERE id=?"
        ))
        .bind(principal_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)?;

        row.map(principal_from_row).ok_or(StoreError::NotFound)?
    }

    async fn get_principal_by_email(&self, email: &str) -> Result<Principal, StoreError> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {PRINCIPAL_COLS} FROM principals WHERE email=?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)?;

        row.map(principal_from_row).ok_or(StoreError::NotFound)?
    }

    async fn list_principals(&self) -> Result<Vec<Principal>, StoreError> {
        let rows = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {PRINCIPAL_COLS} FROM principals ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend_err)?;

        rows.into_iter().map(principal_from_row).collect()
    }

    async fn rename_principal(
        &self,
        principal_id: &PrincipalId,
        new_name: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE principals SET name=?, updated_at=? WHERE id=?")
            .bind(new_name)
            .bind(Utc::now().timestamp())
            .bind(principal_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_principal_status(
        &self,
        principal_id: &PrincipalId,
        status: PrincipalStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE principals SET status=?, updated_at=? WHERE id=?")
            .bind(status.as_str())
            .bind(Utc::now().timestamp())
            .bind(principal_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_principal(&self, principal_id: &PrincipalId) -> Result<(), StoreError> {
        let id = principal_id.0.to_string();
        let mut tx = self.pool.begin().await.map_err(backend_err)?;
        let result = sqlx::query("DELETE FROM principals WHERE id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        sqlx::query("DELETE FROM principal_grants WHERE principal_id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;
        sqlx::query("DELETE FROM group_members WHERE principal_id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;
        tx.commit().await.map_err(backend_err)?;
        Ok(())
    }

    // ───────────────────────────── Rights ─────────────────────────────────

    async fn apply_principal_rights(
        &self,
        principal_id: &PrincipalId,
        flags: &PermissionFlags,
        grants: &[PermissionName],
    ) -> Result<(), StoreError> {
        let id = principal_id.0.to_string();
        let flags_json = serde_json::to_string(flags).map_err(backend_err)?;
        let now = Utc::now().timestamp();

        // One transaction for the whole rewrite: the flag document and the
        // grant relation must never be observable half-replaced.
        let mut tx = self.pool.begin().await.map_err(backend_err)?;
        let result = sqlx::query("UPDATE principals SET flags=?, updated_at=? WHERE id=?")
            .bind(&flags_json)
            .bind(now)
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        sqlx::query("DELETE FROM principal_grants WHERE principal_id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;
        for grant in grants {
            sqlx::query(
                "INSERT INTO principal_grants(principal_id,permission,created_at) VALUES(?,?,?)",
            )
            .bind(&id)
            .bind(grant.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(unique_err)?;
        }
        tx.commit().await.map_err(backend_err)?;
        Ok(())
    }

    async fn list_principal_grants(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<PermissionName>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT permission FROM principal_grants WHERE principal_id=? ORDER BY permission",
        )
        .bind(principal_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend_err)?;
        Ok(rows.into_iter().map(|(p,)| PermissionName(p)).collect())
    }

    // ───────────────────────────── Groups ─────────────────────────────────

    async fn create_group(&self, params: &CreateGroupParams) -> Result<GroupId, StoreError> {
        let id = Uuid::now_v7();
        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO principal_groups(id,name,description,created_at,updated_at)
             VALUES(?,?,?,?,?)",
        )
        .bind(id.to_string())
        .bind(&params.name)
        .bind(&params.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(unique_err)?;
        Ok(GroupId(id))
    }

    async fn get_group(&self, group_id: &GroupId) -> Result<Group, StoreError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLS} FROM principal_groups WHERE id=?"
        ))
        .bind(group_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)?;

        row.map(group_from_row).ok_or(StoreError::NotFound)?
    }

    async fn get_group_by_name(&self, name: &str) -> Result<Group, StoreError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLS} FROM principal_groups WHERE name=?"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)?;

        row.map(group_from_row).ok_or(StoreError::NotFound)?
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLS} FROM principal_groups ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend_err)?;

        rows.into_iter().map(group_from_row).collect()
    }

    async fn update_group(
        &self,
        group_id: &GroupId,
        name: &str,
        description: Option<String>,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE principal_groups SET name=?, description=?, updated_at=? WHERE id=?")
                .bind(name)
                .bind(description)
                .bind(Utc::now().timestamp())
                .bind(group_id.0.to_string())
                .execute(&self.pool)
                .await
                .map_err(unique_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_group(&self, group_id: &GroupId) -> Result<(), StoreError> {
        let id = group_id.0.to_string();
        let mut tx = self.pool.begin().await.map_err(backend_err)?;
        let result = sqlx::query("DELETE FROM principal_groups WHERE id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        sqlx::query("DELETE FROM group_members WHERE group_id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;
        sqlx::query("DELETE FROM group_grants WHERE group_id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend_err)?;
        tx.commit().await.map_err(backend_err)?;
        Ok(())
    }

    async fn add_group_member(
        &self,
        group_id: &GroupId,
        principal_id: &PrincipalId,
    ) -> Result<(), StoreError> {
        // Membership rows have no FK enforcement; check both ends exist.
        self.get_group(group_id).await?;
        self.get_principal(principal_id).await?;
        sqlx::query("INSERT INTO group_members(group_id,principal_id,created_at) VALUES(?,?,?)")
            .bind(group_id.0.to_string())
            .bind(principal_id.0.to_string())
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(unique_err)?;
        Ok(())
    }

    async fn remove_group_member(
        &self,
        group_id: &GroupId,
        principal_id: &PrincipalId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM group_members WHERE group_id=? AND principal_id=?")
            .bind(group_id.0.to_string())
            .bind(principal_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_group_members(&self, group_id: &GroupId) -> Result<Vec<GroupMember>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT group_id,principal_id,created_at FROM group_members
             WHERE group_id=? ORDER BY created_at",
        )
        .bind(group_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend_err)?;

        rows.into_iter()
            .map(|(gid, pid, created_at)| {
                Ok(GroupMember {
                    group_id: GroupId(parse_uuid(&gid)?),
                    principal_id: PrincipalId(parse_uuid(&pid)?),
                    created_at: parse_timestamp(created_at)?,
                })
            })
            .collect()
    }

    async fn list_principal_groups(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<Group>, StoreError> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT g.id,g.name,g.description,g.created_at,g.updated_at
             FROM principal_groups g
             JOIN group_members m ON m.group_id=g.id
             WHERE m.principal_id=? ORDER BY g.name",
        )
        .bind(principal_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend_err)?;

        rows.into_iter().map(group_from_row).collect()
    }

    async fn add_group_grant(
        &self,
        group_id: &GroupId,
        permission: &PermissionName,
    ) -> Result<(), StoreError> {
        self.get_group(group_id).await?;
        sqlx::query("INSERT INTO group_grants(group_id,permission,created_at) VALUES(?,?,?)")
            .bind(group_id.0.to_string())
            .bind(permission.as_str())
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(unique_err)?;
        Ok(())
    }

    async fn remove_group_grant(
        &self,
        group_id: &GroupId,
        permission: &PermissionName,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM group_grants WHERE group_id=? AND permission=?")
            .bind(group_id.0.to_string())
            .bind(permission.as_str())
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_group_grants(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<PermissionName>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT permission FROM group_grants WHERE group_id=? ORDER BY permission",
        )
        .bind(group_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend_err)?;
        Ok(rows.into_iter().map(|(p,)| PermissionName(p)).collect())
    }
}

// ───────────────────────────── Audit log ──────────────────────────────────

type AuditRow = (
    String,
    i64,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn audit_backend_err<E: std::fmt::Display>(e: E) -> AuditLogError {
    AuditLogError::Database(e.to_string())
}

fn audit_event_from_row(row: AuditRow) -> Result<AuditEvent, AuditLogError> {
    let (id, timestamp, principal_id, action, resource_type, resource_id, result, reason, details, client_ip, user_agent) =
        row;
    Ok(AuditEvent {
        id: id.parse::<AuditLogId>().map_err(audit_backend_err)?,
        timestamp: DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| AuditLogError::Database(format!("invalid timestamp: {timestamp}")))?,
        principal_id: Uuid::try_parse(&principal_id).map_err(audit_backend_err)?,
        action: action.parse::<AuditAction>().map_err(AuditLogError::Database)?,
        resource_type,
        resource_id,
        result: result.parse::<AuditResult>().map_err(AuditLogError::Database)?,
        reason,
        details: details
            .map(|d| serde_json::from_str(&d))
            .transpose()
            .map_err(audit_backend_err)?,
        client_ip,
        user_agent,
    })
}

fn push_audit_filters<'a>(
    qb: &mut sqlx::QueryBuilder<'a, sqlx::Sqlite>,
    filter: &'a AuditLogFilter,
) {
    if let Some(principal_id) = &filter.principal_id {
        qb.push(" AND principal_id=");
        qb.push_bind(principal_id.0.to_string());
    }
    if let Some(action) = &filter.action {
        qb.push(" AND action=");
        qb.push_bind(action.to_string());
    }
    if let Some(result) = &filter.result {
        qb.push(" AND result=");
        qb.push_bind(result.to_string());
    }
    if let Some(from) = &filter.from {
        qb.push(" AND timestamp>=");
        qb.push_bind(from.timestamp());
    }
    if let Some(to) = &filter.to {
        qb.push(" AND timestamp<");
        qb.push_bind(to.timestamp());
    }
}

#[async_trait::async_trait]
impl AuditLog for SqliteStore {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditLogError> {
        let details = event
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(audit_backend_err)?;
        sqlx::query(
            "INSERT INTO audit_log(id,timestamp,principal_id,action,resource_type,resource_id,result,reason,details,client_ip,user_agent)
             VALUES(?,?,?,?,?,?,?,?,?,?,?)",
        )
        .bind(event.id.to_string())
        .bind(event.timestamp.timestamp())
        .bind(event.principal_id.to_string())
        .bind(event.action.to_string())
        .bind(&event.resource_type)
        .bind(&event.resource_id)
        .bind(event.result.to_string())
        .bind(&event.reason)
        .bind(details)
        .bind(&event.client_ip)
        .bind(&event.user_agent)
        .execute(&self.pool)
        .await
        .map_err(audit_backend_err)?;
        Ok(())
    }

    async fn query(&self, filter: AuditLogFilter) -> Result<Vec<AuditEvent>, AuditLogError> {
        let mut qb = sqlx::QueryBuilder::new(
            "SELECT id,timestamp,principal_id,action,resource_type,resource_id,result,reason,details,client_ip,user_agent
             FROM audit_log WHERE 1=1",
        );
        push_audit_filters(&mut qb, &filter);
        qb.push(" ORDER BY timestamp DESC, id DESC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
            if let Some(offset) = filter.offset {
                qb.push(" OFFSET ");
                qb.push_bind(offset as i64);
            }
        }

        let rows: Vec<AuditRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(audit_backend_err)?;
        rows.into_iter().map(audit_event_from_row).collect()
    }

    async fn get(&self, id: AuditLogId) -> Result<AuditEvent, AuditLogError> {
        let row: Option<AuditRow> = sqlx::query_as(
            "SELECT id,timestamp,principal_id,action,resource_type,resource_id,result,reason,details,client_ip,user_agent
             FROM audit_log WHERE id=?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(audit_backend_err)?;

        row.map(audit_event_from_row)
            .ok_or(AuditLogError::NotFound(id))?
    }

    async fn count(&self, filter: AuditLogFilter) -> Result<u64, AuditLogError> {
        let mut qb = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM audit_log WHERE 1=1");
        push_audit_filters(&mut qb, &filter);
        let (count,): (i64,) = qb
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(audit_backend_err)?;
        Ok(count as u64)
    }
}
