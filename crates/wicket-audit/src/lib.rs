//! Audit logging abstraction for wicket.
//!
//! This crate defines the `AuditLog` trait for persisting audit events
//! and the types representing auditable actions in the system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use wicket_storage::PrincipalId;

/// Unique identifier for an audit log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditLogId(pub Uuid);

impl AuditLogId {
    /// Generate a new audit log ID using UUID v7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AuditLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AuditLogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Categories of auditable actions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Principal administration
    PrincipalCreate,
    PrincipalRename,
    PrincipalStatusChange,
    PrincipalDelete,

    // Rights operations
    RightsApply,
    RightsReset,

    // Group operations
    GroupCreate,
    GroupUpdate,
    GroupDelete,
    GroupMemberAdd,
    GroupMemberRemove,
    GroupGrantAdd,
    GroupGrantRemove,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditAction::PrincipalCreate => "principal.create",
            AuditAction::PrincipalRename => "principal.rename",
            AuditAction::PrincipalStatusChange => "principal.status_change",
            AuditAction::PrincipalDelete => "principal.delete",
            AuditAction::RightsApply => "rights.apply",
            AuditAction::RightsReset => "rights.reset",
            AuditAction::GroupCreate => "group.create",
            AuditAction::GroupUpdate => "group.update",
            AuditAction::GroupDelete => "group.delete",
            AuditAction::GroupMemberAdd => "group.member_add",
            AuditAction::GroupMemberRemove => "group.member_remove",
            AuditAction::GroupGrantAdd => "group.grant_add",
            AuditAction::GroupGrantRemove => "group.grant_remove",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "principal.create" => Ok(AuditAction::PrincipalCreate),
            "principal.rename" => Ok(AuditAction::PrincipalRename),
            "principal.status_change" => Ok(AuditAction::PrincipalStatusChange),
            "principal.delete" => Ok(AuditAction::PrincipalDelete),
            "rights.apply" => Ok(AuditAction::RightsApply),
            "rights.reset" => Ok(AuditAction::RightsReset),
            "group.create" => Ok(AuditAction::GroupCreate),
            "group.update" => Ok(AuditAction::GroupUpdate),
            "group.delete" => Ok(AuditAction::GroupDelete),
            "group.member_add" => Ok(AuditAction::GroupMemberAdd),
            "group.member_remove" => Ok(AuditAction::GroupMemberRemove),
            "group.grant_add" => Ok(AuditAction::GroupGrantAdd),
            "group.grant_remove" => Ok(AuditAction::GroupGrantRemove),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

/// Result of an audited operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    Success,
    PermissionDenied,
    NotFound,
    InvalidRequest,
    Error,
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditResult::Success => "success",
            AuditResult::PermissionDenied => "permission_denied",
            AuditResult::NotFound => "not_found",
            AuditResult::InvalidRequest => "invalid_request",
            AuditResult::Error => "error",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for AuditResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AuditResult::Success),
            "permission_denied" => Ok(AuditResult::PermissionDenied),
            "not_found" => Ok(AuditResult::NotFound),
            "invalid_request" => Ok(AuditResult::InvalidRequest),
            "error" => Ok(AuditResult::Error),
            _ => Err(format!("Unknown audit result: {}", s)),
        }
    }
}

/// An audit log entry representing a single auditable action.
///
/// Uses a raw UUID for the actor for serialization compatibility. Use the
/// builder to construct events from typed IDs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this audit entry
    pub id: AuditLogId,
    /// When the action occurred
    pub timestamp: DateTime<Utc>,
    /// Principal that performed the action (UUID)
    pub principal_id: Uuid,
    /// The action that was performed
    pub action: AuditAction,
    /// Type of resource affected (e.g., "principal", "group")
    pub resource_type: String,
    /// Identifier of the affected resource
    pub resource_id: String,
    /// Result of the operation
    pub result: AuditResult,
    /// Error message or additional context
    pub reason: Option<String>,
    /// Additional details as JSON (e.g., the granted permission list)
    pub details: Option<serde_json::Value>,
    /// Client IP address (if available)
    pub client_ip: Option<String>,
    /// Client user agent (if available)
    pub user_agent: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event builder
    pub fn builder(principal_id: &PrincipalId, action: AuditAction) -> AuditEventBuilder {
        AuditEventBuilder::new(principal_id, action)
    }

    /// Get the actor's principal ID as a typed ID
    pub fn get_principal_id(&self) -> PrincipalId {
        PrincipalId(self.principal_id)
    }
}

/// Builder for constructing audit events
pub struct AuditEventBuilder {
    principal_id: Uuid,
    action: AuditAction,
    resource_type: String,
    resource_id: String,
    result: AuditResult,
    reason: Option<String>,
    details: Option<serde_json::Value>,
    client_ip: Option<String>,
    user_agent: Option<String>,
}

impl AuditEventBuilder {
    pub fn new(principal_id: &PrincipalId, action: AuditAction) -> Self {
        Self {
            principal_id: principal_id.0,
            action,
            resource_type: String::new(),
            resource_id: String::new(),
            result: AuditResult::Success,
            reason: None,
            details: None,
            client_ip: None,
            user_agent: None,
        }
    }

    pub fn resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = resource_type.into();
        self.resource_id = resource_id.into();
        self
    }

    pub fn result(mut self, result: AuditResult) -> Self {
        self.result = result;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = Some(client_ip.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> AuditEvent {
        AuditEvent {
            id: AuditLogId::new(),
            timestamp: Utc::now(),
            principal_id: self.principal_id,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            result: self.result,
            reason: self.reason,
            details: self.details,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
        }
    }
}

/// Filter for querying audit logs
#[derive(Clone, Debug, Default)]
pub struct AuditLogFilter {
    /// Filter by acting principal
    pub principal_id: Option<PrincipalId>,
    /// Filter by action
    pub action: Option<AuditAction>,
    /// Filter by result
    pub result: Option<AuditResult>,
    /// Filter by start timestamp (inclusive)
    pub from: Option<DateTime<Utc>>,
    /// Filter by end timestamp (exclusive)
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of results to return
    pub limit: Option<u32>,
    /// Number of results to skip (for pagination)
    pub offset: Option<u32>,
}

impl AuditLogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal_id(mut self, principal_id: PrincipalId) -> Self {
        self.principal_id = Some(principal_id);
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn result(mut self, result: AuditResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Error type for audit log operations
#[derive(Debug, Error)]
pub enum AuditLogError {
    #[error("database error: {0}")]
    Database(String),

    #[error("audit log not found: {0}")]
    NotFound(AuditLogId),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

/// Trait for audit log persistence.
///
/// Implementations store audit events and provide query capabilities
/// for compliance and security monitoring.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record an audit event.
    ///
    /// This should be called after each auditable operation completes.
    /// Failures to record audit events should be logged but should not
    /// fail the main operation.
    async fn record(&self, event: AuditEvent) -> Result<(), AuditLogError>;

    /// Query audit logs with optional filters.
    ///
    /// Returns events matching the filter criteria, ordered by timestamp descending.
    async fn query(&self, filter: AuditLogFilter) -> Result<Vec<AuditEvent>, AuditLogError>;

    /// Get a specific audit log entry by ID.
    async fn get(&self, id: AuditLogId) -> Result<AuditEvent, AuditLogError>;

    /// Count audit logs matching the filter criteria.
    async fn count(&self, filter: AuditLogFilter) -> Result<u64, AuditLogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_action_display() {
        assert_eq!(AuditAction::RightsApply.to_string(), "rights.apply");
        assert_eq!(AuditAction::PrincipalCreate.to_string(), "principal.create");
        assert_eq!(
            AuditAction::GroupMemberAdd.to_string(),
            "group.member_add"
        );
    }

    #[test]
    fn test_audit_action_parse() {
        assert_eq!(
            "rights.apply".parse::<AuditAction>().unwrap(),
            AuditAction::RightsApply
        );
        assert_eq!(
            "group.grant_remove".parse::<AuditAction>().unwrap(),
            AuditAction::GroupGrantRemove
        );
        assert!("invalid.action".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_audit_action_all_variants_roundtrip() {
        let actions = vec![
            AuditAction::PrincipalCreate,
            AuditAction::PrincipalRename,
            AuditAction::PrincipalStatusChange,
            AuditAction::PrincipalDelete,
            AuditAction::RightsApply,
            AuditAction::RightsReset,
            AuditAction::GroupCreate,
            AuditAction::GroupUpdate,
            AuditAction::GroupDelete,
            AuditAction::GroupMemberAdd,
            AuditAction::GroupMemberRemove,
            AuditAction::GroupGrantAdd,
            AuditAction::GroupGrantRemove,
        ];

        for action in actions {
            let display = action.to_string();
            let parsed: AuditAction = display.parse().unwrap();
            assert_eq!(action, parsed, "Roundtrip failed for {:?}", action);
        }
    }

    #[test]
    fn test_audit_result_display() {
        assert_eq!(AuditResult::Success.to_string(), "success");
        assert_eq!(
            AuditResult::PermissionDenied.to_string(),
            "permission_denied"
        );
    }

    #[test]
    fn test_audit_result_all_variants_roundtrip() {
        let results = vec![
            AuditResult::Success,
            AuditResult::PermissionDenied,
            AuditResult::NotFound,
            AuditResult::InvalidRequest,
            AuditResult::Error,
        ];

        for result in results {
            let display = result.to_string();
            let parsed: AuditResult = display.parse().unwrap();
            assert_eq!(result, parsed, "Roundtrip failed for {:?}", result);
        }
    }

    #[test]
    fn test_audit_event_builder() {
        let principal_id = PrincipalId(Uuid::new_v4());
        let event = AuditEvent::builder(&principal_id, AuditAction::RightsApply)
            .resource("principal", "some-target")
            .result(AuditResult::Success)
            .build();

        assert_eq!(event.principal_id, principal_id.0);
        assert_eq!(event.action, AuditAction::RightsApply);
        assert_eq!(event.resource_type, "principal");
        assert_eq!(event.resource_id, "some-target");
        assert_eq!(event.result, AuditResult::Success);
        assert_eq!(event.get_principal_id(), principal_id);
    }

    #[test]
    fn test_audit_event_builder_with_all_fields() {
        let principal_id = PrincipalId(Uuid::new_v4());
        let event = AuditEvent::builder(&principal_id, AuditAction::GroupGrantAdd)
            .resource("group", "auditors")
            .result(AuditResult::Success)
            .reason("requested via rights form")
            .details(serde_json::json!({"permission": "can_view_register"}))
            .client_ip("192.168.1.1")
            .user_agent("wicket-admin/1.0")
            .build();

        assert_eq!(event.reason.as_deref(), Some("requested via rights form"));
        assert!(event.details.is_some());
        assert_eq!(event.client_ip.as_deref(), Some("192.168.1.1"));
        assert_eq!(event.user_agent.as_deref(), Some("wicket-admin/1.0"));
    }

    #[test]
    fn test_audit_event_serialization() {
        let principal_id = PrincipalId(Uuid::new_v4());
        let event = AuditEvent::builder(&principal_id, AuditAction::RightsReset)
            .resource("principal", "target")
            .build();

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: AuditEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event.principal_id, deserialized.principal_id);
        assert_eq!(event.action, deserialized.action);
    }

    #[test]
    fn test_audit_action_serde() {
        let action = AuditAction::RightsApply;
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, "\"rights_apply\"");

        let deserialized: AuditAction = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, action);
    }

    #[test]
    fn test_audit_log_filter_builder() {
        let principal_uuid = Uuid::new_v4();
        let from_time = Utc::now();
        let to_time = Utc::now();

        let filter = AuditLogFilter::new()
            .principal_id(PrincipalId(principal_uuid))
            .action(AuditAction::RightsApply)
            .result(AuditResult::Success)
            .from(from_time)
            .to(to_time)
            .limit(100)
            .offset(50);

        assert_eq!(filter.principal_id, Some(PrincipalId(principal_uuid)));
        assert_eq!(filter.action, Some(AuditAction::RightsApply));
        assert_eq!(filter.result, Some(AuditResult::Success));
        assert_eq!(filter.from, Some(from_time));
        assert_eq!(filter.to, Some(to_time));
        assert_eq!(filter.limit, Some(100));
        assert_eq!(filter.offset, Some(50));
    }

    #[test]
    fn test_audit_log_filter_default() {
        let filter = AuditLogFilter::default();
        assert!(filter.principal_id.is_none());
        assert!(filter.action.is_none());
        assert!(filter.result.is_none());
        assert!(filter.from.is_none());
        assert!(filter.to.is_none());
        assert!(filter.limit.is_none());
        assert!(filter.offset.is_none());
    }

    #[test]
    fn test_audit_log_id_generation() {
        let id1 = AuditLogId::new();
        let id2 = AuditLogId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_audit_log_id_is_v7() {
        let id = AuditLogId::new();
        assert_eq!(id.0.get_version_num(), 7);
    }

    #[test]
    fn test_audit_log_id_parse() {
        let uuid = Uuid::new_v4();
        let parsed: AuditLogId = uuid.to_string().parse().unwrap();
        assert_eq!(parsed.0, uuid);
        assert!("not-a-uuid".parse::<AuditLogId>().is_err());
    }

    #[test]
    fn test_audit_log_error_display() {
        let db_err = AuditLogError::Database("connection failed".to_string());
        assert!(db_err.to_string().contains("database error"));
        assert!(db_err.to_string().contains("connection failed"));

        let not_found_err = AuditLogError::NotFound(AuditLogId::new());
        assert!(not_found_err.to_string().contains("not found"));
    }

    #[test]
    fn test_audit_event_timestamp_is_recent() {
        let principal_id = PrincipalId(Uuid::new_v4());
        let before = Utc::now();
        let event = AuditEvent::builder(&principal_id, AuditAction::GroupCreate).build();
        let after = Utc::now();

        assert!(event.timestamp >= before);
        assert!(event.timestamp <= after);
    }
}
