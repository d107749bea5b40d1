//! Group types for principal grouping.
//!
//! A group carries its own named-grant relation; a principal's effective
//! permissions union in the grants of every group it belongs to.

use chrono::{DateTime, Utc};

use super::{GroupId, PrincipalId};

/// Group record
#[derive(Clone, Debug)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group membership record
#[derive(Clone, Debug)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub principal_id: PrincipalId,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a group
#[derive(Clone, Debug)]
pub struct CreateGroupParams {
    pub name: String,
    pub description: Option<String>,
}
