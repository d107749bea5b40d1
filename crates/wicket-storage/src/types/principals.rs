//! Principal (user account) types.

use chrono::{DateTime, Utc};
use std::str::FromStr;

use super::{PermissionFlags, PrincipalId};

/// Account status for a principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrincipalStatus {
    Active,
    Inactive,
}

/// Error type for parsing PrincipalStatus from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePrincipalStatusError(pub String);

impl std::fmt::Display for ParsePrincipalStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid principal status: {}", self.0)
    }
}

impl std::error::Error for ParsePrincipalStatusError {}

impl FromStr for PrincipalStatus {
    type Err = ParsePrincipalStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PrincipalStatus::Active),
            "inactive" => Ok(PrincipalStatus::Inactive),
            _ => Err(ParsePrincipalStatusError(s.to_string())),
        }
    }
}

impl PrincipalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalStatus::Active => "active",
            PrincipalStatus::Inactive => "inactive",
        }
    }
}

/// Principal record.
///
/// Permission state is represented twice: the boolean attribute set in
/// `flags` and the named-grant relation kept by the backend. The two agree
/// after any mutation because the only write path is
/// [`Store::apply_principal_rights`](crate::Store::apply_principal_rights).
#[derive(Clone, Debug)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    pub name: String,
    pub status: PrincipalStatus,
    pub flags: PermissionFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a principal.
///
/// Principals start active with every permission flag false and no grants.
#[derive(Clone, Debug)]
pub struct CreatePrincipalParams {
    pub email: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(PrincipalStatus::Active.as_str(), "active");
        assert_eq!(PrincipalStatus::Inactive.as_str(), "inactive");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "active".parse::<PrincipalStatus>().unwrap(),
            PrincipalStatus::Active
        );
        assert_eq!(
            "inactive".parse::<PrincipalStatus>().unwrap(),
            PrincipalStatus::Inactive
        );
    }

    #[test]
    fn test_status_parse_invalid() {
        assert!("disabled".parse::<PrincipalStatus>().is_err());
        assert!("Active".parse::<PrincipalStatus>().is_err()); // Case sensitive
        assert!("".parse::<PrincipalStatus>().is_err());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [PrincipalStatus::Active, PrincipalStatus::Inactive] {
            let parsed: PrincipalStatus = status.as_str().parse().unwrap();
            assert_eq!(status, parsed);
        }
    }
}
