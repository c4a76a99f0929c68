use serde::{Deserialize, Serialize};

/// Stable identifier for an authenticated user.
///
/// Issued by the identity provider at account creation and immutable
/// afterwards. The engine treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account role. Assigned at account creation and changed only by an
/// explicit administrative action, never by the billing flow.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    /// Unrecognized value from the identity collaborator. Evaluates to
    /// Denied everywhere; never a crash.
    #[serde(other)]
    Unknown,
}

impl Role {
    /// The subscription family this role shops in. `Admin` accounts carry
    /// teacher-side plans; `Unknown` has no family and no entitlements.
    pub fn family(&self) -> Option<RoleFamily> {
        match self {
            Role::Student => Some(RoleFamily::Student),
            Role::Teacher | Role::Admin => Some(RoleFamily::Teacher),
            Role::Unknown => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Teacher => write!(f, "teacher"),
            Role::Admin => write!(f, "admin"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

/// Plan family a tier belongs to. `Personal` exists only as a tier family;
/// no role maps to it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum RoleFamily {
    Student,
    Teacher,
    Personal,
}
