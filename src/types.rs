//! Shared domain types used across the routing engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role assigned to a principal by the server at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    SuperAdmin,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::SuperAdmin, Role::Teacher, Role::Student];

    /// Wire representation, as persisted under `userRole`
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        }
    }

    /// Parse a persisted role string. Unrecognized values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == value)
    }

    /// Roles whose landing page depends on the tenant lifecycle status
    pub fn has_lifecycle(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of the tenant (school) an admin belongs to.
///
/// Transitions are server-authoritative: the client only ever records a
/// status the API reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    ProfileIncomplete,
    ProfileSubmitted,
    Active,
    Suspended,
    Inactive,
    Rejected,
}

impl LifecycleStatus {
    pub const ALL: [LifecycleStatus; 6] = [
        LifecycleStatus::ProfileIncomplete,
        LifecycleStatus::ProfileSubmitted,
        LifecycleStatus::Active,
        LifecycleStatus::Suspended,
        LifecycleStatus::Inactive,
        LifecycleStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::ProfileIncomplete => "PROFILE_INCOMPLETE",
            LifecycleStatus::ProfileSubmitted => "PROFILE_SUBMITTED",
            LifecycleStatus::Active => "ACTIVE",
            LifecycleStatus::Suspended => "SUSPENDED",
            LifecycleStatus::Inactive => "INACTIVE",
            LifecycleStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logged-in actor as seen by the client.
///
/// Role and status are copies persisted at login and are not re-validated
/// against the server. This is client-side UX routing only; the API must
/// independently authorize every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub token: Option<String>,
    pub role: Option<Role>,
    pub tenant_id: Option<String>,
    pub lifecycle_status: Option<LifecycleStatus>,
}

impl Principal {
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
