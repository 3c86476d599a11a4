//! Tenant lifecycle: where a principal belongs for a given status, and which
//! super-admin actions may move a school between statuses.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::routes::Route;
use crate::types::{LifecycleStatus, Role};

/// Canonical landing route for an admin in the given lifecycle status
pub fn admin_landing(status: LifecycleStatus) -> Route {
    match status {
        LifecycleStatus::ProfileIncomplete => Route::SchoolProfile,
        LifecycleStatus::ProfileSubmitted => Route::PendingApproval,
        LifecycleStatus::Active => Route::Dashboard,
        LifecycleStatus::Suspended => Route::Suspended,
        LifecycleStatus::Inactive => Route::Deactivated,
        LifecycleStatus::Rejected => Route::Rejected,
    }
}

/// The single place that decides where a principal belongs right now.
///
/// Super-admins are not tenant-scoped and ignore the status. An admin whose
/// status is unknown lands on the dashboard. Any other role (or no role) has
/// no lifecycle landing and is sent to login.
pub fn landing_route(role: Option<Role>, status: Option<LifecycleStatus>) -> Route {
    match role {
        Some(Role::SuperAdmin) => Route::SuperAdminHome,
        Some(Role::Admin) => status.map(admin_landing).unwrap_or(Route::Dashboard),
        Some(Role::Teacher) | Some(Role::Student) | None => Route::Login,
    }
}

/// Action a super-admin can take on a school
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchoolAction {
    Approve,
    Reject,
    Suspend,
    Deactivate,
}

impl SchoolAction {
    /// Path segment under `/api/superadmin/schools/{id}/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            SchoolAction::Approve => "approve",
            SchoolAction::Reject => "reject",
            SchoolAction::Suspend => "suspend",
            SchoolAction::Deactivate => "deactivate",
        }
    }

    /// Status the school holds once the server accepts the action
    pub fn target_status(&self) -> LifecycleStatus {
        match self {
            SchoolAction::Approve => LifecycleStatus::Active,
            SchoolAction::Reject => LifecycleStatus::Rejected,
            SchoolAction::Suspend => LifecycleStatus::Suspended,
            SchoolAction::Deactivate => LifecycleStatus::Inactive,
        }
    }

    /// Whether the action carries a free-text reason in its request body
    pub fn takes_reason(&self) -> bool {
        matches!(self, SchoolAction::Reject | SchoolAction::Suspend)
    }

    /// Check the transition against [`allowed_actions`]
    pub fn apply(&self, from: LifecycleStatus) -> Result<LifecycleStatus, TransitionError> {
        if allowed_actions(from).contains(self) {
            Ok(self.target_status())
        } else {
            Err(TransitionError { action: *self, from })
        }
    }
}

impl fmt::Display for SchoolAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} a school that is {from}")]
pub struct TransitionError {
    pub action: SchoolAction,
    pub from: LifecycleStatus,
}

/// Actions offered for a school in the given status.
///
/// `Approve` on a suspended or deactivated school re-activates it. A
/// suspended school may also be deactivated directly.
pub fn allowed_actions(status: LifecycleStatus) -> &'static [SchoolAction] {
    use SchoolAction::*;

    match status {
        LifecycleStatus::ProfileIncomplete | LifecycleStatus::ProfileSubmitted => &[Approve, Reject],
        LifecycleStatus::Active => &[Suspend, Deactivate],
        LifecycleStatus::Suspended => &[Approve, Deactivate],
        LifecycleStatus::Inactive => &[Approve],
        LifecycleStatus::Rejected => &[],
    }
}
