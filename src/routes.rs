use serde::Serialize;
use std::fmt;

use crate::types::Role;

/// Every destination the routing engine may redirect to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    SuperAdminHome,
    SchoolProfile,
    PendingApproval,
    Rejected,
    Suspended,
    Deactivated,
    TeacherDashboard(String),
    StudentDashboard(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::SuperAdminHome => "/superadmin/profile".to_string(),
            Route::SchoolProfile => "/school/profile".to_string(),
            Route::PendingApproval => "/school/pending-approval".to_string(),
            Route::Rejected => "/school/rejected".to_string(),
            Route::Suspended => "/account/suspended".to_string(),
            Route::Deactivated => "/account/deactivated".to_string(),
            Route::TeacherDashboard(id) => format!("/teacher/dashboard/{}", id),
            Route::StudentDashboard(id) => format!("/student/dashboard/{}", id),
        }
    }

    /// Inverse of [`Route::path`]. Paths outside the route table yield `None`.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = normalize(path);
        let fixed = match path {
            "/login" => Some(Route::Login),
            "/dashboard" => Some(Route::Dashboard),
            "/superadmin/profile" => Some(Route::SuperAdminHome),
            "/school/profile" => Some(Route::SchoolProfile),
            "/school/pending-approval" => Some(Route::PendingApproval),
            "/school/rejected" => Some(Route::Rejected),
            "/account/suspended" => Some(Route::Suspended),
            "/account/deactivated" => Some(Route::Deactivated),
            _ => None,
        };
        if fixed.is_some() {
            return fixed;
        }

        if let Some(id) = path.strip_prefix("/teacher/dashboard/") {
            return valid_segment(id).then(|| Route::TeacherDashboard(id.to_string()));
        }
        if let Some(id) = path.strip_prefix("/student/dashboard/") {
            return valid_segment(id).then(|| Route::StudentDashboard(id.to_string()));
        }
        None
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl Serialize for Route {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

/// Outcome of a routing decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "to", rename_all = "snake_case")]
pub enum Verdict {
    Render,
    Redirect(Route),
}

/// Access requirement of a page in the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reachable without a session (login, registration, account notices)
    Public,
    /// Requires a session whose role is one of the listed roles
    Roles(&'static [Role]),
}

struct PageRule {
    prefix: &'static str,
    access: Access,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const SUPER_ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];
const TEACHER_ONLY: &[Role] = &[Role::Teacher];
const STUDENT_ONLY: &[Role] = &[Role::Student];

// Longest-prefix rules are listed before shorter ones that would shadow them.
const PAGES: &[PageRule] = &[
    PageRule { prefix: "/login", access: Access::Public },
    PageRule { prefix: "/register", access: Access::Public },
    PageRule { prefix: "/account/suspended", access: Access::Public },
    PageRule { prefix: "/account/deactivated", access: Access::Public },
    PageRule { prefix: "/school/rejected", access: Access::Public },
    PageRule { prefix: "/school/pending-approval", access: Access::Public },
    PageRule { prefix: "/school/profile", access: Access::Roles(ADMIN_ONLY) },
    PageRule { prefix: "/dashboard", access: Access::Roles(ADMIN_ONLY) },
    PageRule { prefix: "/admin", access: Access::Roles(ADMIN_ONLY) },
    PageRule { prefix: "/superadmin", access: Access::Roles(SUPER_ADMIN_ONLY) },
    PageRule { prefix: "/teacher", access: Access::Roles(TEACHER_ONLY) },
    PageRule { prefix: "/student", access: Access::Roles(STUDENT_ONLY) },
];

/// Look up the access requirement for a page path.
///
/// Matching is by path segment, so `/admin` covers `/admin/teachers` but not
/// `/administrators`. Unknown paths return `None` (the not-found page).
pub fn page_access(path: &str) -> Option<Access> {
    let path = normalize(path);
    PAGES
        .iter()
        .find(|rule| {
            path == rule.prefix
                || path
                    .strip_prefix(rule.prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
        .map(|rule| rule.access)
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('/')
}
