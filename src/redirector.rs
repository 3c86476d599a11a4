//! Mount-time navigation for the authenticated shell.
//!
//! Reads the persisted session only (no network) and issues at most one
//! history-replacing redirect.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::lifecycle::landing_route;
use crate::routes::Route;
use crate::session::{SessionSnapshot, SessionStore};
use crate::types::{LifecycleStatus, Role};

/// Destination for an admin whose profile is submitted but not yet approved.
///
/// The status table names the pending-approval notice; the shell lands on
/// the dashboard unless configured otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmittedLanding {
    #[default]
    Dashboard,
    PendingApproval,
}

impl FromStr for SubmittedLanding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(SubmittedLanding::Dashboard),
            "pending-approval" | "pending_approval" => Ok(SubmittedLanding::PendingApproval),
            other => Err(format!("unknown submitted-profile landing '{}'", other)),
        }
    }
}

impl fmt::Display for SubmittedLanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmittedLanding::Dashboard => f.write_str("dashboard"),
            SubmittedLanding::PendingApproval => f.write_str("pending-approval"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    pub submitted_landing: SubmittedLanding,
}

/// History-replacing navigation
pub trait Navigator {
    fn replace(&mut self, route: &Route);
}

/// Minimal navigation history; `replace` overwrites the current entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<Route>,
    replacements: usize,
}

impl History {
    pub fn starting_at(route: Route) -> Self {
        Self {
            entries: vec![route],
            replacements: 0,
        }
    }

    pub fn current(&self) -> Option<&Route> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl Navigator for History {
    fn replace(&mut self, route: &Route) {
        match self.entries.last_mut() {
            Some(current) => *current = route.clone(),
            None => self.entries.push(route.clone()),
        }
        self.replacements += 1;
    }
}

/// Where the shell must send this session, if anywhere.
///
/// Total over every combination of token, role and status; fields that do
/// not apply to the matched role are ignored.
pub fn redirect_target(snapshot: &SessionSnapshot, policy: &RoutingPolicy) -> Option<Route> {
    if !snapshot.has_token() {
        return Some(Route::Login);
    }

    match snapshot.role {
        Some(Role::SuperAdmin) => Some(Route::SuperAdminHome),
        Some(Role::Admin) => match snapshot.status {
            Some(LifecycleStatus::ProfileSubmitted) => Some(match policy.submitted_landing {
                SubmittedLanding::Dashboard => Route::Dashboard,
                SubmittedLanding::PendingApproval => Route::PendingApproval,
            }),
            Some(status) => Some(landing_route(Some(Role::Admin), Some(status))),
            // no status recorded: defer to the per-route gate
            None => None,
        },
        Some(Role::Teacher) | Some(Role::Student) | None => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct NavigationRedirector {
    policy: RoutingPolicy,
}

impl NavigationRedirector {
    pub fn new(policy: RoutingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Run once per mount of the authenticated shell
    pub fn on_mount(&self, store: &dyn SessionStore, navigator: &mut dyn Navigator) -> Option<Route> {
        let snapshot = SessionSnapshot::load(store);
        let target = redirect_target(&snapshot, &self.policy);

        match &target {
            Some(route) => {
                tracing::debug!(
                    "Redirecting shell to {} (role: {:?}, status: {:?})",
                    route,
                    snapshot.role,
                    snapshot.status
                );
                navigator.replace(route);
            }
            None => tracing::debug!("No shell redirect for role {:?}", snapshot.role),
        }

        target
    }
}
