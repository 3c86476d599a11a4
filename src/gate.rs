//! Per-route role gate.
//!
//! Purely role-based: a suspended admin is still an admin here. Lifecycle
//! gating is layered on top by the navigation redirector.

use crate::claims::decode_claims;
use crate::lifecycle::landing_route;
use crate::routes::{page_access, Access, Route, Verdict};
use crate::session::{SessionSnapshot, SessionStore};
use crate::types::Role;

/// Home route for a principal turned away from a page
pub fn role_home(snapshot: &SessionSnapshot) -> Route {
    match snapshot.role {
        Some(Role::Admin) | Some(Role::SuperAdmin) => landing_route(snapshot.role, snapshot.status),
        Some(Role::Teacher) => principal_id(snapshot)
            .map(Route::TeacherDashboard)
            .unwrap_or(Route::Login),
        Some(Role::Student) => principal_id(snapshot)
            .map(Route::StudentDashboard)
            .unwrap_or(Route::Login),
        None => Route::Login,
    }
}

fn principal_id(snapshot: &SessionSnapshot) -> Option<String> {
    snapshot
        .token
        .as_deref()
        .and_then(decode_claims)
        .and_then(|claims| claims.id)
}

/// Decide whether a session may see a page requiring one of `required`
pub fn authorize_snapshot(required: &[Role], snapshot: &SessionSnapshot) -> Verdict {
    if !snapshot.has_token() {
        tracing::debug!("No session token, redirecting to login");
        return Verdict::Redirect(Route::Login);
    }

    match snapshot.role {
        Some(role) if required.contains(&role) => Verdict::Render,
        Some(role) => {
            let home = role_home(snapshot);
            tracing::debug!("Role {} not permitted here, redirecting to {}", role, home);
            Verdict::Redirect(home)
        }
        None => {
            tracing::debug!("Session has no recognized role, redirecting to login");
            Verdict::Redirect(Route::Login)
        }
    }
}

pub fn authorize(required: &[Role], store: &dyn SessionStore) -> Verdict {
    authorize_snapshot(required, &SessionSnapshot::load(store))
}

/// Gate a concrete page path using the page registry.
///
/// Public pages and unknown paths (the not-found page) always render.
pub fn authorize_path(path: &str, store: &dyn SessionStore) -> Verdict {
    match page_access(path) {
        Some(Access::Roles(required)) => authorize(required, store),
        Some(Access::Public) | None => Verdict::Render,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, AUTH_TOKEN, STATUS, USER_ROLE};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn token(id: u32) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"id":{},"schoolId":3}}"#, id));
        format!("h.{}.s", payload)
    }

    fn store(role: Option<&str>, status: Option<&str>) -> MemorySessionStore {
        let store = MemorySessionStore::new();
        store.set(AUTH_TOKEN, &token(77)).unwrap();
        if let Some(role) = role {
            store.set(USER_ROLE, role).unwrap();
        }
        if let Some(status) = status {
            store.set(STATUS, status).unwrap();
        }
        store
    }

    #[test]
    fn missing_token_redirects_to_login() {
        let store = MemorySessionStore::with_entries([(USER_ROLE, "ADMIN")]);
        assert_eq!(authorize(&[Role::Admin], &store), Verdict::Redirect(Route::Login));
    }

    #[test]
    fn matching_role_renders() {
        let s = store(Some("ADMIN"), Some("SUSPENDED"));
        assert_eq!(authorize(&[Role::Admin], &s), Verdict::Render);
        let s = store(Some("TEACHER"), None);
        assert_eq!(authorize(&[Role::Teacher, Role::Student], &s), Verdict::Render);
    }

    #[test]
    fn teacher_never_renders_admin_page() {
        let s = store(Some("TEACHER"), Some("ACTIVE"));
        assert_eq!(
            authorize(&[Role::Admin], &s),
            Verdict::Redirect(Route::TeacherDashboard("77".into()))
        );
    }

    #[test]
    fn student_without_decodable_id_goes_to_login() {
        let s = MemorySessionStore::with_entries([(AUTH_TOKEN, "opaque"), (USER_ROLE, "STUDENT")]);
        assert_eq!(authorize(&[Role::Admin], &s), Verdict::Redirect(Route::Login));
    }

    #[test]
    fn admin_and_super_admin_are_sent_to_their_landing() {
        let s = store(Some("ADMIN"), Some("PROFILE_INCOMPLETE"));
        assert_eq!(authorize(&[Role::SuperAdmin], &s), Verdict::Redirect(Route::SchoolProfile));
        let s = store(Some("ADMIN"), None);
        assert_eq!(authorize(&[Role::SuperAdmin], &s), Verdict::Redirect(Route::Dashboard));
        let s = store(Some("SUPER_ADMIN"), Some("REJECTED"));
        assert_eq!(authorize(&[Role::Admin], &s), Verdict::Redirect(Route::SuperAdminHome));
    }

    #[test]
    fn unrecognized_role_goes_to_login() {
        let s = store(Some("JANITOR"), None);
        assert_eq!(authorize(&[Role::Admin], &s), Verdict::Redirect(Route::Login));
    }

    #[test]
    fn path_gate_uses_page_registry() {
        let s = store(Some("STUDENT"), None);
        assert_eq!(authorize_path("/login", &s), Verdict::Render);
        assert_eq!(authorize_path("/student/dashboard/77", &s), Verdict::Render);
        assert_eq!(
            authorize_path("/admin/teachers", &s),
            Verdict::Redirect(Route::StudentDashboard("77".into()))
        );
        assert_eq!(authorize_path("/does-not-exist", &s), Verdict::Render);

        let empty = MemorySessionStore::new();
        assert_eq!(authorize_path("/account/suspended", &empty), Verdict::Render);
        assert_eq!(authorize_path("/dashboard", &empty), Verdict::Redirect(Route::Login));
    }
}
