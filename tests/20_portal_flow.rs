mod common;

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use school_portal::client::{ClientError, PortalClient};
use school_portal::gate::{authorize, authorize_path};
use school_portal::lifecycle::SchoolAction;
use school_portal::redirector::{History, NavigationRedirector, RoutingPolicy, SubmittedLanding};
use school_portal::routes::{Route, Verdict};
use school_portal::session::{SessionSnapshot, SessionStore, AUTH_TOKEN, IS_LOGGED_IN};
use school_portal::types::{LifecycleStatus, Role};

async fn client_for(api: &common::MockApi) -> (PortalClient, Arc<dyn SessionStore>) {
    let store: Arc<dyn SessionStore> = common::memory_store();
    let gateway = common::gateway_for(api, Arc::clone(&store), None);
    (PortalClient::new(gateway), store)
}

#[tokio::test]
async fn admin_login_then_profile_submission_moves_the_landing() -> Result<()> {
    let api = common::spawn_mock_api().await?;
    let (client, store) = client_for(&api).await;

    let login = client.login("admin@school.test", common::PASSWORD).await?;
    assert_eq!(login.role, "ADMIN");

    let snapshot = SessionSnapshot::load(store.as_ref());
    assert!(snapshot.logged_in);
    assert_eq!(snapshot.role, Some(Role::Admin));
    assert_eq!(snapshot.status, Some(LifecycleStatus::ProfileIncomplete));
    assert_eq!(snapshot.principal().tenant_id.as_deref(), Some("5"));

    let redirector = NavigationRedirector::default();
    let mut history = History::starting_at(Route::Dashboard);
    assert_eq!(redirector.on_mount(store.as_ref(), &mut history), Some(Route::SchoolProfile));
    assert_eq!(history.current(), Some(&Route::SchoolProfile));
    assert_eq!(history.len(), 1);

    let status = client.submit_profile(json!({ "name": "Green Valley" })).await?;
    assert_eq!(status, LifecycleStatus::ProfileSubmitted);

    let mut history = History::starting_at(Route::SchoolProfile);
    assert_eq!(redirector.on_mount(store.as_ref(), &mut history), Some(Route::Dashboard));

    let pending = NavigationRedirector::new(RoutingPolicy {
        submitted_landing: SubmittedLanding::PendingApproval,
    });
    let mut history = History::starting_at(Route::SchoolProfile);
    assert_eq!(pending.on_mount(store.as_ref(), &mut history), Some(Route::PendingApproval));
    Ok(())
}

#[tokio::test]
async fn suspended_admin_is_sent_to_suspension_page() -> Result<()> {
    let api = common::spawn_mock_api().await?;
    let (client, store) = client_for(&api).await;

    client.login("suspended@school.test", common::PASSWORD).await?;

    let mut history = History::starting_at(Route::Dashboard);
    let target = NavigationRedirector::default().on_mount(store.as_ref(), &mut history);
    assert_eq!(target, Some(Route::Suspended));
    assert_eq!(history.replacements(), 1);

    // the role gate alone still lets an admin through
    assert_eq!(authorize(&[Role::Admin], store.as_ref()), Verdict::Render);
    Ok(())
}

#[tokio::test]
async fn super_admin_lands_on_profile() -> Result<()> {
    let api = common::spawn_mock_api().await?;
    let (client, store) = client_for(&api).await;

    client.login("super@school.test", common::PASSWORD).await?;

    let mut history = History::starting_at(Route::Login);
    let target = NavigationRedirector::default().on_mount(store.as_ref(), &mut history);
    assert_eq!(target, Some(Route::SuperAdminHome));
    assert_eq!(authorize_path("/dashboard", store.as_ref()), Verdict::Redirect(Route::SuperAdminHome));
    Ok(())
}

#[tokio::test]
async fn teacher_turned_away_from_admin_pages_to_own_dashboard() -> Result<()> {
    let api = common::spawn_mock_api().await?;
    let (client, store) = client_for(&api).await;

    client.login("teacher@school.test", common::PASSWORD).await?;

    let mut history = History::starting_at(Route::TeacherDashboard("21".to_string()));
    assert_eq!(NavigationRedirector::default().on_mount(store.as_ref(), &mut history), None);
    assert_eq!(history.replacements(), 0);

    assert_eq!(
        authorize_path("/admin/teachers", store.as_ref()),
        Verdict::Redirect(Route::TeacherDashboard("21".to_string()))
    );
    assert_eq!(authorize_path("/teacher/dashboard/21", store.as_ref()), Verdict::Render);
    Ok(())
}

#[tokio::test]
async fn rejected_login_leaves_session_empty() -> Result<()> {
    let api = common::spawn_mock_api().await?;
    let (client, store) = client_for(&api).await;

    let err = client
        .login("admin@school.test", "wrong")
        .await
        .expect_err("bad password must fail");

    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(store.get(AUTH_TOKEN).is_none());
    assert!(store.get(IS_LOGGED_IN).is_none());

    let mut history = History::starting_at(Route::Dashboard);
    let target = NavigationRedirector::default().on_mount(store.as_ref(), &mut history);
    assert_eq!(target, Some(Route::Login));
    Ok(())
}

#[tokio::test]
async fn forced_logout_after_password_change_clears_session() -> Result<()> {
    let api = common::spawn_mock_api().await?;
    let (client, store) = client_for(&api).await;

    client.login("teacher@school.test", common::PASSWORD).await?;
    let change = client.change_password("new-secret-1", "new-secret-1").await?;

    assert!(change.logged_out);
    assert_eq!(change.message, "Password updated successfully");
    assert!(store.get(AUTH_TOKEN).is_none());
    assert!(!SessionSnapshot::load(store.as_ref()).logged_in);

    let hit = api
        .hits()
        .into_iter()
        .find(|h| h.path == "/api/auth/change-password")
        .expect("change-password call");
    assert!(hit.authorization.is_some_and(|h| h.starts_with("Bearer ")));
    Ok(())
}

#[tokio::test]
async fn super_admin_lists_and_moves_schools() -> Result<()> {
    let api = common::spawn_mock_api().await?;
    let (client, _store) = client_for(&api).await;

    client.login("super@school.test", common::PASSWORD).await?;

    let schools = client.list_schools().await?;
    assert_eq!(schools.len(), 3);
    assert_eq!(schools[0].id, "1");
    assert_eq!(schools[0].lifecycle_status(), Some(LifecycleStatus::ProfileSubmitted));
    assert_eq!(schools[2].id, "3");

    let status = client
        .school_action("1", SchoolAction::Approve, schools[0].lifecycle_status(), None)
        .await?;
    assert_eq!(status, LifecycleStatus::Active);

    let status = client
        .school_action("2", SchoolAction::Suspend, schools[1].lifecycle_status(), None)
        .await?;
    assert_eq!(status, LifecycleStatus::Suspended);

    assert_eq!(api.hits_to("/api/superadmin/schools/1/approve"), 1);
    assert_eq!(api.hits_to("/api/superadmin/schools/2/suspend"), 1);
    Ok(())
}

#[tokio::test]
async fn invalid_transition_is_refused_without_a_call() -> Result<()> {
    let api = common::spawn_mock_api().await?;
    let (client, _store) = client_for(&api).await;

    client.login("super@school.test", common::PASSWORD).await?;

    let err = client
        .school_action("3", SchoolAction::Suspend, Some(LifecycleStatus::Rejected), None)
        .await
        .expect_err("rejected schools cannot be suspended");

    assert!(matches!(err, ClientError::Transition(_)));
    assert_eq!(api.hits_to("/api/superadmin/schools/3/suspend"), 0);
    Ok(())
}

#[tokio::test]
async fn school_list_requires_a_session() -> Result<()> {
    let api = common::spawn_mock_api().await?;
    let (client, _store) = client_for(&api).await;

    let err = client.list_schools().await.expect_err("anonymous list must fail");
    match err {
        ClientError::Gateway(e) => {
            assert!(e.is_auth_failure());
            assert_eq!(e.message(), "Unauthorized");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn minted_claims_decode_for_the_session() -> Result<()> {
    let token = common::mint_token(json!({ "id": 42, "schoolId": "7", "role": "STUDENT" }));
    let claims = school_portal::claims::decode_claims(&token).expect("claims");

    assert_eq!(claims.id.as_deref(), Some("42"));
    assert_eq!(claims.school_id.as_deref(), Some("7"));
    assert_eq!(claims.role.as_deref(), Some("STUDENT"));
    Ok(())
}
