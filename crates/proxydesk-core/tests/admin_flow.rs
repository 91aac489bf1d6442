//! End-to-end flows against a mock admin API.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use proxydesk_core::auth::session::SESSION_FILE;
use proxydesk_core::auth::SessionFile;
use proxydesk_core::guard::View;
use proxydesk_core::models::NewUser;
use proxydesk_core::{
    AdminSurface, ApiError, AuthorizedClient, Confirmation, DeleteOutcome, RouteGuard,
    RouteState, SessionStore,
};

const POLL: Duration = Duration::from_secs(30);
const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    server: MockServer,
    _dir: TempDir,
    store: Arc<SessionStore>,
    guard: RouteGuard,
    client: AuthorizedClient,
}

fn write_stored_token(dir: &Path, token: &str) {
    let file = SessionFile {
        jwt_token: token.to_string(),
        saved_at: Utc::now(),
    };
    std::fs::write(dir.join(SESSION_FILE), serde_json::to_string(&file).unwrap()).unwrap();
}

/// Bootstrap the way the application does: store, guard, one client
async fn harness(stored_token: Option<&str>) -> Harness {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    if let Some(token) = stored_token {
        write_stored_token(dir.path(), token);
    }
    let store = Arc::new(SessionStore::new(dir.path()));
    let mut guard = RouteGuard::new(&store);
    guard.start(&store);
    let client = AuthorizedClient::new(&server.uri(), WAIT, store.clone()).unwrap();
    Harness {
        server,
        _dir: dir,
        store,
        guard,
        client,
    }
}

async fn proxy_requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path().starts_with("/api/proxy"))
        .collect()
}

fn count(requests: &[Request], verb: &str, route: &str) -> usize {
    requests
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == route)
        .count()
}

async fn mount_users(server: &MockServer, token: &str, users: &[&str]) {
    let users: Vec<_> = users.iter().map(|u| json!({ "username": u })).collect();
    Mock::given(method("GET"))
        .and(path("/api/proxy/users"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": users })))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, token: &str, is_active: bool, status: &str) {
    Mock::given(method("GET"))
        .and(path("/api/proxy/status"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_active": is_active,
            "status": status,
            "details": "danted.service - SOCKS (proxy) server",
        })))
        .mount(server)
        .await;
}

async fn wait_for_status(surface: &mut AdminSurface) {
    tokio::time::timeout(WAIT, surface.next_update())
        .await
        .expect("status update did not arrive");
}

// ----------------------------------------------------------------------------
// Startup
// ----------------------------------------------------------------------------

#[tokio::test]
async fn no_stored_token_shows_login_without_requests() {
    let h = harness(None).await;

    assert_eq!(h.guard.state(), RouteState::Unauthenticated);
    assert_eq!(h.guard.view(), View::Login);
    assert!(proxy_requests(&h.server).await.is_empty());
}

#[tokio::test]
async fn stored_token_activates_admin_with_one_list_and_one_status() {
    let h = harness(Some("tok-1")).await;
    mount_users(&h.server, "tok-1", &["alice"]).await;
    mount_status(&h.server, "tok-1", true, "active").await;

    assert_eq!(h.guard.state(), RouteState::Authenticated);
    assert_eq!(h.guard.view(), View::Admin);

    let mut surface = AdminSurface::activate(h.client.clone(), POLL).await;
    wait_for_status(&mut surface).await;

    let requests = proxy_requests(&h.server).await;
    assert_eq!(count(&requests, "GET", "/api/proxy/users"), 1);
    assert_eq!(count(&requests, "GET", "/api/proxy/status"), 1);
    assert_eq!(requests.len(), 2);
    for r in &requests {
        assert_eq!(r.headers.get("authorization").unwrap(), "Bearer tok-1");
    }

    assert_eq!(surface.resources.users().len(), 1);
    assert!(surface.status().unwrap().is_active);
    surface.teardown();
}

// ----------------------------------------------------------------------------
// Users
// ----------------------------------------------------------------------------

#[tokio::test]
async fn create_posts_success_and_relists() {
    let h = harness(Some("tok-1")).await;
    mount_users(&h.server, "tok-1", &["alice", "bob"]).await;
    mount_status(&h.server, "tok-1", true, "active").await;
    Mock::given(method("POST"))
        .and(path("/api/proxy/users"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_json(json!({ "username": "bob", "password": "pw" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "SOCKS5 user 'bob' created successfully"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut surface = AdminSurface::activate(h.client.clone(), POLL).await;
    surface.resources.form = NewUser::new("bob", "pw");
    surface.create_user().await.unwrap();

    assert_eq!(surface.notifications.current_success(), Some("User bob created successfully"));
    assert_eq!(surface.notifications.current_error(), None);
    assert!(surface.resources.form.username.is_empty());
    assert!(surface.resources.form.password.is_empty());

    let bobs = surface
        .resources
        .users()
        .iter()
        .filter(|u| u.username == "bob")
        .count();
    assert_eq!(bobs, 1);

    // Activation list plus the follow-up list
    let requests = proxy_requests(&h.server).await;
    assert_eq!(count(&requests, "GET", "/api/proxy/users"), 2);
    surface.teardown();
}

#[tokio::test]
async fn create_then_list_yields_exactly_one_record() {
    let h = harness(Some("tok-1")).await;
    mount_users(&h.server, "tok-1", &["alice"]).await;
    Mock::given(method("POST"))
        .and(path("/api/proxy/users"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&h.server)
        .await;

    let mut manager = proxydesk_core::ResourceManager::new(h.client.clone());
    let mut notes = proxydesk_core::Notifications::default();
    manager.form = NewUser::new("alice", "pw1");
    manager.create(&mut notes).await.unwrap();
    manager.list(&mut notes).await.unwrap();

    assert_eq!(manager.users().len(), 1);
    assert_eq!(manager.users()[0].username, "alice");
}

#[tokio::test]
async fn incomplete_form_never_reaches_network() {
    let h = harness(Some("tok-1")).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&h.server)
        .await;

    let mut manager = proxydesk_core::ResourceManager::new(h.client.clone());
    let mut notes = proxydesk_core::Notifications::default();
    manager.form = NewUser::new("carol", "");
    let err = manager.create(&mut notes).await.unwrap_err();

    assert!(matches!(err, ApiError::IncompleteInput(_)));
    assert_eq!(notes.current_error(), Some("Username and password are required"));
    assert!(proxy_requests(&h.server).await.is_empty());
}

#[tokio::test]
async fn create_rejection_shows_server_message_and_keeps_form() {
    let h = harness(Some("tok-1")).await;
    Mock::given(method("POST"))
        .and(path("/api/proxy/users"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid username format" })),
        )
        .mount(&h.server)
        .await;

    let mut manager = proxydesk_core::ResourceManager::new(h.client.clone());
    let mut notes = proxydesk_core::Notifications::default();
    notes.success("User old created successfully");
    manager.form = NewUser::new("Bad Name", "password1");
    let err = manager.create(&mut notes).await.unwrap_err();

    assert!(matches!(err, ApiError::Validation { status: 400, .. }));
    assert_eq!(notes.current_error(), Some("Invalid username format"));
    assert_eq!(notes.current_success(), None);
    assert_eq!(manager.form.username, "Bad Name");
    // No follow-up list after a failed create
    assert_eq!(count(&proxy_requests(&h.server).await, "GET", "/api/proxy/users"), 0);
    assert!(h.store.is_authenticated());
}

#[tokio::test]
async fn list_failure_keeps_previous_list() {
    let h = harness(Some("tok-1")).await;
    Mock::given(method("GET"))
        .and(path("/api/proxy/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "username": "alice" }]
        })))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/proxy/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&h.server)
        .await;

    let mut manager = proxydesk_core::ResourceManager::new(h.client.clone());
    let mut notes = proxydesk_core::Notifications::default();
    manager.list(&mut notes).await.unwrap();
    assert!(manager.refresh(&mut notes).await.is_err());

    assert_eq!(manager.users().len(), 1);
    assert_eq!(notes.current_error(), Some("Failed to fetch users"));
    assert!(h.store.is_authenticated());
}

#[tokio::test]
async fn declined_delete_issues_no_request() {
    let h = harness(Some("tok-1")).await;
    mount_users(&h.server, "tok-1", &["bob"]).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let mut manager = proxydesk_core::ResourceManager::new(h.client.clone());
    let mut notes = proxydesk_core::Notifications::default();
    manager.list(&mut notes).await.unwrap();
    notes.success("User bob created successfully");
    let before = proxy_requests(&h.server).await.len();

    let mut prompt = String::new();
    let outcome = manager
        .delete_with(
            "bob",
            |pending| {
                prompt = pending.prompt();
                false
            },
            &mut notes,
        )
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(prompt, "Are you sure you want to delete user bob?");
    assert_eq!(proxy_requests(&h.server).await.len(), before);
    assert_eq!(manager.users().len(), 1);
    // Declining is not an action: notifications are untouched
    assert_eq!(notes.current_success(), Some("User bob created successfully"));
}

#[tokio::test]
async fn confirmed_delete_posts_success_and_relists() {
    let h = harness(Some("tok-1")).await;
    Mock::given(method("GET"))
        .and(path("/api/proxy/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "username": "alice" }, { "username": "bob" }]
        })))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    mount_users(&h.server, "tok-1", &["alice"]).await;
    Mock::given(method("DELETE"))
        .and(path("/api/proxy/users/bob"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut manager = proxydesk_core::ResourceManager::new(h.client.clone());
    let mut notes = proxydesk_core::Notifications::default();
    manager.list(&mut notes).await.unwrap();
    assert_eq!(manager.users().len(), 2);

    let pending = manager.request_delete("bob");
    let outcome = manager
        .delete(pending, Confirmation::Accepted, &mut notes)
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(notes.current_success(), Some("User bob deleted successfully"));
    assert_eq!(manager.users().len(), 1);
    assert_eq!(manager.users()[0].username, "alice");
}

#[tokio::test]
async fn empty_username_delete_issues_no_request() {
    let h = harness(Some("tok-1")).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let mut manager = proxydesk_core::ResourceManager::new(h.client.clone());
    let mut notes = proxydesk_core::Notifications::default();
    let pending = manager.request_delete("");
    let err = manager
        .delete(pending, Confirmation::Accepted, &mut notes)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::IncompleteInput(_)));
    assert_eq!(notes.current_error(), Some("Username is required"));
    assert_eq!(notes.current_success(), None);
    assert!(proxy_requests(&h.server).await.is_empty());
    assert!(h.store.is_authenticated());
}

#[tokio::test]
async fn relist_failure_after_create_keeps_both_notifications() {
    let h = harness(Some("tok-1")).await;
    Mock::given(method("POST"))
        .and(path("/api/proxy/users"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/proxy/users"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&h.server)
        .await;

    let mut manager = proxydesk_core::ResourceManager::new(h.client.clone());
    let mut notes = proxydesk_core::Notifications::default();
    manager.form = NewUser::new("bob", "password1");
    manager.create(&mut notes).await.unwrap();

    assert_eq!(notes.current_success(), Some("User bob created successfully"));
    assert_eq!(notes.current_error(), Some("boom"));
}

#[tokio::test]
async fn protected_delete_shows_server_message() {
    let h = harness(Some("tok-1")).await;
    Mock::given(method("DELETE"))
        .and(path("/api/proxy/users/root"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "error": "Invalid or protected username" })),
        )
        .mount(&h.server)
        .await;

    let mut manager = proxydesk_core::ResourceManager::new(h.client.clone());
    let mut notes = proxydesk_core::Notifications::default();
    let pending = manager.request_delete("root");
    assert!(manager
        .delete(pending, Confirmation::Accepted, &mut notes)
        .await
        .is_err());

    assert_eq!(notes.current_error(), Some("Invalid or protected username"));
    assert!(h.store.is_authenticated());
}

// ----------------------------------------------------------------------------
// Authorization failures
// ----------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_delete_logs_out_and_stops_requests() {
    let mut h = harness(Some("tok-1")).await;
    mount_users(&h.server, "tok-1", &["bob"]).await;
    mount_status(&h.server, "tok-1", true, "active").await;
    Mock::given(method("DELETE"))
        .and(path("/api/proxy/users/bob"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "msg": "Token has expired" })),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let mut surface = AdminSurface::activate(h.client.clone(), POLL).await;
    wait_for_status(&mut surface).await;

    let pending = surface.request_delete("bob");
    let err = surface
        .delete_user(pending, Confirmation::Accepted)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(surface.notifications.current_error().is_none());

    assert!(!h.store.is_authenticated());
    assert_eq!(h.guard.sync(), Some(RouteState::Unauthenticated));
    assert_eq!(h.guard.view(), View::Login);
    // Exactly one logout: nothing further to observe
    assert_eq!(h.guard.sync(), None);

    let before = proxy_requests(&h.server).await.len();
    assert!(surface.refresh_users().await.unwrap_err().is_unauthorized());
    surface.refresh_status();
    wait_for_status(&mut surface).await;
    surface.teardown();
    assert_eq!(proxy_requests(&h.server).await.len(), before);
}

#[tokio::test]
async fn concurrent_unauthorized_responses_log_out_once() {
    let mut h = harness(Some("tok-1")).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let (users, status) = tokio::join!(h.client.list_users(), h.client.fetch_status());
    assert!(users.unwrap_err().is_unauthorized());
    assert!(status.unwrap_err().is_unauthorized());

    assert!(!h.store.is_authenticated());
    assert_eq!(h.guard.sync(), Some(RouteState::Unauthenticated));
    assert_eq!(h.guard.sync(), None);
    assert!(!h.store.logout());
}

#[tokio::test]
async fn late_unauthorized_does_not_end_new_session() {
    let h = harness(Some("tok-old")).await;
    Mock::given(method("GET"))
        .and(path("/api/proxy/status"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .mount(&h.server)
        .await;

    let client = h.client.clone();
    let in_flight = tokio::spawn(async move { client.fetch_status().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Operator logs out and back in while the old request is pending
    h.store.logout();
    h.store.set_authenticated("tok-new".to_string()).unwrap();

    assert!(in_flight.await.unwrap().unwrap_err().is_unauthorized());
    assert_eq!(h.store.token().as_deref(), Some("tok-new"));
}

// ----------------------------------------------------------------------------
// Status
// ----------------------------------------------------------------------------

#[tokio::test]
async fn stopped_service_shows_inactive_label() {
    let h = harness(Some("tok-1")).await;
    mount_users(&h.server, "tok-1", &[]).await;
    Mock::given(method("GET"))
        .and(path("/api/proxy/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_active": false,
            "status": "stopped",
            "details": "...",
        })))
        .mount(&h.server)
        .await;

    let mut surface = AdminSurface::activate(h.client.clone(), POLL).await;
    wait_for_status(&mut surface).await;

    let status = surface.status().unwrap();
    assert!(!status.is_active);
    assert_eq!(status.indicator(), "inactive");
    assert_eq!(status.status_label, "stopped");
    assert_eq!(status.details, "...");
    surface.teardown();
}

#[tokio::test]
async fn status_failure_keeps_stale_snapshot() {
    let h = harness(Some("tok-1")).await;
    mount_users(&h.server, "tok-1", &[]).await;
    Mock::given(method("GET"))
        .and(path("/api/proxy/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_active": true,
            "status": "active",
            "details": "",
        })))
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/proxy/status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Failed to get proxy status: sudo: a password is required"
        })))
        .mount(&h.server)
        .await;

    let mut surface = AdminSurface::activate(h.client.clone(), POLL).await;
    wait_for_status(&mut surface).await;
    assert_eq!(surface.status().unwrap().status_label, "active");

    surface.refresh_status();
    wait_for_status(&mut surface).await;

    assert_eq!(surface.status().unwrap().status_label, "active");
    assert_eq!(
        surface.notifications.current_error(),
        Some("Failed to get proxy status: sudo: a password is required")
    );
    assert!(surface.is_polling());
    surface.teardown();
}

// ----------------------------------------------------------------------------
// Login
// ----------------------------------------------------------------------------

#[tokio::test]
async fn login_sets_session_and_guard_follows() {
    let mut h = harness(None).await;
    Mock::given(method("POST"))
        .and(path("/api/admin/login"))
        .and(body_json(json!({ "username": "admin", "password": "admin123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok-9" })))
        .expect(1)
        .mount(&h.server)
        .await;

    let token = h.client.login("admin", "admin123").await.unwrap();
    assert_eq!(token, "tok-9");

    let requests = h.server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());

    h.store.set_authenticated(token).unwrap();
    assert_eq!(h.guard.sync(), Some(RouteState::Authenticated));
    assert_eq!(h.guard.view(), View::Admin);
}

#[tokio::test]
async fn bad_login_reports_message_and_keeps_session_state() {
    let mut h = harness(None).await;
    Mock::given(method("POST"))
        .and(path("/api/admin/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "msg": "Bad username or password" })),
        )
        .mount(&h.server)
        .await;

    let err = h.client.login("admin", "wrong").await.unwrap_err();
    assert_eq!(err.user_message("Login failed"), "Bad username or password");
    assert!(!h.store.is_authenticated());
    assert_eq!(h.guard.sync(), None);
}
