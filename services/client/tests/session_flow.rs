//! services/client/tests/session_flow.rs

mod common;

use common::Harness;
use infradoc_core::domain::Role;
use infradoc_core::gate::{Decision, Route};
use infradoc_core::ports::{AuthService, SessionStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn login_persists_the_session_and_lands_on_the_role_dashboard() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "admin", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login successful",
            "token": "jwt-123",
            "user": {
                "id": 1,
                "username": "admin",
                "email": "admin@example.com",
                "role": "admin",
                "department": "engineering"
            }
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut session = h.session();
    let landing = session.login(" admin ", "secret").await.unwrap();

    assert_eq!(landing, Route::AdminDashboard);
    let stored = h.store.load().unwrap().expect("session should be persisted");
    assert_eq!(stored.token, "jwt-123");
    assert_eq!(stored.role, Role::Admin);
    assert_eq!(stored.profile.id, "1");

    // A fresh process sees the same session.
    let rehydrated = h.session();
    assert_eq!(rehydrated.profile().map(|p| p.username.as_str()), Some("admin"));
    assert_eq!(
        rehydrated.resolve(Route::AdminUsers),
        Decision::Render(Route::AdminUsers)
    );
}

#[tokio::test]
async fn login_rejects_empty_fields_without_calling_the_backend() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let mut session = h.session();
    let err = session.login("   ", "secret").await.unwrap_err();
    assert_eq!(err.to_string(), "Please fill in all fields");
    assert!(session.session().is_none());
}

#[tokio::test]
async fn failed_login_surfaces_the_backend_message() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&h.server)
        .await;

    let mut session = h.session();
    let err = session.login("admin", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(session.session().is_none());
    assert!(h.store.load().unwrap().is_none());
}

#[tokio::test]
async fn logout_clears_locally_even_when_the_backend_fails() {
    let h = Harness::start().await;
    h.sign_in(Role::User, "engineering");
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", "Bearer token-abc"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut session = h.session();
    assert!(session.session().is_some());

    let route = session.logout().await;

    assert_eq!(route, Route::Login);
    assert!(session.session().is_none());
    assert!(h.store.load().unwrap().is_none());
    assert_eq!(
        session.resolve(Route::Library),
        Decision::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn a_401_anywhere_ends_the_session_and_drops_cached_documents() {
    let h = Harness::start().await;
    h.sign_in(Role::User, "engineering");
    Mock::given(method("GET"))
        .and(path("/api/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [
                { "id": 1, "name": "Pump manual.pdf", "status": "processed" }
            ]
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/users"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Token has expired" })),
        )
        .mount(&h.server)
        .await;

    let mut session = h.session();
    let documents = h.fetcher().fetch(&mut session, &Default::default()).await;
    assert_eq!(documents.len(), 1);
    assert_eq!(session.documents().len(), 1);

    let result = h.gateway.list_users(&session.credential()).await;
    let err = session.observe(result).unwrap_err();

    assert!(err.is_auth_failure());
    assert!(session.session().is_none());
    assert!(session.documents().is_empty());
    assert!(h.store.load().unwrap().is_none());
    assert_eq!(
        session.resolve(Route::Insights),
        Decision::Redirect(Route::Login)
    );
}

#[tokio::test]
async fn public_routes_redirect_signed_in_users_to_their_landing() {
    let h = Harness::start().await;
    h.sign_in(Role::User, "operations");
    let session = h.session();

    assert_eq!(
        session.resolve(Route::Login),
        Decision::Redirect(Route::DepartmentDashboard)
    );
    assert_eq!(
        session.resolve(Route::AdminUpload),
        Decision::Redirect(Route::DepartmentDashboard)
    );
    assert_eq!(session.resolve(Route::Library), Decision::Render(Route::Library));
}

#[tokio::test]
async fn refresh_profile_updates_the_stored_role() {
    let h = Harness::start().await;
    h.sign_in(Role::User, "engineering");
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer token-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "id": 7,
                "username": "jdoe",
                "email": "jdoe@example.com",
                "role": "admin",
                "department": "engineering"
            }
        })))
        .mount(&h.server)
        .await;

    let mut session = h.session();
    let profile = session.refresh_profile().await.unwrap();

    assert_eq!(profile.role, Role::Admin);
    assert_eq!(h.store.load().unwrap().unwrap().role, Role::Admin);
}
