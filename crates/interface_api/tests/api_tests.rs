//! HTTP surface tests against in-memory adapters

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};

use domain_claims::testing::{
    InMemoryClaimStore, InMemoryOutbox, InMemoryUserDirectory, StubRenderer, StubStorage,
};
use domain_claims::{ClaimService, Notifier};
use domain_party::{User, UserRole};
use interface_api::auth::{hash_password, TokenManager};
use interface_api::AppState;

const JWT_SECRET: &str = "test-secret";
const MAX_UPLOAD: usize = 10 * 1024 * 1024;

struct TestApp {
    server: TestServer,
    directory: Arc<InMemoryUserDirectory>,
    outbox: Arc<InMemoryOutbox>,
    tokens: Arc<TokenManager>,
}

fn test_app() -> TestApp {
    let store = Arc::new(InMemoryClaimStore::new());
    let storage = Arc::new(StubStorage::new());
    let renderer = Arc::new(StubRenderer::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let outbox = Arc::new(InMemoryOutbox::new());
    let tokens = Arc::new(TokenManager::new(JWT_SECRET, 24));

    let directory_port: Arc<dyn domain_party::UserDirectory> = directory.clone();
    let outbox_port: Arc<dyn domain_claims::OutboxStore> = outbox.clone();
    let notifier = Arc::new(Notifier::new(outbox_port, "claims-desk@claimtrack.app"));
    let service = Arc::new(ClaimService::new(
        store,
        storage,
        renderer,
        Arc::clone(&directory_port),
        Arc::clone(&notifier),
    ));
    let state = AppState::new(service, directory_port, notifier, Arc::clone(&tokens), MAX_UPLOAD);
    let server = TestServer::new(interface_api::router(state)).expect("router");
    TestApp {
        server,
        directory,
        outbox,
        tokens,
    }
}

fn staff_token(app: &TestApp, role: UserRole) -> String {
    let mut user = User::new(
        "Lucia Fernandez",
        format!("{:?}@example.com", role).to_lowercase(),
        hash_password("hunter2hunter2").unwrap(),
        role,
    );
    user.approve();
    app.directory.add(user.clone());
    app.tokens.issue(&user).unwrap()
}

fn pdf_part() -> Part {
    Part::bytes(b"%PDF-1.4".to_vec())
        .file_name("doc.pdf")
        .mime_type("application/pdf")
}

fn intake_form() -> MultipartForm {
    MultipartForm::new()
        .add_text("name", "Maria Lopez")
        .add_text("national_id", "30123456")
        .add_text("email", "maria@example.com")
        .add_text("role", "driver")
        .add_text("has_own_insurance", "true")
        .add_text("counterparty_insurer_name", "Seguros del Sur")
        .add_part("identity", pdf_part())
        .add_part("license", pdf_part())
        .add_part("vehicle_registration", pdf_part())
        .add_part("insurance_certificate", pdf_part())
        .add_part("police_report", pdf_part())
        .add_part("budget_estimate", pdf_part())
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let res = app.server.get("/health").await;
    res.assert_status_ok();
    res.assert_json(&json!({ "status": "ok" }));
}

#[tokio::test]
async fn intake_and_tracking_round_trip() {
    let app = test_app();

    let res = app
        .server
        .post("/api/v1/claims")
        .multipart(intake_form())
        .await;
    res.assert_status(axum::http::StatusCode::CREATED);
    let body: Value = res.json();
    let code = body["tracking_code"].as_str().expect("tracking code");
    assert_eq!(code.len(), 6);

    // Two intents queued: claimant confirmation and admin alert.
    assert_eq!(app.outbox.intents().len(), 2);

    let res = app
        .server
        .get(&format!("/api/v1/claims/track/{code}"))
        .add_query_param("national_id", "30123456")
        .await;
    res.assert_status_ok();
    let view: Value = res.json();
    assert_eq!(view["status"], "submitted");

    let res = app
        .server
        .get(&format!("/api/v1/claims/track/{code}"))
        .add_query_param("national_id", "11111111")
        .await;
    res.assert_status_not_found();
}

#[tokio::test]
async fn incomplete_intake_is_rejected_with_the_missing_document() {
    let app = test_app();
    let form = MultipartForm::new()
        .add_text("name", "Maria Lopez")
        .add_text("national_id", "30123456")
        .add_text("email", "maria@example.com")
        .add_text("role", "pedestrian");

    let res = app.server.post("/api/v1/claims").multipart(form).await;
    res.assert_status_bad_request();
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("identity"));
}

#[tokio::test]
async fn staff_listing_requires_a_staff_token() {
    let app = test_app();
    app.server
        .post("/api/v1/claims")
        .multipart(intake_form())
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    // No token at all.
    app.server
        .get("/api/v1/claims")
        .await
        .assert_status_unauthorized();

    // Producers are not staff.
    let producer = staff_token(&app, UserRole::Producer);
    app.server
        .get("/api/v1/claims")
        .authorization_bearer(&producer)
        .await
        .assert_status_forbidden();

    let handler = staff_token(&app, UserRole::Handler);
    let res = app
        .server
        .get("/api/v1/claims")
        .authorization_bearer(&handler)
        .await;
    res.assert_status_ok();
    let claims: Value = res.json();
    assert_eq!(claims.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn caseload_listing_follows_handler_assignment() {
    let app = test_app();
    let res = app
        .server
        .post("/api/v1/claims")
        .multipart(intake_form())
        .await;
    let created: Value = res.json();
    let id = created["claim_id"].as_str().unwrap().to_string();

    let mut handler = User::new(
        "Lucia Fernandez",
        "lucia@example.com",
        hash_password("hunter2hunter2").unwrap(),
        UserRole::Handler,
    );
    handler.approve();
    app.directory.add(handler.clone());
    let token = app.tokens.issue(&handler).unwrap();

    // Nothing assigned yet.
    let res = app
        .server
        .get("/api/v1/claims/mine")
        .authorization_bearer(&token)
        .await;
    res.assert_status_ok();
    let claims: Value = res.json();
    assert!(claims.as_array().unwrap().is_empty());

    app.server
        .put(&format!("/api/v1/claims/{id}/handler"))
        .authorization_bearer(&token)
        .json(&json!({ "handler_id": handler.id }))
        .await
        .assert_status_ok();

    let res = app
        .server
        .get("/api/v1/claims/mine")
        .authorization_bearer(&token)
        .await;
    let claims: Value = res.json();
    assert_eq!(claims.as_array().unwrap().len(), 1);
    assert_eq!(claims[0]["status"], "received");
}

#[tokio::test]
async fn status_updates_go_through_the_state_machine() {
    let app = test_app();
    let res = app
        .server
        .post("/api/v1/claims")
        .multipart(intake_form())
        .await;
    let created: Value = res.json();
    let id = created["claim_id"].as_str().unwrap().to_string();
    let token = staff_token(&app, UserRole::Admin);

    let res = app
        .server
        .put(&format!("/api/v1/claims/{id}/status"))
        .authorization_bearer(&token)
        .json(&json!({ "status": "negotiating" }))
        .await;
    res.assert_status_ok();

    // Backward moves come back as conflicts.
    let res = app
        .server
        .put(&format!("/api/v1/claims/{id}/status"))
        .authorization_bearer(&token)
        .json(&json!({ "status": "received" }))
        .await;
    res.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn registration_and_login_enforce_approval() {
    let app = test_app();

    let res = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "name": "Pedro Sosa",
            "email": "pedro@example.com",
            "password": "hunter2hunter2",
            "role": "producer",
        }))
        .await;
    res.assert_status(axum::http::StatusCode::CREATED);
    let user: Value = res.json();
    assert_eq!(user["is_approved"], json!(false));
    assert!(user.get("password_hash").is_none());

    // Unapproved accounts cannot log in.
    let res = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "pedro@example.com", "password": "hunter2hunter2" }))
        .await;
    res.assert_status_forbidden();

    // Admin approves, then login succeeds.
    let admin = staff_token(&app, UserRole::Admin);
    let id = user["id"].as_str().unwrap();
    app.server
        .put(&format!("/api/v1/users/{id}/approve"))
        .authorization_bearer(&admin)
        .await
        .assert_status_ok();

    // The approval notice rides the outbox like everything else.
    let intents = app.outbox.intents();
    assert!(intents
        .iter()
        .any(|i| i.to == "pedro@example.com" && i.subject.contains("approved")));

    let res = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "pedro@example.com", "password": "hunter2hunter2" }))
        .await;
    res.assert_status_ok();
    let auth: Value = res.json();
    assert!(auth["token"].as_str().is_some());

    // Wrong password stays a 401.
    app.server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "pedro@example.com", "password": "wrong-password" }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn unknown_referral_code_still_registers() {
    let app = test_app();
    let res = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "name": "Olga Ramirez",
            "email": "olga@example.com",
            "password": "hunter2hunter2",
            "role": "organizer",
            "referral_code": "not-a-user-id",
        }))
        .await;
    res.assert_status(axum::http::StatusCode::CREATED);
    let user: Value = res.json();
    assert!(user["referred_by"].is_null());
}

#[tokio::test]
async fn duplicate_email_registration_is_a_conflict() {
    let app = test_app();
    let body = json!({
        "name": "Pedro Sosa",
        "email": "pedro@example.com",
        "password": "hunter2hunter2",
        "role": "producer",
    });

    app.server
        .post("/api/v1/auth/register")
        .json(&body)
        .await
        .assert_status(axum::http::StatusCode::CREATED);
    app.server
        .post("/api/v1/auth/register")
        .json(&body)
        .await
        .assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_registration_is_refused() {
    let app = test_app();
    let res = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "name": "Eve",
            "email": "eve@example.com",
            "password": "hunter2hunter2",
            "role": "admin",
        }))
        .await;
    res.assert_status_forbidden();
}

#[tokio::test]
async fn file_urls_are_signed_and_guarded() {
    let app = test_app();
    let res = app
        .server
        .post("/api/v1/claims")
        .multipart(intake_form())
        .await;
    let created: Value = res.json();
    let id = created["claim_id"].as_str().unwrap().to_string();

    let token = staff_token(&app, UserRole::Handler);
    let res = app
        .server
        .get(&format!("/api/v1/claims/{id}/files/identity"))
        .authorization_bearer(&token)
        .await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert!(body["url"].as_str().unwrap().contains("expires="));

    // Unrelated network users cannot reach the files.
    let producer = staff_token(&app, UserRole::Producer);
    app.server
        .get(&format!("/api/v1/claims/{id}/files/identity"))
        .authorization_bearer(&producer)
        .await
        .assert_status_forbidden();
}
