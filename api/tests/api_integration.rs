use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use feedback_api::middleware::auth::{hash_password, TokenIssuer};
use feedback_api::{build_router, ApiState, ServerConfig};
use feedback_forms::{
    InMemoryContactStore, InMemoryFormStore, InMemoryUserStore, RepoResult, RepositoryError,
    ResponseRecord, ResponseStore, UserAccount, UserStore,
};
use serde_json::{json, Value};
use uuid::Uuid;

fn server() -> TestServer {
    let config = ServerConfig {
        jwt_secret: "integration-secret".into(),
        secure_cookies: false,
        ..ServerConfig::default()
    };
    TestServer::new(build_router(ApiState::in_memory(config))).unwrap()
}

fn bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

async fn register(server: &TestServer, email: &str) -> String {
    let resp = server
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": "secret-pass", "name": "Test User" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::CREATED);
    let body: Value = resp.json();
    body["token"].as_str().unwrap().to_string()
}

async fn create_form(server: &TestServer, token: &str) -> String {
    let resp = bearer(server.post("/api/forms"), token)
        .json(&json!({
            "title": "Team survey",
            "elements": [
                { "id": "q1", "type": "single-choice", "question": "Favourite colour",
                  "options": ["Red", "Blue"] },
                { "id": "q2", "type": "number", "question": "Age" },
                { "id": "q3", "type": "short-text" }
            ]
        }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::CREATED);
    let body: Value = resp.json();
    assert_eq!(body["status"], "draft");
    body["id"].as_str().unwrap().to_string()
}

async fn publish(server: &TestServer, token: &str, form_id: &str) -> String {
    let resp = bearer(server.patch(&format!("/api/forms/{form_id}/publish")), token).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["form"]["status"], "published");
    body["form"]["shareCode"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let resp = server().get("/health").await;
    assert_eq!(resp.status_code(), 200);
    let body: Value = resp.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn register_sets_cookie_and_login_checks_password() {
    let server = server();
    let resp = server
        .post("/api/auth/register")
        .json(&json!({ "email": "Ann@Example.com", "password": "secret-pass", "name": "Ann" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::CREATED);
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("token="));
    let body: Value = resp.json();
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert!(body["user"].get("passwordHash").is_none());

    let dup = server
        .post("/api/auth/register")
        .json(&json!({ "email": "ann@example.com", "password": "secret-pass", "name": "Ann" }))
        .await;
    assert_eq!(dup.status_code(), StatusCode::BAD_REQUEST);

    let bad = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ann@example.com", "password": "wrong-pass" }))
        .await;
    assert_eq!(bad.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = bad.json();
    assert_eq!(body["error"], "Invalid credentials");

    let ok = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ann@example.com", "password": "secret-pass" }))
        .await;
    assert_eq!(ok.status_code(), StatusCode::OK);
    assert!(ok.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn me_reports_anonymous_caller() {
    let server = server();
    let resp = server.get("/api/auth/me").await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json();
    assert!(body["user"].is_null());

    let token = register(&server, "bob@example.com").await;
    let resp = server
        .get("/api/auth/me")
        .add_header(header::COOKIE, HeaderValue::from_str(&format!("token={token}")).unwrap())
        .await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["user"]["email"], "bob@example.com");
}

#[tokio::test]
async fn analytics_requires_session() {
    let server = server();
    let resp = server
        .get("/api/forms/00000000-0000-0000-0000-000000000000/analytics")
        .await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn analytics_for_unknown_form_is_not_found() {
    let server = server();
    let token = register(&server, "owner@example.com").await;

    let missing = bearer(
        server.get(&format!("/api/forms/{}/analytics", uuid::Uuid::new_v4())),
        &token,
    )
    .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    let body: Value = missing.json();
    assert_eq!(body["error"], "Form not found");

    let malformed = bearer(server.get("/api/forms/not-a-uuid/analytics"), &token).await;
    assert_eq!(malformed.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn analytics_of_form_without_responses() {
    let server = server();
    let owner = register(&server, "owner@example.com").await;
    let form_id = create_form(&server, &owner).await;

    let resp = bearer(server.get(&format!("/api/forms/{form_id}/analytics")), &owner).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["totalResponses"], 0);
    assert_eq!(body["completionRate"], 0);
    assert_eq!(body["trends"].as_array().unwrap().len(), 7);
    assert_eq!(body["perQuestion"]["q1"]["optionCounts"], json!({ "Red": 0, "Blue": 0 }));
    assert_eq!(body["perQuestion"]["q2"]["count"], 0);
    assert!(body["perQuestion"]["q2"]["min"].is_null());
}

#[tokio::test]
async fn submit_then_read_analytics() {
    let server = server();
    let owner = register(&server, "owner@example.com").await;
    let alice = register(&server, "alice@example.com").await;
    let carol = register(&server, "carol@example.com").await;

    let form_id = create_form(&server, &owner).await;
    publish(&server, &owner, &form_id).await;

    for (token, data) in [
        (&alice, json!({ "q1": "Red", "q2": 30, "q3": "hello" })),
        (&carol, json!({ "q1": "Red", "q2": "40" })),
    ] {
        let resp = bearer(server.post(&format!("/api/forms/{form_id}/responses")), token)
            .json(&json!({ "data": data }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::CREATED);
    }

    let resp = bearer(server.get(&format!("/api/forms/{form_id}/analytics")), &owner).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["totalResponses"], 2);
    assert_eq!(body["completionRate"], 100);
    assert_eq!(body["perQuestion"]["q1"]["optionCounts"], json!({ "Red": 2, "Blue": 0 }));
    assert_eq!(body["perQuestion"]["q2"]["average"], 35.0);
    assert_eq!(body["perQuestion"]["q2"]["min"], 30.0);
    assert_eq!(body["perQuestion"]["q2"]["max"], 40.0);
    assert_eq!(body["perQuestion"]["q3"]["responseCount"], 1);
    assert_eq!(body["perQuestion"]["q3"]["averageLength"], 5);

    let today: u64 = body["trends"]
        .as_array()
        .unwrap()
        .iter()
        .map(|bucket| bucket["responseCount"].as_u64().unwrap())
        .sum();
    assert_eq!(today, 2);

    // other users see nothing
    let resp = bearer(server.get(&format!("/api/forms/{form_id}/analytics")), &alice).await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submission_rules() {
    let server = server();
    let owner = register(&server, "owner@example.com").await;
    let alice = register(&server, "alice@example.com").await;
    let form_id = create_form(&server, &owner).await;
    let submit_path = format!("/api/forms/{form_id}/responses");

    // drafts are closed
    let resp = bearer(server.post(&submit_path), &alice)
        .json(&json!({ "data": { "q1": "Red" } }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);

    publish(&server, &owner, &form_id).await;

    let resp = bearer(server.post(&submit_path), &owner)
        .json(&json!({ "data": { "q1": "Red" } }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);

    let resp = bearer(server.post(&submit_path), &alice).json(&json!({})).await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);

    let resp = bearer(server.post(&submit_path), &alice)
        .json(&json!({ "data": { "q1": "Red" } }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::CREATED);

    let resp = bearer(server.post(&submit_path), &alice)
        .json(&json!({ "data": { "q1": "Blue" } }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::CONFLICT);

    let mine = bearer(server.get("/api/responses"), &alice).await;
    assert_eq!(mine.status_code(), StatusCode::OK);
    let body: Value = mine.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["form"]["id"], form_id.as_str());

    let none = bearer(server.get("/api/responses"), &owner).await;
    assert_eq!(none.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn share_code_lookup() {
    let server = server();
    let owner = register(&server, "owner@example.com").await;
    let alice = register(&server, "alice@example.com").await;
    let form_id = create_form(&server, &owner).await;
    let code = publish(&server, &owner, &form_id).await;
    assert_eq!(code.len(), 8);

    let resp = bearer(server.get(&format!("/api/forms/share/{code}")), &alice).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["form"]["id"], form_id.as_str());
    assert_eq!(body["owner"]["email"], "owner@example.com");

    let resp = bearer(server.post(&format!("/api/forms/{form_id}/responses")), &alice)
        .json(&json!({ "data": { "q1": "Blue" } }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::CREATED);
    let resp = bearer(server.get(&format!("/api/forms/share/{code}")), &alice).await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);

    let resp = bearer(server.patch(&format!("/api/forms/{form_id}/unpublish")), &owner).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let resp = bearer(server.get(&format!("/api/forms/share/{code}")), &owner).await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_owner_may_modify_form() {
    let server = server();
    let owner = register(&server, "owner@example.com").await;
    let mallory = register(&server, "mallory@example.com").await;
    let form_id = create_form(&server, &owner).await;
    let path = format!("/api/forms/{form_id}");

    let resp = bearer(server.put(&path), &mallory)
        .json(&json!({ "title": "Mine now", "elements": [{ "id": "x", "type": "number" }] }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);

    let resp = bearer(server.delete(&path), &mallory).await;
    assert_eq!(resp.status_code(), StatusCode::FORBIDDEN);

    let resp = bearer(server.patch(&format!("{path}/publish")), &mallory).await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);

    let resp = bearer(server.put(&path), &owner)
        .json(&json!({ "title": "  ", "elements": [] }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);

    let resp = bearer(server.delete(&path), &owner).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let resp = bearer(server.get(&path), &owner).await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_counts_forms_by_status() {
    let server = server();
    let owner = register(&server, "owner@example.com").await;
    let published = create_form(&server, &owner).await;
    create_form(&server, &owner).await;
    publish(&server, &owner, &published).await;

    let resp = bearer(server.get("/api/dashboard"), &owner).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["activeForms"], 1);
    assert_eq!(body["draftedForms"], 1);
    assert_eq!(body["totalResponses"], 0);
    assert_eq!(body["recentForms"].as_array().unwrap().len(), 2);
}

/// Response store whose backend is unreachable.
struct OfflineResponses;

#[axum::async_trait]
impl ResponseStore for OfflineResponses {
    async fn insert(&self, _response: &ResponseRecord) -> RepoResult<()> {
        Err(RepositoryError::Storage("disk offline".into()))
    }

    async fn get(&self, _id: Uuid) -> RepoResult<Option<ResponseRecord>> {
        Err(RepositoryError::Storage("disk offline".into()))
    }

    async fn list_by_form(&self, _form_id: Uuid) -> RepoResult<Vec<ResponseRecord>> {
        Err(RepositoryError::Storage("disk offline".into()))
    }

    async fn list_by_respondent(&self, _respondent_id: Uuid) -> RepoResult<Vec<ResponseRecord>> {
        Err(RepositoryError::Storage("disk offline".into()))
    }

    async fn find_by_respondent(
        &self,
        _form_id: Uuid,
        _respondent_id: Uuid,
    ) -> RepoResult<Option<ResponseRecord>> {
        Err(RepositoryError::Storage("disk offline".into()))
    }

    async fn delete(&self, _id: Uuid) -> RepoResult<bool> {
        Err(RepositoryError::Storage("disk offline".into()))
    }

    async fn delete_by_form(&self, _form_id: Uuid) -> RepoResult<usize> {
        Err(RepositoryError::Storage("disk offline".into()))
    }
}

#[tokio::test]
async fn analytics_store_failure_is_opaque() {
    let config = ServerConfig {
        jwt_secret: "integration-secret".into(),
        secure_cookies: false,
        ..ServerConfig::default()
    };
    let state = ApiState::new(
        config,
        Arc::new(InMemoryFormStore::new()),
        Arc::new(OfflineResponses),
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryContactStore::new()),
    );
    let server = TestServer::new(build_router(state)).unwrap();
    let token = register(&server, "owner@example.com").await;
    let form_id = create_form(&server, &token).await;

    let resp = bearer(server.get(&format!("/api/forms/{form_id}/analytics")), &token).await;
    assert_eq!(resp.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text(), r#"{"error":"Internal server error"}"#);
}

#[tokio::test]
async fn default_config_accepts_no_forged_session() {
    assert!(ServerConfig::default().validate().is_err());

    let users = Arc::new(InMemoryUserStore::new());
    let victim = UserAccount::new("victim@example.com", "Victim", hash_password("secret-pass").unwrap());
    users.insert(&victim).await.unwrap();
    let state = ApiState::new(
        ServerConfig::default(),
        Arc::new(InMemoryFormStore::new()),
        Arc::new(feedback_forms::InMemoryResponseStore::new()),
        users,
        Arc::new(InMemoryContactStore::new()),
    );
    let server = TestServer::new(build_router(state)).unwrap();

    let old_default = TokenIssuer::new(b"feedback-dev-secret-change-in-production", 3600)
        .issue(&victim)
        .unwrap();
    let resp = bearer(server.get("/api/auth/me"), &old_default).await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);

    let claims = json!({
        "sub": victim.id,
        "email": victim.email,
        "iat": chrono::Utc::now().timestamp(),
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    let unkeyed = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b""),
    )
    .unwrap();
    let resp = bearer(server.get("/api/auth/me"), &unkeyed).await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn contact_requires_every_field() {
    let server = server();
    let resp = server
        .post("/api/contact")
        .json(&json!({ "name": "Ann", "email": "ann@example.com", "message": "Hello" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["message"], "Success");

    let resp = server
        .post("/api/contact")
        .json(&json!({ "name": "Ann", "email": "ann@example.com" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["error"], "Missing fields");

    let resp = server
        .post("/api/contact")
        .json(&json!({ "name": "  ", "email": "ann@example.com", "message": "Hello" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn change_password_replaces_login_secret() {
    let server = server();
    let token = register(&server, "ann@example.com").await;

    let resp = bearer(server.post("/api/auth/change-password"), &token)
        .json(&json!({ "password": "new-secret" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::OK);

    let resp = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ann@example.com", "password": "secret-pass" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    let resp = server
        .post("/api/auth/login")
        .json(&json!({ "email": "ann@example.com", "password": "new-secret" }))
        .await;
    assert_eq!(resp.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn lifecycle_transitions_use_patch() {
    let server = server();
    let token = register(&server, "owner@example.com").await;
    let form_id = create_form(&server, &token).await;

    let resp = bearer(server.post(&format!("/api/forms/{form_id}/publish")), &token).await;
    assert_eq!(resp.status_code(), StatusCode::METHOD_NOT_ALLOWED);

    publish(&server, &token, &form_id).await;
    let resp = bearer(server.patch(&format!("/api/forms/{form_id}/archive")), &token).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body["form"]["status"], "archived");
}
