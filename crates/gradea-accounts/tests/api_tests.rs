//! Integration tests for the account backend API.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use gradea_accounts::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    Backend,
};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Create a test app with in-memory identity and storage.
fn create_test_app() -> Router {
    let state = AppState::new(Backend::memory());
    create_router_with_rate_limit(state, RateLimitState::permissive())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn signup_admin(app: &Router, email: &str, team_id: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/v1/admins",
        Some(json!({
            "email": email,
            "password": "secret123",
            "teamId": team_id,
            "profile": { "name": "Ms. Osei", "department": "Math" }
        })),
    )
    .await
}

async fn signup_student(app: &Router, email: &str, team_id: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/v1/students",
        Some(json!({
            "email": email,
            "password": "secret123",
            "teamId": team_id,
            "profile": { "name": "Kofi", "studentId": "S-17" }
        })),
    )
    .await
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["account_count"], 0);
    assert_eq!(json["identity_healthy"], true);
}

#[tokio::test]
async fn test_admin_signup_claims_team() {
    let app = create_test_app();

    let (status, json) = signup_admin(&app, "osei@school.edu", "TEAM001").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["teamId"], "TEAM001");
    assert_eq!(json["role"], "admin");

    let (status, json) = send(&app, Method::GET, "/v1/teams/TEAM001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["valid"], true);

    let (_, json) = send(&app, Method::GET, "/v1/teams/NOPE99", None).await;
    assert_eq!(json["valid"], false);

    let (_, json) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(json["account_count"], 1);
}

#[tokio::test]
async fn test_duplicate_team_id_conflict() {
    let app = create_test_app();

    signup_admin(&app, "osei@school.edu", "TEAM001").await;
    let (status, json) = signup_admin(&app, "mensah@school.edu", "TEAM001").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "TEAM_ID_TAKEN");
}

#[tokio::test]
async fn test_short_team_id_rejected() {
    let app = create_test_app();

    let (status, json) = signup_admin(&app, "osei@school.edu", "T1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let app = create_test_app();

    let (status, json) = signup_admin(&app, "not-an-email", "TEAM001").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_reserved_profile_field_rejected() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        Method::POST,
        "/v1/admins",
        Some(json!({
            "email": "osei@school.edu",
            "password": "secret123",
            "teamId": "TEAM001",
            "profile": { "role": "student" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_student_signup_unknown_team() {
    let app = create_test_app();

    let (status, json) = signup_student(&app, "kofi@school.edu", "NOPE99").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "INVALID_TEAM");

    let (_, json) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(json["account_count"], 0);
}

#[tokio::test]
async fn test_student_joins_team() {
    let app = create_test_app();

    let (_, admin) = signup_admin(&app, "osei@school.edu", "TEAM001").await;
    let admin_uid = admin["uid"].as_str().unwrap().to_string();

    let (status, student) = signup_student(&app, "kofi@school.edu", "TEAM001").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(student["adminUid"], admin_uid.as_str());
    assert_eq!(student["role"], "student");
    let student_uid = student["uid"].as_str().unwrap();

    let (status, role) = send(
        &app,
        Method::GET,
        &format!("/v1/accounts/{}/role", student_uid),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role["role"], "student");
    assert_eq!(role["teamId"], "TEAM001");
    assert_eq!(role["adminUid"], admin_uid.as_str());

    let (status, count) = send(
        &app,
        Method::GET,
        &format!("/v1/admins/{}/students/count", admin_uid),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn test_email_in_use() {
    let app = create_test_app();

    signup_admin(&app, "osei@school.edu", "TEAM001").await;
    let (status, json) = signup_student(&app, "osei@school.edu", "TEAM001").await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "EMAIL_IN_USE");
}

#[tokio::test]
async fn test_sign_in_reports_role() {
    let app = create_test_app();
    signup_admin(&app, "osei@school.edu", "TEAM001").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/v1/sessions",
        Some(json!({ "email": "osei@school.edu", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["role"], "admin");
    assert_eq!(json["email"], "osei@school.edu");

    let (status, json) = send(
        &app,
        Method::POST,
        "/v1/sessions",
        Some(json!({ "email": "osei@school.edu", "password": "wrong-one" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "WRONG_PASSWORD");
}

#[tokio::test]
async fn test_role_not_found() {
    let app = create_test_app();

    let (status, json) = send(&app, Method::GET, "/v1/accounts/ghost/role", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_profile_round_trip() {
    let app = create_test_app();
    signup_admin(&app, "osei@school.edu", "TEAM001").await;
    let (_, student) = signup_student(&app, "kofi@school.edu", "TEAM001").await;
    let uri = format!("/v1/accounts/{}/profile", student["uid"].as_str().unwrap());

    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "phone": "555-0101" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let profile = &json["profile"];
    assert_eq!(profile["phone"], "555-0101");
    assert_eq!(profile["name"], "Kofi");
    assert_eq!(profile["role"], "student");
    assert!(profile["updatedAt"].is_string());
    assert_eq!(profile["startDate"].as_str().unwrap().len(), 10);
}

#[tokio::test]
async fn test_profile_unknown_account() {
    let app = create_test_app();

    let (status, _) = send(&app, Method::GET, "/v1/accounts/ghost/profile", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/v1/accounts/ghost/profile",
        Some(json!({ "phone": "555-0101" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_messages() {
    let app = create_test_app();
    let (_, admin) = signup_admin(&app, "osei@school.edu", "TEAM001").await;
    let admin_uid = admin["uid"].as_str().unwrap();

    let (status, json) = send(
        &app,
        Method::POST,
        &format!("/v1/admins/{}/messages", admin_uid),
        Some(json!({ "message": "Quiz on Friday" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json["id"].is_string());

    let (status, json) = send(
        &app,
        Method::POST,
        "/v1/messages",
        Some(json!({ "senderUid": admin_uid, "receiverUid": "s1", "message": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_rate_limiting() {
    let state = AppState::new(Backend::memory());
    let app = create_router_with_rate_limit(state, RateLimitState::new(1));

    let (status, _) = send(&app, Method::GET, "/v1/teams/TEAM001", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, Method::GET, "/v1/teams/TEAM001", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["code"], "RATE_LIMIT_EXCEEDED");

    // Health sits outside the limiter.
    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
