//! Integration tests for the sign-up and login endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use reviewhub_api::{ApiServer, ApiServerConfig};
use reviewhub_auth::verify_password;
use reviewhub_db::entities::user;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot` method

const PASSWORD: &str = "correct horse battery";

/// Helper to create an in-memory database with migrations applied
async fn create_test_db() -> DatabaseConnection {
    let db = reviewhub_db::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    reviewhub_db::migrate(&db)
        .await
        .expect("Failed to run migrations");

    db
}

/// Helper to create a test API server
fn create_test_server(db: DatabaseConnection) -> ApiServer {
    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: true,
        jwt_secret: "test-secret".to_string(),
        session_ttl_hours: 1,
    };

    ApiServer::new(config, db)
}

fn sign_up_body(email: &str) -> Value {
    json!({
        "email": email,
        "first_name": "Test",
        "last_name": "User",
        "password": PASSWORD,
        "confirm_password": PASSWORD
    })
}

async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

#[tokio::test]
async fn test_sign_up_success() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let (status, body) = post_json(&app, "/api/auth/sign-up", &sign_up_body("test@example.com")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["first_name"], "Test");
    assert_eq!(body["last_name"], "User");

    // Password material never leaves the server
    assert!(body.get("password").is_none());
    assert!(body.get("confirm_password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_sign_up_stores_hashed_password() {
    let db = create_test_db().await;
    let app = create_test_server(db.clone()).build_router();

    let (status, _) = post_json(&app, "/api/auth/sign-up", &sign_up_body("hash@example.com")).await;
    assert_eq!(status, StatusCode::CREATED);

    let stored = user::Entity::find()
        .filter(user::Column::Email.eq("hash@example.com"))
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("User not found");

    assert!(stored.password_hash.starts_with("$argon2id$"));
    assert_ne!(stored.password_hash, PASSWORD);
    assert!(verify_password(PASSWORD, &stored.password_hash).unwrap());
    assert!(!stored.is_staff);
    assert!(!stored.is_superuser);
}

#[tokio::test]
async fn test_sign_up_duplicate_email() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let (status, _) =
        post_json(&app, "/api/auth/sign-up", &sign_up_body("duplicate@example.com")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        post_json(&app, "/api/auth/sign-up", &sign_up_body("duplicate@example.com")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["email"],
        json!(["A user with this email already exists."])
    );
}

#[tokio::test]
async fn test_sign_up_password_too_short() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let mut payload = sign_up_body("short@example.com");
    payload["password"] = json!("1234567");
    payload["confirm_password"] = json!("1234567");

    let (status, body) = post_json(&app, "/api/auth/sign-up", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["password"]
        .as_array()
        .unwrap()
        .contains(&json!(
            "This password is too short. It must contain at least 8 characters."
        )));
}

#[tokio::test]
async fn test_sign_up_password_entirely_numeric() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let mut payload = sign_up_body("numeric@example.com");
    payload["password"] = json!("123456789");
    payload["confirm_password"] = json!("123456789");

    let (status, body) = post_json(&app, "/api/auth/sign-up", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["password"], json!(["This password is entirely numeric."]));
}

#[tokio::test]
async fn test_sign_up_password_mismatch_creates_no_user() {
    let db = create_test_db().await;
    let app = create_test_server(db.clone()).build_router();

    let mut payload = sign_up_body("mismatch@example.com");
    payload["confirm_password"] = json!("something else entirely");

    let (status, body) = post_json(&app, "/api/auth/sign-up", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["non_field_errors"],
        json!(["The passwords must be the same."])
    );

    let count = user::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_sign_up_reports_all_errors_together() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let (status, body) = post_json(&app, "/api/auth/sign-up", &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["email", "first_name", "password", "confirm_password"] {
        assert_eq!(
            body[field],
            json!(["This field is required."]),
            "missing error for {field}"
        );
    }
}

#[tokio::test]
async fn test_sign_up_rejects_privilege_flags() {
    let db = create_test_db().await;
    let app = create_test_server(db.clone()).build_router();

    let mut payload = sign_up_body("staff@example.com");
    payload["is_staff"] = json!(true);
    payload["is_superuser"] = json!(true);

    let (status, body) = post_json(&app, "/api/auth/sign-up", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["is_staff"], json!(["This field is not allowed."]));
    assert_eq!(body["is_superuser"], json!(["This field is not allowed."]));

    // The account was not created at all
    let count = user::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_sign_up_last_name_is_optional() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let mut payload = sign_up_body("noname@example.com");
    payload.as_object_mut().unwrap().remove("last_name");

    let (status, body) = post_json(&app, "/api/auth/sign-up", &payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["last_name"], "");
}

#[tokio::test]
async fn test_sign_up_method_not_allowed() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    for method in ["GET", "PUT", "DELETE"] {
        let request = Request::builder()
            .uri("/api/auth/sign-up")
            .method(method)
            .body(Body::empty())
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} should not be allowed"
        );
    }
}

#[tokio::test]
async fn test_login_success() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let (status, _) = post_json(&app, "/api/auth/sign-up", &sign_up_body("login@example.com")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        &json!({"email": "login@example.com", "password": PASSWORD}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert!(body.get("expires_at").is_some());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let (status, _) = post_json(&app, "/api/auth/sign-up", &sign_up_body("wrong@example.com")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        &json!({"email": "wrong@example.com", "password": "not the password"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["non_field_errors"],
        json!(["Unable to log in with provided credentials."])
    );
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_login_unknown_email_gets_same_error() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let (status, body) = post_json(
        &app,
        "/api/auth/login",
        &json!({"email": "nobody@example.com", "password": PASSWORD}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["non_field_errors"],
        json!(["Unable to log in with provided credentials."])
    );
}

#[tokio::test]
async fn test_login_missing_fields() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let (status, body) = post_json(&app, "/api/auth/login", &json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["email"], json!(["This field is required."]));
    assert_eq!(body["password"], json!(["This field is required."]));
}

#[tokio::test]
async fn test_login_method_not_allowed() {
    let db = create_test_db().await;
    let app = create_test_server(db).build_router();

    let request = Request::builder()
        .uri("/api/auth/login")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
