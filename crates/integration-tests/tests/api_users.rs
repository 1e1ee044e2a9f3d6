//! Integration tests for account routes.
//!
//! Tests without `#[ignore]` never reach the database. The rest need
//! `RECIPE_API_TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p recipe-book-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use recipe_book_integration_tests::{TestContext, unique_email};

// ============================================================================
// Routing & Auth (no database)
// ============================================================================

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new();
    let (status, _) = ctx.send_raw(
        axum::http::Request::get("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let ctx = TestContext::new();
    let (status, body) = ctx.json(Method::GET, "/api/user/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_me_rejects_unknown_scheme() {
    let ctx = TestContext::new();
    let request = axum::http::Request::get("/api/user/me")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = ctx.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_post_me_not_allowed() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .json(Method::POST, "/api/user/me", None, Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_trailing_slash_is_normalized() {
    let ctx = TestContext::new();
    let (status, _) = ctx.json(Method::GET, "/api/user/me/", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let ctx = TestContext::new();
    let request = axum::http::Request::get("/health")
        .header("x-request-id", "req-123")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-123"
    );
}

// ============================================================================
// Validation before the database
// ============================================================================

#[tokio::test]
async fn test_create_user_requires_email_and_password() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .json(Method::POST, "/api/user/create", None, Some(json!({"name": "x"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["email"].is_array());
    assert!(body["fields"]["password"].is_array());
}

#[tokio::test]
async fn test_create_user_short_password() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/user/create",
            None,
            Some(json!({"email": "test@example.com", "password": "pw", "name": "Test"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["password"].is_array());
}

#[tokio::test]
async fn test_create_user_invalid_email() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/user/create",
            None,
            Some(json!({"email": "not-an-email", "password": "testpass123"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["email"].is_array());
}

#[tokio::test]
async fn test_token_requires_fields() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .json(Method::POST, "/api/user/token", None, Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_blank_password() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .json(
            Method::POST,
            "/api/user/token",
            None,
            Some(json!({"email": "test@example.com", "password": ""})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_reports_only_missing_field() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/user/token",
            None,
            Some(json!({"email": "test@example.com"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["password"].is_array());
    assert!(body["fields"].get("email").is_none());
}

#[tokio::test]
async fn test_wrongly_typed_field_is_field_error() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/user/create",
            None,
            Some(json!({"email": 5, "password": "testpass123"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation failed");
    assert!(body["fields"]["email"].is_array());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/user/create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let (status, body) = ctx.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_body_without_json_content_type_is_rejected() {
    let ctx = TestContext::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/user/create")
        .body(Body::from(r#"{"email": "test@example.com"}"#))
        .unwrap();
    let (status, body) = ctx.send(request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["error"].is_string());
}

// ============================================================================
// Database-backed scenarios
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_register_then_authenticate() {
    let ctx = TestContext::with_database().await;
    let (email, token) = ctx.user_with_token().await;

    let (status, body) = ctx.get("/api/user/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"email": email, "name": "Test User"}));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_email_domain_is_normalized() {
    let ctx = TestContext::with_database().await;
    let local = unique_email().replace("@example.com", "");
    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/user/create",
            None,
            Some(json!({"email": format!("{local}@EXAMPLE.com"), "password": "testpass123"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], format!("{local}@example.com"));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_duplicate_email_is_case_insensitive() {
    let ctx = TestContext::with_database().await;
    let (email, _) = ctx.user_with_token().await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/user/create",
            None,
            Some(json!({"email": email.to_uppercase(), "password": "testpass123"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["email"].is_array());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_token_wrong_password() {
    let ctx = TestContext::with_database().await;
    let (email, _) = ctx.user_with_token().await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/api/user/token",
            None,
            Some(json!({"email": email, "password": "wrongpass"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_bearer_scheme_accepted() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let request = axum::http::Request::get("/api/user/me")
        .header("authorization", format!("Bearer {token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_unknown_token_rejected() {
    let ctx = TestContext::with_database().await;
    let (status, _) = ctx.get("/api/user/me", "deadbeef").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_patch_profile_updates_name_and_password() {
    let ctx = TestContext::with_database().await;
    let (email, token) = ctx.user_with_token().await;

    let (status, body) = ctx
        .json(
            Method::PATCH,
            "/api/user/me",
            Some(&token),
            Some(json!({"name": "Updated name", "password": "newpassword123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Updated name");

    let (status, _) = ctx
        .json(
            Method::POST,
            "/api/user/token",
            None,
            Some(json!({"email": email, "password": "newpassword123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_put_profile_requires_email_and_name() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let (status, body) = ctx
        .json(
            Method::PUT,
            "/api/user/me",
            Some(&token),
            Some(json!({"name": "Only name"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["email"].is_array());
}
