mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use chrono::Utc;
use common::{ADMIN_EMAIL, TEST_JWT_SECRET, encode_token};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use verse_portal::{
    ApiError, AppConfig, AppState, MemoryRepository,
    auth::{AuthUser, Claims},
    config::Env,
    repository::RepositoryState,
};

// --- Helper Functions ---

fn create_app_state(env: Env) -> AppState {
    let config = AppConfig {
        env,
        ..AppConfig::default()
    };
    AppState {
        repo: Arc::new(MemoryRepository::new()) as RepositoryState,
        config,
    }
}

/// Helper to get the mutable Parts struct from a generated Request.
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn bearer(parts: &mut Parts, token: &str) {
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let token = encode_token("writer@example.com", TEST_JWT_SECRET);
    let state = create_app_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await;

    let user = auth_user.expect("valid token should authenticate");
    assert_eq!(user.email, "writer@example.com");
    assert!(!user.is_admin);
}

#[tokio::test]
async fn test_admin_status_is_case_insensitive_and_trimmed() {
    let token = encode_token("  ADMIN@Example.com  ", TEST_JWT_SECRET);
    let state = create_app_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let user = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .expect("valid token should authenticate");
    assert_eq!(user.email, ADMIN_EMAIL);
    assert!(user.is_admin);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(matches!(auth_user, Err(ApiError::InvalidToken)));
}

#[tokio::test]
async fn test_auth_failure_with_foreign_secret() {
    // Signed by someone who does not hold the configured secret.
    let token = encode_token("writer@example.com", "some-other-secret");
    let state = create_app_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(matches!(auth_user, Err(ApiError::InvalidToken)));
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "writer@example.com".to_string(),
        iat: (now - 7200) as usize,
        exp: (now - 3600) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(matches!(auth_user, Err(ApiError::InvalidToken)));
}

#[tokio::test]
async fn test_blank_identity_is_a_distinct_failure() {
    // The token verifies, but it cannot attribute an action to anyone.
    let token = encode_token("   ", TEST_JWT_SECRET);
    let state = create_app_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    bearer(&mut parts, &token);

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(matches!(auth_user, Err(ApiError::MissingIdentity)));
}

#[tokio::test]
async fn test_local_bypass_success() {
    let state = create_app_state(Env::Local);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-email"),
        header::HeaderValue::from_static("Writer@Example.COM "),
    );

    let user = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .expect("local bypass should authenticate");
    assert_eq!(user.email, "writer@example.com");
    assert!(!user.is_admin);
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let state = create_app_state(Env::Production);

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    // Provide ONLY the local bypass header.
    parts.headers.insert(
        header::HeaderName::from_static("x-user-email"),
        header::HeaderValue::from_static("writer@example.com"),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(matches!(auth_user, Err(ApiError::InvalidToken)));
}
