#![allow(dead_code)]

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use tokio::net::TcpListener;
use verse_portal::{
    AppConfig, AppState, MemoryRepository, create_router,
    auth::Claims,
    config::Env,
    repository::RepositoryState,
};

/// Matches `AppConfig::default()`.
pub const TEST_JWT_SECRET: &str = "super-secure-test-secret-value-local";
/// Matches `AppConfig::default()`.
pub const ADMIN_EMAIL: &str = "admin@example.com";

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

/// Spawns the full router on an ephemeral port, backed by the in-memory
/// repository. The environment is forced to Production so the local identity
/// bypass stays out of the way and every request exercises the token flow.
pub async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new()) as RepositoryState;
    let config = AppConfig {
        env: Env::Production,
        ..AppConfig::default()
    };

    let state = AppState { repo, config };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// Signs a token with an arbitrary subject and secret, without the
/// normalization the production signer applies. Lets tests present odd-cased
/// identities and foreign-secret tokens.
pub fn encode_token(sub: &str, secret: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        iat: now as usize,
        exp: (now + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// A valid token for the given identity, signed with the configured secret.
pub fn token_for(email: &str) -> String {
    verse_portal::auth::sign_token(email, TEST_JWT_SECRET).unwrap()
}

/// A minimal valid post body owned by whoever submits it.
pub fn post_body(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "category": "History",
        "authorName": "Test Author",
        "sections": [
            { "subtitle": "Intro", "description": "<p>Body</p>" }
        ]
    })
}

/// A complete access-request submission for the given email.
pub fn access_request_body(email: &str) -> serde_json::Value {
    serde_json::json!({
        "email": email,
        "fullName": "Prospective Author",
        "country": "Ireland",
        "state": "Leinster",
        "profession": "Historian",
        "phone": "+353 1 234 5678",
        "socialLink": "https://example.com/profile"
    })
}
