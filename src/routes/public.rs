use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in): post reads, access-request submission, and the
/// account gateway (signup/login).
///
/// Security Mandate:
/// Nothing in this module may mutate a post or reveal an access request.
/// Post mutation lives behind the authenticated router; access-request review
/// is admin-only.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Liveness banner, answered immediately.
        .route("/", get(|| async { "Verse Portal API is live" }))
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // GET /posts
        // Lists every post, newest first.
        .route("/posts", get(handlers::get_posts))
        // GET /posts/{id}
        // Retrieves the detailed view of a single post.
        .route("/posts/{id}", get(handlers::get_post_details))
        // POST /access-requests
        // Accepts an admin-access application from any visitor. Duplicate
        // emails are rejected atomically at the store layer.
        .route("/access-requests", post(handlers::submit_access_request))
        // POST /auth/signup
        // Registers an author account; the password is hashed before storage.
        .route("/auth/signup", post(handlers::signup))
        // POST /auth/login
        // Verifies credentials and issues the bearer token used by all gated routes.
        .route("/auth/login", post(handlers::login))
}
