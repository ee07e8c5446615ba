use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any caller who has successfully passed the
/// authentication layer. This module carries the content-mutation surface
/// (create/update/delete posts, the ownership-scoped admin listing) and the
/// access-request review surface.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being present on the router layer above this module. This guarantees that
/// all handlers receive a validated `AuthUser` struct containing the caller's
/// email and derived admin status, which is then used for all ownership
/// checks (e.g., in `update_post` and `delete_post`) and for the in-handler
/// admin checks on the access-request review endpoints.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /posts
        // Submits a new post. The stored author is always the caller.
        .route("/posts", post(handlers::create_post))
        // GET /posts/admin?page=...
        // Ownership-scoped listing: everything for the primary administrator,
        // own posts only for everyone else. 10 per page, newest first.
        .route("/posts/admin", get(handlers::get_admin_posts))
        // PUT/DELETE /posts/{id}
        // Allows a caller to modify or remove a post.
        // Strict ownership check (owner or primary admin) is enforced within
        // the handler logic.
        .route(
            "/posts/{id}",
            put(handlers::update_post).delete(handlers::delete_post),
        )
        // --- Access-Request Review ---
        // These paths authenticate here and enforce the primary-admin check in
        // the handlers; there is no ownership concept for requests.
        // GET /access-requests
        .route("/access-requests", get(handlers::get_access_requests))
        // GET/PUT/DELETE /access-requests/{id}
        .route(
            "/access-requests/{id}",
            get(handlers::get_access_request_details)
                .put(handlers::update_access_request)
                .delete(handlers::delete_access_request),
        )
}
