use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch, put},
};

/// Admin Router Module
///
/// Defines the account-management routes, exclusively accessible to the
/// configured primary administrator. These endpoints provide oversight over
/// who may publish on the platform.
///
/// Access Control:
/// This entire router is nested under '/admin' behind the authentication
/// layer; every handler then explicitly verifies the caller is the primary
/// administrator before touching the repository.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users
        // Lists all registered accounts (without password hashes).
        .route("/users", get(handlers::get_users))
        // PUT /admin/users/allow
        // Grants publishing permission to a batch of accounts by email.
        .route("/users/allow", put(handlers::allow_creation))
        // PATCH /admin/users/{id}/permission
        // Flips one account's publishing permission.
        .route(
            "/users/{id}/permission",
            patch(handlers::toggle_user_permission),
        )
        // DELETE /admin/users/{id}
        // Removes an account entirely.
        .route("/users/{id}", delete(handlers::delete_user))
}
