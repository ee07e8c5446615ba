use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    models::{
        AccessRequest, AllowCreationRequest, LoginRequest, LoginResponse, Post, PostPayload,
        SignupRequest, SubmitAccessRequest, UpdateAccessRequest, User,
    },
    security,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

/// Fixed page size for the ownership-scoped admin listing.
const ADMIN_PAGE_SIZE: i64 = 10;

/// The category sentinel that redirects to the caller-supplied custom string.
const CATEGORY_SENTINEL: &str = "Others";

// --- Filter Structs ---

/// PageFilter
///
/// Defines the accepted query parameters for the admin post listing endpoint
/// (GET /posts/admin). Used by Axum's Query extractor to safely bind HTTP
/// query parameters.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageFilter {
    /// 1-based page number; defaults to the first page.
    pub page: Option<i64>,
}

// --- Validation & Category Resolution ---

/// validate_post_payload
///
/// Enforces the invariants every stored post must satisfy: non-blank title,
/// category and author name, at least one section, and no section with a
/// blank subtitle or description. Applied to creates and to full-document
/// updates alike, so the invariants hold at all times.
fn validate_post_payload(payload: &PostPayload) -> Result<(), ApiError> {
    if payload.title.trim().is_empty()
        || payload.author_name.trim().is_empty()
        || payload.category.trim().is_empty()
        || payload.sections.is_empty()
    {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    }

    for section in &payload.sections {
        if section.subtitle.trim().is_empty() || section.description.trim().is_empty() {
            return Err(ApiError::Validation(
                "Every section needs a subtitle and a description".to_string(),
            ));
        }
    }

    Ok(())
}

/// resolve_category
///
/// Replaces the "Others" sentinel with the trimmed custom category, falling
/// back to "Uncategorized" when that is blank. The raw custom string is kept
/// only when the sentinel was used, so the edit form can round-trip it.
fn resolve_category(payload: &mut PostPayload) {
    if payload.category == CATEGORY_SENTINEL {
        let custom = payload.custom_category.trim();
        payload.category = if custom.is_empty() {
            "Uncategorized".to_string()
        } else {
            custom.to_string()
        };
    } else {
        payload.custom_category = String::new();
    }
}

// --- Post Handlers ---

/// get_posts
///
/// [Public Route] Lists every post, newest first.
#[utoipa::path(
    get,
    path = "/posts",
    responses((status = 200, description = "All posts, newest first", body = [Post]))
)]
pub async fn get_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.repo.get_posts().await?;
    Ok(Json(posts))
}

/// get_post_details
///
/// [Public Route] Retrieves a single post by ID.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    match state.repo.get_post(id).await? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound("Article not found".to_string())),
    }
}

/// get_admin_posts
///
/// [Authenticated Route] Lists posts scoped by ownership, 10 per page,
/// newest first: the primary administrator sees every post, any other
/// authenticated author sees only their own.
#[utoipa::path(
    get,
    path = "/posts/admin",
    params(PageFilter),
    responses((status = 200, description = "Posts visible to the caller", body = [Post]))
)]
pub async fn get_admin_posts(
    AuthUser { email, is_admin }: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<PageFilter>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let page = filter.page.unwrap_or(1).max(1);
    let offset = (page - 1) * ADMIN_PAGE_SIZE;

    let posts = if is_admin {
        state.repo.get_all_posts(ADMIN_PAGE_SIZE, offset).await?
    } else {
        state
            .repo
            .get_posts_by_author(&email, ADMIN_PAGE_SIZE, offset)
            .await?
    };

    Ok(Json(posts))
}

/// create_post
///
/// [Authenticated Route] Handles the submission of a new post.
///
/// The stored `author_email` is always the authenticated caller; any author
/// email present in the request body is ignored. The category sentinel is
/// resolved before the payload reaches the repository.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = PostPayload,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Missing required fields")
    )
)]
pub async fn create_post(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Json(mut payload): Json<PostPayload>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    validate_post_payload(&payload)?;
    resolve_category(&mut payload);

    let post = state.repo.create_post(payload, &email).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route] Full-document replace of a post's fields.
///
/// *Authorization*: fetch first, so an unknown id is a 404 and a known id
/// owned by someone else is a 403 — distinct failures. Only the owning
/// author or the primary administrator may proceed. `author_email` is never
/// altered by this operation.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = PostPayload,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    AuthUser { email, is_admin }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<PostPayload>,
) -> Result<Json<Post>, ApiError> {
    let existing = state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Article not found".to_string()))?;

    if !is_admin && existing.author_email != email {
        return Err(ApiError::Forbidden(
            "Cannot edit others' articles".to_string(),
        ));
    }

    validate_post_payload(&payload)?;
    resolve_category(&mut payload);

    match state.repo.update_post(id, payload).await? {
        Some(post) => Ok(Json(post)),
        // The row vanished between the fetch and the write.
        None => Err(ApiError::NotFound("Article not found".to_string())),
    }
}

/// delete_post
///
/// [Authenticated Route] Removes a post.
///
/// *Authorization*: same fetch-then-check flow as `update_post` — 404 for an
/// unknown id, 403 when the caller is neither the owner nor the primary
/// administrator.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    AuthUser { email, is_admin }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Article not found".to_string()))?;

    if !is_admin && existing.author_email != email {
        return Err(ApiError::Forbidden(
            "Cannot delete others' articles".to_string(),
        ));
    }

    if state.repo.delete_post(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Article not found".to_string()))
    }
}

// --- Access-Request Handlers ---

/// submit_access_request
///
/// [Public Route] Accepts an admin-access application from any visitor.
///
/// Every field must be present and non-blank — including `phone`, even
/// though the stored schema treats it as optional. The insert is atomic on
/// the unique email index: a duplicate submission is a 409 with no
/// check-then-write window.
#[utoipa::path(
    post,
    path = "/access-requests",
    request_body = SubmitAccessRequest,
    responses(
        (status = 201, description = "Submitted", body = AccessRequest),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Duplicate email")
    )
)]
pub async fn submit_access_request(
    State(state): State<AppState>,
    Json(payload): Json<SubmitAccessRequest>,
) -> Result<(StatusCode, Json<AccessRequest>), ApiError> {
    let phone = payload.phone.as_deref().unwrap_or("");
    if payload.email.trim().is_empty()
        || payload.full_name.trim().is_empty()
        || payload.country.trim().is_empty()
        || payload.state.trim().is_empty()
        || payload.profession.trim().is_empty()
        || payload.social_link.trim().is_empty()
        || phone.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "All required fields must be filled".to_string(),
        ));
    }

    let request = AccessRequest {
        id: Uuid::new_v4(),
        email: payload.email,
        full_name: payload.full_name,
        country: payload.country,
        state: payload.state,
        profession: payload.profession,
        phone: payload.phone,
        social_link: payload.social_link,
        ..AccessRequest::default()
    };

    match state.repo.create_access_request(request).await? {
        Some(saved) => Ok((StatusCode::CREATED, Json(saved))),
        None => Err(ApiError::Conflict(
            "A request with this email has already been submitted".to_string(),
        )),
    }
}

/// require_admin
///
/// The access-request review surface has no ownership concept: only the
/// primary administrator may pass.
fn require_admin(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        ))
    }
}

/// get_access_requests
///
/// [Admin Route] Lists every pending application, newest first.
#[utoipa::path(
    get,
    path = "/access-requests",
    responses(
        (status = 200, description = "All requests, newest first", body = [AccessRequest]),
        (status = 403, description = "Not the administrator")
    )
)]
pub async fn get_access_requests(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AccessRequest>>, ApiError> {
    require_admin(&auth)?;
    let requests = state.repo.get_access_requests().await?;
    Ok(Json(requests))
}

/// get_access_request_details
///
/// [Admin Route] Retrieves a single application by ID.
#[utoipa::path(
    get,
    path = "/access-requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Found", body = AccessRequest),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_access_request_details(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccessRequest>, ApiError> {
    require_admin(&auth)?;
    match state.repo.get_access_request(id).await? {
        Some(request) => Ok(Json(request)),
        None => Err(ApiError::NotFound("Request not found".to_string())),
    }
}

/// update_access_request
///
/// [Admin Route] Merges the provided fields into an application; fields
/// absent from the payload keep their stored values.
#[utoipa::path(
    put,
    path = "/access-requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = UpdateAccessRequest,
    responses(
        (status = 200, description = "Updated", body = AccessRequest),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_access_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccessRequest>,
) -> Result<Json<AccessRequest>, ApiError> {
    require_admin(&auth)?;
    match state.repo.update_access_request(id, payload).await? {
        Some(request) => Ok(Json(request)),
        None => Err(ApiError::NotFound(
            "Request not found for update".to_string(),
        )),
    }
}

/// delete_access_request
///
/// [Admin Route] Removes an application, typically after it has been
/// reviewed out-of-band.
#[utoipa::path(
    delete,
    path = "/access-requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_access_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&auth)?;
    if state.repo.delete_access_request(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(
            "Request not found for deletion".to_string(),
        ))
    }
}

// --- Account Handlers ---

/// signup
///
/// [Public Route] Registers an author account. The email is normalized, the
/// password is hashed with Argon2id before storage, and admin status is
/// derived from the configured primary-administrator address.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 400, description = "Missing fields or weak password"),
        (status = 409, description = "Email or username taken")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if payload.username.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.password.is_empty()
    {
        return Err(ApiError::Validation(
            "Username, email and password are required".to_string(),
        ));
    }

    let email = auth::normalize_email(&payload.email);
    let username = payload.username.trim().to_string();

    // Friendly, field-specific conflicts; the unique indexes remain the
    // backstop if two signups race past these checks.
    if state.repo.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }
    if state.repo.get_user_by_username(&username).await?.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let password_hash = security::hash_password(&payload.password)?;
    let is_admin = auth::is_primary_admin(&email, &state.config);

    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        password_hash,
        is_admin,
        // The primary administrator can always publish; everyone else waits
        // for a grant.
        is_allowed_to_create: is_admin,
        ..User::default()
    };

    let created = state.repo.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// login
///
/// [Public Route] Verifies credentials and issues the signed bearer token
/// every gated operation requires. A wrong email and a wrong password yield
/// the same response.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = auth::normalize_email(&payload.email);

    let Some(user) = state.repo.get_user_by_email(&email).await? else {
        return Err(ApiError::Validation("Invalid credentials".to_string()));
    };

    if !security::verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::Validation("Invalid credentials".to_string()));
    }

    let token = auth::sign_token(&user.email, &state.config.jwt_secret)?;
    Ok(Json(LoginResponse { token, user }))
}

// --- User-Management Handlers (Admin) ---

/// get_users
///
/// [Admin Route] Lists every registered account (password hashes are never
/// serialized).
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All accounts", body = [User]))
)]
pub async fn get_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_admin(&auth)?;
    let users = state.repo.get_users().await?;
    Ok(Json(users))
}

/// allow_creation
///
/// [Admin Route] Grants publishing permission to a batch of accounts by
/// email address.
#[utoipa::path(
    put,
    path = "/admin/users/allow",
    request_body = AllowCreationRequest,
    responses(
        (status = 200, description = "Accounts updated"),
        (status = 404, description = "No matching accounts")
    )
)]
pub async fn allow_creation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<AllowCreationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&auth)?;

    let touched = state.repo.allow_creation(&payload.emails).await?;
    if touched == 0 {
        return Err(ApiError::NotFound(
            "No accounts found for the provided emails".to_string(),
        ));
    }

    Ok(Json(serde_json::json!({ "updated": touched })))
}

/// toggle_user_permission
///
/// [Admin Route] Flips a single account's publishing permission and returns
/// the updated record.
#[utoipa::path(
    patch,
    path = "/admin/users/{id}/permission",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn toggle_user_permission(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    require_admin(&auth)?;
    match state.repo.toggle_user_permission(id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound("User not found".to_string())),
    }
}

/// delete_user
///
/// [Admin Route] Removes an account and returns the deleted record.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = User),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    require_admin(&auth)?;
    match state.repo.delete_user(id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound("User not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Section;

    fn payload_with(category: &str, custom: &str) -> PostPayload {
        PostPayload {
            title: "Title".to_string(),
            category: category.to_string(),
            custom_category: custom.to_string(),
            author_name: "Author".to_string(),
            sections: vec![Section {
                subtitle: "Intro".to_string(),
                description: "Body".to_string(),
                image_url: None,
            }],
            ..PostPayload::default()
        }
    }

    #[test]
    fn test_sentinel_resolves_to_trimmed_custom_category() {
        let mut payload = payload_with("Others", "  Weaponry  ");
        resolve_category(&mut payload);
        assert_eq!(payload.category, "Weaponry");
        // The raw custom string survives for form round-trips.
        assert_eq!(payload.custom_category, "  Weaponry  ");
    }

    #[test]
    fn test_sentinel_with_blank_custom_falls_back() {
        let mut payload = payload_with("Others", "   ");
        resolve_category(&mut payload);
        assert_eq!(payload.category, "Uncategorized");
    }

    #[test]
    fn test_plain_category_clears_custom() {
        let mut payload = payload_with("History", "stale");
        resolve_category(&mut payload);
        assert_eq!(payload.category, "History");
        assert_eq!(payload.custom_category, "");
    }

    #[test]
    fn test_payload_validation_rejects_blanks() {
        let mut payload = payload_with("History", "");
        payload.title = "   ".to_string();
        assert!(validate_post_payload(&payload).is_err());

        let mut payload = payload_with("History", "");
        payload.author_name = String::new();
        assert!(validate_post_payload(&payload).is_err());

        let mut payload = payload_with("History", "");
        payload.sections.clear();
        assert!(validate_post_payload(&payload).is_err());

        let mut payload = payload_with("History", "");
        payload.sections[0].description = String::new();
        assert!(validate_post_payload(&payload).is_err());

        assert!(validate_post_payload(&payload_with("History", "")).is_ok());
    }
}
