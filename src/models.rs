use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Section
///
/// One ordered body segment of a post: a subtitle, a rich-text description and
/// an optional illustration URL. Sections are persisted as a JSONB array on the
/// `posts` row; a post carries at least one of them at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Section {
    pub subtitle: String,
    pub description: String,
    pub image_url: Option<String>,
}

/// Post
///
/// Represents a published article from the `posts` table. This is the primary
/// data structure for the core business logic.
///
/// Ownership: `author_email` is set once at creation from the authenticated
/// caller and is the value every mutation is authorized against. It is never
/// taken from a request body and never changed by an update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    /// The resolved category. Never the sentinel value "Others": the sentinel
    /// is replaced at write time by the trimmed custom category (or
    /// "Uncategorized" when that is blank).
    pub category: String,
    /// The raw custom string submitted alongside the "Others" sentinel, kept
    /// verbatim so the edit form can round-trip it. Empty otherwise.
    pub custom_category: String,
    pub featured: bool,
    pub author_email: String,
    pub author_name: String,
    pub author_link: Option<String>,
    /// JSONB column. Invariant: non-empty.
    #[sqlx(json)]
    pub sections: Vec<Section>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// AccessRequest
///
/// An application from a prospective author asking for publishing access,
/// stored in the `access_requests` table. The email is unique across the
/// table: at most one outstanding request per address, enforced by the
/// database index rather than a check-then-write.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AccessRequest {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub country: String,
    pub state: String,
    pub profession: String,
    /// Optional in the schema; the public submission endpoint nevertheless
    /// requires it (preserved source behavior, see DESIGN.md).
    pub phone: Option<String>,
    pub social_link: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// User
///
/// An author account from the `users` table. `is_admin` is set at signup when
/// the email matches the configured primary administrator; authorization
/// decisions nevertheless re-derive admin status from configuration on every
/// request, so this flag is informational for the frontend.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub is_admin: bool,
    /// Grantable publishing permission, toggled by the primary administrator.
    pub is_allowed_to_create: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// --- Request Payloads (Input Schemas) ---

/// PostPayload
///
/// Input payload for creating a post (POST /posts) or fully replacing one
/// (PUT /posts/{id}). Updates are whole-document: every field here overwrites
/// the stored value, with the single exception that the author email always
/// comes from the authenticated caller, never from this payload.
///
/// All fields default when absent so that a missing field and a blank field
/// fail the same explicit validation instead of a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub custom_category: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_link: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// SubmitAccessRequest
///
/// Input payload for the public access-request submission (POST
/// /access-requests). Every field, including `phone`, must be present and
/// non-blank to pass validation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SubmitAccessRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub profession: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub social_link: String,
}

/// UpdateAccessRequest
///
/// Partial update payload for an access request (PUT /access-requests/{id},
/// primary admin only). Uses `Option<T>` for all fields and
/// `#[serde(skip_serializing_if = "Option::is_none")]` so only provided
/// fields are merged into the stored record.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAccessRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_link: Option<String>,
}

/// SignupRequest
///
/// Input payload for the public registration endpoint (POST /auth/signup).
/// The password is hashed before it ever reaches the repository and is never
/// persisted or logged in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// LoginRequest
///
/// Input payload for credential verification (POST /auth/login).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// LoginResponse
///
/// Output schema for a successful login: the signed bearer token plus the
/// account record (without the password hash) for the frontend session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// AllowCreationRequest
///
/// Input payload for granting publishing permission to a batch of existing
/// accounts by email (PUT /admin/users/allow).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AllowCreationRequest {
    pub emails: Vec<String>,
}
