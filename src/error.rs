use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// ApiError
///
/// The complete failure taxonomy for the API surface. Every handler returns
/// `Result<_, ApiError>`, and every variant maps to exactly one status code,
/// so a client can distinguish the failure class without parsing messages.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed fields in a submitted payload.
    #[error("{0}")]
    Validation(String),

    /// A token was presented and verified, but it carries no usable identity.
    #[error("Missing caller identity")]
    MissingIdentity,

    /// The bearer token is absent, malformed, or not signed with the
    /// configured server secret.
    #[error("Invalid or missing token")]
    InvalidToken,

    /// The caller is authenticated but is neither the resource owner nor the
    /// primary administrator.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// A uniqueness rule was violated (duplicate access-request email,
    /// duplicate account email/username).
    #[error("{0}")]
    Conflict(String),

    #[error("Server error")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingIdentity => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken => StatusCode::FORBIDDEN,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref source) = self {
            // Surface the generic message to the client, keep the cause in the logs.
            tracing::error!("internal error: {:?}", source);
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    /// Store-level errors propagate as 500s, except unique-index violations,
    /// which are the atomic insert-if-absent signal and belong to the
    /// conflict class.
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("Duplicate record".to_string())
            }
            _ => ApiError::Internal(Box::new(err)),
        }
    }
}
