use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Rejection body shared by every error surface in the workspace.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
}

/// Builds the canonical rejection response.
pub fn reject(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    let body = ApiErrorBody {
        success: false,
        message: message.into(),
        code,
    };
    (status, Json(body)).into_response()
}

/// Failures while resolving the caller identity. All map to 401: the caller
/// is not authenticated, as opposed to authenticated-but-forbidden.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("bearer token rejected")]
    TokenRejected,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        reject(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
    }
}

/// Token verification failures. Expiry is distinguished so clients know a
/// refresh may still succeed.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Startup configuration failures. Fatal: never surfaced at request time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "signing key must be at least {minimum} bytes for HMAC-SHA256, got {actual}; \
         set a longer JWT_SECRET"
    )]
    SigningKeyTooShort { minimum: usize, actual: usize },
    #[error("refresh token TTL ({refresh}s) must exceed access token TTL ({access}s)")]
    RefreshTtlTooShort { access: i64, refresh: i64 },
}
