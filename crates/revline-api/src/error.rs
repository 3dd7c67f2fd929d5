use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use revline_db::StoreError;

/// API failure taxonomy. Every variant maps to a stable machine-readable
/// code plus a human message; internal detail is logged server-side and
/// never returned to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("authentication required")]
    TokenMissing,
    #[error("invalid or expired session")]
    TokenInvalid,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::TokenMissing | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::TokenInvalid | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::TokenMissing => "TOKEN_MISSING",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("not found"),
            StoreError::NotOwner => ApiError::Forbidden("you do not own this resource"),
            StoreError::DuplicateUser => {
                ApiError::Validation("username or email already in use".into())
            }
            StoreError::DuplicateRegistration => {
                ApiError::Conflict("already registered for this event")
            }
            StoreError::DuplicateReview => {
                ApiError::Conflict("you have already reviewed this business")
            }
            StoreError::AlreadyFollowing => ApiError::Conflict("already following this user"),
            StoreError::NotFollowing => ApiError::NotFound("not following this user"),
            StoreError::SelfFollow => ApiError::Validation("cannot follow yourself".into()),
            err @ (StoreError::InsertFailed(_)
            | StoreError::LockPoisoned
            | StoreError::Sqlite(_)) => {
                error!("store error: {err}");
                ApiError::Internal
            }
        }
    }
}

/// Blocking-task join failures are infrastructure faults, not client errors.
pub(crate) fn join_error(err: tokio::task::JoinError) -> ApiError {
    error!("spawn_blocking join error: {err}");
    ApiError::Internal
}
