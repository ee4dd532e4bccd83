//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::discovery::DiscoveryError;
use crate::services::auth::AuthError;
use crate::services::email::EmailError;
use crate::services::photos::PhotoError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Discovery engine operation failed.
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Email delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Photo upload failed.
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User may not act on this resource (e.g., editing someone else's store).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is a server-side fault worth reporting.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Internal(_) | Self::Email(_) => true,
            Self::Repository(err) => !matches!(
                err,
                RepositoryError::NotFound
                    | RepositoryError::Conflict(_)
                    | RepositoryError::Validation(_)
            ),
            Self::Discovery(err) => matches!(
                err,
                DiscoveryError::Index(_) | DiscoveryError::Query(_)
            ),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Repository(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Validation(_) => StatusCode::BAD_REQUEST,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Discovery(err) => match err {
                DiscoveryError::EmptyQuery | DiscoveryError::InvalidCoordinates(_) => {
                    StatusCode::BAD_REQUEST
                }
                DiscoveryError::Index(_) | DiscoveryError::Query(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Photo(err) => match err {
                PhotoError::UnsupportedType(_) | PhotoError::Decode(_) => StatusCode::BAD_REQUEST,
                PhotoError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Email(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn public_message(&self) -> String {
        match self {
            // Don't expose internal error details to clients
            Self::Internal(_) | Self::Email(_) => "Internal server error".to_owned(),
            Self::Repository(err) => match err {
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    "Internal server error".to_owned()
                }
                RepositoryError::NotFound => "Not found".to_owned(),
                RepositoryError::Conflict(msg) | RepositoryError::Validation(msg) => msg.clone(),
            },
            Self::Discovery(err) => match err {
                DiscoveryError::Index(_) | DiscoveryError::Query(_) => {
                    "Internal server error".to_owned()
                }
                other => other.to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_owned()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_owned()
                }
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    "Internal server error".to_owned()
                }
                other => other.to_string(),
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("store cool-shop".to_owned());
        assert_eq!(err.to_string(), "Not found: store cool-shop");

        let err = AppError::BadRequest("invalid input".to_owned());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".to_owned()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("x".to_owned()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Discovery(DiscoveryError::EmptyQuery).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Repository(RepositoryError::Conflict("slug".to_owned())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".to_owned()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err = AppError::Internal("connection pool exhausted".to_owned());
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Discovery(DiscoveryError::EmptyQuery);
        assert_eq!(err.public_message(), "search query cannot be empty");
    }
}
