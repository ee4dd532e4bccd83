//! Authentication error types.

use thiserror::Error;

use storefinder_core::EmailError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email format is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password doesn't meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Email/password combination is wrong.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No account for this email.
    #[error("user not found")]
    UserNotFound,

    /// Reset token is unknown or expired.
    #[error("password reset token is invalid or expired")]
    InvalidResetToken,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
