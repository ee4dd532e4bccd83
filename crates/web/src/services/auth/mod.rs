//! Authentication service.
//!
//! Password registration/login with Argon2id hashing, plus the
//! password-reset token flow: a random URL-safe token with a one-hour
//! expiry, stored alongside the user and invalidated on use.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine as _;
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;

use storefinder_core::Email;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes per reset token (encodes to 43 URL-safe chars).
const RESET_TOKEN_BYTES: usize = 32;

/// How long a reset token stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Authentication service.
///
/// Handles registration, login, and the password-reset flow.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid,
    /// `AuthError::WeakPassword`/`PasswordMismatch` for bad passwords, and
    /// `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        if password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Issue a password-reset token for the account with this email.
    ///
    /// Returns the user and the raw token to embed in the reset link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email.
    pub async fn start_password_reset(&self, email: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        self.users
            .create_reset_token(user.id, &token, expires_at)
            .await?;

        Ok((user, token))
    }

    /// Check that a reset token is known and unexpired.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` otherwise.
    pub async fn check_reset_token(&self, token: &str) -> Result<User, AuthError> {
        self.users
            .find_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidResetToken)
    }

    /// Redeem a reset token: set the new password and invalidate the token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` for unknown/expired tokens,
    /// `AuthError::WeakPassword`/`PasswordMismatch` for bad passwords.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        validate_password(password)?;
        if password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let user = self.check_reset_token(token).await?;

        let password_hash = hash_password(password)?;
        self.users.set_password(user.id, &password_hash).await?;
        self.users.delete_reset_token(token).await?;

        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a random URL-safe reset token.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_tokens_are_distinct_and_url_safe() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
