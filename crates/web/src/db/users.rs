//! User repository.
//!
//! Accounts, password hashes, password-reset tokens, and the favorite
//! ("heart") set. Heart toggling happens in one atomic statement at the
//! database - never read-modify-write in a handler - so concurrent toggles
//! by the same user cannot lose updates.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storefinder_core::{Email, StoreId, UserId};

use super::RepositoryError;
use crate::models::User;

/// Database row shape for a user.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: Email,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user with an email and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists,
    /// `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, password_hash) \
             VALUES ($1, $2) \
             RETURNING id, email, created_at, updated_at",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Get a user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, (i32, Email, DateTime<Utc>, DateTime<Utc>, String)>(
            "SELECT id, email, created_at, updated_at, password_hash \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, email, created_at, updated_at, hash)| {
            (
                User {
                    id: UserId::new(id),
                    email,
                    created_at,
                    updated_at,
                },
                hash,
            )
        }))
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist,
    /// `RepositoryError::Database` for other database errors.
    pub async fn set_password(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    // =========================================================================
    // Password reset tokens
    // =========================================================================

    /// Store a password-reset token for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_reset_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token, expires_at) \
             VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Find the user owning a still-valid reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT u.id, u.email, u.created_at, u.updated_at \
             FROM users u \
             JOIN password_reset_tokens t ON t.user_id = u.id \
             WHERE t.token = $1 AND t.expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Invalidate a reset token after use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_reset_token(&self, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Hearts (favorites)
    // =========================================================================

    /// Toggle a store in the user's heart set.
    ///
    /// One conditional statement at the database: remove the heart if
    /// present, otherwise add it. Returns `true` if the store is hearted
    /// after the toggle.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn toggle_heart(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<bool, RepositoryError> {
        let hearted = sqlx::query_scalar::<_, bool>(
            "WITH removed AS ( \
                 DELETE FROM user_hearts WHERE user_id = $1 AND store_id = $2 \
                 RETURNING store_id \
             ), added AS ( \
                 INSERT INTO user_hearts (user_id, store_id) \
                 SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM removed) \
                 ON CONFLICT DO NOTHING \
                 RETURNING store_id \
             ) \
             SELECT EXISTS (SELECT 1 FROM added)",
        )
        .bind(user_id)
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;

        Ok(hearted)
    }

    /// IDs of the stores the user has hearted, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearts(&self, user_id: UserId) -> Result<Vec<StoreId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, StoreId>(
            "SELECT store_id FROM user_hearts WHERE user_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }
}
