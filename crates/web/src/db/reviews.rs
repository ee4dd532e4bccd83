//! Review repository.
//!
//! Reviews are joined to stores only on demand (`for_store`, `scan_all`);
//! store reads never eagerly attach them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storefinder_core::{Rating, ReviewId, StoreId, UserId};

use super::RepositoryError;
use crate::models::Review;

/// Database row shape for a review.
#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    store_id: StoreId,
    author_id: UserId,
    rating: Rating,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            store_id: row.store_id,
            author_id: row.author_id,
            rating: row.rating,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a review on a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist,
    /// `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        store_id: StoreId,
        author_id: UserId,
        rating: Rating,
        text: &str,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "INSERT INTO reviews (store_id, author_id, rating, text) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, store_id, author_id, rating, text, created_at",
        )
        .bind(store_id)
        .bind(author_id)
        .bind(rating)
        .bind(text)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// All reviews for one store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_store(&self, store_id: StoreId) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, store_id, author_id, rating, text, created_at \
             FROM reviews WHERE store_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Every review, oldest first. Feeds the top-stores ranking pipeline.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn scan_all(&self) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, store_id, author_id, rating, text, created_at \
             FROM reviews ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }
}
