//! Store repository.
//!
//! Slug allocation is an explicit step of the create/update workflow here:
//! read the matching slug set, allocate, insert. The unique constraint on
//! `stores.slug` is the authoritative defense against allocation races; a
//! violating write is re-allocated against a fresh slug set and retried once
//! before surfacing as a conflict.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storefinder_core::{Coordinates, Slug, StoreId, UserId};

use super::RepositoryError;
use crate::models::{Location, PAGE_SIZE, Store, StorePage};

/// Fields for creating a store. The slug is derived, not supplied.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub coordinates: Coordinates,
    pub address: String,
    pub photo: Option<String>,
    pub author_id: UserId,
}

/// Fields for updating a store. `photo: None` keeps the existing photo;
/// the author and creation time are immutable.
#[derive(Debug, Clone)]
pub struct StoreUpdate {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub coordinates: Coordinates,
    pub address: String,
    pub photo: Option<String>,
}

/// Database row shape for a store.
#[derive(sqlx::FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    slug: Slug,
    description: String,
    tags: Vec<String>,
    longitude: f64,
    latitude: f64,
    address: String,
    photo: Option<String>,
    author_id: UserId,
    created_at: DateTime<Utc>,
}

impl StoreRow {
    fn into_store(self) -> Result<Store, RepositoryError> {
        let coordinates = Coordinates::new(self.longitude, self.latitude).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coordinates in database: {e}"))
        })?;

        Ok(Store {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            tags: self.tags,
            location: Location {
                coordinates,
                address: self.address,
            },
            photo: self.photo,
            author_id: self.author_id,
            created_at: self.created_at,
        })
    }
}

const STORE_COLUMNS: &str = "id, name, slug, description, tags, longitude, latitude, \
                             address, photo, author_id, created_at";

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a store, allocating its slug from the name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if the name produces no usable
    /// slug, `RepositoryError::Conflict` if a slug collision survives the
    /// retry, `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewStore) -> Result<Store, RepositoryError> {
        let mut retried = false;
        loop {
            let existing = self.slugs_matching_base(&new.name).await?;
            let slug = Slug::allocate(&new.name, &existing)
                .map_err(|e| RepositoryError::Validation(e.to_string()))?;

            match self.insert(new, &slug).await {
                // Lost a slug race: re-read the slug set and retry once
                Err(RepositoryError::Conflict(_)) if !retried => {
                    retried = true;
                }
                other => return other,
            }
        }
    }

    /// Update a store's editable fields.
    ///
    /// The slug is recomputed only when the name actually changed; a plain
    /// description or tag edit keeps the existing URL. Only the owning
    /// author's row matches, so a non-owner update reports `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no store matches the id and
    /// author, `RepositoryError::Validation`/`Conflict` as for `create`.
    pub async fn update(
        &self,
        id: StoreId,
        author_id: UserId,
        update: &StoreUpdate,
    ) -> Result<Store, RepositoryError> {
        let current = self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)?;

        let mut retried = false;
        loop {
            let slug = if update.name == current.name {
                current.slug.clone()
            } else {
                let existing = self.slugs_matching_base(&update.name).await?;
                Slug::allocate(&update.name, &existing)
                    .map_err(|e| RepositoryError::Validation(e.to_string()))?
            };

            match self.apply_update(id, author_id, update, &slug).await {
                Err(RepositoryError::Conflict(_)) if !retried && update.name != current.name => {
                    retried = true;
                }
                other => return other,
            }
        }
    }

    /// Get a store by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(StoreRow::into_store).transpose()
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(StoreRow::into_store).transpose()
    }

    /// One page of the store listing, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn page(&self, page: i64) -> Result<StorePage, RepositoryError> {
        let page = page.max(1);
        let offset = (page - 1) * PAGE_SIZE;

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stores")
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores ORDER BY created_at ASC, id ASC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(PAGE_SIZE)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let stores = rows
            .into_iter()
            .map(StoreRow::into_store)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StorePage {
            stores,
            count,
            page,
            pages: StorePage::total_pages(count),
        })
    }

    /// Every store, oldest first. Feeds the discovery index and the
    /// facet/ranking pipelines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn scan_all(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(StoreRow::into_store).collect()
    }

    /// Stores carrying the given tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn with_tag(&self, tag: &str) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE $1 = ANY(tags) \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(tag)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(StoreRow::into_store).collect()
    }

    /// Stores carrying at least one tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn with_any_tag(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE cardinality(tags) > 0 \
             ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(StoreRow::into_store).collect()
    }

    /// Stores with the given IDs (e.g., a user's hearted stores).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_ids(&self, ids: &[StoreId]) -> Result<Vec<Store>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = ANY($1) \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(raw_ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(StoreRow::into_store).collect()
    }

    /// Slugs whose text matches the allocation pattern for `name`'s base.
    ///
    /// Prefilters in SQL (prefix match) and applies the exact
    /// `^(base)(-[0-9]*)?$` rule in `Slug::allocate`.
    async fn slugs_matching_base(&self, name: &str) -> Result<Vec<Slug>, RepositoryError> {
        let Ok(base) = Slug::base(name) else {
            // allocate() reports the precise error
            return Ok(Vec::new());
        };

        let slugs = sqlx::query_scalar::<_, Slug>(
            "SELECT slug FROM stores WHERE slug ILIKE $1 || '%'",
        )
        .bind(base.as_str())
        .fetch_all(self.pool)
        .await?;

        Ok(slugs)
    }

    async fn insert(&self, new: &NewStore, slug: &Slug) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "INSERT INTO stores (name, slug, description, tags, longitude, latitude, \
                                 address, photo, author_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(slug)
        .bind(&new.description)
        .bind(&new.tags)
        .bind(new.coordinates.longitude())
        .bind(new.coordinates.latitude())
        .bind(&new.address)
        .bind(&new.photo)
        .bind(new.author_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("slug already exists: {slug}"));
            }
            RepositoryError::Database(e)
        })?;

        row.into_store()
    }

    async fn apply_update(
        &self,
        id: StoreId,
        author_id: UserId,
        update: &StoreUpdate,
        slug: &Slug,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "UPDATE stores \
             SET name = $1, slug = $2, description = $3, tags = $4, longitude = $5, \
                 latitude = $6, address = $7, photo = COALESCE($8, photo) \
             WHERE id = $9 AND author_id = $10 \
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(&update.name)
        .bind(slug)
        .bind(&update.description)
        .bind(&update.tags)
        .bind(update.coordinates.longitude())
        .bind(update.coordinates.latitude())
        .bind(&update.address)
        .bind(&update.photo)
        .bind(id)
        .bind(author_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("slug already exists: {slug}"));
            }
            RepositoryError::Database(e)
        })?;

        row.ok_or(RepositoryError::NotFound)?.into_store()
    }
}
