//! Store discovery engine.
//!
//! The four read-side query components over repository state:
//!
//! - [`relevance`] - ranked free-text search (name + description)
//! - [`proximity`] - nearest stores to a geographic point
//! - [`facets`] - distinct-tag counts
//! - [`ranking`] - top stores by review quality
//!
//! Relevance and proximity queries run against [`DiscoveryIndex`], which is
//! built asynchronously from a full store scan at startup and rebuilt after
//! store writes. The app starts immediately with an empty index; a
//! background task builds the real one and swaps it in atomically. Facet and
//! ranking pipelines are pure functions over rows the caller materializes.
//!
//! Every component validates its input before consulting index state, so a
//! bad query fails the same way whether or not the index is warm. "No
//! results" is always an empty list, never an error.

pub mod facets;
pub mod proximity;
pub mod ranking;
pub mod relevance;

use std::sync::{Arc, RwLock};

use sqlx::PgPool;
use tracing::{error, info, instrument};

use storefinder_core::Coordinates;

pub use facets::{TagCount, tag_counts};
pub use proximity::{NearbyStore, ProximityIndex};
pub use ranking::{TopStore, top_stores};
pub use relevance::{RelevanceIndex, SearchHit};

/// Maximum results for a text search.
pub const SEARCH_LIMIT: usize = 5;

/// Maximum results for a proximity query.
pub const NEAR_LIMIT: usize = 10;

/// Proximity query radius in meters (10 km).
pub const NEAR_MAX_DISTANCE_M: f64 = 10_000.0;

/// Discovery engine errors.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Search query was empty or whitespace-only.
    #[error("search query cannot be empty")]
    EmptyQuery,

    /// Longitude/latitude failed validation.
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(#[from] storefinder_core::CoordinatesError),

    /// Index construction or state failure.
    #[error("index error: {0}")]
    Index(String),

    /// Query execution failure.
    #[error("query error: {0}")]
    Query(String),
}

/// Inner index state (once built).
struct ReadyIndexes {
    relevance: RelevanceIndex,
    proximity: ProximityIndex,
}

/// The shared discovery index.
///
/// Starts empty and is populated asynchronously; queries served before the
/// first build completes return empty results.
#[derive(Clone)]
pub struct DiscoveryIndex {
    inner: Arc<RwLock<Option<ReadyIndexes>>>,
}

impl Default for DiscoveryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryIndex {
    /// Create a new empty discovery index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Check if the index has been built.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.read().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Swap in freshly built indexes. Called by the rebuild task.
    fn set_ready(
        &self,
        relevance: RelevanceIndex,
        proximity: ProximityIndex,
    ) -> Result<(), DiscoveryError> {
        *self
            .inner
            .write()
            .map_err(|_| DiscoveryError::Index("lock poisoned".to_owned()))? = Some(ReadyIndexes {
            relevance,
            proximity,
        });
        Ok(())
    }

    /// Ranked free-text search over store names and descriptions.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::EmptyQuery`] for an empty query even while
    /// the index is still warming up.
    #[allow(clippy::significant_drop_tightening)] // the guard must outlive the borrowed indexes
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, DiscoveryError> {
        if query.trim().is_empty() {
            return Err(DiscoveryError::EmptyQuery);
        }

        let guard = self
            .inner
            .read()
            .map_err(|_| DiscoveryError::Index("lock poisoned".to_owned()))?;

        match guard.as_ref() {
            Some(ready) => ready.relevance.search(query, limit),
            None => Ok(Vec::new()),
        }
    }

    /// Stores within [`NEAR_MAX_DISTANCE_M`] of the given point, nearest
    /// first. Arguments are (longitude, latitude), matching storage order.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidCoordinates`] for out-of-range or
    /// non-finite input even while the index is still warming up.
    #[allow(clippy::significant_drop_tightening)]
    pub fn near(
        &self,
        longitude: f64,
        latitude: f64,
        max_distance_m: f64,
        limit: usize,
    ) -> Result<Vec<NearbyStore>, DiscoveryError> {
        let origin = Coordinates::new(longitude, latitude)?;

        let guard = self
            .inner
            .read()
            .map_err(|_| DiscoveryError::Index("lock poisoned".to_owned()))?;

        match guard.as_ref() {
            Some(ready) => Ok(ready.proximity.near(origin, max_distance_m, limit)),
            None => Ok(Vec::new()),
        }
    }

    /// Number of stores in the built index, or 0 if not ready.
    #[must_use]
    pub fn num_stores(&self) -> u64 {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(|r| r.relevance.num_docs()))
            .unwrap_or(0)
    }
}

/// Spawn a background task that (re)builds the discovery index.
///
/// Used at startup and after store writes. Until the first build completes,
/// queries return empty results.
pub fn rebuild_async(index: DiscoveryIndex, pool: PgPool) {
    tokio::spawn(async move {
        match rebuild(&index, &pool).await {
            Ok(count) => info!(stores = count, "discovery index ready"),
            Err(e) => error!(error = %e, "failed to rebuild discovery index"),
        }
    });
}

/// Rebuild the discovery index from a full store scan.
///
/// # Errors
///
/// Returns [`DiscoveryError::Index`] if the scan or the build fails.
#[instrument(skip_all)]
pub async fn rebuild(index: &DiscoveryIndex, pool: &PgPool) -> Result<usize, DiscoveryError> {
    let stores = crate::db::stores::StoreRepository::new(pool)
        .scan_all()
        .await
        .map_err(|e| DiscoveryError::Index(format!("store scan failed: {e}")))?;

    let relevance = RelevanceIndex::build(&stores)?;
    let proximity = ProximityIndex::build(&stores);
    index.set_ready(relevance, proximity)?;

    Ok(stores.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_fails_even_before_ready() {
        let index = DiscoveryIndex::new();
        assert!(!index.is_ready());
        assert!(matches!(
            index.search("", SEARCH_LIMIT),
            Err(DiscoveryError::EmptyQuery)
        ));
        assert!(matches!(
            index.search("   ", SEARCH_LIMIT),
            Err(DiscoveryError::EmptyQuery)
        ));
    }

    #[test]
    fn test_invalid_coordinates_fail_even_before_ready() {
        let index = DiscoveryIndex::new();
        assert!(matches!(
            index.near(-200.0, 0.0, NEAR_MAX_DISTANCE_M, NEAR_LIMIT),
            Err(DiscoveryError::InvalidCoordinates(_))
        ));
        assert!(matches!(
            index.near(0.0, f64::NAN, NEAR_MAX_DISTANCE_M, NEAR_LIMIT),
            Err(DiscoveryError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn test_not_ready_returns_empty_results() {
        let index = DiscoveryIndex::new();
        assert!(index.search("coffee", SEARCH_LIMIT).unwrap().is_empty());
        assert!(
            index
                .near(0.0, 0.0, NEAR_MAX_DISTANCE_M, NEAR_LIMIT)
                .unwrap()
                .is_empty()
        );
    }
}
