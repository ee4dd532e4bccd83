//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefinder_core::{Rating, ReviewId, StoreId, UserId};

/// A review left on a store (domain type).
///
/// Reviews are insert-only: there is no update or delete path.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    /// Unique review ID.
    pub id: ReviewId,
    /// Store being reviewed.
    pub store_id: StoreId,
    /// User who wrote the review.
    pub author_id: UserId,
    /// Star rating, 1-5.
    pub rating: Rating,
    /// Review body, may be empty.
    pub text: String,
    /// When the review was created.
    pub created_at: DateTime<Utc>,
}
