//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefinder_core::{Coordinates, Slug, StoreId, UserId};

/// Tags a store can be labeled with in the add/edit form.
pub const TAG_CHOICES: &[&str] = &["Wifi", "Open Late", "Family Friendly", "Vegetarian", "Licensed"];

/// Number of stores per listing page.
pub const PAGE_SIZE: i64 = 4;

/// A store's physical location.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    /// (longitude, latitude) pair - never the other way around.
    pub coordinates: Coordinates,
    /// Street address as entered by the author.
    pub address: String,
}

/// A store listing (domain type).
#[derive(Debug, Clone)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// URL identifier, unique across all stores.
    pub slug: Slug,
    /// Free-form description, may be empty.
    pub description: String,
    /// Tag set; no empty strings, order irrelevant.
    pub tags: Vec<String>,
    /// Where the store is.
    pub location: Location,
    /// Uploaded photo filename, if any.
    pub photo: Option<String>,
    /// User who created the store; immutable after creation.
    pub author_id: UserId,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
}

/// One page of the store listing.
#[derive(Debug, Clone)]
pub struct StorePage {
    /// Stores on this page, in listing order.
    pub stores: Vec<Store>,
    /// Total number of stores across all pages.
    pub count: i64,
    /// The requested page (1-based).
    pub page: i64,
    /// Total number of pages.
    pub pages: i64,
}

impl StorePage {
    /// Number of pages needed for `count` stores at [`PAGE_SIZE`] per page.
    #[must_use]
    pub const fn total_pages(count: i64) -> i64 {
        (count + PAGE_SIZE - 1) / PAGE_SIZE
    }

    /// Whether the caller asked for a page past the end and should be
    /// redirected to the last valid page instead of seeing an empty one.
    #[must_use]
    pub fn is_past_end(&self) -> bool {
        self.stores.is_empty() && self.page > 1
    }

    /// The last page that actually has results (at least page 1).
    #[must_use]
    pub const fn last_page(&self) -> i64 {
        if self.pages > 1 { self.pages } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(StorePage::total_pages(0), 0);
        assert_eq!(StorePage::total_pages(1), 1);
        assert_eq!(StorePage::total_pages(4), 1);
        assert_eq!(StorePage::total_pages(5), 2);
        assert_eq!(StorePage::total_pages(8), 2);
        assert_eq!(StorePage::total_pages(9), 3);
    }

    #[test]
    fn test_past_end_detection() {
        let page = StorePage {
            stores: Vec::new(),
            count: 5,
            page: 3,
            pages: 2,
        };
        assert!(page.is_past_end());
        assert_eq!(page.last_page(), 2);

        let first = StorePage {
            stores: Vec::new(),
            count: 0,
            page: 1,
            pages: 0,
        };
        // An empty first page renders empty, it never redirects
        assert!(!first.is_past_end());
        assert_eq!(first.last_page(), 1);
    }
}
