//! Review-quality store ranking.
//!
//! An explicit pipeline over materialized rows: join reviews to stores by
//! store id, drop stores with fewer than two reviews, average the remaining
//! ratings, sort by average descending, truncate. The five steps are the
//! contract; keep them visible.

use std::cmp::Ordering;
use std::collections::HashMap;

use storefinder_core::{Slug, StoreId};

use crate::models::{Review, Store};

/// Default number of top stores returned.
pub const DEFAULT_LIMIT: usize = 10;

/// Minimum review count for a store to be ranked (inclusive).
pub const MIN_REVIEWS: usize = 2;

/// A store that survived the ranking pipeline.
#[derive(Debug, Clone)]
pub struct TopStore {
    /// URL identifier.
    pub slug: Slug,
    /// Display name.
    pub name: String,
    /// Photo filename, if any.
    pub photo: Option<String>,
    /// The reviews that produced the average, in input order.
    pub reviews: Vec<Review>,
    /// Arithmetic mean of the review ratings.
    pub average_rating: f64,
}

/// Rank stores by average review rating.
///
/// Stores with fewer than [`MIN_REVIEWS`] reviews are excluded entirely - a
/// store with exactly two qualifies, a store with one never does regardless
/// of rating. Reviews referencing a store id not present in `stores` are
/// dropped silently. Ties in average order by slug ascending.
#[must_use]
#[allow(clippy::cast_precision_loss)] // review counts stay far below 2^52
pub fn top_stores(stores: &[Store], reviews: &[Review], limit: usize) -> Vec<TopStore> {
    // Join: group reviews by the store they reference
    let mut by_store: HashMap<StoreId, Vec<&Review>> = HashMap::new();
    for review in reviews {
        by_store.entry(review.store_id).or_default().push(review);
    }

    // Filter + project: keep stores with enough reviews, compute the mean
    let mut ranked: Vec<TopStore> = stores
        .iter()
        .filter_map(|store| {
            let store_reviews = by_store.get(&store.id)?;
            if store_reviews.len() < MIN_REVIEWS {
                return None;
            }

            let sum: f64 = store_reviews.iter().map(|r| r.rating.as_f64()).sum();
            let average_rating = sum / store_reviews.len() as f64;

            Some(TopStore {
                slug: store.slug.clone(),
                name: store.name.clone(),
                photo: store.photo.clone(),
                reviews: store_reviews.iter().map(|r| (*r).clone()).collect(),
                average_rating,
            })
        })
        .collect();

    // Sort: highest average first, ties by slug for determinism
    ranked.sort_by(|a, b| {
        b.average_rating
            .partial_cmp(&a.average_rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.slug.cmp(&b.slug))
    });

    // Limit
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Location;
    use chrono::Utc;
    use storefinder_core::{Coordinates, Rating, ReviewId, UserId};

    fn store(id: i32, name: &str) -> Store {
        Store {
            id: StoreId::new(id),
            name: name.to_owned(),
            slug: Slug::base(name).unwrap(),
            description: String::new(),
            tags: Vec::new(),
            location: Location {
                coordinates: Coordinates::new(0.0, 0.0).unwrap(),
                address: "1 Main St".to_owned(),
            },
            photo: None,
            author_id: UserId::new(1),
            created_at: Utc::now(),
        }
    }

    fn review(id: i32, store_id: i32, rating: i16) -> Review {
        Review {
            id: ReviewId::new(id),
            store_id: StoreId::new(store_id),
            author_id: UserId::new(1),
            rating: Rating::new(rating).unwrap(),
            text: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_two_reviews_included_single_review_excluded() {
        let stores = vec![store(1, "Store X"), store(2, "Store Y")];
        let reviews = vec![review(1, 1, 5), review(2, 1, 3), review(3, 2, 5)];

        let top = top_stores(&stores, &reviews, DEFAULT_LIMIT);

        assert_eq!(top.len(), 1);
        let x = top.first().unwrap();
        assert_eq!(x.slug.as_str(), "store-x");
        assert!((x.average_rating - 4.0).abs() < 1e-9);
        assert_eq!(x.reviews.len(), 2);
    }

    #[test]
    fn test_zero_reviews_excluded() {
        let stores = vec![store(1, "Quiet Store")];
        let top = top_stores(&stores, &[], DEFAULT_LIMIT);
        assert!(top.is_empty());
    }

    #[test]
    fn test_sorted_by_average_descending() {
        let stores = vec![store(1, "Low"), store(2, "High"), store(3, "Mid")];
        let reviews = vec![
            review(1, 1, 1),
            review(2, 1, 2),
            review(3, 2, 5),
            review(4, 2, 5),
            review(5, 3, 3),
            review(6, 3, 4),
        ];

        let top = top_stores(&stores, &reviews, DEFAULT_LIMIT);
        let names: Vec<&str> = top.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Mid", "Low"]);
    }

    #[test]
    fn test_average_is_exact_mean() {
        let stores = vec![store(1, "Store")];
        let reviews = vec![review(1, 1, 5), review(2, 1, 4), review(3, 1, 4)];

        let top = top_stores(&stores, &reviews, DEFAULT_LIMIT);
        let avg = top.first().unwrap().average_rating;
        assert!((avg - 13.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ties_order_by_slug() {
        let stores = vec![store(1, "Zebra"), store(2, "Apple")];
        let reviews = vec![
            review(1, 1, 4),
            review(2, 1, 4),
            review(3, 2, 4),
            review(4, 2, 4),
        ];

        let top = top_stores(&stores, &reviews, DEFAULT_LIMIT);
        let slugs: Vec<&str> = top.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["apple", "zebra"]);
    }

    #[test]
    fn test_limit_truncates() {
        let stores: Vec<Store> = (1..=4).map(|i| store(i, &format!("Store {i}"))).collect();
        let reviews: Vec<Review> = (1..=4)
            .flat_map(|s| {
                vec![
                    review(s * 10, s, 4),
                    review(s * 10 + 1, s, 4),
                ]
            })
            .collect();

        let top = top_stores(&stores, &reviews, 2);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_review_for_missing_store_dropped() {
        let stores = vec![store(1, "Store")];
        let reviews = vec![review(1, 99, 5), review(2, 99, 5)];

        let top = top_stores(&stores, &reviews, DEFAULT_LIMIT);
        assert!(top.is_empty());
    }
}
