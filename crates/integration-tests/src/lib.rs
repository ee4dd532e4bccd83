//! Shared fixtures for Storefinder integration tests.
//!
//! The discovery engine runs over plain domain values, so these tests
//! exercise it end to end without a database.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Utc};

use storefinder_core::{Coordinates, Rating, ReviewId, Slug, StoreId, UserId};
use storefinder_web::models::{Location, Review, Store};

/// Fixed instant the fixture timeline is anchored to.
const EPOCH_SECS: i64 = 1_700_000_000;

/// Deterministic creation time: the fixture epoch plus `offset_secs`.
///
/// # Panics
///
/// Panics if the offset is out of chrono's representable range, which no
/// test fixture approaches.
#[must_use]
pub fn created_at(offset_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(EPOCH_SECS + offset_secs, 0).expect("timestamp in range")
}

/// A store fixture at a location, created `id` seconds after the epoch.
///
/// # Panics
///
/// Panics if `name` produces no slug or the coordinates are invalid -
/// fixtures are expected to be well-formed.
#[must_use]
pub fn store(id: i32, name: &str, longitude: f64, latitude: f64) -> Store {
    Store {
        id: StoreId::new(id),
        name: name.to_owned(),
        slug: Slug::base(name).expect("fixture name produces a slug"),
        description: String::new(),
        tags: Vec::new(),
        location: Location {
            coordinates: Coordinates::new(longitude, latitude).expect("fixture coordinates"),
            address: "1 Fixture St".to_owned(),
        },
        photo: None,
        author_id: UserId::new(1),
        created_at: created_at(i64::from(id)),
    }
}

/// A store fixture with a description and tags.
#[must_use]
pub fn store_with(
    id: i32,
    name: &str,
    description: &str,
    tags: &[&str],
) -> Store {
    let mut s = store(id, name, 0.0, 0.0);
    s.description = description.to_owned();
    s.tags = tags.iter().map(ToString::to_string).collect();
    s
}

/// A review fixture.
///
/// # Panics
///
/// Panics if `rating` is outside 1..=5.
#[must_use]
pub fn review(id: i32, store_id: i32, rating: i16) -> Review {
    Review {
        id: ReviewId::new(id),
        store_id: StoreId::new(store_id),
        author_id: UserId::new(2),
        rating: Rating::new(rating).expect("fixture rating in range"),
        text: String::new(),
        created_at: created_at(i64::from(id)),
    }
}
