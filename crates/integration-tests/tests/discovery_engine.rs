//! End-to-end behavior of the discovery engine over fixture data.

#![allow(clippy::unwrap_used)]

use storefinder_core::Coordinates;
use storefinder_integration_tests::{review, store, store_with};
use storefinder_web::discovery::{
    DiscoveryError, DiscoveryIndex, NEAR_LIMIT, NEAR_MAX_DISTANCE_M, ProximityIndex,
    RelevanceIndex, SEARCH_LIMIT, ranking, tag_counts, top_stores,
};
use storefinder_web::models::StorePage;

// =============================================================================
// Relevance search
// =============================================================================

#[test]
fn test_search_ranks_matching_store_first() {
    let stores = vec![
        store_with(1, "Cool Shop", "everything is cool here", &[]),
        store_with(2, "Warm Shop", "cozy blankets", &[]),
    ];
    let index = RelevanceIndex::build(&stores).unwrap();

    let hits = index.search("cool", SEARCH_LIMIT).unwrap();

    assert!(!hits.is_empty());
    assert_eq!(hits.first().unwrap().slug.as_str(), "cool-shop");
    // "warm" is more than one edit from "cool", so Warm Shop cannot match
    assert!(hits.iter().all(|h| h.slug.as_str() != "warm-shop"));
}

#[test]
fn test_exact_match_outranks_fuzzy_match() {
    // "coal" is one edit from "cool": it fuzzy-matches but scores less
    let stores = vec![
        store_with(1, "Coal Shop", "", &[]),
        store_with(2, "Cool Shop", "", &[]),
    ];
    let index = RelevanceIndex::build(&stores).unwrap();

    let hits = index.search("cool", SEARCH_LIMIT).unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits.first().unwrap().slug.as_str(), "cool-shop");
    assert_eq!(hits.get(1).unwrap().slug.as_str(), "coal-shop");
    assert!(hits.first().unwrap().score > hits.get(1).unwrap().score);
}

#[test]
fn test_search_matches_description_too() {
    let stores = vec![
        store_with(1, "The Annex", "records and espresso", &[]),
        store_with(2, "Corner Books", "paperbacks", &[]),
    ];
    let index = RelevanceIndex::build(&stores).unwrap();

    let hits = index.search("espresso", SEARCH_LIMIT).unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits.first().unwrap().slug.as_str(), "the-annex");
}

#[test]
fn test_search_ties_break_by_creation_time_then_slug() {
    // Identical names except for the distinguishing word: identical scores
    // for the query "shop", so the older store (lower fixture id) wins
    let stores = vec![
        store_with(2, "Shop Two", "", &[]),
        store_with(1, "Shop One", "", &[]),
    ];
    let index = RelevanceIndex::build(&stores).unwrap();

    let hits = index.search("shop", SEARCH_LIMIT).unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits.first().unwrap().slug.as_str(), "shop-one");
    assert_eq!(hits.get(1).unwrap().slug.as_str(), "shop-two");
}

#[test]
fn test_search_is_deterministic() {
    let stores: Vec<_> = (1..=6)
        .map(|i| store_with(i, &format!("Shop {i}"), "general store", &[]))
        .collect();
    let index = RelevanceIndex::build(&stores).unwrap();

    let first = index.search("store", SEARCH_LIMIT).unwrap();
    let second = index.search("store", SEARCH_LIMIT).unwrap();

    let slugs = |hits: &[storefinder_web::discovery::SearchHit]| {
        hits.iter().map(|h| h.slug.clone()).collect::<Vec<_>>()
    };
    assert_eq!(slugs(&first), slugs(&second));
}

#[test]
fn test_search_respects_limit() {
    let stores: Vec<_> = (1..=8)
        .map(|i| store_with(i, &format!("Shop {i}"), "", &[]))
        .collect();
    let index = RelevanceIndex::build(&stores).unwrap();

    let hits = index.search("shop", SEARCH_LIMIT).unwrap();
    assert_eq!(hits.len(), SEARCH_LIMIT);
}

#[test]
fn test_empty_query_is_a_validation_error() {
    let index = RelevanceIndex::build(&[store_with(1, "Cool Shop", "", &[])]).unwrap();

    assert!(matches!(
        index.search("", SEARCH_LIMIT),
        Err(DiscoveryError::EmptyQuery)
    ));
    assert!(matches!(
        index.search("   \t ", SEARCH_LIMIT),
        Err(DiscoveryError::EmptyQuery)
    ));
}

#[test]
fn test_no_matches_is_empty_not_error() {
    let index = RelevanceIndex::build(&[store_with(1, "Cool Shop", "", &[])]).unwrap();
    let hits = index.search("zzzzzzz", SEARCH_LIMIT).unwrap();
    assert!(hits.is_empty());
}

// =============================================================================
// Proximity
// =============================================================================

#[test]
fn test_near_orders_by_distance_and_respects_radius() {
    // Downtown Vancouver, with one store out in Burnaby (~11 km away)
    let stores = vec![
        store(1, "Waterfront", -123.1138, 49.2888),
        store(2, "Gastown", -123.1089, 49.2832),
        store(3, "Yaletown", -123.1216, 49.2744),
        store(4, "Burnaby", -122.9805, 49.2488),
    ];
    let index = ProximityIndex::build(&stores);
    let origin = Coordinates::new(-123.1140, 49.2890).unwrap();

    let results = index.near(origin, NEAR_MAX_DISTANCE_M, NEAR_LIMIT);

    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Waterfront", "Gastown", "Yaletown"]);

    for pair in results.windows(2) {
        assert!(pair.first().unwrap().distance_m <= pair.get(1).unwrap().distance_m);
    }
    assert!(results.iter().all(|r| r.distance_m <= NEAR_MAX_DISTANCE_M));
}

#[test]
fn test_near_caps_at_limit() {
    let stores: Vec<_> = (1..=15)
        .map(|i| store(i, &format!("Store {i}"), 0.001 * f64::from(i), 0.0))
        .collect();
    let index = ProximityIndex::build(&stores);
    let origin = Coordinates::new(0.0, 0.0).unwrap();

    let results = index.near(origin, NEAR_MAX_DISTANCE_M, NEAR_LIMIT);
    assert_eq!(results.len(), NEAR_LIMIT);
}

#[test]
fn test_invalid_coordinates_rejected_before_index_is_ready() {
    let index = DiscoveryIndex::new();

    assert!(matches!(
        index.near(200.0, 0.0, NEAR_MAX_DISTANCE_M, NEAR_LIMIT),
        Err(DiscoveryError::InvalidCoordinates(_))
    ));
    assert!(matches!(
        index.near(0.0, -91.0, NEAR_MAX_DISTANCE_M, NEAR_LIMIT),
        Err(DiscoveryError::InvalidCoordinates(_))
    ));
}

// =============================================================================
// Tag facets
// =============================================================================

#[test]
fn test_tag_counts_sum_to_membership_pairs() {
    let stores = vec![
        store_with(1, "A", "", &["Wifi", "Licensed"]),
        store_with(2, "B", "", &["Wifi"]),
        store_with(3, "C", "", &["Open Late", "Wifi"]),
        store_with(4, "D", "", &[]),
    ];

    let counts = tag_counts(&stores);

    // (store, tag) membership pairs: 2 + 1 + 2 + 0
    let total: usize = counts.iter().map(|c| c.count).sum();
    assert_eq!(total, 5);

    for pair in counts.windows(2) {
        assert!(pair.first().unwrap().count >= pair.get(1).unwrap().count);
    }
    assert_eq!(counts.first().unwrap().tag, "Wifi");
    assert_eq!(counts.first().unwrap().count, 3);
}

// =============================================================================
// Top stores
// =============================================================================

#[test]
fn test_two_review_cutoff_is_inclusive() {
    // Store X: ratings [5, 3] -> included at 4.0
    // Store Y: one rating of 5 -> excluded entirely
    let stores = vec![store(1, "Store X", 0.0, 0.0), store(2, "Store Y", 0.0, 0.0)];
    let reviews = vec![review(1, 1, 5), review(2, 1, 3), review(3, 2, 5)];

    let top = top_stores(&stores, &reviews, ranking::DEFAULT_LIMIT);

    assert_eq!(top.len(), 1);
    let x = top.first().unwrap();
    assert_eq!(x.slug.as_str(), "store-x");
    assert!((x.average_rating - 4.0).abs() < 1e-9);
}

#[test]
fn test_average_matches_mean_of_included_reviews() {
    let stores = vec![store(1, "Store", 0.0, 0.0)];
    let ratings = [4, 5, 3, 4, 5];
    let reviews: Vec<_> = ratings
        .iter()
        .enumerate()
        .map(|(i, &r)| review(i32::try_from(i).unwrap() + 1, 1, r))
        .collect();

    let top = top_stores(&stores, &reviews, ranking::DEFAULT_LIMIT);

    let expected = f64::from(ratings.iter().map(|&r| i32::from(r)).sum::<i32>())
        / ratings.len() as f64;
    assert!((top.first().unwrap().average_rating - expected).abs() < 1e-9);
    assert_eq!(top.first().unwrap().reviews.len(), ratings.len());
}

#[test]
fn test_top_stores_sorted_descending_and_limited() {
    let stores: Vec<_> = (1..=12).map(|i| store(i, &format!("Store {i}"), 0.0, 0.0)).collect();
    // Store i gets two reviews rated (i % 5) + 1
    let reviews: Vec<_> = (1..=12)
        .flat_map(|i| {
            let rating = i16::try_from(i % 5).unwrap() + 1;
            vec![review(i * 2, i, rating), review(i * 2 + 1, i, rating)]
        })
        .collect();

    let top = top_stores(&stores, &reviews, ranking::DEFAULT_LIMIT);

    assert_eq!(top.len(), ranking::DEFAULT_LIMIT);
    for pair in top.windows(2) {
        assert!(
            pair.first().unwrap().average_rating >= pair.get(1).unwrap().average_rating
        );
    }
    assert!(top.iter().all(|t| t.reviews.len() >= ranking::MIN_REVIEWS));
}

// =============================================================================
// Pagination
// =============================================================================

#[test]
fn test_five_stores_paginate_into_two_pages() {
    // 5 stores at page size 4: page 2 holds 1 store, page 3 redirects back
    assert_eq!(StorePage::total_pages(5), 2);

    let page_two = StorePage {
        stores: vec![store(5, "Fifth", 0.0, 0.0)],
        count: 5,
        page: 2,
        pages: 2,
    };
    assert!(!page_two.is_past_end());
    assert_eq!(page_two.stores.len(), 1);

    let page_three = StorePage {
        stores: Vec::new(),
        count: 5,
        page: 3,
        pages: 2,
    };
    assert!(page_three.is_past_end());
    assert_eq!(page_three.last_page(), 2);
}
