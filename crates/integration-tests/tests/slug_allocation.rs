//! Slug derivation and allocation behavior.

#![allow(clippy::unwrap_used)]

use storefinder_core::{Slug, SlugError};

fn slugs(texts: &[&str]) -> Vec<Slug> {
    texts
        .iter()
        .map(|t| Slug::base(t).expect("valid slug text"))
        .collect()
}

// =============================================================================
// Derivation
// =============================================================================

#[test]
fn test_base_is_lowercase_hyphenated_ascii() {
    assert_eq!(Slug::base("Cool Shop").unwrap().as_str(), "cool-shop");
    assert_eq!(
        Slug::base("  The   Daily Grind!  ").unwrap().as_str(),
        "the-daily-grind"
    );
    assert_eq!(Slug::base("Nine & 3/4").unwrap().as_str(), "nine-3-4");
}

#[test]
fn test_empty_name_is_rejected() {
    assert_eq!(Slug::base("   "), Err(SlugError::Empty));
    assert_eq!(Slug::base("!!!???"), Err(SlugError::Empty));
    assert!(matches!(Slug::allocate("", &[]), Err(SlugError::Empty)));
}

// =============================================================================
// Allocation
// =============================================================================

#[test]
fn test_first_allocation_is_the_base() {
    let slug = Slug::allocate("Cool Shop", &[]).unwrap();
    assert_eq!(slug.as_str(), "cool-shop");
}

#[test]
fn test_identical_names_get_numbered_suffixes() {
    // Two stores created with the same name: "cool-shop", then "cool-shop-2"
    let first = Slug::allocate("Cool Shop", &[]).unwrap();
    assert_eq!(first.as_str(), "cool-shop");

    let second = Slug::allocate("Cool Shop", std::slice::from_ref(&first)).unwrap();
    assert_eq!(second.as_str(), "cool-shop-2");

    let third = Slug::allocate("Cool Shop", &[first, second]).unwrap();
    assert_eq!(third.as_str(), "cool-shop-3");
}

#[test]
fn test_allocation_is_deterministic_for_unchanged_input() {
    let existing = slugs(&["cool-shop", "cool-shop-2", "warm-shop"]);
    let a = Slug::allocate("Cool Shop", &existing).unwrap();
    let b = Slug::allocate("Cool Shop", &existing).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "cool-shop-3");
}

#[test]
fn test_prefix_slugs_do_not_collide() {
    // "cool-shopping" shares a prefix but does not match the pattern
    let existing = slugs(&["cool-shopping", "cool-shop-house"]);
    let slug = Slug::allocate("Cool Shop", &existing).unwrap();
    assert_eq!(slug.as_str(), "cool-shop");
}

#[test]
fn test_matching_is_case_insensitive() {
    let existing = vec![Slug::base("COOL shop").unwrap()];
    let slug = Slug::allocate("cool SHOP", &existing).unwrap();
    assert_eq!(slug.as_str(), "cool-shop-2");
}
