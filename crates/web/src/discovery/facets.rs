//! Tag facet aggregation.
//!
//! Answers "which tags exist, and how many stores carry each one" for the
//! tag browse page.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::models::Store;

/// A distinct tag paired with the number of stores carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    /// The tag text.
    pub tag: String,
    /// Number of stores containing this tag at least once.
    pub count: usize,
}

/// Count distinct tags across all stores.
///
/// A store contributes at most 1 to each tag's count, even if its tag list
/// repeats a tag. Empty tag strings are ignored. Results are sorted by count
/// descending, ties by tag ascending.
#[must_use]
pub fn tag_counts(stores: &[Store]) -> Vec<TagCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for store in stores {
        // Tags within a store are a set; dedupe before counting
        let distinct: BTreeSet<&str> = store
            .tags
            .iter()
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .collect();
        for tag in distinct {
            *counts.entry(tag).or_insert(0) += 1;
        }
    }

    let mut out: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_owned(),
            count,
        })
        .collect();

    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Location;
    use chrono::Utc;
    use storefinder_core::{Coordinates, Slug, StoreId, UserId};

    fn store_with_tags(id: i32, tags: &[&str]) -> Store {
        Store {
            id: StoreId::new(id),
            name: format!("Store {id}"),
            slug: Slug::base(&format!("store {id}")).unwrap(),
            description: String::new(),
            tags: tags.iter().map(ToString::to_string).collect(),
            location: Location {
                coordinates: Coordinates::new(0.0, 0.0).unwrap(),
                address: "1 Main St".to_owned(),
            },
            photo: None,
            author_id: UserId::new(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_counts_stores_not_occurrences() {
        let stores = vec![
            store_with_tags(1, &["Wifi", "Wifi", "Licensed"]),
            store_with_tags(2, &["Wifi"]),
        ];
        let counts = tag_counts(&stores);
        assert_eq!(
            counts,
            vec![
                TagCount {
                    tag: "Wifi".to_owned(),
                    count: 2
                },
                TagCount {
                    tag: "Licensed".to_owned(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_sorted_by_count_then_tag() {
        let stores = vec![
            store_with_tags(1, &["Open Late", "Wifi"]),
            store_with_tags(2, &["Wifi", "Family Friendly"]),
            store_with_tags(3, &["Family Friendly"]),
        ];
        let counts = tag_counts(&stores);
        let order: Vec<(&str, usize)> = counts.iter().map(|c| (c.tag.as_str(), c.count)).collect();
        assert_eq!(
            order,
            vec![("Family Friendly", 2), ("Wifi", 2), ("Open Late", 1)]
        );
    }

    #[test]
    fn test_count_sum_equals_membership_pairs() {
        let stores = vec![
            store_with_tags(1, &["a", "b", "c"]),
            store_with_tags(2, &["b", "c"]),
            store_with_tags(3, &[]),
        ];
        let counts = tag_counts(&stores);
        let total: usize = counts.iter().map(|c| c.count).sum();
        // (store, tag) membership pairs: 3 + 2 + 0
        assert_eq!(total, 5);
    }

    #[test]
    fn test_empty_tags_ignored() {
        let stores = vec![store_with_tags(1, &["", "Wifi"])];
        let counts = tag_counts(&stores);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.first().unwrap().tag, "Wifi");
    }

    #[test]
    fn test_no_stores_yields_empty() {
        assert!(tag_counts(&[]).is_empty());
    }
}
