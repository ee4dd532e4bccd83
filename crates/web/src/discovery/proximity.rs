//! Nearest-store geospatial queries.
//!
//! Stores are bucketed into a fixed-size latitude/longitude cell grid at
//! build time. A query walks only the cells overlapping its bounding box
//! (wrapping across the antimeridian), computes haversine distances for the
//! candidates found there, filters to the maximum distance, and sorts
//! ascending. Work therefore scales with local store density, not the total
//! store count.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use storefinder_core::{Coordinates, Slug};

use crate::models::{Location, Store};

/// Mean earth radius in meters, spherical model.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Grid cell edge in degrees (~28 km north-south per cell).
const CELL_SIZE_DEG: f64 = 0.25;

/// Number of grid columns (longitude bands).
const GRID_COLS: i32 = (360.0 / CELL_SIZE_DEG) as i32;

/// Number of grid rows (latitude bands).
const GRID_ROWS: i32 = (180.0 / CELL_SIZE_DEG) as i32;

/// A store projection returned by a proximity query.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyStore {
    /// URL identifier.
    pub slug: Slug,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Coordinates and address.
    pub location: Location,
    /// Photo filename, if any.
    pub photo: Option<String>,
    /// Great-circle distance from the query point in meters.
    pub distance_m: f64,
}

/// One indexed store.
#[derive(Debug, Clone)]
struct StorePoint {
    coordinates: Coordinates,
    slug: Slug,
    name: String,
    description: String,
    address: String,
    photo: Option<String>,
}

/// Grid-bucketed nearest-neighbor index over store locations.
pub struct ProximityIndex {
    points: Vec<StorePoint>,
    grid: HashMap<(i32, i32), Vec<usize>>,
}

impl ProximityIndex {
    /// Build the index from a store scan.
    #[must_use]
    pub fn build(stores: &[Store]) -> Self {
        let mut points = Vec::with_capacity(stores.len());
        let mut grid: HashMap<(i32, i32), Vec<usize>> = HashMap::new();

        for store in stores {
            let coordinates = store.location.coordinates;
            let cell = cell_of(&coordinates);
            grid.entry(cell).or_default().push(points.len());
            points.push(StorePoint {
                coordinates,
                slug: store.slug.clone(),
                name: store.name.clone(),
                description: store.description.clone(),
                address: store.location.address.clone(),
                photo: store.photo.clone(),
            });
        }

        Self { points, grid }
    }

    /// Number of indexed stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the index holds no stores.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Stores within `max_distance_m` meters of `origin`, nearest first.
    ///
    /// Stores farther than `max_distance_m` are excluded entirely, not
    /// merely deprioritized. Ties in distance order by slug. At most `limit`
    /// results; no matches is an empty list, never an error.
    #[must_use]
    pub fn near(&self, origin: Coordinates, max_distance_m: f64, limit: usize) -> Vec<NearbyStore> {
        let mut matches: Vec<(f64, usize)> = Vec::new();

        for cell in candidate_cells(origin, max_distance_m) {
            let Some(indices) = self.grid.get(&cell) else {
                continue;
            };
            for &idx in indices {
                let Some(point) = self.points.get(idx) else {
                    continue;
                };
                let distance = haversine_m(origin, point.coordinates);
                if distance <= max_distance_m {
                    matches.push((distance, idx));
                }
            }
        }

        matches.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    let slug_a = self.points.get(a.1).map(|p| &p.slug);
                    let slug_b = self.points.get(b.1).map(|p| &p.slug);
                    slug_a.cmp(&slug_b)
                })
        });
        matches.truncate(limit);

        matches
            .into_iter()
            .filter_map(|(distance_m, idx)| {
                let point = self.points.get(idx)?;
                Some(NearbyStore {
                    slug: point.slug.clone(),
                    name: point.name.clone(),
                    description: point.description.clone(),
                    location: Location {
                        coordinates: point.coordinates,
                        address: point.address.clone(),
                    },
                    photo: point.photo.clone(),
                    distance_m,
                })
            })
            .collect()
    }
}

/// Grid cells overlapping the query's bounding box, with antimeridian wrap.
#[allow(clippy::cast_possible_truncation)]
fn candidate_cells(origin: Coordinates, max_distance_m: f64) -> Vec<(i32, i32)> {
    let lat_delta = max_distance_m / METERS_PER_DEGREE;
    let lat_min = (origin.latitude() - lat_delta).max(-90.0);
    let lat_max = (origin.latitude() + lat_delta).min(90.0);

    // The longitude band is widest at the latitude closest to a pole.
    // Near the poles cos() collapses and the band covers every column.
    let widest_lat = lat_min.abs().max(lat_max.abs()).min(89.9);
    let lng_scale = widest_lat.to_radians().cos();
    let lng_delta = if lng_scale <= f64::EPSILON {
        360.0
    } else {
        max_distance_m / (METERS_PER_DEGREE * lng_scale)
    };

    let row_min = row_of(lat_min);
    let row_max = row_of(lat_max);

    let (col_start, col_count) = if lng_delta >= 180.0 {
        (0, GRID_COLS)
    } else {
        let start = ((origin.longitude() - lng_delta + 180.0) / CELL_SIZE_DEG).floor() as i32;
        let end = ((origin.longitude() + lng_delta + 180.0) / CELL_SIZE_DEG).floor() as i32;
        (start, (end - start + 1).min(GRID_COLS))
    };

    let mut cells = Vec::with_capacity(((row_max - row_min + 1) * col_count).unsigned_abs() as usize);
    for row in row_min..=row_max {
        for offset in 0..col_count {
            cells.push((row, (col_start + offset).rem_euclid(GRID_COLS)));
        }
    }
    cells
}

/// Cell coordinates (row, col) for a point.
fn cell_of(point: &Coordinates) -> (i32, i32) {
    (row_of(point.latitude()), col_of(point.longitude()))
}

/// Latitude band index, clamped so +90 lands in the last row.
#[allow(clippy::cast_possible_truncation)]
fn row_of(latitude: f64) -> i32 {
    (((latitude + 90.0) / CELL_SIZE_DEG).floor() as i32).clamp(0, GRID_ROWS - 1)
}

/// Longitude band index, clamped so +180 lands in the last column.
#[allow(clippy::cast_possible_truncation)]
fn col_of(longitude: f64) -> i32 {
    (((longitude + 180.0) / CELL_SIZE_DEG).floor() as i32).clamp(0, GRID_COLS - 1)
}

/// Great-circle distance between two points in meters (haversine).
fn haversine_m(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let d_lat = (b.latitude() - a.latitude()).to_radians();
    let d_lng = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storefinder_core::{StoreId, UserId};

    fn store_at(id: i32, name: &str, longitude: f64, latitude: f64) -> Store {
        Store {
            id: StoreId::new(id),
            name: name.to_owned(),
            slug: storefinder_core::Slug::base(name).unwrap(),
            description: String::new(),
            tags: Vec::new(),
            location: Location {
                coordinates: Coordinates::new(longitude, latitude).unwrap(),
                address: "1 Main St".to_owned(),
            },
            photo: None,
            author_id: UserId::new(1),
            created_at: Utc::now(),
        }
    }

    fn origin(longitude: f64, latitude: f64) -> Coordinates {
        Coordinates::new(longitude, latitude).unwrap()
    }

    #[test]
    fn test_haversine_known_distance() {
        // 0.01 degrees of latitude is ~1112 meters
        let a = origin(0.0, 0.0);
        let b = origin(0.0, 0.01);
        let d = haversine_m(a, b);
        assert!((d - 1112.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = origin(-123.1, 49.25);
        assert!(haversine_m(p, p).abs() < 1e-9);
    }

    #[test]
    fn test_results_sorted_ascending_within_max() {
        let stores = vec![
            store_at(1, "Far", 0.08, 0.0),    // ~8.9 km
            store_at(2, "Near", 0.01, 0.0),   // ~1.1 km
            store_at(3, "Mid", 0.04, 0.0),    // ~4.5 km
            store_at(4, "Beyond", 0.5, 0.0),  // ~55 km, excluded
        ];
        let index = ProximityIndex::build(&stores);

        let results = index.near(origin(0.0, 0.0), 10_000.0, 10);

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Mid", "Far"]);
        for pair in results.windows(2) {
            assert!(pair[0].distance_m <= pair[1].distance_m);
        }
        assert!(results.iter().all(|r| r.distance_m <= 10_000.0));
    }

    #[test]
    fn test_limit_caps_results() {
        let stores: Vec<Store> = (1..=5)
            .map(|i| store_at(i, &format!("Store {i}"), 0.001 * f64::from(i), 0.0))
            .collect();
        let index = ProximityIndex::build(&stores);

        let results = index.near(origin(0.0, 0.0), 10_000.0, 2);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_no_matches_is_empty_not_error() {
        let stores = vec![store_at(1, "Lonely", 10.0, 10.0)];
        let index = ProximityIndex::build(&stores);

        let results = index.near(origin(-10.0, -10.0), 10_000.0, 10);
        assert!(results.is_empty());
    }

    #[test]
    fn test_antimeridian_wrap() {
        let stores = vec![store_at(1, "Dateline", 179.95, 0.0)];
        let index = ProximityIndex::build(&stores);

        // ~11 km away across the antimeridian
        let results = index.near(origin(-179.95, 0.0), 15_000.0, 10);
        assert_eq!(results.len(), 1);
        let hit = results.first().unwrap();
        assert!(hit.distance_m < 12_000.0, "got {}", hit.distance_m);
    }

    #[test]
    fn test_distance_ties_order_by_slug() {
        let stores = vec![
            store_at(1, "Beta", 0.01, 0.0),
            store_at(2, "Alpha", -0.01, 0.0),
        ];
        let index = ProximityIndex::build(&stores);

        let results = index.near(origin(0.0, 0.0), 10_000.0, 10);
        let slugs: Vec<&str> = results.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_store_projection_fields() {
        let mut store = store_at(1, "Projected", 0.0, 0.0);
        store.description = "about".to_owned();
        store.photo = Some("p.jpg".to_owned());
        let index = ProximityIndex::build(std::slice::from_ref(&store));

        let results = index.near(origin(0.0, 0.0), 10_000.0, 10);
        let hit = results.first().unwrap();
        assert_eq!(hit.slug.as_str(), "projected");
        assert_eq!(hit.description, "about");
        assert_eq!(hit.photo.as_deref(), Some("p.jpg"));
        assert_eq!(hit.location.address, "1 Main St");
    }
}
