//! Seed the database with sample data for local development.
//!
//! Creates two users, a handful of stores around Vancouver, and enough
//! reviews that the top-stores page has something to rank.

use secrecy::SecretString;
use tracing::info;

use storefinder_core::{Coordinates, Rating};
use storefinder_web::db::reviews::ReviewRepository;
use storefinder_web::db::stores::{NewStore, StoreRepository};
use storefinder_web::services::auth::AuthService;

/// Password both seeded accounts log in with.
const SEED_PASSWORD: &str = "password123";

struct SeedStore {
    name: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    longitude: f64,
    latitude: f64,
    address: &'static str,
}

const SEED_STORES: &[SeedStore] = &[
    SeedStore {
        name: "Pacific Coffee Roasters",
        description: "Small-batch roasts and long tables for laptop mornings.",
        tags: &["Wifi", "Open Late"],
        longitude: -123.1207,
        latitude: 49.2827,
        address: "801 W Georgia St, Vancouver, BC",
    },
    SeedStore {
        name: "Granville Greens",
        description: "Salads, juices, and a patio that catches the afternoon sun.",
        tags: &["Vegetarian", "Family Friendly"],
        longitude: -123.1336,
        latitude: 49.2754,
        address: "1689 Johnston St, Vancouver, BC",
    },
    SeedStore {
        name: "East Side Records",
        description: "Used vinyl, strong espresso, louder opinions.",
        tags: &["Wifi"],
        longitude: -123.0652,
        latitude: 49.2816,
        address: "2412 Main St, Vancouver, BC",
    },
    SeedStore {
        name: "Harbour Night Market",
        description: "Street food stalls along the water, Thursday through Sunday.",
        tags: &["Open Late", "Family Friendly", "Licensed"],
        longitude: -123.1093,
        latitude: 49.2886,
        address: "999 Canada Pl, Vancouver, BC",
    },
    SeedStore {
        name: "Kitsilano Surf Supply",
        description: "Boards, wetsuits, and free advice about the water.",
        tags: &["Family Friendly"],
        longitude: -123.1569,
        latitude: 49.2684,
        address: "1300 Cornwall Ave, Vancouver, BC",
    },
    SeedStore {
        name: "Commercial Drive Taproom",
        description: "Twenty rotating taps and a dartboard nobody respects.",
        tags: &["Licensed", "Open Late"],
        longitude: -123.0702,
        latitude: 49.2691,
        address: "1745 Commercial Dr, Vancouver, BC",
    },
];

/// Ratings per seeded store, in `SEED_STORES` order. Stores with fewer than
/// two ratings stay off the top-stores page, which is useful for testing.
const SEED_RATINGS: &[&[i16]] = &[&[5, 4, 5], &[4, 4], &[5], &[3, 5, 4, 4], &[], &[2, 3]];

/// Seed the database.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset, the connection fails, or
/// any insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "DATABASE_URL not set")?;

    let pool = storefinder_web::db::create_pool(&database_url).await?;
    info!("Connected to database");

    let auth = AuthService::new(&pool);
    let stores = StoreRepository::new(&pool);
    let reviews = ReviewRepository::new(&pool);

    let owner = auth
        .register("owner@example.com", SEED_PASSWORD, SEED_PASSWORD)
        .await?;
    let reviewer = auth
        .register("reviewer@example.com", SEED_PASSWORD, SEED_PASSWORD)
        .await?;
    info!("Created {} and {}", owner.email, reviewer.email);

    for (seed, ratings) in SEED_STORES.iter().zip(SEED_RATINGS) {
        let store = stores
            .create(&NewStore {
                name: seed.name.to_owned(),
                description: seed.description.to_owned(),
                tags: seed.tags.iter().map(ToString::to_string).collect(),
                coordinates: Coordinates::new(seed.longitude, seed.latitude)?,
                address: seed.address.to_owned(),
                photo: None,
                author_id: owner.id,
            })
            .await?;

        for &value in *ratings {
            reviews
                .create(store.id, reviewer.id, Rating::new(value)?, "Seeded review")
                .await?;
        }

        info!(slug = %store.slug, reviews = ratings.len(), "Seeded store");
    }

    info!("Seeding complete!");
    Ok(())
}
