//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Store listing (page 1)
//! GET  /stores/page/{page}      - Store listing, paginated (size 4)
//! GET  /store/{slug}            - Store detail with reviews
//! GET  /add                     - Add-store form (requires auth)
//! POST /add                     - Create store (requires auth)
//! GET  /stores/{id}/edit        - Edit form (owner only)
//! POST /stores/{id}/edit        - Update store (owner only)
//! GET  /top                     - Top stores by review quality
//!
//! # Tags
//! GET  /tags                    - Tag facets + all tagged stores
//! GET  /tags/{tag}              - Tag facets + stores with this tag
//!
//! # Map
//! GET  /map                     - Map page
//!
//! # Reviews & hearts
//! POST /reviews/{store_id}      - Add a review (requires auth)
//! GET  /hearts                  - Hearted stores (requires auth)
//!
//! # Auth
//! GET  /login                   - Login page
//! POST /login                   - Login action
//! GET  /register                - Register page
//! POST /register                - Register action
//! POST /logout                  - Logout action
//! GET  /forgot                  - Forgot-password page
//! POST /forgot                  - Send reset link
//! GET  /reset/{token}           - Reset-password page
//! POST /reset/{token}           - Reset password
//!
//! # JSON API
//! GET  /api/search?q=           - Relevance search, top 5
//! GET  /api/stores/near?lat=&lng= - Stores within 10 km, nearest first
//! POST /api/stores/{id}/heart   - Toggle favorite (requires auth)
//! ```

pub mod auth;
pub mod hearts;
pub mod map;
pub mod reviews;
pub mod search;
pub mod stores;
pub mod tags;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/stores/page/{page}", get(stores::paged))
        .route("/store/{slug}", get(stores::show))
        .route("/add", get(stores::add_form).post(stores::create))
        .route("/stores/{id}/edit", get(stores::edit_form).post(stores::update))
        .route("/top", get(stores::top))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/forgot", get(auth::forgot_page).post(auth::forgot))
        .route("/reset/{token}", get(auth::reset_page).post(auth::reset))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search::search))
        .route("/stores/near", get(map::near))
        .route("/stores/{id}/heart", post(hearts::toggle))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(store_routes())
        .merge(auth_routes())
        .route("/tags", get(tags::index))
        .route("/tags/{tag}", get(tags::show))
        .route("/map", get(map::page))
        .route("/hearts", get(hearts::index))
        .route("/reviews/{store_id}", post(reviews::create))
        .nest("/api", api_routes())
}
