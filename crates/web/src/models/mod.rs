//! Domain models for the site.
//!
//! These types represent validated domain objects separate from database row
//! types; the `db` module maps rows into them.

pub mod review;
pub mod session;
pub mod store;
pub mod user;

pub use review::Review;
pub use session::{CurrentUser, keys as session_keys};
pub use store::{Location, PAGE_SIZE, Store, StorePage, TAG_CHOICES};
pub use user::User;
