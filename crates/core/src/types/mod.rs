//! Core types for Storefinder.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod coordinates;
pub mod email;
pub mod id;
pub mod rating;
pub mod slug;

pub use coordinates::{Coordinates, CoordinatesError};
pub use email::{Email, EmailError};
pub use id::*;
pub use rating::{Rating, RatingError};
pub use slug::{Slug, SlugError};
