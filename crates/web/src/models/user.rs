//! User domain types.

use chrono::{DateTime, Utc};

use storefinder_core::{Email, UserId};

/// A site user (domain type).
///
/// The password hash never leaves the `db` layer; this type is safe to hand
/// to templates.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user record last changed.
    pub updated_at: DateTime<Utc>,
}
