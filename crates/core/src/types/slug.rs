//! URL-safe store identifiers.
//!
//! A [`Slug`] is derived from a store's display name and is what appears in
//! store URLs (`/store/cool-shop`). Allocation is count-based: if slugs
//! matching the derived base already exist, a numeric suffix is appended.
//! The allocator is deterministic given the same inputs; it does NOT by
//! itself guarantee global uniqueness under concurrent creation - the
//! database's unique constraint on the slug column is the authoritative
//! defense, and callers retry allocation once on a constraint violation.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when deriving a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The name contains no usable characters.
    #[error("name does not produce a usable slug")]
    Empty,
}

/// A URL-safe string identifier derived from a human-readable name.
///
/// Slugs are lowercase ASCII: alphanumeric runs separated by single hyphens,
/// optionally followed by a `-N` collision suffix.
///
/// ## Examples
///
/// ```
/// use storefinder_core::Slug;
///
/// let slug = Slug::base("Cool Shop").unwrap();
/// assert_eq!(slug.as_str(), "cool-shop");
///
/// // Non-alphanumeric runs collapse to a single hyphen
/// let slug = Slug::base("  Joe's -- Caffè!  ").unwrap();
/// assert_eq!(slug.as_str(), "joe-s-caff");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive the base slug from a display name.
    ///
    /// Lowercases ASCII alphanumerics, collapses every other run of
    /// characters into a single hyphen, and trims leading/trailing hyphens.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if nothing usable remains.
    pub fn base(name: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }

        if out.is_empty() {
            return Err(SlugError::Empty);
        }

        Ok(Self(out))
    }

    /// Allocate a slug for `name` given the set of already-issued slugs
    /// whose text matches the base pattern.
    ///
    /// With no matches the result is the base itself; with `k` matches the
    /// result is `base-(k+1)`. Callers pass the matching set as read from
    /// storage; the allocator re-filters it defensively so that unrelated
    /// slugs in the input cannot skew the count.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if `name` does not produce a usable base.
    pub fn allocate(name: &str, existing: &[Self]) -> Result<Self, SlugError> {
        let base = Self::base(name)?;
        let matching = existing.iter().filter(|s| s.matches_base(&base)).count();

        if matching == 0 {
            Ok(base)
        } else {
            Ok(Self(format!("{}-{}", base.0, matching + 1)))
        }
    }

    /// Whether this slug matches `base` under the collision pattern
    /// `^(base)(-[0-9]*)?$`, case-insensitively.
    #[must_use]
    pub fn matches_base(&self, base: &Self) -> bool {
        let base = base.as_str();
        let Some(head) = self.0.get(..base.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(base) {
            return false;
        }

        match self.0.get(base.len()..) {
            Some("") => true,
            Some(rest) => rest
                .strip_prefix('-')
                .is_some_and(|digits| digits.chars().all(|c| c.is_ascii_digit())),
            None => false,
        }
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values were validated at allocation time
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn slug(s: &str) -> Slug {
        Slug(s.to_owned())
    }

    #[test]
    fn test_base_lowercases_and_hyphenates() {
        assert_eq!(Slug::base("Cool Shop").unwrap().as_str(), "cool-shop");
        assert_eq!(Slug::base("Tim Hortons").unwrap().as_str(), "tim-hortons");
    }

    #[test]
    fn test_base_collapses_runs_and_trims() {
        assert_eq!(Slug::base("  A  --  B!! ").unwrap().as_str(), "a-b");
        assert_eq!(Slug::base("!!!hello???").unwrap().as_str(), "hello");
    }

    #[test]
    fn test_base_drops_non_ascii() {
        assert_eq!(Slug::base("Caffè Über").unwrap().as_str(), "caff-ber");
    }

    #[test]
    fn test_base_empty_name_fails() {
        assert_eq!(Slug::base(""), Err(SlugError::Empty));
        assert_eq!(Slug::base("   "), Err(SlugError::Empty));
        assert_eq!(Slug::base("!!!"), Err(SlugError::Empty));
    }

    #[test]
    fn test_allocate_no_collision() {
        let allocated = Slug::allocate("Cool Shop", &[]).unwrap();
        assert_eq!(allocated.as_str(), "cool-shop");
    }

    #[test]
    fn test_allocate_second_store_gets_suffix_two() {
        let existing = vec![slug("cool-shop")];
        let allocated = Slug::allocate("Cool Shop", &existing).unwrap();
        assert_eq!(allocated.as_str(), "cool-shop-2");
    }

    #[test]
    fn test_allocate_counts_suffixed_matches() {
        let existing = vec![slug("cool-shop"), slug("cool-shop-2")];
        let allocated = Slug::allocate("Cool Shop", &existing).unwrap();
        assert_eq!(allocated.as_str(), "cool-shop-3");
    }

    #[test]
    fn test_allocate_ignores_unrelated_slugs() {
        let existing = vec![slug("cool-shopping"), slug("warm-shop"), slug("cool")];
        let allocated = Slug::allocate("Cool Shop", &existing).unwrap();
        assert_eq!(allocated.as_str(), "cool-shop");
    }

    #[test]
    fn test_allocate_is_deterministic() {
        let existing = vec![slug("cool-shop"), slug("cool-shop-2")];
        let first = Slug::allocate("Cool Shop", &existing).unwrap();
        let second = Slug::allocate("Cool Shop", &existing).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_matches_base_pattern() {
        let base = slug("cool-shop");
        assert!(slug("cool-shop").matches_base(&base));
        assert!(slug("cool-shop-2").matches_base(&base));
        assert!(slug("cool-shop-10").matches_base(&base));
        // Bare trailing hyphen is allowed by the pattern ([0-9]* matches "")
        assert!(slug("cool-shop-").matches_base(&base));
        // Case-insensitive, like the original text index
        assert!(slug("Cool-Shop").matches_base(&base));

        assert!(!slug("cool-shopping").matches_base(&base));
        assert!(!slug("cool-shop-x").matches_base(&base));
        assert!(!slug("cool").matches_base(&base));
    }

    #[test]
    fn test_serde_roundtrip() {
        let s = Slug::base("Cool Shop").unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"cool-shop\"");
        let parsed: Slug = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }
}
