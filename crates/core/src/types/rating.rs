//! Review ratings.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// The value is outside 1..=5.
    #[error("rating must be between 1 and 5, got {0}")]
    OutOfRange(i16),
}

/// A review rating: an integer from 1 to 5 stars.
///
/// ```
/// use storefinder_core::Rating;
///
/// assert_eq!(Rating::new(4).unwrap().as_i16(), 4);
/// assert!(Rating::new(0).is_err());
/// assert!(Rating::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(i16);

impl Rating {
    /// Smallest allowed rating.
    pub const MIN: i16 = 1;
    /// Largest allowed rating.
    pub const MAX: i16 = 5;

    /// Create a rating, validating the 1..=5 range.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] for values outside 1..=5.
    pub const fn new(value: i16) -> Result<Self, RatingError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(RatingError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn as_i16(&self) -> i16 {
        self.0
    }

    /// The rating as an f64, for averaging.
    #[must_use]
    pub const fn as_f64(&self) -> f64 {
        self.0 as f64
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Rating {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Rating {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Self::new(v).map_err(Into::into)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Rating {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range() {
        for v in 1..=5 {
            assert_eq!(Rating::new(v).unwrap().as_i16(), v);
        }
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(Rating::new(0), Err(RatingError::OutOfRange(0)));
        assert_eq!(Rating::new(6), Err(RatingError::OutOfRange(6)));
        assert_eq!(Rating::new(-1), Err(RatingError::OutOfRange(-1)));
    }
}
