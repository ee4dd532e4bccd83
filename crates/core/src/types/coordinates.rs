//! Geographic coordinates.
//!
//! Stored and consumed in (longitude, latitude) order everywhere - the same
//! order GeoJSON uses. Swapping the two silently corrupts every distance
//! computation, so the pair only exists behind this validated type.

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Coordinates`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoordinatesError {
    /// Longitude outside [-180, 180] or not a finite number.
    #[error("longitude must be a finite number in [-180, 180], got {0}")]
    InvalidLongitude(f64),
    /// Latitude outside [-90, 90] or not a finite number.
    #[error("latitude must be a finite number in [-90, 90], got {0}")]
    InvalidLatitude(f64),
}

/// A validated (longitude, latitude) pair in degrees.
///
/// ## Examples
///
/// ```
/// use storefinder_core::Coordinates;
///
/// let point = Coordinates::new(-123.1, 49.25).unwrap();
/// assert_eq!(point.longitude(), -123.1);
/// assert_eq!(point.latitude(), 49.25);
///
/// assert!(Coordinates::new(-190.0, 0.0).is_err());
/// assert!(Coordinates::new(0.0, f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    longitude: f64,
    latitude: f64,
}

impl Coordinates {
    /// Create coordinates from a (longitude, latitude) pair in degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if either component is non-finite or out of range.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, CoordinatesError> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinatesError::InvalidLongitude(longitude));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinatesError::InvalidLatitude(latitude));
        }

        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Longitude in degrees, in [-180, 180].
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees, in [-90, 90].
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        assert!(Coordinates::new(0.0, 0.0).is_ok());
        assert!(Coordinates::new(-180.0, -90.0).is_ok());
        assert!(Coordinates::new(180.0, 90.0).is_ok());
    }

    #[test]
    fn test_longitude_out_of_range() {
        assert!(matches!(
            Coordinates::new(180.1, 0.0),
            Err(CoordinatesError::InvalidLongitude(_))
        ));
        assert!(matches!(
            Coordinates::new(-200.0, 0.0),
            Err(CoordinatesError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_latitude_out_of_range() {
        assert!(matches!(
            Coordinates::new(0.0, 90.5),
            Err(CoordinatesError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
    }
}
