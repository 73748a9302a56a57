//! Coordinate model for validated geographic positions

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Valid latitude range in decimal degrees
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;
/// Valid longitude range in decimal degrees
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A latitude/longitude pair that is known to be in range.
///
/// Fields are private so a `Coordinate` can only come out of [`Coordinate::new`]:
/// either both values are in range or no value exists at all.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ValidationError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting the pair as a whole if either value is out of range
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if LATITUDE_RANGE.contains(&latitude) && LONGITUDE_RANGE.contains(&longitude) {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(ValidationError::Range {
                latitude,
                longitude,
            })
        }
    }

    /// Latitude in decimal degrees
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_coordinate_rejects_pair_when_one_side_is_out_of_range() {
        let err = Coordinate::new(45.0, 181.0).unwrap_err();
        assert!(matches!(err, ValidationError::Range { .. }));
    }

    #[test]
    fn test_coordinate_rejects_nan() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_format_coordinates() {
        let coordinate = Coordinate::new(45.943_21, 24.966_79).unwrap();
        assert_eq!(coordinate.format_coordinates(), "45.9432, 24.9668");
    }

    #[test]
    fn test_deserialize_checks_range() {
        let ok: Coordinate = serde_json::from_str(r#"{"latitude":1.5,"longitude":2.5}"#).unwrap();
        assert_eq!(ok.latitude(), 1.5);

        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude":91,"longitude":0}"#);
        assert!(bad.is_err());
    }
}
