//! Coordinate input validation
//!
//! Turns the free-form latitude/longitude text typed by a user into a
//! [`Coordinate`], or explains why it can't.

use tracing::debug;

use crate::error::{CoordinateField, ValidationError};
use crate::models::Coordinate;

/// Parser and range checker for user-entered coordinates
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateValidator;

impl CoordinateValidator {
    /// Parse both fields and range-check them as one pair
    pub fn validate(&self, lat_text: &str, lon_text: &str) -> Result<Coordinate, ValidationError> {
        let latitude = Self::parse_field(CoordinateField::Latitude, lat_text)?;
        let longitude = Self::parse_field(CoordinateField::Longitude, lon_text)?;

        let coordinate = Coordinate::new(latitude, longitude)?;
        debug!("Validated coordinates: {}", coordinate.format_coordinates());
        Ok(coordinate)
    }

    fn parse_field(field: CoordinateField, text: &str) -> Result<f64, ValidationError> {
        let trimmed = text.trim();

        // "1e400", "inf" and "NaN" parse fine; Coordinate::new rejects them as out of range
        trimmed
            .parse::<f64>()
            .map_err(|_| ValidationError::parse(field, trimmed))
    }
}
