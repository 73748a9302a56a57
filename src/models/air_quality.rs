//! Air quality reading returned by a lookup

use serde::{Deserialize, Serialize};

/// Result of one successful air quality lookup.
///
/// Only `aqi` feeds classification; the rest describes the monitoring city
/// the service matched to the requested coordinates.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AirQualityReading {
    /// US AQI value
    pub aqi: u32,
    /// Nearest monitored city
    pub city: Option<String>,
    /// State or region of the city
    pub state: Option<String>,
    /// Country of the city
    pub country: Option<String>,
    /// Main pollutant code for the US AQI (e.g. "p2")
    pub main_pollutant: Option<String>,
    /// Observation timestamp as reported by the service
    pub observed_at: Option<String>,
}

impl AirQualityReading {
    /// Create a reading that only carries the index
    #[must_use]
    pub fn new(aqi: u32) -> Self {
        Self {
            aqi,
            city: None,
            state: None,
            country: None,
            main_pollutant: None,
            observed_at: None,
        }
    }

    /// Human readable place name, e.g. "Brasov, Brasov, Romania"
    #[must_use]
    pub fn place(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_joins_known_parts() {
        let mut reading = AirQualityReading::new(42);
        reading.city = Some("Brasov".to_string());
        reading.country = Some("Romania".to_string());
        assert_eq!(reading.place().as_deref(), Some("Brasov, Romania"));
    }

    #[test]
    fn test_place_without_metadata() {
        assert!(AirQualityReading::new(7).place().is_none());
    }
}
