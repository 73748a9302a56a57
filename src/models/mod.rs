//! Data models for the AirMap application
//!
//! - Coordinate: validated geographic position
//! - AirQuality: reading produced by a lookup

pub mod air_quality;
pub mod coordinate;

pub use air_quality::AirQualityReading;
pub use coordinate::Coordinate;
