//! `AirMap` - air quality lookup by coordinates with an interactive map
//!
//! This library validates user-entered coordinates, looks up the US AQI of
//! the nearest monitored city, classifies it, and renders a map with a
//! marker at the requested place.

pub mod air_quality;
pub mod api;
pub mod classifier;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod map;
pub mod models;
pub mod validation;
pub mod web;

use std::sync::Arc;

// Re-export core types for public API
pub use air_quality::{AirQualitySource, IqAirClient};
pub use classifier::{AqiCategory, classify};
pub use config::AirMapConfig;
pub use controller::{Controller, LookupOutcome, LookupReport, LookupStage};
pub use error::{AirMapError, CoordinateField, LookupError, ValidationError};
pub use map::{ArtifactHost, DirectoryHost, LeafletMapPresenter, MapArtifact, MapPresenter, PublishedMap};
pub use models::{AirQualityReading, Coordinate};
pub use validation::CoordinateValidator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AirMapError>;

/// Wire the production collaborators described by `config` into a controller
pub fn build_controller(config: &AirMapConfig) -> Result<Controller> {
    let client = IqAirClient::new(&config.service)?;
    Ok(Controller::new(
        Arc::new(client),
        Arc::new(LeafletMapPresenter::from_config(&config.map)),
        Arc::new(DirectoryHost::from_config(config)),
    ))
}
