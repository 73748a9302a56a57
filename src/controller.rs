//! Lookup orchestration
//!
//! A [`Controller`] runs one "get air quality" action from raw text input to a
//! single user-visible message:
//!
//! `Idle -> Validating -> Fetching -> Classifying -> Presenting -> Idle`
//!
//! with a failure possible at any step. The map is rendered and published as
//! soon as the coordinates validate, before the network lookup, so a failed
//! lookup still leaves the map pointing at the requested place.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::AirMapError;
use crate::air_quality::AirQualitySource;
use crate::classifier::{AqiCategory, classify};
use crate::map::{ArtifactHost, MapPresenter, PublishedMap};
use crate::models::{AirQualityReading, Coordinate};
use crate::validation::CoordinateValidator;

/// Step of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStage {
    Idle,
    Validating,
    Fetching,
    Classifying,
    Presenting,
    Error,
}

impl fmt::Display for LookupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LookupStage::Idle => "idle",
            LookupStage::Validating => "validating",
            LookupStage::Fetching => "fetching",
            LookupStage::Classifying => "classifying",
            LookupStage::Presenting => "presenting",
            LookupStage::Error => "error",
        };
        f.write_str(name)
    }
}

/// How a lookup ended
#[derive(Debug)]
pub enum LookupOutcome {
    Success {
        reading: AirQualityReading,
        category: AqiCategory,
    },
    Failure {
        /// Step that failed
        stage: LookupStage,
        reason: AirMapError,
    },
}

/// Everything one action produced
#[derive(Debug)]
pub struct LookupReport {
    pub coordinate: Option<Coordinate>,
    pub map: Option<PublishedMap>,
    pub outcome: LookupOutcome,
}

impl LookupReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, LookupOutcome::Success { .. })
    }

    /// The one message shown to the user
    #[must_use]
    pub fn message(&self) -> String {
        match &self.outcome {
            LookupOutcome::Success { reading, category } => {
                format!("Air quality: {} (AQI: {})", category.label(), reading.aqi)
            }
            LookupOutcome::Failure { reason, .. } => reason.user_message(),
        }
    }
}

/// Runs lookups against injected collaborators.
///
/// Holds no per-request data; one instance serves a whole session.
#[derive(Clone)]
pub struct Controller {
    validator: CoordinateValidator,
    source: Arc<dyn AirQualitySource>,
    presenter: Arc<dyn MapPresenter>,
    host: Arc<dyn ArtifactHost>,
}

impl Controller {
    pub fn new(
        source: Arc<dyn AirQualitySource>,
        presenter: Arc<dyn MapPresenter>,
        host: Arc<dyn ArtifactHost>,
    ) -> Self {
        Self {
            validator: CoordinateValidator,
            source,
            presenter,
            host,
        }
    }

    /// Render and publish a map without looking anything up
    #[instrument(skip(self), fields(coordinates = %center.format_coordinates()))]
    pub async fn show_map(&self, center: Coordinate) -> Result<PublishedMap, AirMapError> {
        let artifact = self.presenter.render(center)?;
        self.host.publish(&artifact).await
    }

    /// Run one lookup from raw user text to a report
    #[instrument(skip(self))]
    pub async fn lookup(&self, lat_text: &str, lon_text: &str) -> LookupReport {
        let mut stage = LookupStage::Idle;

        advance(&mut stage, LookupStage::Validating);
        let coordinate = match self.validator.validate(lat_text, lon_text) {
            Ok(coordinate) => coordinate,
            Err(e) => {
                warn!("Rejected coordinates: {}", e);
                return failed(stage, e.into(), None, None);
            }
        };

        // the map follows the coordinates before the network call
        advance(&mut stage, LookupStage::Fetching);
        let map = match self.show_map(coordinate).await {
            Ok(map) => map,
            Err(e) => {
                warn!("Map update failed: {}", e);
                return failed(stage, e, Some(coordinate), None);
            }
        };

        let reading = match self.source.fetch_aqi(coordinate).await {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Air quality lookup failed: {}", e);
                return failed(stage, e.into(), Some(coordinate), Some(map));
            }
        };

        advance(&mut stage, LookupStage::Classifying);
        let category = classify(&reading);

        advance(&mut stage, LookupStage::Presenting);
        let report = LookupReport {
            coordinate: Some(coordinate),
            map: Some(map),
            outcome: LookupOutcome::Success { reading, category },
        };
        info!("{}", report.message());

        advance(&mut stage, LookupStage::Idle);
        report
    }
}

fn advance(stage: &mut LookupStage, next: LookupStage) {
    debug!("Lookup stage {} -> {}", stage, next);
    *stage = next;
}

/// Report a failure at the stage the lookup had reached
fn failed(
    stage: LookupStage,
    reason: AirMapError,
    coordinate: Option<Coordinate>,
    map: Option<PublishedMap>,
) -> LookupReport {
    debug!("Lookup stage {} -> {}", stage, LookupStage::Error);
    LookupReport {
        coordinate,
        map,
        outcome: LookupOutcome::Failure { stage, reason },
    }
}
