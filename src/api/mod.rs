use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    AirMapError,
    classifier::AqiCategory,
    controller::{Controller, LookupOutcome, LookupReport, LookupStage},
};

/// Raw text exactly as typed by the user
#[derive(Debug, Default, Deserialize)]
pub struct AirQualityQuery {
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lon: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiAirQuality {
    pub success: bool,
    pub message: String,
    pub aqi: Option<u32>,
    pub category: Option<AqiCategory>,
    /// Nearest monitoring city reported by the service
    pub city: Option<String>,
    pub map_url: Option<String>,
    /// Step that failed, absent on success
    pub stage: Option<LookupStage>,
}

impl From<&LookupReport> for ApiAirQuality {
    fn from(report: &LookupReport) -> Self {
        let (aqi, category, city, stage) = match &report.outcome {
            LookupOutcome::Success { reading, category } => {
                (Some(reading.aqi), Some(*category), reading.city.clone(), None)
            }
            LookupOutcome::Failure { stage, .. } => (None, None, None, Some(*stage)),
        };

        Self {
            success: report.is_success(),
            message: report.message(),
            aqi,
            category,
            city,
            map_url: report.map.as_ref().map(|map| map.url.clone()),
            stage,
        }
    }
}

fn status_for(report: &LookupReport) -> StatusCode {
    match &report.outcome {
        LookupOutcome::Success { .. } => StatusCode::OK,
        LookupOutcome::Failure { reason, .. } => match reason {
            AirMapError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AirMapError::Lookup(_) => StatusCode::BAD_GATEWAY,
            AirMapError::Config { .. } | AirMapError::Render { .. } | AirMapError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
    }
}

pub fn router() -> Router<Controller> {
    Router::new().route("/air-quality", get(get_air_quality))
}

async fn get_air_quality(
    State(controller): State<Controller>,
    Query(query): Query<AirQualityQuery>,
) -> (StatusCode, Json<ApiAirQuality>) {
    let report = controller.lookup(&query.lat, &query.lon).await;
    (status_for(&report), Json(ApiAirQuality::from(&report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::map::PublishedMap;
    use crate::models::{AirQualityReading, Coordinate};
    use std::path::PathBuf;

    #[test]
    fn test_success_payload_fields() {
        let mut reading = AirQualityReading::new(42);
        reading.city = Some("Brasov".to_string());
        reading.country = Some("Romania".to_string());
        let report = LookupReport {
            coordinate: Coordinate::new(45.9432, 24.9668).ok(),
            map: Some(PublishedMap {
                file: PathBuf::from("public/map_45.9432_24.9668.html"),
                url: "http://localhost:8000/maps/map_45.9432_24.9668.html?t=1".to_string(),
            }),
            outcome: LookupOutcome::Success {
                reading,
                category: AqiCategory::Good,
            },
        };

        let json = serde_json::to_value(ApiAirQuality::from(&report)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["aqi"], 42);
        assert_eq!(json["category"], "good");
        assert_eq!(json["city"], "Brasov");
        assert!(json["stage"].is_null());
        assert_eq!(status_for(&report), StatusCode::OK);
    }

    #[test]
    fn test_failure_payload_names_stage() {
        let report = LookupReport {
            coordinate: None,
            map: None,
            outcome: LookupOutcome::Failure {
                stage: LookupStage::Validating,
                reason: AirMapError::Validation(ValidationError::Range {
                    latitude: 200.0,
                    longitude: 24.0,
                }),
            },
        };

        let json = serde_json::to_value(ApiAirQuality::from(&report)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["stage"], "validating");
        assert!(json["city"].is_null());
        assert!(json["map_url"].is_null());
        assert_eq!(status_for(&report), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
