//! Air quality API client for IQAir (AirVisual) integration
//!
//! One lookup is one GET against the `nearest_city` endpoint. There is no
//! retry and no caching: every call reaches the service exactly once.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

use crate::AirMapError;
use crate::config::ServiceConfig;
use crate::error::LookupError;
use crate::models::{AirQualityReading, Coordinate};

/// Anything that can produce an air quality reading for a coordinate
#[async_trait]
pub trait AirQualitySource: Send + Sync {
    /// Look up the current AQI near `coordinate`
    async fn fetch_aqi(&self, coordinate: Coordinate) -> Result<AirQualityReading, LookupError>;
}

/// Client for the IQAir `nearest_city` endpoint
pub struct IqAirClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl IqAirClient {
    /// Create a new client. Fails if no API key is configured.
    pub fn new(config: &ServiceConfig) -> Result<Self, AirMapError> {
        let api_key = config.require_api_key()?.to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("AirMap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AirMapError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
        })
    }

    fn request_url(&self, coordinate: Coordinate) -> String {
        format!(
            "{}?lat={}&lon={}&key={}",
            self.base_url,
            coordinate.latitude(),
            coordinate.longitude(),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl AirQualitySource for IqAirClient {
    #[instrument(skip(self), fields(coordinates = %coordinate.format_coordinates()))]
    async fn fetch_aqi(&self, coordinate: Coordinate) -> Result<AirQualityReading, LookupError> {
        info!("Requesting air quality from {}", self.base_url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(self.request_url(coordinate))
            .send()
            .await
            .map_err(|e| {
                // reqwest includes the URL in its error, which carries the key
                let e = e.without_url();
                warn!("Air quality request failed: {}", e);
                LookupError::transport(format!("Request failed: {e}"))
            })?;

        let status = response.status();
        debug!("HTTP response received: {}", status);

        if !status.is_success() {
            error!("Air quality service returned HTTP {}", status);
            return Err(LookupError::transport(format!(
                "Service responded with status: {} - {}",
                status,
                status.canonical_reason().unwrap_or("Unknown error")
            )));
        }

        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            warn!("Failed to read air quality response body: {}", e);
            LookupError::transport(format!("Failed to read response: {e}"))
        })?;

        let reading = iqair::parse_reading(&body).inspect_err(|e| {
            error!("Unusable air quality response: {}", e);
        })?;

        let total_duration = start_time.elapsed();
        info!(
            aqi = reading.aqi,
            city = reading.city.as_deref().unwrap_or("unknown"),
            "Retrieved air quality in {:.3}s",
            total_duration.as_secs_f64()
        );

        if total_duration.as_secs() > 5 {
            warn!(
                "Slow air quality response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(reading)
    }
}

/// `IQAir` `nearest_city` response structures
pub(crate) mod iqair {
    use serde::Deserialize;

    use crate::error::LookupError;
    use crate::models::AirQualityReading;

    #[derive(Debug, Deserialize)]
    pub struct NearestCityResponse {
        pub status: Option<String>,
        pub data: Option<NearestCityData>,
    }

    /// On `status: "fail"` the service puts a `message` here instead of a city
    #[derive(Debug, Deserialize)]
    pub struct NearestCityData {
        pub city: Option<String>,
        pub state: Option<String>,
        pub country: Option<String>,
        pub current: Option<Current>,
        pub message: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Current {
        pub pollution: Option<Pollution>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Pollution {
        pub ts: Option<String>,
        pub aqius: Option<i64>,
        pub mainus: Option<String>,
    }

    /// Extract a reading from a raw response body
    pub fn parse_reading(body: &str) -> Result<AirQualityReading, LookupError> {
        let response: NearestCityResponse = serde_json::from_str(body)
            .map_err(|e| LookupError::service(format!("malformed response: {e}")))?;

        let Some(data) = response.data else {
            return Err(LookupError::service("no data"));
        };

        let Some(pollution) = data.current.and_then(|current| current.pollution) else {
            return Err(match (response.status.as_deref(), data.message) {
                (Some("fail"), Some(message)) => LookupError::service(message),
                _ => LookupError::service("no pollution data"),
            });
        };

        let aqi = match pollution.aqius {
            Some(aqi) => u32::try_from(aqi)
                .map_err(|_| LookupError::service(format!("invalid AQI value: {aqi}")))?,
            None => return Err(LookupError::service("missing AQI value")),
        };

        Ok(AirQualityReading {
            aqi,
            city: data.city,
            state: data.state,
            country: data.country,
            main_pollutant: pollution.mainus,
            observed_at: pollution.ts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;

    const SUCCESS_BODY: &str = r#"{
        "status": "success",
        "data": {
            "city": "Brasov",
            "state": "Brasov",
            "country": "Romania",
            "location": {"type": "Point", "coordinates": [25.6, 45.65]},
            "current": {
                "pollution": {"ts": "2024-05-01T10:00:00.000Z", "aqius": 42, "mainus": "p2", "aqicn": 15, "maincn": "p2"},
                "weather": {"ts": "2024-05-01T10:00:00.000Z", "tp": 18, "hu": 60}
            }
        }
    }"#;

    #[test]
    fn test_parse_success() {
        let reading = iqair::parse_reading(SUCCESS_BODY).unwrap();
        assert_eq!(reading.aqi, 42);
        assert_eq!(reading.city.as_deref(), Some("Brasov"));
        assert_eq!(reading.main_pollutant.as_deref(), Some("p2"));
        assert_eq!(reading.observed_at.as_deref(), Some("2024-05-01T10:00:00.000Z"));
    }

    #[test]
    fn test_parse_missing_data_is_service_error() {
        let err = iqair::parse_reading(r#"{"status": "success"}"#).unwrap_err();
        assert_eq!(err, LookupError::service("no data"));
    }

    #[test]
    fn test_parse_fail_status_keeps_service_message() {
        let body = r#"{"status": "fail", "data": {"message": "incorrect_api_key"}}"#;
        let err = iqair::parse_reading(body).unwrap_err();
        assert_eq!(err, LookupError::service("incorrect_api_key"));
    }

    #[test]
    fn test_parse_missing_pollution_is_service_error() {
        let body = r#"{"status": "success", "data": {"city": "X", "current": {}}}"#;
        assert!(matches!(
            iqair::parse_reading(body),
            Err(LookupError::Service { .. })
        ));
    }

    #[test]
    fn test_parse_negative_aqi_is_service_error() {
        let body = r#"{"data": {"current": {"pollution": {"aqius": -3}}}}"#;
        let err = iqair::parse_reading(body).unwrap_err();
        assert!(matches!(err, LookupError::Service { .. }));
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn test_parse_non_integer_aqi_is_service_error() {
        let body = r#"{"data": {"current": {"pollution": {"aqius": "high"}}}}"#;
        assert!(matches!(
            iqair::parse_reading(body),
            Err(LookupError::Service { .. })
        ));
    }

    #[test]
    fn test_parse_non_json_is_service_error() {
        assert!(matches!(
            iqair::parse_reading("<html>bad gateway</html>"),
            Err(LookupError::Service { .. })
        ));
    }

    #[test]
    fn test_client_requires_api_key() {
        let Err(err) = IqAirClient::new(&ServiceConfig::default()) else {
            panic!("client built without a key");
        };
        assert!(matches!(err, AirMapError::Config { .. }));
        assert!(err.to_string().contains("AIRMAP_SERVICE__API_KEY"));
    }

    #[test]
    fn test_request_url() {
        let config = ServiceConfig {
            api_key: Some("key with space".to_string()),
            base_url: "http://example.test/v2/nearest_city".to_string(),
            timeout_seconds: 5,
        };
        let client = IqAirClient::new(&config).unwrap();
        let coordinate = Coordinate::new(45.9432, 24.9668).unwrap();
        assert_eq!(
            client.request_url(coordinate),
            "http://example.test/v2/nearest_city?lat=45.9432&lon=24.9668&key=key%20with%20space"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ServiceConfig {
            api_key: Some("test_api_key_123".to_string()),
            base_url: format!("http://127.0.0.1:{port}/v2/nearest_city"),
            timeout_seconds: 5,
        };
        let client = IqAirClient::new(&config).unwrap();
        let err = client
            .fetch_aqi(Coordinate::new(1.0, 2.0).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Transport { .. }));
        assert!(!err.to_string().contains("test_api_key_123"));
    }
}
