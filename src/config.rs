//! Configuration management for the `AirMap` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AirMapError;
use crate::models::coordinate::{LATITUDE_RANGE, LONGITUDE_RANGE};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `AirMap` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirMapConfig {
    /// Air quality service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Map rendering and publishing
    #[serde(default)]
    pub map: MapConfig,
    /// Local web server
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Air quality service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// IQAir access key. Required for lookups, never logged.
    pub api_key: Option<String>,
    /// Endpoint of the nearest-city lookup
    #[serde(default = "default_service_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_service_timeout")]
    pub timeout_seconds: u32,
}

/// Map document settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Directory the generated map document is written to
    #[serde(default = "default_map_output_dir")]
    pub output_dir: PathBuf,
    /// File name of the generated map document
    #[serde(default = "default_map_file_name")]
    pub file_name: String,
    /// Initial zoom level
    #[serde(default = "default_map_zoom")]
    pub zoom: u8,
    /// Popup text of the marker
    #[serde(default = "default_marker_label")]
    pub marker_label: String,
    /// Latitude the map is centered on before the first lookup
    #[serde(default = "default_initial_latitude")]
    pub initial_latitude: f64,
    /// Longitude the map is centered on before the first lookup
    #[serde(default = "default_initial_longitude")]
    pub initial_longitude: f64,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Host name used in published map URLs
    #[serde(default = "default_public_host")]
    pub public_host: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_service_base_url() -> String {
    "http://api.airvisual.com/v2/nearest_city".to_string()
}

fn default_service_timeout() -> u32 {
    30
}

fn default_map_output_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_map_file_name() -> String {
    "map.html".to_string()
}

fn default_map_zoom() -> u8 {
    6
}

fn default_marker_label() -> String {
    "Selected location".to_string()
}

// Romania
fn default_initial_latitude() -> f64 {
    45.9432
}

fn default_initial_longitude() -> f64 {
    24.9668
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_public_host() -> String {
    "localhost".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_service_base_url(),
            timeout_seconds: default_service_timeout(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            output_dir: default_map_output_dir(),
            file_name: default_map_file_name(),
            zoom: default_map_zoom(),
            marker_label: default_marker_label(),
            initial_latitude: default_initial_latitude(),
            initial_longitude: default_initial_longitude(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            public_host: default_public_host(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ServiceConfig {
    /// The access key, or a configuration error naming how to supply it
    pub fn require_api_key(&self) -> std::result::Result<&str, AirMapError> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(AirMapError::config(
                "No air quality API key configured. Set AIRMAP_SERVICE__API_KEY or service.api_key in the config file.",
            )),
        }
    }
}

impl ServerConfig {
    /// Base URL a browser uses to reach this server
    #[must_use]
    pub fn public_url(&self) -> String {
        format!("http://{}:{}", self.public_host, self.port)
    }
}

impl AirMapConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. AIRMAP_SERVICE__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("AIRMAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AirMapConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("airmap").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.service.base_url.is_empty() {
            self.service.base_url = default_service_base_url();
        }
        if self.service.timeout_seconds == 0 {
            self.service.timeout_seconds = default_service_timeout();
        }
        if self.map.file_name.is_empty() {
            self.map.file_name = default_map_file_name();
        }
        if self.map.marker_label.is_empty() {
            self.map.marker_label = default_marker_label();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.public_host.is_empty() {
            self.server.public_host = default_public_host();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the service access key, if one is set
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.service.api_key {
            if api_key.is_empty() {
                return Err(AirMapError::config(
                    "Air quality API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(AirMapError::config(
                    "Air quality API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }

            if api_key.len() > 100 {
                return Err(AirMapError::config(
                    "Air quality API key appears to be invalid (too long). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.service.timeout_seconds > 300 {
            return Err(
                AirMapError::config("Air quality API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.map.zoom > 19 {
            return Err(AirMapError::config("Map zoom cannot exceed 19").into());
        }

        if !LATITUDE_RANGE.contains(&self.map.initial_latitude)
            || !LONGITUDE_RANGE.contains(&self.map.initial_longitude)
        {
            return Err(AirMapError::config(
                "Initial map center must be a valid latitude/longitude",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AirMapError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AirMapError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.service.base_url.starts_with("http://")
            && !self.service.base_url.starts_with("https://")
        {
            return Err(AirMapError::config(
                "Air quality API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if self.map.file_name.contains(['/', '\\']) {
            return Err(
                AirMapError::config("Map file name must not contain path separators").into(),
            );
        }

        Ok(())
    }
}
