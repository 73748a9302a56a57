//! Error types and handling for the `AirMap` application

use std::fmt;

use thiserror::Error;

/// Which coordinate text field failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateField {
    Latitude,
    Longitude,
}

impl fmt::Display for CoordinateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateField::Latitude => f.write_str("latitude"),
            CoordinateField::Longitude => f.write_str("longitude"),
        }
    }
}

/// Rejected coordinate input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The text is not a decimal number
    #[error("Invalid {field}: '{input}' is not a number")]
    Parse {
        field: CoordinateField,
        input: String,
    },

    /// Latitude outside [-90, 90] or longitude outside [-180, 180]
    #[error("Coordinates out of range: ({latitude}, {longitude})")]
    Range { latitude: f64, longitude: f64 },
}

impl ValidationError {
    /// Create a new parse error
    pub fn parse<S: Into<String>>(field: CoordinateField, input: S) -> Self {
        Self::Parse {
            field,
            input: input.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::Parse { .. } => {
                "Invalid coordinates entered. Make sure they are valid numbers.".to_string()
            }
            ValidationError::Range { .. } => {
                "Latitude must be between -90 and 90, and longitude between -180 and 180."
                    .to_string()
            }
        }
    }
}

/// Failure of a single air quality lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Connection, timeout or non-2xx status
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The service answered but the payload carried no usable AQI
    #[error("Service error: {message}")]
    Service { message: String },
}

impl LookupError {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new service error
    pub fn service<S: Into<String>>(message: S) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Transport { .. } => {
                "Unable to reach the air quality service. Please check your internet connection."
                    .to_string()
            }
            LookupError::Service { .. } => {
                "Error retrieving data: air quality data unavailable.".to_string()
            }
        }
    }
}

/// Main error type for the `AirMap` application
#[derive(Error, Debug)]
pub enum AirMapError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Air quality lookup errors
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// Map rendering or publishing errors
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AirMapError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AirMapError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            AirMapError::Validation(err) => err.user_message(),
            AirMapError::Lookup(err) => err.user_message(),
            AirMapError::Render { .. } | AirMapError::Io { .. } => {
                "Unable to render the map for this location.".to_string()
            }
        }
    }
}
