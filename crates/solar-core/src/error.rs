//! Centralized error types for the solar calculator.
//!
//! This module provides a typed error hierarchy that:
//! - Classifies every failure into one [`ErrorKind`] of the calculator taxonomy
//! - Provides user-friendly messages suitable for the single message slot
//! - Preserves full error context for debugging/logging

use std::fmt;

use thiserror::Error;

/// Top-level application error type.
///
/// Every failure of a calculator action converts into this type.
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Device location error: {0}")]
    Location(#[from] LocationError),

    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("Prediction service error: {0}")]
    Prediction(#[from] PredictionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A location lookup was started while another one was still running.
    #[error("A location resolution is already in progress")]
    ResolutionInProgress,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Validation(e) => e.user_message(),
            AppError::Location(e) => e.user_message(),
            AppError::Geocode(e) => e.user_message(),
            AppError::Prediction(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::ResolutionInProgress => "A location lookup is already in progress.",
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }

    /// Explanation supplied by a remote service, shown next to the user message.
    pub fn detail(&self) -> Option<String> {
        match self {
            AppError::Prediction(PredictionError::Status { message, .. })
                if !message.trim().is_empty() =>
            {
                Some(message.trim().to_string())
            }
            _ => None,
        }
    }

    /// Classify this error into the calculator's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Location(_) => ErrorKind::LocationUnavailable,
            AppError::Geocode(e) => e.kind(),
            AppError::Prediction(e) => e.kind(),
            AppError::Config(_) => ErrorKind::Config,
            AppError::ResolutionInProgress => ErrorKind::Busy,
            AppError::Io(_) | AppError::Other(_) => ErrorKind::Internal,
        }
    }
}

/// Error taxonomy shown to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or missing user input; never reaches the network.
    Validation,
    /// Device location capability denied, absent or timed out.
    LocationUnavailable,
    /// City or country left empty.
    MissingInput,
    /// Geocoding returned no match.
    PlaceNotFound,
    /// Geocoding transport or parse failure.
    Geocoding,
    /// Prediction service could not be reached.
    BackendUnreachable,
    /// Prediction service answered with a non-success status or a bad body.
    Backend,
    /// Another resolution is still in progress.
    Busy,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::LocationUnavailable => "LocationUnavailable",
            ErrorKind::MissingInput => "MissingInput",
            ErrorKind::PlaceNotFound => "PlaceNotFound",
            ErrorKind::Geocoding => "GeocodingError",
            ErrorKind::BackendUnreachable => "BackendUnreachable",
            ErrorKind::Backend => "BackendError",
            ErrorKind::Busy => "Busy",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Internal => "InternalError",
        };
        f.write_str(name)
    }
}

/// Cloneable failure reason kept in request state and in the message slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    /// Backend-provided reason, e.g. the `error` field of a rejected prediction
    pub detail: Option<String>,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<&AppError> for Failure {
    fn from(e: &AppError) -> Self {
        let failure = Failure::new(e.kind(), e.user_message());
        match e.detail() {
            Some(detail) => failure.with_detail(detail),
            None => failure,
        }
    }
}

impl From<AppError> for Failure {
    fn from(e: AppError) -> Self {
        Failure::from(&e)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.message, detail),
            None => f.write_str(&self.message),
        }
    }
}

/// User input rejected before any network call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("No location has been resolved")]
    MissingCoordinate,

    #[error("Panel area must be a positive number, got {0}")]
    InvalidPanelArea(f64),

    #[error("Latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::MissingCoordinate => "Please provide location (GPS or City/Country).",
            ValidationError::InvalidPanelArea(_) => "Please enter a valid panel area.",
            ValidationError::LatitudeOutOfRange(_) => "Latitude must be between -90 and 90.",
            ValidationError::LongitudeOutOfRange(_) => "Longitude must be between -180 and 180.",
        }
    }
}

/// Device location errors.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location service unavailable")]
    ServiceUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Location access denied. Please enter City & Country."
            }
            LocationError::ServiceUnavailable => "Geolocation is not supported on this device.",
            LocationError::Timeout => "Location request timed out. Please enter City & Country.",
            LocationError::Other(_) => {
                "Could not determine your location. Please enter City & Country."
            }
        }
    }
}

/// Place-name (forward geocoding) errors.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("City and country are both required")]
    MissingInput,

    #[error("No match for {city}, {country}")]
    PlaceNotFound { city: String, country: String },

    #[error("Geocoding request failed: {0}")]
    Request(String),

    #[error("Invalid geocoding response: {0}")]
    InvalidResponse(String),
}

impl GeocodeError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeocodeError::MissingInput => "Please enter both city and country",
            GeocodeError::PlaceNotFound { .. } => "City not found. Try again.",
            GeocodeError::Request(_) | GeocodeError::InvalidResponse(_) => {
                "Error fetching coordinates."
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GeocodeError::MissingInput => ErrorKind::MissingInput,
            GeocodeError::PlaceNotFound { .. } => ErrorKind::PlaceNotFound,
            GeocodeError::Request(_) | GeocodeError::InvalidResponse(_) => ErrorKind::Geocoding,
        }
    }
}

/// Prediction service errors.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Prediction service unreachable: {0}")]
    Unreachable(String),

    #[error("Prediction service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid prediction response: {0}")]
    InvalidResponse(String),
}

impl PredictionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            PredictionError::Unreachable(_) => "Backend request failed.",
            PredictionError::Status { status, .. } if *status >= 500 => {
                "The prediction service is experiencing issues. Please try again later."
            }
            PredictionError::Status { .. } => "The prediction request was rejected.",
            PredictionError::InvalidResponse(_) => {
                "Received an unexpected response from the prediction service."
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::Unreachable(_) => ErrorKind::BackendUnreachable,
            PredictionError::Status { .. } | PredictionError::InvalidResponse(_) => {
                ErrorKind::Backend
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_geocode_error(self) -> GeocodeError;
    fn into_prediction_error(self) -> PredictionError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_geocode_error(self) -> GeocodeError {
        if self.is_decode() {
            GeocodeError::InvalidResponse(self.to_string())
        } else {
            GeocodeError::Request(self.to_string())
        }
    }

    fn into_prediction_error(self) -> PredictionError {
        if self.is_decode() {
            PredictionError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            PredictionError::Status {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            PredictionError::Unreachable(self.to_string())
        }
    }
}
