use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable overriding `services.prediction_api_url`.
pub const PREDICTION_URL_ENV: &str = "SOLAR_PREDICTION_API_URL";
/// Environment variable overriding `services.geocoding_api_url`.
pub const GEOCODING_URL_ENV: &str = "SOLAR_GEOCODING_API_URL";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// External service endpoints
    pub services: ServiceConfig,

    /// Savings pricing
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Calculator defaults
    #[serde(default)]
    pub calculator: CalculatorConfig,

    /// Device location settings
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the prediction service (`/api/solar-prediction/` is appended)
    pub prediction_api_url: String,

    /// Base URL of the Nominatim-compatible geocoding service (`/search` is appended)
    pub geocoding_api_url: String,

    /// User-Agent sent to the geocoding service
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Geocoding request timeout in seconds
    #[serde(default = "default_geocoding_timeout")]
    pub geocoding_timeout_seconds: u64,

    /// Prediction request timeout in seconds; `None` keeps the transport default
    #[serde(default)]
    pub prediction_timeout_seconds: Option<u64>,
}

fn default_user_agent() -> String {
    format!("solar-calc/{}", env!("CARGO_PKG_VERSION"))
}

fn default_geocoding_timeout() -> u64 {
    10
}

/// Price applied to the daily energy estimate for the savings figure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Price of one kWh in `currency`
    #[serde(default = "default_unit_price")]
    pub unit_price: f64,

    /// Currency label shown next to the savings
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_unit_price() -> f64 {
    4.43
}

fn default_currency() -> String {
    "Rs".to_string()
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            unit_price: default_unit_price(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
    /// Panel area (m²) a new session starts with
    #[serde(default = "default_panel_area")]
    pub default_panel_area: f64,
}

fn default_panel_area() -> f64 {
    25.0
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            default_panel_area: default_panel_area(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// How long to wait for a device position fix
    #[serde(default = "default_location_timeout")]
    pub timeout_seconds: u64,

    /// Application id reported to the platform location service
    #[serde(default = "default_desktop_id")]
    pub desktop_id: String,

    /// Place looked up when no device fix is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_place: Option<PlaceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceConfig {
    pub city: String,
    pub country: String,
}

fn default_location_timeout() -> u64 {
    10
}

fn default_desktop_id() -> String {
    "solar-calc".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_location_timeout(),
            desktop_id: default_desktop_id(),
            fallback_place: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            services: ServiceConfig {
                prediction_api_url: "http://127.0.0.1:8000".to_string(), // Django dev server
                geocoding_api_url: "https://nominatim.openstreetmap.org".to_string(),
                user_agent: default_user_agent(),
                geocoding_timeout_seconds: default_geocoding_timeout(),
                prediction_timeout_seconds: None,
            },
            pricing: PricingConfig::default(),
            calculator: CalculatorConfig::default(),
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the user config file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from an explicit path, writing defaults there if missing.
    ///
    /// Environment overrides are not applied.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Replace service endpoints with `SOLAR_*_API_URL` values when set
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(PREDICTION_URL_ENV).ok(),
            std::env::var(GEOCODING_URL_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, prediction: Option<String>, geocoding: Option<String>) {
        if let Some(url) = prediction.filter(|u| !u.trim().is_empty()) {
            tracing::debug!("Prediction endpoint overridden from environment: {}", url);
            self.services.prediction_api_url = url;
        }
        if let Some(url) = geocoding.filter(|u| !u.trim().is_empty()) {
            tracing::debug!("Geocoding endpoint overridden from environment: {}", url);
            self.services.geocoding_api_url = url;
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.services.prediction_api_url,
            "services.prediction_api_url",
            &mut result,
        );
        self.validate_url(
            &self.services.geocoding_api_url,
            "services.geocoding_api_url",
            &mut result,
        );

        if self.services.user_agent.trim().is_empty() {
            result.add_warning(
                "services.user_agent",
                "Empty User-Agent; public Nominatim instances may reject requests",
            );
        }

        if self.services.geocoding_timeout_seconds == 0 {
            result.add_error(
                "services.geocoding_timeout_seconds",
                "Geocoding timeout must be greater than 0",
            );
        }

        if self.services.prediction_timeout_seconds == Some(0) {
            result.add_error(
                "services.prediction_timeout_seconds",
                "Prediction timeout must be greater than 0 when set",
            );
        }

        if !(self.pricing.unit_price.is_finite() && self.pricing.unit_price > 0.0) {
            result.add_error("pricing.unit_price", "Unit price must be a positive number");
        }

        if self.pricing.currency.trim().is_empty() {
            result.add_error("pricing.currency", "Currency label cannot be empty");
        }

        let area = self.calculator.default_panel_area;
        if !(area.is_finite() && area > 0.0) {
            result.add_error(
                "calculator.default_panel_area",
                "Default panel area must be a positive number",
            );
        } else if area > 10_000.0 {
            result.add_warning(
                "calculator.default_panel_area",
                "Default panel area is unusually large (>10000 m²)",
            );
        }

        if self.location.timeout_seconds == 0 {
            result.add_error(
                "location.timeout_seconds",
                "Location timeout must be greater than 0",
            );
        } else if self.location.timeout_seconds > 300 {
            result.add_warning(
                "location.timeout_seconds",
                "Location timeout is more than 5 minutes",
            );
        }

        if let Some(place) = &self.location.fallback_place {
            if place.city.trim().is_empty() || place.country.trim().is_empty() {
                result.add_warning(
                    "location.fallback_place",
                    "Fallback place needs both city and country",
                );
            }
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("solar-calc");

        Ok(config_dir.join("config.toml"))
    }
}
