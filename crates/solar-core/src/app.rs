use anyhow::Result;

use crate::Config;

/// Application bootstrap: holds the validated configuration shared by the
/// location provider, the prediction client and the calculator session.
pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance from the user config file
    pub fn new() -> Result<Self> {
        let (config, validation) = Config::load_validated()?;
        tracing::info!(
            "Configuration loaded ({} warning(s))",
            validation.warnings.len()
        );
        Ok(Self::with_config(config))
    }

    /// Create an application instance around an already built configuration
    pub fn with_config(config: Config) -> Self {
        tracing::debug!(
            prediction = %config.services.prediction_api_url,
            geocoding = %config.services.geocoding_api_url,
            "Using service endpoints"
        );
        Self { config }
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }
}
