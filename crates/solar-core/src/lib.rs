pub mod app;
pub mod config;
pub mod error;
pub mod request_state;

pub use app::App;
pub use config::{
    CalculatorConfig, Config, LocationConfig, PlaceConfig, PricingConfig, ServiceConfig,
    ValidationResult,
};
pub use error::{
    AppError, ConfigError, ErrorKind, Failure, GeocodeError, LocationError, PredictionError,
    ReqwestErrorExt, ValidationError,
};
pub use request_state::{
    Completion, RequestState, RequestToken, RequestTracker, ResolutionKind, ResolutionState,
    ResolutionTracker,
};

use anyhow::Result;

/// Initialize logging for the calculator
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    tracing::info!("Solar calculator core initialized");
    Ok(())
}
