//! Solar prediction service client.

use std::time::Duration;

use reqwest::Client;
use solar_core::error::{ConfigError, PredictionError, ReqwestErrorExt};
use solar_core::Config;
use tracing::instrument;
use url::Url;

use crate::types::{ErrorBody, PredictionRequest, PredictionResult};

const PREDICTION_PATH: &str = "api/solar-prediction/";

/// HTTP client for `GET /api/solar-prediction/`.
///
/// A single attempt per call; failures surface directly to the caller.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: Client,
    endpoint: Url,
}

impl PredictionClient {
    /// Create a client for the service at `base_url`.
    ///
    /// `timeout` of `None` keeps the transport default.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ConfigError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ConfigError::Invalid(format!("prediction URL {}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(PREDICTION_PATH)
            .map_err(|e| ConfigError::Invalid(format!("prediction URL {}: {}", base_url, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::Invalid(format!("prediction client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            &config.services.prediction_api_url,
            config
                .services
                .prediction_timeout_seconds
                .map(Duration::from_secs),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch the forecast for `request`.
    #[instrument(skip(self), level = "info")]
    pub async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, PredictionError> {
        let coordinate = request.coordinate();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("lat", coordinate.latitude()),
                ("lon", coordinate.longitude()),
                ("panel_area", request.panel_area()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Prediction request failed: {}", e);
                e.into_prediction_error()
            })?;

        self.handle_response(response).await
    }

    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<PredictionResult, PredictionError> {
        let status = response.status();

        if status.is_success() {
            let result: PredictionResult = response
                .json()
                .await
                .map_err(|e| PredictionError::InvalidResponse(format!("JSON parse error: {}", e)))?;
            tracing::info!(
                "Prediction received: energy={:?} irradiance={:?}",
                result.solar_energy,
                result.solar_irradiance
            );
            return Ok(result);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        tracing::warn!("Prediction service returned {}: {}", status, message);
        Err(PredictionError::Status {
            status: status.as_u16(),
            message,
        })
    }
}
