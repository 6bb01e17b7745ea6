use crate::device::{DeviceLocator, PlatformLocator, SystemLocator};
use crate::geocode::Geocoder;
use crate::types::{Coordinate, PlaceQuery, ResolvedLocation, COORDINATE_PRECISION};
use solar_core::error::{ConfigError, GeocodeError, LocationError, ValidationError};
use solar_core::Config;
use std::time::Duration;

/// Resolves a coordinate plus label through one of three strategies.
///
/// The provider holds no session state; the caller decides which result
/// becomes current.
#[derive(Debug, Clone)]
pub struct LocationProvider<L = SystemLocator> {
    locator: L,
    geocoder: Geocoder,
}

impl LocationProvider<SystemLocator> {
    /// Build the provider with the platform locator from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let geocoder = Geocoder::new(
            &config.services.geocoding_api_url,
            &config.services.user_agent,
            Duration::from_secs(config.services.geocoding_timeout_seconds),
        )?;
        let locator = SystemLocator::new(
            PlatformLocator::new(config.location.desktop_id.clone()),
            Duration::from_secs(config.location.timeout_seconds),
        );
        Ok(Self::new(locator, geocoder))
    }
}

impl<L: DeviceLocator> LocationProvider<L> {
    pub fn new(locator: L, geocoder: Geocoder) -> Self {
        Self { locator, geocoder }
    }

    /// One-shot device fix, rounded to four decimal places.
    pub async fn resolve_device(&self) -> Result<ResolvedLocation, LocationError> {
        match self.locator.current_position().await {
            Ok(coordinate) => {
                let coordinate = coordinate.rounded(COORDINATE_PRECISION);
                tracing::info!("Device location resolved to {}", coordinate);
                Ok(ResolvedLocation::Device { coordinate })
            }
            Err(e) => {
                tracing::warn!("Device location failed: {}", e);
                Err(e)
            }
        }
    }

    /// First geocoding match for `query`, labelled with the query text.
    pub async fn resolve_place(&self, query: &PlaceQuery) -> Result<ResolvedLocation, GeocodeError> {
        let matches = self.geocoder.search(query).await.map_err(|e| {
            tracing::warn!("Geocoding {}, {} failed: {}", query.city(), query.country(), e);
            e
        })?;

        let Some(first) = matches.into_iter().next() else {
            tracing::info!("No geocoding match for {}, {}", query.city(), query.country());
            return Err(GeocodeError::PlaceNotFound {
                city: query.city().to_string(),
                country: query.country().to_string(),
            });
        };

        let coordinate = first.coordinate.rounded(COORDINATE_PRECISION);
        tracing::info!(
            matched = first.display_name.as_deref().unwrap_or("-"),
            "Resolved {}, {} to {}",
            query.city(),
            query.country(),
            coordinate
        );
        Ok(ResolvedLocation::Place {
            coordinate,
            city: query.city().to_string(),
            country: query.country().to_string(),
        })
    }

    /// Coordinates typed in by the user, taken as-is without a label.
    pub fn resolve_manual(&self, latitude: f64, longitude: f64) -> Result<ResolvedLocation, ValidationError> {
        let coordinate = Coordinate::new(latitude, longitude)?;
        Ok(ResolvedLocation::Manual { coordinate })
    }
}
