//! Forward geocoding: convert a city/country pair to coordinates.
//! Talks to a Nominatim-compatible `/search` endpoint.

use crate::types::{Coordinate, GeocodeMatch, PlaceQuery};
use reqwest::Client;
use serde::Deserialize;
use solar_core::error::{ConfigError, GeocodeError, ReqwestErrorExt};
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Degrees,
    lon: Degrees,
    display_name: Option<String>,
}

/// Nominatim sends degrees as numeric strings; some mirrors send plain numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Number(f64),
    Text(String),
}

impl Degrees {
    fn parse(&self, field: &str) -> Result<f64, GeocodeError> {
        match self {
            Degrees::Number(value) => Ok(*value),
            Degrees::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                GeocodeError::InvalidResponse(format!("{} is not a number: {:?}", field, text))
            }),
        }
    }
}

impl NominatimPlace {
    fn into_match(self) -> Result<GeocodeMatch, GeocodeError> {
        let latitude = self.lat.parse("lat")?;
        let longitude = self.lon.parse("lon")?;
        let coordinate = Coordinate::new(latitude, longitude)
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;
        Ok(GeocodeMatch {
            coordinate,
            display_name: self.display_name,
        })
    }
}

/// HTTP client for the geocoding service.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    search_url: Url,
}

impl Geocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ConfigError::Invalid(format!("geocoding URL {}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let search_url = base
            .join("search")
            .map_err(|e| ConfigError::Invalid(format!("geocoding URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("geocoding client: {}", e)))?;

        Ok(Self { client, search_url })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    /// Look up `query`, returning at most one match. An empty vector means no match.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &PlaceQuery) -> Result<Vec<GeocodeMatch>, GeocodeError> {
        tracing::debug!("Geocoding request to {}", self.search_url);

        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[
                ("city", query.city()),
                ("country", query.country()),
                ("format", "json"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(ReqwestErrorExt::into_geocode_error)?;

        if !response.status().is_success() {
            tracing::debug!("Geocoding returned status {}", response.status());
            return Err(GeocodeError::Request(format!(
                "geocoding service returned {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(ReqwestErrorExt::into_geocode_error)?;

        let matches = places
            .into_iter()
            .take(1)
            .map(NominatimPlace::into_match)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Geocoding returned {} match(es)", matches.len());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_appends_path() {
        let geocoder =
            Geocoder::new("https://nominatim.test/", "test", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            geocoder.search_url().as_str(),
            "https://nominatim.test/search"
        );
    }

    #[test]
    fn test_search_url_keeps_base_path() {
        let geocoder =
            Geocoder::new("http://localhost:8080/nominatim", "test", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            geocoder.search_url().as_str(),
            "http://localhost:8080/nominatim/search"
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = Geocoder::new("not a url", "test", Duration::from_secs(1));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_degrees_accept_strings_and_numbers() {
        let place: NominatimPlace =
            serde_json::from_str(r#"{"lat": "19.0759899", "lon": 72.8773928}"#).unwrap();
        let m = place.into_match().unwrap();
        assert_eq!(m.coordinate.latitude(), 19.0759899);
        assert_eq!(m.coordinate.longitude(), 72.8773928);
        assert!(m.display_name.is_none());
    }

    #[test]
    fn test_unparseable_degrees_are_invalid_response() {
        let place: NominatimPlace =
            serde_json::from_str(r#"{"lat": "north", "lon": "72.1"}"#).unwrap();
        assert!(matches!(
            place.into_match(),
            Err(GeocodeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_out_of_range_degrees_are_invalid_response() {
        let place: NominatimPlace =
            serde_json::from_str(r#"{"lat": "91.0", "lon": "0"}"#).unwrap();
        assert!(matches!(
            place.into_match(),
            Err(GeocodeError::InvalidResponse(_))
        ));
    }
}
