use serde::{Deserialize, Serialize};
use solar_core::error::ValidationError;
use solar_location::Coordinate;

/// Coordinate plus panel area, validated as one unit before any request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRequest {
    coordinate: Coordinate,
    panel_area: f64,
}

impl PredictionRequest {
    pub fn new(coordinate: Coordinate, panel_area: f64) -> Result<Self, ValidationError> {
        if !panel_area.is_finite() || panel_area <= 0.0 {
            return Err(ValidationError::InvalidPanelArea(panel_area));
        }
        Ok(Self {
            coordinate,
            panel_area,
        })
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn panel_area(&self) -> f64 {
        self.panel_area
    }
}

/// Forecast payload returned by the prediction service.
///
/// Every field is optional: a missing value is shown as a neutral figure
/// instead of failing the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Daily energy estimate (kWh)
    #[serde(default)]
    pub solar_energy: Option<f64>,
    /// Predicted irradiance (kWh/m²/day)
    #[serde(default)]
    pub solar_irradiance: Option<f64>,
    /// Panel area echoed back by the service
    #[serde(default)]
    pub panel_area: Option<f64>,
    /// System efficiency ratio, 0..1
    #[serde(default)]
    pub efficiency: Option<f64>,
    /// CO₂ offset (kg/day)
    #[serde(default)]
    pub co2_offset: Option<f64>,
    #[serde(default)]
    pub weather: Option<WeatherSnapshot>,
    #[serde(default)]
    pub aqi: Option<AirQuality>,
}

/// Current weather used by the model. Temperatures are in Kelvin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    #[serde(rename = "AQI", default)]
    pub aqi: Option<f64>,
    #[serde(rename = "Category", default)]
    pub category: Option<String>,
}

/// Error body the service sends with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinate() -> Coordinate {
        Coordinate::new(19.076, 72.8777).unwrap()
    }

    #[test]
    fn test_request_requires_positive_panel_area() {
        assert!(PredictionRequest::new(coordinate(), 25.0).is_ok());
        assert_eq!(
            PredictionRequest::new(coordinate(), 0.0),
            Err(ValidationError::InvalidPanelArea(0.0))
        );
        assert_eq!(
            PredictionRequest::new(coordinate(), -3.5),
            Err(ValidationError::InvalidPanelArea(-3.5))
        );
        assert!(PredictionRequest::new(coordinate(), f64::NAN).is_err());
        assert!(PredictionRequest::new(coordinate(), f64::INFINITY).is_err());
    }

    #[test]
    fn test_full_payload_deserializes() {
        let json = r#"{
            "solar_irradiance": 5.12,
            "solar_energy": 23.04,
            "panel_area": 25.0,
            "efficiency": 0.18,
            "weather": {
                "temperature": 301.15,
                "humidity": 74,
                "pressure": 1008,
                "wind_speed": 4.12,
                "temp_min": 300.2,
                "temp_max": 302.4,
                "precipitation": 0.0
            },
            "aqi": {"AQI": 87, "Category": "Satisfactory"},
            "co2_offset": 18.89
        }"#;
        let result: PredictionResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.solar_energy, Some(23.04));
        assert_eq!(result.efficiency, Some(0.18));
        let weather = result.weather.unwrap();
        assert_eq!(weather.temperature, Some(301.15));
        assert_eq!(weather.humidity, Some(74.0));
        let aqi = result.aqi.unwrap();
        assert_eq!(aqi.aqi, Some(87.0));
        assert_eq!(aqi.category.as_deref(), Some("Satisfactory"));
    }

    #[test]
    fn test_sparse_payload_deserializes() {
        let result: PredictionResult =
            serde_json::from_str(r#"{"solar_energy": 10.0, "weather": {}}"#).unwrap();
        assert_eq!(result.solar_energy, Some(10.0));
        assert!(result.efficiency.is_none());
        assert!(result.aqi.is_none());
        assert_eq!(result.weather, Some(WeatherSnapshot::default()));
    }

    #[test]
    fn test_null_fields_are_missing() {
        let result: PredictionResult =
            serde_json::from_str(r#"{"solar_energy": null, "aqi": {"AQI": null}}"#).unwrap();
        assert!(result.solar_energy.is_none());
        assert_eq!(result.aqi, Some(AirQuality::default()));
    }
}
