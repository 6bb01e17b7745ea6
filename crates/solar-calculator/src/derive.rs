//! Display figures derived from a prediction payload.
//!
//! Every function here is total: missing source fields turn into neutral
//! values ("0.00", "0%", "Unknown") rather than errors.

use solar_core::PricingConfig;
use solar_predict::PredictionResult;

pub use solar_location::round_to;

const KELVIN_OFFSET: f64 = 273.15;
const DAYS_PER_YEAR: f64 = 365.0;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Yearly savings for a daily energy estimate, rounded to whole currency units.
pub fn annual_savings(daily_energy: f64, unit_price: f64) -> f64 {
    (daily_energy * unit_price * DAYS_PER_YEAR).round()
}

/// Efficiency ratio (0..1) as a whole percentage; absent means 0.
pub fn efficiency_percent(efficiency: Option<f64>) -> f64 {
    match efficiency {
        Some(ratio) if ratio.is_finite() => (ratio * 100.0).round(),
        _ => 0.0,
    }
}

/// Fixed-precision text, or the zero string of that precision when missing.
pub fn format_fixed(value: Option<f64>, decimals: usize) -> String {
    let value = value.filter(|v| v.is_finite()).unwrap_or(0.0);
    format!("{:.*}", decimals, value)
}

/// Value as the service sent it; "0" when missing or zero.
fn format_raw(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => v.to_string(),
        _ => "0".to_string(),
    }
}

/// Everything the result panel shows for one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFigures {
    /// Daily energy, kWh (2 dp)
    pub daily_energy: String,
    /// Irradiance, kWh/m²/day (2 dp)
    pub irradiance: String,
    /// Wind speed, m/s (as received)
    pub wind_speed: String,
    /// Temperature, °C (1 dp)
    pub temperature: String,
    pub aqi: String,
    pub aqi_category: String,
    /// CO₂ offset, kg/day (2 dp)
    pub co2_offset: String,
    pub annual_savings: f64,
    /// Savings with currency, e.g. "33147 Rs"
    pub annual_savings_text: String,
    pub efficiency_percent: f64,
    /// e.g. "25 m² panels • 18% efficiency"
    pub efficiency_badge: String,
    /// Label of the location the prediction was requested for
    pub location_label: Option<String>,
}

impl DisplayFigures {
    pub fn derive(
        result: &PredictionResult,
        pricing: &PricingConfig,
        panel_area: f64,
        location_label: Option<String>,
    ) -> Self {
        let weather = result.weather.as_ref();
        let aqi = result.aqi.as_ref();

        // A 0 K reading is treated as missing
        let temperature = weather
            .and_then(|w| w.temperature)
            .filter(|k| *k != 0.0)
            .map(kelvin_to_celsius);

        let savings = annual_savings(result.solar_energy.unwrap_or(0.0), pricing.unit_price);
        let efficiency = efficiency_percent(result.efficiency);

        Self {
            daily_energy: format_fixed(result.solar_energy, 2),
            irradiance: format_fixed(result.solar_irradiance, 2),
            wind_speed: format_raw(weather.and_then(|w| w.wind_speed)),
            temperature: format_fixed(temperature, 1),
            aqi: format_raw(aqi.and_then(|a| a.aqi)),
            aqi_category: aqi
                .and_then(|a| a.category.clone())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            co2_offset: format_fixed(result.co2_offset, 2),
            annual_savings: savings,
            annual_savings_text: format!("{:.0} {}", savings, pricing.currency),
            efficiency_percent: efficiency,
            efficiency_badge: format!("{} m² panels • {:.0}% efficiency", panel_area, efficiency),
            location_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_predict::{AirQuality, WeatherSnapshot};

    fn pricing() -> PricingConfig {
        PricingConfig::default()
    }

    #[test]
    fn test_kelvin_to_celsius() {
        assert!((kelvin_to_celsius(300.0) - 26.85).abs() < 1e-9);
        assert_eq!(kelvin_to_celsius(273.15), 0.0);
    }

    #[test]
    fn test_annual_savings_matches_formula() {
        assert_eq!(annual_savings(10.0, 4.43), (10.0_f64 * 4.43 * 365.0).round());
        assert_eq!(annual_savings(0.0, 4.43), 0.0);
    }

    #[test]
    fn test_efficiency_percent() {
        assert_eq!(efficiency_percent(Some(0.18)), 18.0);
        assert_eq!(efficiency_percent(Some(1.0)), 100.0);
        assert_eq!(efficiency_percent(None), 0.0);
        assert_eq!(efficiency_percent(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(Some(20.5), 2), "20.50");
        assert_eq!(format_fixed(Some(4.567), 2), "4.57");
        assert_eq!(format_fixed(None, 2), "0.00");
        assert_eq!(format_fixed(None, 1), "0.0");
        assert_eq!(format_fixed(None, 0), "0");
    }

    #[test]
    fn test_empty_payload_yields_neutral_figures() {
        let figures = DisplayFigures::derive(&PredictionResult::default(), &pricing(), 25.0, None);

        assert_eq!(figures.daily_energy, "0.00");
        assert_eq!(figures.irradiance, "0.00");
        assert_eq!(figures.wind_speed, "0");
        assert_eq!(figures.temperature, "0.0");
        assert_eq!(figures.aqi, "0");
        assert_eq!(figures.aqi_category, "Unknown");
        assert_eq!(figures.co2_offset, "0.00");
        assert_eq!(figures.annual_savings, 0.0);
        assert_eq!(figures.annual_savings_text, "0 Rs");
        assert_eq!(figures.efficiency_percent, 0.0);
        assert_eq!(figures.efficiency_badge, "25 m² panels • 0% efficiency");
    }

    #[test]
    fn test_full_payload_figures() {
        let result = PredictionResult {
            solar_energy: Some(20.5),
            solar_irradiance: Some(4.555),
            panel_area: Some(25.0),
            efficiency: Some(0.18),
            co2_offset: Some(16.81),
            weather: Some(WeatherSnapshot {
                temperature: Some(303.15),
                wind_speed: Some(3.6),
                ..WeatherSnapshot::default()
            }),
            aqi: Some(AirQuality {
                aqi: Some(92.0),
                category: Some("Satisfactory".to_string()),
            }),
        };

        let figures = DisplayFigures::derive(
            &result,
            &pricing(),
            12.5,
            Some("Mumbai, India".to_string()),
        );

        assert_eq!(figures.daily_energy, "20.50");
        assert_eq!(figures.wind_speed, "3.6");
        assert_eq!(figures.temperature, "30.0");
        assert_eq!(figures.aqi, "92");
        assert_eq!(figures.aqi_category, "Satisfactory");
        assert_eq!(figures.co2_offset, "16.81");
        assert_eq!(figures.annual_savings, (20.5_f64 * 4.43 * 365.0).round());
        assert_eq!(figures.annual_savings_text, "33147 Rs");
        assert_eq!(figures.efficiency_badge, "12.5 m² panels • 18% efficiency");
        assert_eq!(figures.location_label.as_deref(), Some("Mumbai, India"));
    }

    #[test]
    fn test_custom_currency() {
        let pricing = PricingConfig {
            unit_price: 0.2,
            currency: "USD".to_string(),
        };
        let result = PredictionResult {
            solar_energy: Some(10.0),
            ..PredictionResult::default()
        };
        let figures = DisplayFigures::derive(&result, &pricing, 25.0, None);
        assert_eq!(figures.annual_savings, 730.0);
        assert_eq!(figures.annual_savings_text, "730 USD");
    }
}
