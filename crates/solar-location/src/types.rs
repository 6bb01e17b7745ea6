use serde::{Deserialize, Serialize};
use solar_core::error::{GeocodeError, ValidationError};

/// Decimal places kept for every resolved coordinate.
pub const COORDINATE_PRECISION: u32 = 4;

/// Round `value` to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// A latitude/longitude pair in decimal degrees, always within geographic range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Same coordinate rounded to `decimals` places. Rounding never leaves the valid range.
    pub fn rounded(&self, decimals: u32) -> Self {
        Self {
            latitude: round_to(self.latitude, decimals),
            longitude: round_to(self.longitude, decimals),
        }
    }
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ValidationError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Outcome of a successful location resolution.
///
/// The label is derived from the variant, so it always describes the
/// coordinate stored next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResolvedLocation {
    /// Fix from the device's location capability
    Device { coordinate: Coordinate },
    /// Forward-geocoded place, labelled with the user's own spelling
    Place {
        coordinate: Coordinate,
        city: String,
        country: String,
    },
    /// Coordinates typed in directly; carries no label
    Manual { coordinate: Coordinate },
}

impl ResolvedLocation {
    pub fn coordinate(&self) -> Coordinate {
        match self {
            ResolvedLocation::Device { coordinate }
            | ResolvedLocation::Place { coordinate, .. }
            | ResolvedLocation::Manual { coordinate } => *coordinate,
        }
    }

    /// Human-readable origin of the coordinate, `None` for manual entry.
    pub fn label(&self) -> Option<String> {
        match self {
            ResolvedLocation::Device { coordinate } => Some(format!(
                "Current Location ({:.4}, {:.4})",
                coordinate.latitude(),
                coordinate.longitude()
            )),
            ResolvedLocation::Place { city, country, .. } => Some(format!("{}, {}", city, country)),
            ResolvedLocation::Manual { .. } => None,
        }
    }
}

/// City and country to look up, both non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceQuery {
    city: String,
    country: String,
}

impl PlaceQuery {
    pub fn new(city: &str, country: &str) -> Result<Self, GeocodeError> {
        let city = city.trim();
        let country = country.trim();
        if city.is_empty() || country.is_empty() {
            return Err(GeocodeError::MissingInput);
        }
        Ok(Self {
            city: city.to_string(),
            country: country.to_string(),
        })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

/// One candidate returned by the geocoding service.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    pub coordinate: Coordinate,
    pub display_name: Option<String>,
}
