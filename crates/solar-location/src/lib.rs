//! Location resolution for the solar calculator
//!
//! Provides device positioning (GeoClue2 / WinRT Geolocator), forward
//! geocoding via a Nominatim-compatible service and manual coordinate entry.

pub mod device;
pub mod geocode;
pub mod provider;
pub mod types;

pub use device::{DeviceLocator, PlatformLocator, SystemLocator, Timed};
pub use geocode::Geocoder;
pub use provider::LocationProvider;
pub use types::*;
