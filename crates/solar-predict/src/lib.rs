//! Client for the solar prediction service.

pub mod client;
pub mod types;

pub use client::PredictionClient;
pub use types::{AirQuality, PredictionRequest, PredictionResult, WeatherSnapshot};
