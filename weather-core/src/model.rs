use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, WeatherError};

/// Arguments of the `getWeather` tool. Every field is optional; gaps are
/// filled from the ambient request context during input resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeatherQuery {
    /// Latitude in decimal degrees (-90 to 90).
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees (-180 to 180).
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Country or region name (or ISO code) used when no coordinates are given.
    #[serde(default)]
    pub country: Option<String>,
    /// Temperature unit for the report. Defaults to fahrenheit.
    #[serde(default)]
    pub unit: Option<TemperatureUnit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "celsius" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(WeatherError::validation(format!(
                "Invalid unit '{value}'. Supported units: celsius, fahrenheit."
            ))),
        }
    }
}

/// A validated coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherError::validation(format!(
                "Invalid latitude {latitude}: must be between -90 and 90"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::validation(format!(
                "Invalid longitude {longitude}: must be between -180 and 180"
            )));
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Human-readable place produced by a locator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub display_name: String,
    pub country: String,
    /// Opaque id for providers that look up conditions by key instead of
    /// coordinates.
    pub provider_key: Option<String>,
}

/// A place together with the coordinates it resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub info: LocationInfo,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindSpeed {
    pub value: f64,
    pub unit: String,
}

/// Sky/precipitation state as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// WMO weather interpretation code.
    Code(i32),
    /// Ready-made provider text, shown verbatim.
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub temperature_c: f64,
    pub humidity_pct: Option<u8>,
    pub wind: Option<WindSpeed>,
    pub condition: Condition,
}

impl WeatherObservation {
    pub fn temperature_f(&self) -> f64 {
        celsius_to_fahrenheit(self.temperature_c)
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}
