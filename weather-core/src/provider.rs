use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

use crate::{
    Config,
    error::{Result, WeatherError},
    model::{Coordinates, Located, LocationInfo, WeatherObservation},
    provider::{
        accuweather::{AccuWeatherConditions, AccuWeatherLocator},
        openmeteo::OpenMeteoConditions,
        openweather::OpenWeatherGeocoder,
    },
};

pub mod accuweather;
mod http;
pub mod openmeteo;
pub mod openweather;

/// A configured pair of location and conditions services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    /// OpenWeather geocoding + Open-Meteo current conditions.
    OpenMeteo,
    /// AccuWeather location search + AccuWeather current conditions.
    AccuWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::AccuWeather => "accuweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::AccuWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "open-meteo" | "openmeteo" => Ok(ProviderId::OpenMeteo),
            "accuweather" => Ok(ProviderId::AccuWeather),
            _ => Err(WeatherError::validation(format!(
                "Unknown provider '{value}'. Supported providers: open-meteo, accuweather."
            ))),
        }
    }
}

/// Resolves place names from coordinates, or coordinates from a place name.
#[async_trait]
pub trait Locator: Send + Sync + Debug {
    /// Reverse geocode a coordinate pair. One outbound request.
    async fn reverse(&self, coordinates: Coordinates) -> Result<LocationInfo>;

    /// Free-text search; the first match wins. One outbound request.
    async fn search(&self, name: &str) -> Result<Located>;
}

/// Fetches current observations for a resolved place.
#[async_trait]
pub trait ConditionsFetcher: Send + Sync + Debug {
    /// Whether `current` needs the locator's provider key. When it does not,
    /// reverse geocoding and the weather request may run concurrently.
    fn needs_location_key(&self) -> bool {
        false
    }

    async fn current(
        &self,
        coordinates: Coordinates,
        location_key: Option<&str>,
    ) -> Result<WeatherObservation>;
}

#[derive(Debug)]
pub struct Providers {
    pub locator: Box<dyn Locator>,
    pub conditions: Box<dyn ConditionsFetcher>,
}

/// Construct the provider pair for `id`, failing fast when no API key is set.
pub fn providers_from_config(id: ProviderId, config: &Config) -> Result<Providers> {
    let api_key = config
        .provider_api_key(id)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            WeatherError::validation(format!(
                "No API key configured for provider '{id}'.\n\
                 Hint: run `weather-mcp configure {id}` or set WEATHER_API_KEY."
            ))
        })?
        .to_owned();

    let provider = config.provider_config(id);
    let geocoding_url = provider.and_then(|p| p.geocoding_url.as_deref());
    let weather_url = provider.and_then(|p| p.weather_url.as_deref());

    let providers = match id {
        ProviderId::OpenMeteo => Providers {
            locator: Box::new(OpenWeatherGeocoder::new(
                api_key,
                geocoding_url.unwrap_or(openweather::DEFAULT_BASE_URL),
            )),
            conditions: Box::new(OpenMeteoConditions::new(
                weather_url.unwrap_or(openmeteo::DEFAULT_BASE_URL),
            )),
        },
        ProviderId::AccuWeather => Providers {
            locator: Box::new(AccuWeatherLocator::new(
                api_key.clone(),
                geocoding_url.unwrap_or(accuweather::DEFAULT_BASE_URL),
            )),
            conditions: Box::new(AccuWeatherConditions::new(
                api_key,
                weather_url.unwrap_or(accuweather::DEFAULT_BASE_URL),
            )),
        },
    };

    Ok(providers)
}

/// Construct the default provider pair from config, using `default_provider`.
pub fn default_providers_from_config(config: &Config) -> anyhow::Result<Providers> {
    let id = config.default_provider_id()?;
    Ok(providers_from_config(id, config)?)
}
