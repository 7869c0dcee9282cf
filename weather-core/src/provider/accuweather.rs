use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherError},
    model::{Condition, Coordinates, Located, LocationInfo, WeatherObservation, WindSpeed},
    provider::http::{decode, get_body, trim_base_url},
};

use super::{ConditionsFetcher, Locator};

pub const DEFAULT_BASE_URL: &str = "https://dataservice.accuweather.com";

const LOCATIONS: &str = "AccuWeather locations";
const CONDITIONS: &str = "AccuWeather current conditions";

/// Location search against the AccuWeather Locations API. Places carry an
/// opaque location key used by [`AccuWeatherConditions`].
#[derive(Clone)]
pub struct AccuWeatherLocator {
    api_key: String,
    base_url: String,
    http: Client,
}

impl AccuWeatherLocator {
    pub fn new(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: trim_base_url(base_url),
            http: Client::new(),
        }
    }
}

/// Current conditions by AccuWeather location key.
#[derive(Clone)]
pub struct AccuWeatherConditions {
    api_key: String,
    base_url: String,
    http: Client,
}

impl AccuWeatherConditions {
    pub fn new(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: trim_base_url(base_url),
            http: Client::new(),
        }
    }
}

impl std::fmt::Debug for AccuWeatherLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccuWeatherLocator")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AccuWeatherConditions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccuWeatherConditions")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwLocation {
    key: String,
    localized_name: String,
    country: AwCountry,
    geo_position: AwGeoPosition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwCountry {
    localized_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwGeoPosition {
    latitude: f64,
    longitude: f64,
}

impl AwLocation {
    fn into_located(self) -> Result<Located> {
        let coordinates = Coordinates::new(self.geo_position.latitude, self.geo_position.longitude)
            .map_err(|e| WeatherError::UpstreamSchema {
                provider: LOCATIONS,
                path: "GeoPosition".to_string(),
                detail: e.to_string(),
            })?;

        Ok(Located {
            info: LocationInfo {
                display_name: self.localized_name,
                country: self.country.localized_name,
                provider_key: Some(self.key),
            },
            coordinates,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwConditions {
    weather_text: Option<String>,
    temperature: Option<AwTemperature>,
    relative_humidity: Option<f64>,
    wind: Option<AwWind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwTemperature {
    metric: AwMeasure,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwWind {
    speed: AwSpeed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwSpeed {
    metric: AwMeasure,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwMeasure {
    value: f64,
    unit: String,
}

impl AwConditions {
    fn into_observation(self) -> Result<WeatherObservation> {
        let temperature = self
            .temperature
            .ok_or_else(|| WeatherError::data_unavailable("current temperature is missing"))?;

        let text = self
            .weather_text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| WeatherError::data_unavailable("current weather text is missing"))?;

        Ok(WeatherObservation {
            temperature_c: temperature.metric.value,
            humidity_pct: self.relative_humidity.map(|h| h.round().clamp(0.0, 100.0) as u8),
            wind: self.wind.map(|w| WindSpeed {
                value: w.speed.metric.value,
                unit: w.speed.metric.unit,
            }),
            condition: Condition::Text(text),
        })
    }
}

#[async_trait]
impl Locator for AccuWeatherLocator {
    async fn reverse(&self, coordinates: Coordinates) -> Result<LocationInfo> {
        tracing::debug!(provider = LOCATIONS, %coordinates, "geoposition search");

        let url = format!("{}/locations/v1/cities/geoposition/search", self.base_url);
        let query = [
            ("apikey", self.api_key.clone()),
            ("q", format!("{},{}", coordinates.latitude(), coordinates.longitude())),
        ];

        let body = get_body(&self.http, LOCATIONS, &url, &query).await?;
        let parsed: Option<AwLocation> = decode(LOCATIONS, &body)?;

        let location = parsed.ok_or_else(|| {
            WeatherError::not_found(format!("Location not found for coordinates {coordinates}"))
        })?;

        Ok(location.into_located()?.info)
    }

    async fn search(&self, name: &str) -> Result<Located> {
        tracing::debug!(provider = LOCATIONS, name, "location search");

        let url = format!("{}/locations/v1/search", self.base_url);
        let query = [("apikey", self.api_key.clone()), ("q", name.to_string())];

        let body = get_body(&self.http, LOCATIONS, &url, &query).await?;
        let parsed: Vec<AwLocation> = decode(LOCATIONS, &body)?;

        parsed
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::not_found(format!("Country not found: {name}")))?
            .into_located()
    }
}

#[async_trait]
impl ConditionsFetcher for AccuWeatherConditions {
    fn needs_location_key(&self) -> bool {
        true
    }

    async fn current(
        &self,
        _coordinates: Coordinates,
        location_key: Option<&str>,
    ) -> Result<WeatherObservation> {
        let key = location_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| WeatherError::data_unavailable("no AccuWeather location key"))?;

        // The key comes from upstream and lands in the URL path.
        if !is_path_safe_key(key) {
            return Err(WeatherError::data_unavailable(format!(
                "invalid AccuWeather location key: {key:?}"
            )));
        }

        tracing::debug!(provider = CONDITIONS, key, "fetching current conditions");

        let url = format!("{}/currentconditions/v1/{key}", self.base_url);
        let query = [("apikey", self.api_key.clone()), ("details", "true".to_string())];

        let body = get_body(&self.http, CONDITIONS, &url, &query).await?;
        let parsed: Vec<AwConditions> = decode(CONDITIONS, &body)?;

        parsed
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::data_unavailable("response has no current conditions"))?
            .into_observation()
    }
}

/// Location keys are digits with the odd `_PC`-style suffix.
fn is_path_safe_key(key: &str) -> bool {
    key.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
