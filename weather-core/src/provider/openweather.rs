use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherError},
    model::{Coordinates, Located, LocationInfo},
    provider::http::{decode, get_body, trim_base_url},
};

use super::Locator;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const PROVIDER: &str = "OpenWeather geocoding";

/// Geocoding through the OpenWeather Geo API (`/geo/1.0/reverse` and
/// `/geo/1.0/direct`). Both endpoints answer with a list of places.
#[derive(Clone)]
pub struct OpenWeatherGeocoder {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherGeocoder {
    pub fn new(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: trim_base_url(base_url),
            http: Client::new(),
        }
    }

    async fn fetch_places(
        &self,
        endpoint: &str,
        mut query: Vec<(&str, String)>,
    ) -> Result<Vec<OwPlace>> {
        let url = format!("{}/geo/1.0/{endpoint}", self.base_url);
        query.push(("limit", "1".to_string()));
        query.push(("appid", self.api_key.clone()));

        let body = get_body(&self.http, PROVIDER, &url, &query).await?;
        decode(PROVIDER, &body)
    }
}

impl std::fmt::Debug for OpenWeatherGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherGeocoder")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct OwPlace {
    name: String,
    lat: f64,
    lon: f64,
    country: String,
}

impl OwPlace {
    fn into_info(self) -> LocationInfo {
        LocationInfo {
            display_name: self.name,
            country: self.country,
            provider_key: None,
        }
    }
}

#[async_trait]
impl Locator for OpenWeatherGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<LocationInfo> {
        tracing::debug!(provider = PROVIDER, %coordinates, "reverse geocoding");

        let places = self
            .fetch_places(
                "reverse",
                vec![
                    ("lat", coordinates.latitude().to_string()),
                    ("lon", coordinates.longitude().to_string()),
                ],
            )
            .await?;

        places
            .into_iter()
            .next()
            .map(OwPlace::into_info)
            .ok_or_else(|| {
                WeatherError::not_found(format!("Location not found for coordinates {coordinates}"))
            })
    }

    async fn search(&self, name: &str) -> Result<Located> {
        tracing::debug!(provider = PROVIDER, name, "searching place");

        let places = self.fetch_places("direct", vec![("q", name.to_string())]).await?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::not_found(format!("Country not found: {name}")))?;

        let coordinates = Coordinates::new(place.lat, place.lon).map_err(|e| {
            WeatherError::UpstreamSchema {
                provider: PROVIDER,
                path: "[0]".to_string(),
                detail: e.to_string(),
            }
        })?;

        Ok(Located {
            info: place.into_info(),
            coordinates,
        })
    }
}
