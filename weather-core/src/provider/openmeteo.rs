use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherError},
    model::{Condition, Coordinates, WeatherObservation, WindSpeed},
    provider::http::{decode, get_body, trim_base_url},
};

use super::ConditionsFetcher;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";

const PROVIDER: &str = "Open-Meteo";
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code";
const DEFAULT_WIND_UNIT: &str = "km/h";

/// Current conditions from the Open-Meteo forecast API. Keyless; works on raw
/// coordinates and reports WMO weather codes.
#[derive(Debug, Clone)]
pub struct OpenMeteoConditions {
    base_url: String,
    http: Client,
}

impl OpenMeteoConditions {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: trim_base_url(base_url),
            http: Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current: Option<OmCurrent>,
    current_units: Option<OmCurrentUnits>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    weather_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OmCurrentUnits {
    wind_speed_10m: Option<String>,
}

impl OmResponse {
    fn into_observation(self) -> Result<WeatherObservation> {
        let current = self
            .current
            .ok_or_else(|| WeatherError::data_unavailable("response has no current conditions"))?;

        let temperature_c = current
            .temperature_2m
            .ok_or_else(|| WeatherError::data_unavailable("current temperature is missing"))?;

        let code = current
            .weather_code
            .ok_or_else(|| WeatherError::data_unavailable("current weather code is missing"))?;

        let wind_unit = self
            .current_units
            .and_then(|u| u.wind_speed_10m)
            .unwrap_or_else(|| DEFAULT_WIND_UNIT.to_string());

        Ok(WeatherObservation {
            temperature_c,
            humidity_pct: current.relative_humidity_2m.map(humidity_pct),
            wind: current.wind_speed_10m.map(|value| WindSpeed {
                value,
                unit: wind_unit,
            }),
            condition: Condition::Code(code),
        })
    }
}

fn humidity_pct(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

#[async_trait]
impl ConditionsFetcher for OpenMeteoConditions {
    async fn current(
        &self,
        coordinates: Coordinates,
        _location_key: Option<&str>,
    ) -> Result<WeatherObservation> {
        tracing::debug!(provider = PROVIDER, %coordinates, "fetching current conditions");

        let url = format!("{}/v1/forecast", self.base_url);
        let query = [
            ("latitude", coordinates.latitude().to_string()),
            ("longitude", coordinates.longitude().to_string()),
            ("current", CURRENT_FIELDS.to_string()),
        ];

        let body = get_body(&self.http, PROVIDER, &url, &query).await?;
        let parsed: OmResponse = decode(PROVIDER, &body)?;

        parsed.into_observation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    async fn fetch(body: serde_json::Value) -> Result<WeatherObservation> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "51.5074"))
            .and(query_param("current", CURRENT_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        OpenMeteoConditions::new(&server.uri())
            .current(Coordinates::new(51.5074, -0.1278).unwrap(), None)
            .await
    }

    #[tokio::test]
    async fn full_current_block() {
        let obs = fetch(json!({
            "current_units": { "temperature_2m": "°C", "wind_speed_10m": "km/h" },
            "current": {
                "time": "2024-05-01T12:00",
                "temperature_2m": 15.2,
                "relative_humidity_2m": 70,
                "wind_speed_10m": 12.3,
                "weather_code": 3
            }
        }))
        .await
        .unwrap();

        assert_eq!(obs.temperature_c, 15.2);
        assert_eq!(obs.humidity_pct, Some(70));
        assert_eq!(
            obs.wind,
            Some(WindSpeed {
                value: 12.3,
                unit: "km/h".into()
            })
        );
        assert_eq!(obs.condition, Condition::Code(3));
    }

    #[tokio::test]
    async fn optional_fields_may_be_absent() {
        let obs = fetch(json!({
            "current": { "temperature_2m": -3.5, "weather_code": 71 }
        }))
        .await
        .unwrap();

        assert_eq!(obs.humidity_pct, None);
        assert_eq!(obs.wind, None);
    }

    #[tokio::test]
    async fn missing_current_block_is_data_unavailable() {
        let err = fetch(json!({ "latitude": 51.5, "longitude": -0.12 })).await.unwrap_err();

        assert!(matches!(err, WeatherError::DataUnavailable(_)));
        assert!(err.to_string().contains("no current conditions"));
    }

    #[tokio::test]
    async fn wrong_type_is_schema_error() {
        let err = fetch(json!({
            "current": { "temperature_2m": "warm", "weather_code": 3 }
        }))
        .await
        .unwrap_err();

        match err {
            WeatherError::UpstreamSchema { path, .. } => {
                assert_eq!(path, "current.temperature_2m")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn humidity_is_clamped() {
        assert_eq!(humidity_pct(70.4), 70);
        assert_eq!(humidity_pct(101.0), 100);
        assert_eq!(humidity_pct(-2.0), 0);
    }
}
