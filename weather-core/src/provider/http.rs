//! Request and decode helpers shared by all providers.

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{Result, WeatherError};

/// Issue one GET and return the body of a successful response.
pub(crate) async fn get_body(
    http: &Client,
    provider: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<String> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| WeatherError::transport(provider, e))?;

    let status = res.status();
    let body = res.text().await.map_err(|e| WeatherError::transport(provider, e))?;

    if !status.is_success() {
        tracing::warn!(provider, status = status.as_u16(), "upstream request failed");
        return Err(WeatherError::Upstream {
            provider,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    Ok(body)
}

/// Decode `body` into `T`, reporting the failing field path on mismatch.
pub(crate) fn decode<T: DeserializeOwned>(provider: &'static str, body: &str) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_str(body);

    serde_path_to_error::deserialize(de).map_err(|err| {
        let path = err.path().to_string();
        let detail = err.into_inner().to_string();
        tracing::warn!(provider, %path, %detail, "response failed schema validation");
        WeatherError::UpstreamSchema {
            provider,
            path,
            detail,
        }
    })
}

pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
