//! Per-invocation context: the ambient location hint attached to the inbound
//! request and the cancellation token of that one call.
//!
//! A `RequestContext` is built by the transport for each tool call and passed
//! explicitly down the call chain. Nothing in here is shared between calls.

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::model::Coordinates;

const HEADER_LATITUDE: &str = "cf-iplatitude";
const HEADER_LONGITUDE: &str = "cf-iplongitude";
const HEADER_COUNTRY: &str = "cf-ipcountry";

/// Location inferred from the inbound request rather than supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoHint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
}

impl GeoHint {
    /// Extract a hint from a request `_meta` object.
    ///
    /// Accepts `{"geo": {"latitude", "longitude", "country"}}` or edge-network
    /// headers under `{"headers": {"cf-iplatitude", ...}}`; explicit `geo`
    /// values win over headers. Malformed or out-of-range values are dropped.
    pub fn from_meta(meta: &Value) -> Self {
        let mut hint = GeoHint::default();

        if let Some(geo) = meta.get("geo") {
            hint.latitude = number_field(geo, "latitude");
            hint.longitude = number_field(geo, "longitude");
            hint.country = string_field(geo, "country");
        }

        if let Some(headers) = meta.get("headers").and_then(Value::as_object) {
            for (name, value) in headers {
                let Some(value) = value.as_str() else { continue };
                match name.to_ascii_lowercase().as_str() {
                    HEADER_LATITUDE if hint.latitude.is_none() => {
                        hint.latitude = value.trim().parse().ok();
                    }
                    HEADER_LONGITUDE if hint.longitude.is_none() => {
                        hint.longitude = value.trim().parse().ok();
                    }
                    HEADER_COUNTRY if hint.country.is_none() => {
                        hint.country = non_blank(value);
                    }
                    _ => {}
                }
            }
        }

        hint.latitude = hint.latitude.filter(|v| Coordinates::new(*v, 0.0).is_ok());
        hint.longitude = hint.longitude.filter(|v| Coordinates::new(0.0, *v).is_ok());

        hint
    }

    /// Both halves of an ambient coordinate pair, if present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.latitude.is_none() && self.longitude.is_none() && self.country.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    hint: GeoHint,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(hint: GeoHint) -> Self {
        Self {
            hint,
            cancel: CancellationToken::new(),
        }
    }

    /// Build a context from an optional `_meta` value of the inbound request.
    pub fn from_meta(meta: Option<&Value>) -> Self {
        Self::new(meta.map(GeoHint::from_meta).unwrap_or_default())
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn hint(&self) -> &GeoHint {
        &self.hint
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

fn number_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).and_then(non_blank)
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn geo_object_is_read() {
        let hint = GeoHint::from_meta(&json!({
            "geo": { "latitude": 48.85, "longitude": "2.35", "country": "FR" }
        }));

        assert_eq!(hint.latitude, Some(48.85));
        assert_eq!(hint.longitude, Some(2.35));
        assert_eq!(hint.country.as_deref(), Some("FR"));
        assert!(hint.coordinates().is_some());
    }

    #[test]
    fn edge_headers_are_read_case_insensitively() {
        let hint = GeoHint::from_meta(&json!({
            "headers": {
                "CF-IPLatitude": "51.5074",
                "cf-iplongitude": "-0.1278",
                "CF-IPCountry": "GB"
            }
        }));

        assert_eq!(hint.latitude, Some(51.5074));
        assert_eq!(hint.longitude, Some(-0.1278));
        assert_eq!(hint.country.as_deref(), Some("GB"));
    }

    #[test]
    fn geo_wins_over_headers() {
        let hint = GeoHint::from_meta(&json!({
            "geo": { "country": "Norway" },
            "headers": { "cf-ipcountry": "SE" }
        }));

        assert_eq!(hint.country.as_deref(), Some("Norway"));
    }

    #[test]
    fn malformed_hints_are_dropped() {
        let hint = GeoHint::from_meta(&json!({
            "geo": { "latitude": 123.0, "longitude": "east", "country": "  " }
        }));

        assert!(hint.is_empty());
    }

    #[test]
    fn missing_meta_gives_empty_context() {
        let ctx = RequestContext::from_meta(None);
        assert!(ctx.hint().is_empty());
        assert!(!ctx.cancellation().is_cancelled());
    }
}
