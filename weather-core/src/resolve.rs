//! Input resolution: explicit tool arguments first, ambient hint second.

use crate::{
    context::GeoHint,
    error::{Result, WeatherError},
    model::{Coordinates, TemperatureUnit, WeatherQuery},
};

/// What the locator has to work with.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Coordinates(Coordinates),
    Country(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInput {
    pub target: Target,
    pub unit: TemperatureUnit,
}

/// Turn a query plus ambient hint into a validated target.
///
/// Never touches the network; every failure here is a validation error.
pub fn resolve_input(query: &WeatherQuery, hint: &GeoHint) -> Result<ResolvedInput> {
    let unit = query.unit.unwrap_or_default();

    let target = if query.latitude.is_some() || query.longitude.is_some() {
        let latitude = query.latitude.or(hint.latitude).ok_or_else(|| missing("latitude"))?;
        let longitude = query.longitude.or(hint.longitude).ok_or_else(|| missing("longitude"))?;
        Target::Coordinates(Coordinates::new(latitude, longitude)?)
    } else if let Some(country) = &query.country {
        Target::Country(country_name(country)?)
    } else if let Some(coordinates) = hint.coordinates() {
        Target::Coordinates(coordinates)
    } else if let Some(country) = &hint.country {
        Target::Country(country_name(country)?)
    } else if hint.latitude.is_some() {
        return Err(missing("longitude"));
    } else {
        return Err(missing("latitude"));
    };

    Ok(ResolvedInput { target, unit })
}

fn missing(field: &str) -> WeatherError {
    WeatherError::validation(format!("Missing required parameter: {field}"))
}

fn country_name(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WeatherError::validation("Invalid parameter: country must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(lat: Option<f64>, lon: Option<f64>, country: Option<&str>) -> WeatherQuery {
        WeatherQuery {
            latitude: lat,
            longitude: lon,
            country: country.map(str::to_string),
            unit: None,
        }
    }

    #[test]
    fn explicit_coordinates_win() {
        let hint = GeoHint {
            latitude: Some(1.0),
            longitude: Some(2.0),
            country: Some("FR".into()),
        };
        let resolved = resolve_input(&query(Some(51.5), Some(-0.12), Some("GB")), &hint).unwrap();

        assert_eq!(resolved.target, Target::Coordinates(Coordinates::new(51.5, -0.12).unwrap()));
        assert_eq!(resolved.unit, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn missing_half_filled_from_hint() {
        let hint = GeoHint {
            longitude: Some(10.0),
            ..GeoHint::default()
        };
        let resolved = resolve_input(&query(Some(59.9), None, None), &hint).unwrap();

        assert_eq!(resolved.target, Target::Coordinates(Coordinates::new(59.9, 10.0).unwrap()));
    }

    #[test]
    fn missing_longitude_is_named() {
        let err = resolve_input(&query(Some(59.9), None, None), &GeoHint::default()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: longitude");
    }

    #[test]
    fn nothing_supplied_names_latitude() {
        let err = resolve_input(&WeatherQuery::default(), &GeoHint::default()).unwrap_err();
        assert!(matches!(err, WeatherError::Validation(_)));
        assert_eq!(err.to_string(), "Missing required parameter: latitude");
    }

    #[test]
    fn explicit_country_beats_ambient_coordinates() {
        let hint = GeoHint {
            latitude: Some(1.0),
            longitude: Some(2.0),
            country: None,
        };
        let resolved = resolve_input(&query(None, None, Some(" Japan ")), &hint).unwrap();
        assert_eq!(resolved.target, Target::Country("Japan".into()));
    }

    #[test]
    fn ambient_coordinates_then_country() {
        let coords_hint = GeoHint {
            latitude: Some(35.0),
            longitude: Some(139.0),
            country: Some("JP".into()),
        };
        let resolved = resolve_input(&WeatherQuery::default(), &coords_hint).unwrap();
        assert!(matches!(resolved.target, Target::Coordinates(_)));

        let country_hint = GeoHint {
            country: Some("JP".into()),
            ..GeoHint::default()
        };
        let resolved = resolve_input(&WeatherQuery::default(), &country_hint).unwrap();
        assert_eq!(resolved.target, Target::Country("JP".into()));
    }

    #[test]
    fn blank_country_rejected() {
        let err = resolve_input(&query(None, None, Some("   ")), &GeoHint::default()).unwrap_err();
        assert!(err.to_string().contains("country"));
    }

    #[test]
    fn out_of_range_rejected() {
        let err = resolve_input(&query(Some(120.0), Some(0.0), None), &GeoHint::default())
            .unwrap_err();
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn explicit_unit_kept() {
        let mut q = query(Some(0.0), Some(0.0), None);
        q.unit = Some(TemperatureUnit::Celsius);
        let input = resolve_input(&q, &GeoHint::default()).unwrap();
        assert_eq!(input.unit, TemperatureUnit::Celsius);
    }
}
