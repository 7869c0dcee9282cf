use std::fmt::Write;

use crate::model::{LocationInfo, TemperatureUnit, WeatherObservation};

/// Render the text block returned to the tool caller.
///
/// Humidity and wind lines appear only when the provider reported them.
pub fn render_report(
    location: &LocationInfo,
    observation: &WeatherObservation,
    unit: TemperatureUnit,
) -> String {
    let mut out = String::new();

    if location.country.is_empty() {
        let _ = writeln!(out, "Weather in {}:", location.display_name);
    } else {
        let _ = writeln!(out, "Weather in {}, {}:", location.display_name, location.country);
    }

    let _ = writeln!(out, "- Temperature: {}", format_temperature(observation, unit));

    if let Some(humidity) = observation.humidity_pct {
        let _ = writeln!(out, "- Humidity: {humidity}%");
    }

    if let Some(wind) = &observation.wind {
        let _ = writeln!(out, "- Wind Speed: {} {}", wind.value, wind.unit);
    }

    let _ = write!(out, "- Conditions: {}", observation.condition.description());

    out
}

/// Celsius is shown as reported; Fahrenheit is converted and rounded to one
/// decimal for display.
pub fn format_temperature(observation: &WeatherObservation, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{}{}", observation.temperature_c, unit.symbol()),
        TemperatureUnit::Fahrenheit => {
            format!("{:.1}{}", round_one_decimal(observation.temperature_f()), unit.symbol())
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
