//! WMO weather interpretation codes.
//! See: https://open-meteo.com/en/docs#weathervariables

use std::{collections::HashMap, sync::LazyLock};

use crate::model::Condition;

pub const UNKNOWN_CONDITION: &str = "Unknown";

static WMO_CODES: LazyLock<HashMap<i32, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (0, "Clear sky"),
        (1, "Mainly clear"),
        (2, "Partly cloudy"),
        (3, "Overcast"),
        (45, "Fog"),
        (48, "Depositing rime fog"),
        (51, "Light drizzle"),
        (53, "Moderate drizzle"),
        (55, "Dense drizzle"),
        (56, "Light freezing drizzle"),
        (57, "Dense freezing drizzle"),
        (61, "Slight rain"),
        (63, "Moderate rain"),
        (65, "Heavy rain"),
        (66, "Light freezing rain"),
        (67, "Heavy freezing rain"),
        (71, "Slight snow fall"),
        (73, "Moderate snow fall"),
        (75, "Heavy snow fall"),
        (77, "Snow grains"),
        (80, "Slight rain showers"),
        (81, "Moderate rain showers"),
        (82, "Violent rain showers"),
        (85, "Slight snow showers"),
        (86, "Heavy snow showers"),
        (95, "Thunderstorm"),
        (96, "Thunderstorm with slight hail"),
        (99, "Thunderstorm with heavy hail"),
    ])
});

/// Look up a WMO code. Codes outside the table map to "Unknown".
pub fn describe_code(code: i32) -> &'static str {
    WMO_CODES.get(&code).copied().unwrap_or(UNKNOWN_CONDITION)
}

impl Condition {
    pub fn description(&self) -> &str {
        match self {
            Condition::Code(code) => describe_code(*code),
            Condition::Text(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(describe_code(0), "Clear sky");
        assert_eq!(describe_code(3), "Overcast");
        assert_eq!(describe_code(45), "Fog");
        assert_eq!(describe_code(65), "Heavy rain");
        assert_eq!(describe_code(99), "Thunderstorm with heavy hail");
    }

    #[test]
    fn every_table_entry_round_trips_verbatim() {
        for (code, text) in WMO_CODES.iter() {
            assert_eq!(describe_code(*code), *text);
        }
    }

    #[test]
    fn unmapped_codes_are_unknown() {
        for code in [-1, 4, 44, 50, 100, 999, i32::MAX] {
            assert_eq!(describe_code(code), "Unknown");
        }
    }

    #[test]
    fn text_condition_is_verbatim() {
        let condition = Condition::Text("Mostly sunny".into());
        assert_eq!(condition.description(), "Mostly sunny");
        assert_eq!(Condition::Code(2).description(), "Partly cloudy");
    }
}
