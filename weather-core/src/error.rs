use thiserror::Error;

/// Every way a single `getWeather` invocation can fail.
///
/// The `Display` text of each variant is what the caller sees inside an
/// error tool result, so messages are written for end users.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Missing or invalid input; raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// A provider answered, but the body does not have the documented shape.
    #[error("Unexpected response from {provider} at `{path}`: {detail}")]
    UpstreamSchema {
        provider: &'static str,
        path: String,
        detail: String,
    },

    #[error("{0}")]
    NotFound(String),

    /// The provider answered successfully without usable current conditions.
    #[error("Weather data unavailable: {0}")]
    DataUnavailable(String),

    #[error("{provider} request failed with status {status}: {body}")]
    Upstream {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Network-level failure. The URL is stripped from `source` so API keys
    /// passed as query parameters never reach the caller.
    #[error("Failed to reach {provider}: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request cancelled")]
    Cancelled,
}

impl WeatherError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn data_unavailable(msg: impl Into<String>) -> Self {
        Self::DataUnavailable(msg.into())
    }

    pub(crate) fn transport(provider: &'static str, source: reqwest::Error) -> Self {
        Self::Transport {
            provider,
            source: source.without_url(),
        }
    }

    /// Short machine-friendly name of the variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::UpstreamSchema { .. } => "upstream_schema",
            Self::NotFound(_) => "not_found",
            Self::DataUnavailable(_) => "data_unavailable",
            Self::Upstream { .. } => "upstream_status",
            Self::Transport { .. } => "transport",
            Self::Cancelled => "cancelled",
        }
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
