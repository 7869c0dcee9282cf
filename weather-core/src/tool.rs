//! The `getWeather` tool boundary: argument parsing, the input schema and the
//! uniform result envelope every failure is folded into.

use serde_json::Value;
use std::any::Any;

use crate::{
    error::{Result, WeatherError},
    model::WeatherQuery,
};

pub const TOOL_NAME: &str = "getWeather";
pub const TOOL_DESCRIPTION: &str = "Get current weather conditions for a location. \
     Pass latitude/longitude or a country name; when neither is given the caller's \
     inferred location is used. Temperatures default to fahrenheit.";
pub const UNKNOWN_ERROR: &str = "Unknown Error";

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub is_error: bool,
    pub text: String,
}

impl ToolResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            text: text.into(),
        }
    }

    /// Typed failures carry their own message, which is passed through verbatim.
    pub fn from_error(err: &WeatherError) -> Self {
        tracing::warn!(kind = err.kind(), error = %err, "getWeather failed");
        Self::error(err.to_string())
    }

    /// Fold a panic payload into an error result. String payloads are used as
    /// the message; anything else becomes "Unknown Error" and is logged.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(msg) = payload.downcast_ref::<&'static str>() {
            tracing::error!(panic = %msg, "getWeather panicked");
            return Self::error(*msg);
        }
        if let Some(msg) = payload.downcast_ref::<String>() {
            tracing::error!(panic = %msg, "getWeather panicked");
            return Self::error(msg.clone());
        }

        tracing::error!("getWeather panicked with a non-string payload");
        Self::error(UNKNOWN_ERROR)
    }
}

/// Decode raw tool arguments. `None` is treated as an empty object.
pub fn parse_arguments(arguments: Option<Value>) -> Result<WeatherQuery> {
    let value = match arguments {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(v) => v,
    };

    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        if path == "." {
            WeatherError::validation(format!("Invalid arguments: {inner}"))
        } else {
            WeatherError::validation(format!("Invalid parameter '{path}': {inner}"))
        }
    })
}

/// JSON schema of the tool arguments.
pub fn input_schema() -> Value {
    let schema = schemars::schema_for!(WeatherQuery);
    serde_json::to_value(schema).unwrap_or_else(|_| Value::Object(Default::default()))
}
