//! Core library for the `weather-mcp` tool server.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Input resolution against the ambient request context
//! - Abstraction over location and weather providers
//! - Condition-code lookup and report formatting
//! - The `getWeather` tool boundary and its error envelope
//!
//! It is used by `weather-mcp`, but can also be reused by other binaries or services.

pub mod conditions;
pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;
pub mod resolve;
pub mod service;
pub mod tool;

pub use config::{Config, ProviderConfig};
pub use context::{GeoHint, RequestContext};
pub use error::{Result, WeatherError};
pub use model::{
    Condition, Coordinates, LocationInfo, TemperatureUnit, WeatherObservation, WeatherQuery,
    WindSpeed,
};
pub use provider::{ConditionsFetcher, Locator, ProviderId, Providers};
pub use service::{WeatherReport, WeatherService};
pub use tool::ToolResult;
