use anyhow::Context;
use clap::{Parser, Subcommand};
use weather_core::{
    Config, ProviderId, RequestContext, TemperatureUnit, WeatherQuery, WeatherService,
    provider::default_providers_from_config,
};

use crate::server::McpServer;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-mcp", version, about = "Weather MCP server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the getWeather tool over stdio.
    Serve {
        /// Provider to use instead of the configured default.
        #[arg(long)]
        provider: Option<String>,
    },

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "open-meteo" or "accuweather".
        provider: String,
    },

    /// Run one getWeather call and print the report.
    Show {
        #[arg(long, allow_negative_numbers = true)]
        latitude: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        longitude: Option<f64>,

        /// Country name, used when coordinates are absent.
        #[arg(long)]
        country: Option<String>,

        /// "celsius" or "fahrenheit" (default).
        #[arg(long, value_parser = parse_unit)]
        unit: Option<TemperatureUnit>,

        #[arg(long)]
        provider: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { provider } => {
                let service = build_service(provider)?;
                McpServer::new(service).serve_stdio().await?;
            }
            Command::Configure { provider } => configure(&provider)?,
            Command::Show {
                latitude,
                longitude,
                country,
                unit,
                provider,
            } => {
                let service = build_service(provider)?;
                let query = WeatherQuery {
                    latitude,
                    longitude,
                    country,
                    unit,
                };

                let result = service.call(&query, &RequestContext::default()).await;
                if result.is_error {
                    anyhow::bail!(result.text);
                }
                println!("{}", result.text);
            }
        }

        Ok(())
    }
}

fn parse_unit(s: &str) -> Result<TemperatureUnit, String> {
    TemperatureUnit::try_from(s).map_err(|e| e.to_string())
}

fn build_service(provider: Option<String>) -> anyhow::Result<WeatherService> {
    let provider = provider
        .as_deref()
        .map(ProviderId::try_from)
        .transpose()?;

    let config = Config::load(provider)?;
    let providers = default_providers_from_config(&config)?;
    tracing::info!(provider = %config.default_provider_id()?, "providers ready");

    Ok(WeatherService::new(providers))
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let mut config = Config::load_from(&Config::config_file_path()?)?;
    if config.is_provider_configured(id) {
        tracing::info!(provider = %id, "replacing existing API key");
    }
    config.upsert_provider_api_key(id, api_key.trim().to_string());
    let path = config.save()?;

    println!("Saved {id} credentials to {}", path.display());
    Ok(())
}
