//! Binary crate for the `weather-mcp` tool server.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Serving `getWeather` over MCP stdio

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod server;
mod transport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries protocol traffic; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
