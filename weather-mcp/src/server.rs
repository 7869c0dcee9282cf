//! MCP server exposing `getWeather`, built on `rmcp`.
//!
//! rmcp owns the session: handshake, request ids and cancellation. Each
//! `tools/call` gets its own `RequestContext` built from the request's `_meta`
//! and rmcp's per-request cancellation token.

use anyhow::{Context, Result};
use rmcp::{RoleServer, ServerHandler, ServiceExt, model as m, service};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use weather_core::{
    RequestContext, ToolResult, WeatherError, WeatherService,
    tool::{self, TOOL_DESCRIPTION, TOOL_NAME, UNKNOWN_ERROR},
};

use crate::transport::line_transport;

pub const SERVER_NAME: &str = "weather-mcp";

/// JSON-RPC code for a request the client cancelled.
const REQUEST_CANCELLED: i32 = -32800;

pub struct McpServer {
    service: Arc<WeatherService>,
}

impl McpServer {
    pub fn new(service: WeatherService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub async fn serve_stdio(self) -> Result<()> {
        self.run(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one session until the client closes its input.
    pub async fn run<R, W>(self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        tracing::info!("serving getWeather over stdio");

        let running = self
            .serve(line_transport(reader, writer))
            .await
            .context("MCP handshake failed")?;

        let reason = running.waiting().await.context("MCP session task failed")?;
        tracing::info!(?reason, "session closed");
        Ok(())
    }

    fn tool() -> m::Tool {
        let schema = tool::input_schema()
            .as_object()
            .cloned()
            .unwrap_or_default();
        m::Tool::new(TOOL_NAME, TOOL_DESCRIPTION, Arc::new(schema))
    }

    async fn invoke(
        &self,
        arguments: Option<m::JsonObject>,
        ctx: service::RequestContext<RoleServer>,
    ) -> Result<m::CallToolResult, m::ErrorData> {
        let meta = serde_json::to_value(&ctx.meta).ok();
        let request = RequestContext::from_meta(meta.as_ref()).with_cancellation(ctx.ct.clone());
        let service = Arc::clone(&self.service);

        // Run on its own task so a panic becomes an error result.
        let invocation = tokio::spawn(async move {
            let query = tool::parse_arguments(arguments.map(serde_json::Value::Object))?;
            service.get_weather(&query, &request).await
        });

        let result = match invocation.await {
            Ok(Ok(report)) => ToolResult::success(report.render()),
            Ok(Err(WeatherError::Cancelled)) => {
                tracing::info!(id = ?ctx.id, "call cancelled");
                return Err(m::ErrorData::new(
                    m::ErrorCode(REQUEST_CANCELLED),
                    "Request cancelled",
                    None,
                ));
            }
            Ok(Err(err)) => ToolResult::from_error(&err),
            Err(err) if err.is_panic() => ToolResult::from_panic(err.into_panic()),
            Err(err) => {
                tracing::error!(error = %err, "tool task failed");
                ToolResult::error(UNKNOWN_ERROR)
            }
        };

        Ok(to_call_result(result))
    }
}

fn to_call_result(result: ToolResult) -> m::CallToolResult {
    let content = vec![m::Content::text(result.text)];
    if result.is_error {
        m::CallToolResult::error(content)
    } else {
        m::CallToolResult::success(content)
    }
}

#[allow(clippy::manual_async_fn)]
impl ServerHandler for McpServer {
    fn get_info(&self) -> m::ServerInfo {
        m::ServerInfo {
            server_info: m::Implementation {
                name: SERVER_NAME.to_string(),
                title: Some("Weather".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
            capabilities: m::ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Use getWeather with latitude/longitude or a country to get current conditions."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _req: Option<m::PaginatedRequestParam>,
        _ctx: service::RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ListToolsResult, m::ErrorData>> + Send + '_
    {
        async move {
            Ok(m::ListToolsResult {
                tools: vec![Self::tool()],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        req: m::CallToolRequestParam,
        ctx: service::RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::CallToolResult, m::ErrorData>> + Send + '_
    {
        async move {
            if req.name != TOOL_NAME {
                return Err(m::ErrorData::invalid_params(
                    format!("Unknown tool: {}", req.name),
                    None,
                ));
            }

            tracing::debug!(id = ?ctx.id, "getWeather called");
            self.invoke(req.arguments, ctx).await
        }
    }
}
