use crate::{
    context::RequestContext,
    error::{Result, WeatherError},
    format::render_report,
    model::{LocationInfo, TemperatureUnit, WeatherObservation, WeatherQuery},
    provider::{ConditionsFetcher, Locator, Providers},
    resolve::{ResolvedInput, Target, resolve_input},
    tool::ToolResult,
};

/// Everything needed to render one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub location: LocationInfo,
    pub observation: WeatherObservation,
    pub unit: TemperatureUnit,
}

impl WeatherReport {
    pub fn render(&self) -> String {
        render_report(&self.location, &self.observation, self.unit)
    }
}

/// Validate → locate → fetch conditions. Holds no per-request state, so one
/// instance serves any number of concurrent invocations.
#[derive(Debug)]
pub struct WeatherService {
    locator: Box<dyn Locator>,
    conditions: Box<dyn ConditionsFetcher>,
}

impl WeatherService {
    pub fn new(providers: Providers) -> Self {
        Self {
            locator: providers.locator,
            conditions: providers.conditions,
        }
    }

    /// Run one invocation; aborts outstanding requests when the context's
    /// cancellation token fires.
    pub async fn get_weather(
        &self,
        query: &WeatherQuery,
        ctx: &RequestContext,
    ) -> Result<WeatherReport> {
        let input = resolve_input(query, ctx.hint())?;

        tokio::select! {
            biased;
            () = ctx.cancellation().cancelled() => Err(WeatherError::Cancelled),
            report = self.fetch(input) => report,
        }
    }

    /// Run one invocation and normalize the outcome into a tool result.
    pub async fn call(&self, query: &WeatherQuery, ctx: &RequestContext) -> ToolResult {
        match self.get_weather(query, ctx).await {
            Ok(report) => ToolResult::success(report.render()),
            Err(err) => ToolResult::from_error(&err),
        }
    }

    async fn fetch(&self, input: ResolvedInput) -> Result<WeatherReport> {
        let (location, observation) = match input.target {
            Target::Coordinates(coordinates) if !self.conditions.needs_location_key() => {
                tracing::debug!(%coordinates, "locating and fetching concurrently");
                tokio::try_join!(
                    self.locator.reverse(coordinates),
                    self.conditions.current(coordinates, None),
                )?
            }
            Target::Coordinates(coordinates) => {
                let location = self.locator.reverse(coordinates).await?;
                let observation = self
                    .conditions
                    .current(coordinates, location.provider_key.as_deref())
                    .await?;
                (location, observation)
            }
            Target::Country(name) => {
                let located = self.locator.search(&name).await?;
                let observation = self
                    .conditions
                    .current(located.coordinates, located.info.provider_key.as_deref())
                    .await?;
                (located.info, observation)
            }
        };

        tracing::info!(
            location = %location.display_name,
            country = %location.country,
            unit = %input.unit,
            "weather resolved"
        );

        Ok(WeatherReport {
            location,
            observation,
            unit: input.unit,
        })
    }
}
