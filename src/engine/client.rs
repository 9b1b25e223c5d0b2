//! HTTP client for the routing engine's plan API

use crate::engine::types::{Itinerary, PlanResponse};
use crate::error::{Result, RouterError};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Configuration for the engine client
#[derive(Debug, Clone)]
pub struct EngineClientConfig {
    /// Base URL of the running engine server
    pub base_url: String,
    /// Connection timeout (default: 10 seconds)
    pub connect_timeout: Duration,
    /// Request timeout (default: 120 seconds; delay-simulated plans are slow)
    pub request_timeout: Duration,
}

impl Default for EngineClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Client for requesting itineraries from the routing engine
pub struct EngineClient {
    client: Client,
    config: EngineClientConfig,
}

impl EngineClient {
    /// Create a client with custom configuration
    pub fn with_config(config: EngineClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Request the ordered itinerary list for one mode combination.
    ///
    /// Returns an empty vec when the engine found no plan.
    #[allow(clippy::too_many_arguments)]
    pub async fn get_route(
        &self,
        origin_lat: f64,
        origin_lon: f64,
        dest_lat: f64,
        dest_lon: f64,
        date: &str,
        time: &str,
        arrive_by: bool,
        modes: &[&str],
    ) -> Result<Vec<Itinerary>> {
        let response = self
            .plan_request(
                origin_lat, origin_lon, dest_lat, dest_lon, date, time, arrive_by, modes, false,
            )
            .await?;

        Ok(response.plan.map(|p| p.itineraries).unwrap_or_default())
    }

    /// Request a single delay-aware itinerary for one mode combination.
    ///
    /// The engine re-plans against simulated disruptions and returns its
    /// best surviving itinerary. `None` when it found no viable plan.
    #[allow(clippy::too_many_arguments)]
    pub async fn get_delayed_route(
        &self,
        origin_lat: f64,
        origin_lon: f64,
        dest_lat: f64,
        dest_lon: f64,
        date: &str,
        time: &str,
        arrive_by: bool,
        modes: &[&str],
    ) -> Result<Option<Itinerary>> {
        let response = self
            .plan_request(
                origin_lat, origin_lon, dest_lat, dest_lon, date, time, arrive_by, modes, true,
            )
            .await?;

        Ok(response
            .plan
            .map(|p| p.itineraries)
            .unwrap_or_default()
            .into_iter()
            .next())
    }

    #[allow(clippy::too_many_arguments)]
    async fn plan_request(
        &self,
        origin_lat: f64,
        origin_lon: f64,
        dest_lat: f64,
        dest_lon: f64,
        date: &str,
        time: &str,
        arrive_by: bool,
        modes: &[&str],
        simulate_delays: bool,
    ) -> Result<PlanResponse> {
        let url = format!("{}/otp/routers/default/plan", self.config.base_url);
        let mode_param = modes.join(",");

        debug!(
            "Plan request: ({}, {}) -> ({}, {}) at {} {} modes={}",
            origin_lat, origin_lon, dest_lat, dest_lon, date, time, mode_param
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("fromPlace", format!("{},{}", origin_lat, origin_lon)),
                ("toPlace", format!("{},{}", dest_lat, dest_lon)),
                ("date", date.to_string()),
                ("time", time.to_string()),
                ("arriveBy", arrive_by.to_string()),
                ("mode", mode_param),
                ("simulateDelays", simulate_delays.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RouterError::EngineStatusError {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<PlanResponse>().await?)
    }
}
