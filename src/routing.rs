//! Per-commuter route computation
//!
//! Derives the candidate mode combinations for a commuter and collects one
//! route option per combination from the engine. The trip planning itself
//! happens entirely inside the engine; this module only orchestrates the
//! requests.

use crate::db::models::VirtualCommuter;
use crate::engine::types::Itinerary;
use crate::engine::EngineClient;
use crate::error::{Result, RouterError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// One coordinate pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Raw routing outcome for one mode combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteOption {
    pub option_id: Uuid,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub departure: DateTime<Utc>,
    pub modes: Vec<String>,
    pub itineraries: Vec<Itinerary>,
}

/// Candidate mode combinations for a commuter.
///
/// Walk+transit is always an option; walk+car only with vehicle access.
pub fn mode_combinations(vc: &VirtualCommuter) -> Vec<Vec<&'static str>> {
    let mut combinations = vec![vec!["WALK", "TRANSIT"]];

    if vc.has_vehicle {
        combinations.push(vec!["WALK", "CAR"]);
    }

    combinations
}

/// Request itineraries for one commuter and mode combination.
///
/// With delay simulation the engine returns at most one itinerary; a failed
/// delayed request just drops the combination. Returns `None` when the
/// combination yields nothing.
async fn route_option(
    engine: &EngineClient,
    vc: &VirtualCommuter,
    use_delays: bool,
    modes: &[&'static str],
) -> Result<Option<RouteOption>> {
    let date = vc.departure.format("%Y-%m-%d").to_string();
    let time = vc.departure.format("%H:%M").to_string();

    let itineraries: Vec<Itinerary> = if use_delays {
        let delayed = engine
            .get_delayed_route(
                vc.origin_lat,
                vc.origin_lon,
                vc.dest_lat,
                vc.dest_lon,
                &date,
                &time,
                false,
                modes,
            )
            .await;

        match delayed {
            Ok(Some(itinerary)) => vec![itinerary],
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("Delayed route request failed for {}: {}", vc.vc_id, e);
                return Ok(None);
            }
        }
    } else {
        engine
            .get_route(
                vc.origin_lat,
                vc.origin_lon,
                vc.dest_lat,
                vc.dest_lon,
                &date,
                &time,
                false,
                modes,
            )
            .await?
    };

    if itineraries.is_empty() {
        return Ok(None);
    }

    Ok(Some(RouteOption {
        option_id: Uuid::new_v4(),
        origin: GeoPoint {
            lat: vc.origin_lat,
            lon: vc.origin_lon,
        },
        destination: GeoPoint {
            lat: vc.dest_lat,
            lon: vc.dest_lon,
        },
        departure: vc.departure,
        modes: modes.iter().map(|m| m.to_string()).collect(),
        itineraries,
    }))
}

/// Compute all surviving route options for a commuter.
///
/// Combinations that yield nothing are dropped; when every combination
/// comes back empty the commuter has no viable route at all and the job
/// fails with [`RouterError::NoRouteFound`].
pub async fn route_commuter(
    engine: &EngineClient,
    vc: &VirtualCommuter,
    use_delays: bool,
) -> Result<Vec<RouteOption>> {
    let mut options = Vec::new();

    for modes in mode_combinations(vc) {
        if let Some(option) = route_option(engine, vc, use_delays, &modes).await? {
            options.push(option);
        }
    }

    if options.is_empty() {
        return Err(RouterError::NoRouteFound);
    }

    Ok(options)
}
