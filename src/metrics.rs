//! Pure metric extraction from raw itineraries
//!
//! Converts the engine's itinerary JSON into the handful of numbers the
//! downstream mode-choice model consumes. Everything here is pure; the
//! result writer decides where the numbers go.

use crate::engine::types::{Itinerary, Leg, Place};
use crate::routing::RouteOption;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Per-leg metrics inside an option summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegMetric {
    pub mode: String,
    /// Seconds, real-time aware
    pub duration: f64,
    /// Meters, great-circle between the leg's endpoints
    pub distance: f64,
}

/// Decision-relevant metrics for one route option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSummary {
    pub option_id: Uuid,
    /// Seconds from scheduled start to actual end
    pub duration: f64,
    /// Boardings beyond the first non-walk leg
    pub changes: u32,
    /// Seconds of delay against the scheduled end, 0 without real-time data
    pub delay: f64,
    /// Engine re-plans during delay simulation, passed through verbatim
    pub recalculations: i64,
    pub modes: Vec<LegMetric>,
}

/// Great-circle distance in meters between two coordinates.
///
/// Used instead of the engine's path geometry, which is not consulted;
/// good enough for mode-choice distance terms.
pub fn haversine_m(from: &Place, to: &Place) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Extract per-leg metrics: lower-cased mode, real-time-aware duration,
/// approximated distance.
fn leg_metric(leg: &Leg) -> LegMetric {
    let duration = (leg.actual_end() - leg.actual_start()) as f64 / 1000.0;

    LegMetric {
        mode: leg.mode.to_lowercase(),
        duration,
        distance: haversine_m(&leg.from, &leg.to),
    }
}

/// Count of mode changes: non-walk legs beyond the first
fn count_changes(itinerary: &Itinerary) -> u32 {
    let non_walk = itinerary.legs.iter().filter(|l| l.mode != "WALK").count();
    non_walk.saturating_sub(1) as u32
}

/// Summarize one route option from its best (first) itinerary.
pub fn summarize_option(option: &RouteOption) -> Option<OptionSummary> {
    let itinerary = option.itineraries.first()?;

    let actual_end = itinerary.actual_end();
    let duration = (actual_end - itinerary.start_time) as f64 / 1000.0;
    let delay = (actual_end - itinerary.end_time) as f64 / 1000.0;

    Some(OptionSummary {
        option_id: option.option_id,
        duration,
        changes: count_changes(itinerary),
        delay,
        recalculations: itinerary.re_calc_count,
        modes: itinerary.legs.iter().map(leg_metric).collect(),
    })
}
