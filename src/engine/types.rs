//! Wire types for the routing engine's plan API
//!
//! All timestamps are milliseconds since the Unix epoch, as emitted by the
//! engine. `rt_*` fields are real-time overrides produced by the delay
//! simulation; they are absent when the engine ran without delays.

use serde::{Deserialize, Serialize};

/// One endpoint of a leg
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One itinerary segment with a single mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub mode: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt_start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt_end_time: Option<i64>,
    pub from: Place,
    pub to: Place,
}

impl Leg {
    /// Leg start, preferring the real-time override
    pub fn actual_start(&self) -> i64 {
        self.rt_start_time.unwrap_or(self.start_time)
    }

    /// Leg end, preferring the real-time override
    pub fn actual_end(&self) -> i64 {
        self.rt_end_time.unwrap_or(self.end_time)
    }
}

/// One complete planned trip for a mode combination
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub start_time: i64,
    pub end_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt_start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt_end_time: Option<i64>,
    /// How often the engine re-planned the trip while simulating delays
    #[serde(default, rename = "reCalcCount")]
    pub re_calc_count: i64,
    pub legs: Vec<Leg>,
}

impl Itinerary {
    /// Itinerary end, preferring the real-time override
    pub fn actual_end(&self) -> i64 {
        self.rt_end_time.unwrap_or(self.end_time)
    }
}

/// Top-level plan response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct PlanResponse {
    #[serde(default)]
    pub plan: Option<Plan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PLAN: &str = r#"{
        "plan": {
            "itineraries": [{
                "startTime": 0,
                "endTime": 600000,
                "reCalcCount": 2,
                "legs": [{
                    "mode": "WALK",
                    "startTime": 0,
                    "endTime": 120000,
                    "from": {"lat": 52.52, "lon": 13.405},
                    "to": {"lat": 52.521, "lon": 13.41}
                }, {
                    "mode": "BUS",
                    "startTime": 120000,
                    "endTime": 540000,
                    "rtStartTime": 180000,
                    "rtEndTime": 600000,
                    "from": {"lat": 52.521, "lon": 13.41, "name": "Stop A"},
                    "to": {"lat": 52.53, "lon": 13.42, "name": "Stop B"}
                }]
            }]
        }
    }"#;

    #[test]
    fn test_parse_plan_response() {
        let response: PlanResponse = serde_json::from_str(SAMPLE_PLAN).unwrap();
        let plan = response.plan.unwrap();
        assert_eq!(plan.itineraries.len(), 1);

        let itinerary = &plan.itineraries[0];
        assert_eq!(itinerary.start_time, 0);
        assert_eq!(itinerary.end_time, 600000);
        assert_eq!(itinerary.re_calc_count, 2);
        assert_eq!(itinerary.legs.len(), 2);

        let bus = &itinerary.legs[1];
        assert_eq!(bus.mode, "BUS");
        assert_eq!(bus.rt_end_time, Some(600000));
        assert_eq!(bus.from.name.as_deref(), Some("Stop A"));
    }

    #[test]
    fn test_recalc_count_defaults_to_zero() {
        let json = r#"{"startTime": 0, "endTime": 1000, "legs": []}"#;
        let itinerary: Itinerary = serde_json::from_str(json).unwrap();
        assert_eq!(itinerary.re_calc_count, 0);
    }

    #[test]
    fn test_actual_times_prefer_rt_overrides() {
        let json = r#"{
            "startTime": 0, "endTime": 1000, "rtEndTime": 3000,
            "legs": [{
                "mode": "TRAM", "startTime": 0, "endTime": 1000,
                "rtStartTime": 500,
                "from": {"lat": 0.0, "lon": 0.0},
                "to": {"lat": 0.0, "lon": 0.0}
            }]
        }"#;
        let itinerary: Itinerary = serde_json::from_str(json).unwrap();
        assert_eq!(itinerary.actual_end(), 3000);
        assert_eq!(itinerary.legs[0].actual_start(), 500);
        // No rt override on the leg end, scheduled time wins
        assert_eq!(itinerary.legs[0].actual_end(), 1000);
    }

    #[test]
    fn test_missing_plan_is_none() {
        let response: PlanResponse = serde_json::from_str(r#"{"plan": null}"#).unwrap();
        assert!(response.plan.is_none());
    }
}
