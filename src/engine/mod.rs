//! Routing engine integration: HTTP plan client, wire types, and the
//! child-process lifecycle for graph building and the plan server.

pub mod client;
pub mod server;
pub mod types;

pub use client::{EngineClient, EngineClientConfig};
pub use server::{build_graph, EngineServer, GraphResources, READY_MARKER};
pub use types::{Itinerary, Leg, Place, PlanResponse};
