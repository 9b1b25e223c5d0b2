//! Simulation and place resource lookups

use crate::db::models::{PlaceResources, Simulation};
use crate::db::DbPool;
use crate::error::{Result, RouterError};

/// Get a simulation by id
pub async fn get_simulation(pool: &DbPool, sim_id: &str) -> Result<Simulation> {
    let sim = sqlx::query_as::<_, Simulation>("SELECT * FROM simulations WHERE sim_id = $1")
        .bind(sim_id)
        .fetch_optional(pool)
        .await?;

    sim.ok_or_else(|| RouterError::SimulationNotFound(sim_id.to_string()))
}

/// Get the geographic/transit resources for a place
pub async fn get_place_resources(pool: &DbPool, place_id: &str) -> Result<PlaceResources> {
    let resources =
        sqlx::query_as::<_, PlaceResources>("SELECT * FROM place_resources WHERE place_id = $1")
            .bind(place_id)
            .fetch_optional(pool)
            .await?;

    resources.ok_or_else(|| RouterError::PlaceResourcesNotFound(place_id.to_string()))
}

#[cfg(test)]
mod tests {
    // Tests require a running database - see integration tests
}
