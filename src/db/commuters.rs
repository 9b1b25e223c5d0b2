//! Virtual commuter lookups

use crate::db::models::VirtualCommuter;
use crate::db::DbPool;
use crate::error::Result;

/// Get a commuter by its id within a simulation
pub async fn get_commuter(
    pool: &DbPool,
    vc_id: &str,
    sim_id: &str,
) -> Result<Option<VirtualCommuter>> {
    let vc = sqlx::query_as::<_, VirtualCommuter>(
        "SELECT * FROM virtual_commuters WHERE vc_id = $1 AND sim_id = $2",
    )
    .bind(vc_id)
    .bind(sim_id)
    .fetch_optional(pool)
    .await?;

    Ok(vc)
}

/// Count commuters belonging to a simulation
pub async fn count_commuters(pool: &DbPool, sim_id: &str) -> Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM virtual_commuters WHERE sim_id = $1")
            .bind(sim_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}
