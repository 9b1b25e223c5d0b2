//! Result document persistence
//!
//! Both result collections keep exactly one current document per commuter,
//! uniquely indexed on vc_id. Writes are native upserts: a rerun replaces
//! the previous document wholesale instead of accumulating history.

use crate::db::models::{RunMeta, Traveller};
use crate::db::DbPool;
use crate::error::Result;
use crate::metrics::OptionSummary;
use crate::routing::RouteOption;

/// Upsert the raw itinerary document for a commuter
pub async fn upsert_route_result(
    pool: &DbPool,
    vc_id: &str,
    sim_id: &str,
    options: &[RouteOption],
    meta: &RunMeta,
) -> Result<()> {
    let options_json = serde_json::to_value(options)?;
    let meta_json = serde_json::to_value(meta)?;

    sqlx::query(
        r#"
        INSERT INTO route_results (vc_id, sim_id, created_at, options, meta)
        VALUES ($1, $2, NOW(), $3, $4)
        ON CONFLICT (vc_id) DO UPDATE
        SET sim_id = EXCLUDED.sim_id,
            created_at = EXCLUDED.created_at,
            options = EXCLUDED.options,
            meta = EXCLUDED.meta
        "#,
    )
    .bind(vc_id)
    .bind(sim_id)
    .bind(options_json)
    .bind(meta_json)
    .execute(pool)
    .await?;

    Ok(())
}

/// Upsert the decision-ready summary document for a commuter
pub async fn upsert_option_summary(
    pool: &DbPool,
    vc_id: &str,
    sim_id: &str,
    traveller: &Traveller,
    options: &[OptionSummary],
) -> Result<()> {
    let traveller_json = serde_json::to_value(traveller)?;
    let options_json = serde_json::to_value(options)?;

    sqlx::query(
        r#"
        INSERT INTO route_option_summaries (vc_id, sim_id, created_at, traveller, options)
        VALUES ($1, $2, NOW(), $3, $4)
        ON CONFLICT (vc_id) DO UPDATE
        SET sim_id = EXCLUDED.sim_id,
            created_at = EXCLUDED.created_at,
            traveller = EXCLUDED.traveller,
            options = EXCLUDED.options
        "#,
    )
    .bind(vc_id)
    .bind(sim_id)
    .bind(traveller_json)
    .bind(options_json)
    .execute(pool)
    .await?;

    Ok(())
}
