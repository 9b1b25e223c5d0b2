//! Per-job processing
//!
//! The worker loop owns claiming and terminal transitions; the processor
//! owns everything between. Keeping the seam here lets the loop be
//! exercised with synthetic processors.

use crate::db::models::{RunMeta, Traveller};
use crate::db::{commuters, results, DbPool};
use crate::engine::EngineClient;
use crate::error::{Result, RouterError};
use crate::metrics::summarize_option;
use crate::routing::route_commuter;
use futures::future::BoxFuture;
use futures::FutureExt;

/// Processes one claimed job end to end.
///
/// An `Err` marks the job as failed and counts toward the claiming
/// worker's breaker; an `Ok` completes it.
pub trait JobProcessor: Send + Sync {
    fn process<'a>(
        &'a self,
        pool: &'a DbPool,
        vc_id: &'a str,
        sim_id: &'a str,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Production processor: route the commuter and persist both documents
pub struct RouteProcessor {
    engine: EngineClient,
    meta: RunMeta,
    use_delays: bool,
}

impl RouteProcessor {
    pub fn new(engine: EngineClient, meta: RunMeta, use_delays: bool) -> Self {
        Self {
            engine,
            meta,
            use_delays,
        }
    }

    /// Route one commuter and persist both result documents.
    ///
    /// Reprocessing a commuter overwrites its previous documents; the
    /// upserts make the whole function idempotent per claim.
    async fn process_commuter(&self, pool: &DbPool, vc_id: &str, sim_id: &str) -> Result<()> {
        let vc = commuters::get_commuter(pool, vc_id, sim_id)
            .await?
            .ok_or_else(|| RouterError::CommuterNotFound(vc_id.to_string()))?;

        // Non-routable commuters close out without results
        if !vc.routable {
            return Ok(());
        }

        let options = route_commuter(&self.engine, &vc, self.use_delays).await?;

        results::upsert_route_result(pool, &vc.vc_id, &vc.sim_id, &options, &self.meta).await?;

        let summaries: Vec<_> = options.iter().filter_map(summarize_option).collect();
        let traveller = Traveller::from_commuter(&vc);
        results::upsert_option_summary(pool, &vc.vc_id, &vc.sim_id, &traveller, &summaries)
            .await?;

        Ok(())
    }
}

impl JobProcessor for RouteProcessor {
    fn process<'a>(
        &'a self,
        pool: &'a DbPool,
        vc_id: &'a str,
        sim_id: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        self.process_commuter(pool, vc_id, sim_id).boxed()
    }
}
