//! Background job to record connection pool metrics.

use sqlx::PgPool;
use std::time::Duration;

use super::scheduler::Job;

/// Seconds between pool gauge updates.
const POOL_METRICS_INTERVAL_SECS: u64 = 10;

/// Job that periodically records database connection pool gauges.
///
/// Only registered when the postgres backend is active.
pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(POOL_METRICS_INTERVAL_SECS)
    }

    async fn execute(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);
        Ok(())
    }
}
