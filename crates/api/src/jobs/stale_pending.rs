//! Background job failing delivery log entries stuck in `pending`.
//!
//! An entry stays pending only if the process lost its terminal write
//! (crash, restart, store outage outlasting the retries). The sweep moves
//! such entries to `failed` with reason `stale_pending`.

use domain::services::DispatchEngine;
use std::time::Duration;
use tracing::info;

use super::scheduler::Job;

pub struct StalePendingSweepJob {
    engine: DispatchEngine,
    max_age: Duration,
    interval: Duration,
}

impl StalePendingSweepJob {
    pub fn new(engine: DispatchEngine, max_age: Duration, interval: Duration) -> Self {
        Self {
            engine,
            max_age,
            interval,
        }
    }
}

#[async_trait::async_trait]
impl Job for StalePendingSweepJob {
    fn name(&self) -> &'static str {
        "stale_pending_sweep"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> Result<(), String> {
        let failed = self
            .engine
            .fail_stale_pending(self.max_age)
            .await
            .map_err(|e| e.to_string())?;

        if failed > 0 {
            info!(failed = failed, "Stale pending sweep failed entries");
        }
        Ok(())
    }
}
