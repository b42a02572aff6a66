//! Background job scheduler and job implementations.

mod pool_metrics;
mod scheduler;
mod stale_pending;

pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobScheduler};
pub use stale_pending::StalePendingSweepJob;
