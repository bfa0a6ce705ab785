//! Scheduled health checks and retry-queue replay.
//!
//! Both jobs are also callable on demand through the admin API; the loops
//! here only provide the cadence.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::routes::ServerState;

pub fn spawn_periodic_tasks(state: &ServerState, cfg: &configs::PoolConfig) {
    let health = state.health.clone();
    let health_interval = Duration::from_secs(cfg.health_check_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(health_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match health.perform_health_checks().await {
                Ok(outcomes) => debug!(probed = outcomes.len(), "scheduled health checks complete"),
                Err(e) => warn!(error = %e, "scheduled health checks failed"),
            }
        }
    });

    let retry = state.retry.clone();
    let replay_interval = Duration::from_secs(cfg.queue_replay_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(replay_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match retry.process_queue().await {
                Ok(summary) if summary.total > 0 => {
                    debug!(total = summary.total, succeeded = summary.succeeded, "scheduled queue replay complete")
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "scheduled queue replay failed"),
            }
        }
    });
}
