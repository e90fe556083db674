//! Idle Entry Sweeper
//!
//! Both the throttle's window map and the scenario lock map grow with every
//! new session and scenario. The sweeper periodically drops entries nobody
//! is using so memory stays bounded by the active population.

use std::sync::Arc;
use std::time::{Duration, Instant};

use platform::{ScenarioLockRegistry, SessionThrottle};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions_pruned: usize,
    pub locks_pruned: usize,
}

pub fn sweep_once(
    throttle: &SessionThrottle,
    locks: &ScenarioLockRegistry,
    session_idle: Duration,
    now: Instant,
) -> SweepReport {
    SweepReport {
        sessions_pruned: throttle.prune_idle(now, session_idle),
        locks_pruned: locks.prune_idle(),
    }
}

/// Spawn the periodic sweep onto the current runtime.
pub fn spawn_sweeper(
    throttle: Arc<SessionThrottle>,
    locks: Arc<ScenarioLockRegistry>,
    interval: Duration,
    session_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; nothing to sweep yet.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = sweep_once(&throttle, &locks, session_idle, Instant::now());
            if report != SweepReport::default() {
                tracing::info!(
                    sessions_pruned = report.sessions_pruned,
                    locks_pruned = report.locks_pruned,
                    sessions_tracked = throttle.len(),
                    scenarios_tracked = locks.len(),
                    "Idle entry sweep completed"
                );
            }
        }
    })
}
