//! Scenario Gate
//!
//! The single way use cases obtain exclusive access to a scenario. Wraps the
//! process-wide lock registry and applies the configured wait bound.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use kernel::id::ScenarioId;
use platform::{ScenarioLockGuard, ScenarioLockRegistry};

use crate::error::DecisionResult;

#[derive(Debug, Clone)]
pub struct ScenarioGate {
    locks: Arc<ScenarioLockRegistry>,
    wait_timeout: Option<Duration>,
}

impl ScenarioGate {
    pub fn new(locks: Arc<ScenarioLockRegistry>, wait_timeout: Option<Duration>) -> Self {
        Self {
            locks,
            wait_timeout,
        }
    }

    pub fn locks(&self) -> &Arc<ScenarioLockRegistry> {
        &self.locks
    }

    /// Acquire the scenario, failing with `LockTimeout` if the bound elapses.
    pub async fn enter(&self, scenario_id: ScenarioId) -> DecisionResult<ScenarioLockGuard> {
        match self.wait_timeout {
            Some(timeout) => Ok(self.locks.acquire_timeout(scenario_id, timeout).await?),
            None => Ok(self.locks.acquire(scenario_id).await),
        }
    }

    /// Run `critical_section` with the scenario held.
    ///
    /// Whatever the section returns, errors included, is handed back
    /// unchanged after the lock is released.
    pub async fn critical_section<F, Fut, T>(
        &self,
        scenario_id: ScenarioId,
        critical_section: F,
    ) -> DecisionResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DecisionResult<T>>,
    {
        match self.wait_timeout {
            None => self.locks.with_lock(scenario_id, critical_section).await,
            Some(timeout) => {
                let guard = self.locks.acquire_timeout(scenario_id, timeout).await?;
                let output = critical_section().await;
                guard.release();
                output
            }
        }
    }
}
