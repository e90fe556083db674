//! Scenario Lock Registry
//!
//! One async mutex per scenario, created lazily on first use and shared by
//! every request that mutates that scenario's graph. Different scenarios
//! never contend with each other.
//!
//! The registry map itself is a sharded concurrent map. Create-or-fetch goes
//! through its entry API, so concurrent first-time callers for the same
//! scenario all end up on the same mutex.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use kernel::id::ScenarioId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Errors from bounded lock acquisition
#[derive(Debug, Clone, thiserror::Error)]
pub enum LockError {
    #[error("Timed out after {waited:?} waiting for scenario {scenario_id}")]
    Timeout {
        scenario_id: ScenarioId,
        waited: Duration,
    },
}

/// Exclusive access to one scenario
///
/// The lock is released when the guard is dropped, whichever way the
/// holder exits: normal return, `?`, panic, or cancellation of the future
/// that owns it.
#[must_use = "the scenario is unlocked as soon as the guard is dropped"]
pub struct ScenarioLockGuard {
    scenario_id: ScenarioId,
    acquired_at: Instant,
    _guard: OwnedMutexGuard<()>,
}

impl ScenarioLockGuard {
    pub fn scenario_id(&self) -> ScenarioId {
        self.scenario_id
    }

    /// Release explicitly. Equivalent to dropping the guard.
    pub fn release(self) {}
}

impl Drop for ScenarioLockGuard {
    fn drop(&mut self) {
        tracing::trace!(
            scenario_id = %self.scenario_id,
            held_ms = saturating_millis(self.acquired_at.elapsed()),
            "Scenario lock released"
        );
    }
}

impl std::fmt::Debug for ScenarioLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioLockGuard")
            .field("scenario_id", &self.scenario_id)
            .finish_non_exhaustive()
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Process-wide map of scenario locks
#[derive(Debug, Default)]
pub struct ScenarioLockRegistry {
    locks: DashMap<ScenarioId, Arc<Mutex<()>>>,
}

impl ScenarioLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the scenario's mutex, creating it if this is the first use.
    pub fn entry(&self, scenario_id: ScenarioId) -> Arc<Mutex<()>> {
        self.locks
            .entry(scenario_id)
            .or_insert_with(|| {
                tracing::debug!(scenario_id = %scenario_id, "Scenario lock created");
                Arc::new(Mutex::new(()))
            })
            .clone()
    }

    /// Wait for exclusive access to `scenario_id`.
    ///
    /// Blocks only while another holder has the same scenario. There is no
    /// timeout here; wrap the call or use [`acquire_timeout`](Self::acquire_timeout).
    /// Dropping the returned future before it resolves leaves the wait
    /// queue without taking the lock.
    pub async fn acquire(&self, scenario_id: ScenarioId) -> ScenarioLockGuard {
        let lock = self.entry(scenario_id);
        let guard = lock.lock_owned().await;
        tracing::trace!(scenario_id = %scenario_id, "Scenario lock acquired");
        ScenarioLockGuard {
            scenario_id,
            acquired_at: Instant::now(),
            _guard: guard,
        }
    }

    /// [`acquire`](Self::acquire) with an upper bound on the wait
    pub async fn acquire_timeout(
        &self,
        scenario_id: ScenarioId,
        timeout: Duration,
    ) -> Result<ScenarioLockGuard, LockError> {
        tokio::time::timeout(timeout, self.acquire(scenario_id))
            .await
            .map_err(|_| {
                tracing::warn!(
                    scenario_id = %scenario_id,
                    timeout_ms = saturating_millis(timeout),
                    "Gave up waiting for scenario lock"
                );
                LockError::Timeout {
                    scenario_id,
                    waited: timeout,
                }
            })
    }

    /// Run `critical_section` while holding the scenario's lock.
    ///
    /// Its output, including any error it returns, is passed through
    /// unchanged. The lock is released before this returns or unwinds.
    pub async fn with_lock<F, Fut, T>(&self, scenario_id: ScenarioId, critical_section: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = self.acquire(scenario_id).await;
        let output = critical_section().await;
        guard.release();
        output
    }

    /// Remove entries that no task holds, waits on, or has fetched.
    ///
    /// Runs under the map's shard locks, so no caller can fetch an entry
    /// while it is being judged idle.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before.saturating_sub(self.locks.len());
        if removed > 0 {
            tracing::debug!(removed, "Pruned idle scenario locks");
        }
        removed
    }

    pub fn contains(&self, scenario_id: &ScenarioId) -> bool {
        self.locks.contains_key(scenario_id)
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_holders_of_same_scenario_never_overlap() {
        let registry = Arc::new(ScenarioLockRegistry::new());
        let scenario = ScenarioId::new();
        let intervals = Arc::new(std::sync::Mutex::new(Vec::new()));
        let active = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let intervals = intervals.clone();
                let active = active.clone();
                tokio::spawn(async move {
                    let guard = registry.acquire(scenario).await;
                    let start = Instant::now();
                    assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    let end = Instant::now();
                    intervals.lock().unwrap().push((start, end));
                    drop(guard);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut intervals = intervals.lock().unwrap().clone();
        intervals.sort();
        assert_eq!(intervals.len(), 16);
        for pair in intervals.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "critical sections overlapped");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_distinct_scenarios_proceed_in_parallel() {
        let registry = Arc::new(ScenarioLockRegistry::new());
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        // Each critical section waits for the other one to be inside its own.
        // If the scenarios were serialized this would never finish.
        let run = |scenario: ScenarioId| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                registry
                    .with_lock(scenario, || async { barrier.wait().await })
                    .await;
            })
        };
        let a = run(ScenarioId::new());
        let b = run(ScenarioId::new());

        tokio::time::timeout(Duration::from_secs(5), async {
            a.await.unwrap();
            b.await.unwrap();
        })
        .await
        .expect("distinct scenarios blocked each other");
    }

    #[tokio::test]
    async fn test_acquire_suspends_while_held() {
        let registry = ScenarioLockRegistry::new();
        let scenario = ScenarioId::new();
        let held = registry.acquire(scenario).await;

        let mut waiter = tokio_test::task::spawn(registry.acquire(scenario));
        tokio_test::assert_pending!(waiter.poll());

        drop(held);
        assert!(waiter.is_woken());
        let guard = tokio_test::assert_ready!(waiter.poll());
        assert_eq!(guard.scenario_id(), scenario);
    }

    #[tokio::test]
    async fn test_holding_one_scenario_does_not_block_another() {
        let registry = ScenarioLockRegistry::new();
        let _held = registry.acquire(ScenarioId::new()).await;

        let other = registry
            .acquire_timeout(ScenarioId::new(), Duration::from_millis(100))
            .await;
        assert!(other.is_ok());
    }

    #[test]
    fn test_concurrent_first_use_converges_on_one_entry() {
        let registry = Arc::new(ScenarioLockRegistry::new());
        let scenario = ScenarioId::new();
        let start = Arc::new(std::sync::Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let start = start.clone();
                std::thread::spawn(move || {
                    start.wait();
                    registry.entry(scenario)
                })
            })
            .collect();
        let entries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        assert!(entries.iter().all(|e| Arc::ptr_eq(e, &entries[0])));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_acquire_creates_single_entry() {
        let registry = Arc::new(ScenarioLockRegistry::new());
        let scenario = ScenarioId::new();

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let _guard = registry.acquire(scenario).await;
                    tokio::task::yield_now().await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&scenario));
    }

    #[tokio::test]
    async fn test_failed_critical_section_releases_lock() {
        let registry = ScenarioLockRegistry::new();
        let scenario = ScenarioId::new();

        let result: Result<(), &str> = registry
            .with_lock(scenario, || async { Err("mutation failed") })
            .await;
        assert_eq!(result, Err("mutation failed"));

        let again = registry
            .acquire_timeout(scenario, Duration::from_millis(100))
            .await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_panicking_holder_releases_lock() {
        let registry = Arc::new(ScenarioLockRegistry::new());
        let scenario = ScenarioId::new();

        let task = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let _guard = registry.acquire(scenario).await;
                panic!("critical section blew up");
            })
        };
        assert!(task.await.unwrap_err().is_panic());

        let again = registry
            .acquire_timeout(scenario, Duration::from_millis(100))
            .await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_timed_out_waiter_does_not_acquire_or_leak() {
        let registry = ScenarioLockRegistry::new();
        let scenario = ScenarioId::new();
        let held = registry.acquire(scenario).await;

        let err = registry
            .acquire_timeout(scenario, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::Timeout { scenario_id, .. } if scenario_id == scenario));
        assert_eq!(registry.len(), 1);

        held.release();
        assert!(
            registry
                .acquire_timeout(scenario, Duration::from_millis(100))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_aborted_waiter_leaves_wait_set() {
        let registry = Arc::new(ScenarioLockRegistry::new());
        let scenario = ScenarioId::new();
        let held = registry.acquire(scenario).await;

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let _guard = registry.acquire(scenario).await;
                std::future::pending::<()>().await;
            })
        };
        tokio::task::yield_now().await;
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());

        drop(held);
        assert!(
            registry
                .acquire_timeout(scenario, Duration::from_millis(100))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_prune_idle_keeps_held_entries() {
        let registry = ScenarioLockRegistry::new();
        let busy = ScenarioId::new();
        let idle = ScenarioId::new();

        let guard = registry.acquire(busy).await;
        registry.acquire(idle).await.release();
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.prune_idle(), 1);
        assert!(registry.contains(&busy));
        assert!(!registry.contains(&idle));

        drop(guard);
        assert_eq!(registry.prune_idle(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_millis_saturate_instead_of_wrapping() {
        assert_eq!(saturating_millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }
}
