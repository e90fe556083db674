//! Session Throttle
//!
//! Fixed-window request counting per client session. Every inbound request
//! is recorded against its session; once a session exceeds
//! `max_requests_per_window` within one window it is rejected until the
//! window rolls over.
//!
//! Ordering is "count first, then compare": the request that crosses the
//! threshold is counted and then rejected. Rejected requests therefore keep
//! extending the tally for the current window.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use kernel::id::SessionId;

use crate::config::ConfigError;

/// Throttle configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Length of one counting window
    pub window_length: Duration,
    /// Requests admitted per session per window
    pub max_requests_per_window: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            window_length: Duration::from_secs(60),
            max_requests_per_window: 10,
        }
    }
}

impl ThrottleConfig {
    pub fn new(window_length: Duration, max_requests_per_window: u32) -> Result<Self, ConfigError> {
        if max_requests_per_window == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_REQUESTS_PER_WINDOW",
                reason: "must be a positive integer".to_string(),
            });
        }
        if window_length.is_zero() {
            return Err(ConfigError::Invalid {
                key: "RATE_LIMIT_WINDOW",
                reason: "must be longer than zero".to_string(),
            });
        }
        Ok(Self {
            window_length,
            max_requests_per_window,
        })
    }
}

/// Outcome of [`SessionThrottle::check_and_record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Admitted; `count` is this request's position in the window
    Allowed { count: u32 },
    /// Over the limit; `count` includes this request, `retry_after` is
    /// what was left of the window when it was counted
    Rejected { count: u32, retry_after: Duration },
}

impl ThrottleDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ThrottleDecision::Allowed { .. })
    }

    /// Time until the rejecting window closes; `None` when allowed
    pub fn retry_after(&self) -> Option<Duration> {
        match *self {
            ThrottleDecision::Allowed { .. } => None,
            ThrottleDecision::Rejected { retry_after, .. } => Some(retry_after),
        }
    }

    pub fn count(&self) -> u32 {
        match *self {
            ThrottleDecision::Allowed { count } | ThrottleDecision::Rejected { count, .. } => count,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Process-wide per-session request counter
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct SessionThrottle {
    windows: DashMap<SessionId, WindowState>,
    config: ThrottleConfig,
}

impl SessionThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Record one request for `session_id` observed at `now` and classify it.
    ///
    /// Never suspends. The read-modify-write happens under the map's shard
    /// lock, so concurrent requests from one session are all counted.
    pub fn check_and_record(&self, session_id: SessionId, now: Instant) -> ThrottleDecision {
        let window_length = self.config.window_length;
        let mut state = self.windows.entry(session_id).or_insert(WindowState {
            count: 0,
            window_start: now,
        });

        if now.saturating_duration_since(state.window_start) > window_length {
            state.count = 0;
            state.window_start = now;
        }

        state.count = state.count.saturating_add(1);
        let count = state.count;
        let remaining =
            window_length.saturating_sub(now.saturating_duration_since(state.window_start));
        drop(state);

        if count > self.config.max_requests_per_window {
            tracing::warn!(
                session_id = %session_id,
                count,
                max = self.config.max_requests_per_window,
                "Session throttled"
            );
            ThrottleDecision::Rejected {
                count,
                retry_after: remaining,
            }
        } else {
            ThrottleDecision::Allowed { count }
        }
    }

    /// [`check_and_record`](Self::check_and_record) against the current monotonic time
    pub fn check(&self, session_id: SessionId) -> ThrottleDecision {
        self.check_and_record(session_id, Instant::now())
    }

    /// Drop sessions whose window started more than `max_idle` before `now`.
    ///
    /// A pruned session that comes back simply starts a fresh window, which
    /// is what it would have got anyway once its window expired, as long as
    /// `max_idle >= window_length`.
    pub fn prune_idle(&self, now: Instant, max_idle: Duration) -> usize {
        let max_idle = max_idle.max(self.config.window_length);
        let before = self.windows.len();
        self.windows
            .retain(|_, state| now.saturating_duration_since(state.window_start) <= max_idle);
        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            tracing::debug!(removed, "Pruned idle throttle windows");
        }
        removed
    }

    /// Number of sessions currently tracked
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn throttle(max: u32, window_secs: u64) -> SessionThrottle {
        SessionThrottle::new(ThrottleConfig::new(Duration::from_secs(window_secs), max).unwrap())
    }

    #[test]
    fn test_fourth_request_in_window_rejected() {
        let throttle = throttle(3, 60);
        let session = SessionId::new();
        let t0 = Instant::now();

        let decisions: Vec<_> = (0..4)
            .map(|i| throttle.check_and_record(session, t0 + Duration::from_secs(i * 10)))
            .collect();

        assert_eq!(
            decisions,
            vec![
                ThrottleDecision::Allowed { count: 1 },
                ThrottleDecision::Allowed { count: 2 },
                ThrottleDecision::Allowed { count: 3 },
                ThrottleDecision::Rejected {
                    count: 4,
                    retry_after: Duration::from_secs(30),
                },
            ]
        );
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let throttle = throttle(3, 60);
        let session = SessionId::new();
        let t0 = Instant::now();

        assert_eq!(
            throttle.check_and_record(session, t0),
            ThrottleDecision::Allowed { count: 1 }
        );
        assert_eq!(
            throttle.check_and_record(session, t0 + Duration::from_secs(61)),
            ThrottleDecision::Allowed { count: 1 }
        );
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        // Exactly one window length later still belongs to the old window.
        let throttle = throttle(1, 60);
        let session = SessionId::new();
        let t0 = Instant::now();

        assert!(throttle.check_and_record(session, t0).is_allowed());
        assert_eq!(
            throttle.check_and_record(session, t0 + Duration::from_secs(60)),
            ThrottleDecision::Rejected {
                count: 2,
                retry_after: Duration::ZERO,
            }
        );
    }

    #[test]
    fn test_rejection_reports_time_left_in_its_window() {
        let throttle = throttle(1, 60);
        let session = SessionId::new();
        let t0 = Instant::now();

        let first = throttle.check_and_record(session, t0);
        assert_eq!(first.retry_after(), None);
        assert_eq!(
            throttle
                .check_and_record(session, t0 + Duration::from_secs(45))
                .retry_after(),
            Some(Duration::from_secs(15))
        );

        // A later request that opens a new window cannot change what an
        // earlier rejection reported.
        let rejected = throttle.check_and_record(session, t0 + Duration::from_secs(50));
        throttle.check_and_record(session, t0 + Duration::from_secs(61));
        assert_eq!(rejected.retry_after(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_rejected_requests_still_count() {
        let throttle = throttle(1, 60);
        let session = SessionId::new();
        let t0 = Instant::now();

        for _ in 0..5 {
            throttle.check_and_record(session, t0);
        }
        assert_eq!(throttle.check_and_record(session, t0).count(), 6);
    }

    #[test]
    fn test_sessions_are_independent() {
        let throttle = throttle(1, 60);
        let t0 = Instant::now();
        let a = SessionId::new();
        let b = SessionId::new();

        assert!(throttle.check_and_record(a, t0).is_allowed());
        assert!(!throttle.check_and_record(a, t0).is_allowed());
        assert!(throttle.check_and_record(b, t0).is_allowed());
        assert_eq!(throttle.len(), 2);
    }

    #[test]
    fn test_fresh_session_always_allowed() {
        let throttle = throttle(1, 60);
        for _ in 0..100 {
            assert_eq!(
                throttle.check(SessionId::new()),
                ThrottleDecision::Allowed { count: 1 }
            );
        }
    }

    #[test]
    fn test_concurrent_requests_all_counted() {
        let throttle = Arc::new(throttle(1_000, 60));
        let session = SessionId::new();
        let t0 = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let throttle = throttle.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        throttle.check_and_record(session, t0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(throttle.check_and_record(session, t0).count(), 801);
    }

    #[test]
    fn test_prune_idle_removes_stale_windows() {
        let throttle = throttle(5, 60);
        let t0 = Instant::now();
        let stale = SessionId::new();
        let fresh = SessionId::new();

        throttle.check_and_record(stale, t0);
        throttle.check_and_record(fresh, t0 + Duration::from_secs(500));

        let removed = throttle.prune_idle(t0 + Duration::from_secs(600), Duration::from_secs(300));
        assert_eq!(removed, 1);
        assert_eq!(throttle.len(), 1);

        // A pruned session is treated as new.
        assert_eq!(
            throttle.check_and_record(stale, t0 + Duration::from_secs(601)),
            ThrottleDecision::Allowed { count: 1 }
        );
    }

    #[test]
    fn test_config_rejects_zero_limit() {
        assert!(ThrottleConfig::new(Duration::from_secs(60), 0).is_err());
        assert!(ThrottleConfig::new(Duration::ZERO, 3).is_err());
        assert_eq!(
            ThrottleConfig::new(Duration::from_secs(60), 3).unwrap(),
            ThrottleConfig {
                window_length: Duration::from_secs(60),
                max_requests_per_window: 3,
            }
        );
    }
}
