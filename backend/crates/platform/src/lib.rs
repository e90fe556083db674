//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations for the API services:
//! - Session throttling (fixed-window request counting per client session)
//! - Scenario lock registry (one async mutex per scenario)
//! - Session cookie handling
//! - Environment configuration helpers

pub mod config;
pub mod cookie;
pub mod scenario_lock;
pub mod throttle;

pub use scenario_lock::{LockError, ScenarioLockGuard, ScenarioLockRegistry};
pub use throttle::{SessionThrottle, ThrottleConfig, ThrottleDecision};
