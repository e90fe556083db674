//! Application Configuration

use std::time::Duration;

use platform::ThrottleConfig;
use platform::config::{ConfigError, env_or, env_secs};
use platform::cookie::CookieConfig;

/// Decision API configuration
#[derive(Debug, Clone)]
pub struct DecisionConfig {
    /// Per-session request throttle
    pub throttle: ThrottleConfig,
    /// Upper bound on waiting for a scenario lock; `None` waits indefinitely
    pub lock_wait_timeout: Option<Duration>,
    /// Cookie carrying the session identity
    pub session_cookie: CookieConfig,
    /// Throttle windows older than this are dropped by the sweeper
    pub session_idle: Duration,
    /// How often the sweeper runs
    pub sweep_interval: Duration,
    /// Largest accepted batch in one create/update/delete call
    pub max_batch_size: usize,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            throttle: ThrottleConfig::default(),
            lock_wait_timeout: None,
            session_cookie: CookieConfig::session(),
            session_idle: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(300),
            max_batch_size: 1000,
        }
    }
}

impl DecisionConfig {
    /// Defaults with a non-Secure cookie so plain-HTTP local clients keep their session
    pub fn development() -> Self {
        let mut config = Self::default();
        config.session_cookie.secure = false;
        config
    }

    /// Read configuration from the environment, falling back to defaults.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `RATE_LIMIT_WINDOW` | throttle window, seconds |
    /// | `MAX_REQUESTS_PER_WINDOW` | requests per session per window |
    /// | `SCENARIO_LOCK_TIMEOUT_SECS` | optional lock wait bound |
    /// | `SESSION_COOKIE_SECURE` | `true`/`false` |
    /// | `SESSION_COOKIE_MAX_AGE_SECS` | optional cookie lifetime |
    /// | `SESSION_IDLE_SECS` | sweeper idle threshold |
    /// | `SWEEP_INTERVAL_SECS` | sweeper period |
    /// | `MAX_BATCH_SIZE` | batch limit |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let throttle = ThrottleConfig::new(
            env_secs("RATE_LIMIT_WINDOW")?.unwrap_or(defaults.throttle.window_length),
            env_or(
                "MAX_REQUESTS_PER_WINDOW",
                defaults.throttle.max_requests_per_window,
            )?,
        )?;

        let mut session_cookie = defaults.session_cookie;
        session_cookie.secure = env_or("SESSION_COOKIE_SECURE", session_cookie.secure)?;
        session_cookie.max_age = env_secs("SESSION_COOKIE_MAX_AGE_SECS")?;

        let sweep_interval = env_secs("SWEEP_INTERVAL_SECS")?.unwrap_or(defaults.sweep_interval);
        if sweep_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "SWEEP_INTERVAL_SECS",
                reason: "must be longer than zero".to_string(),
            });
        }

        let max_batch_size = env_or("MAX_BATCH_SIZE", defaults.max_batch_size)?;
        if max_batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_BATCH_SIZE",
                reason: "must be a positive integer".to_string(),
            });
        }

        Ok(Self {
            throttle,
            lock_wait_timeout: env_secs("SCENARIO_LOCK_TIMEOUT_SECS")?,
            session_cookie,
            session_idle: env_secs("SESSION_IDLE_SECS")?.unwrap_or(defaults.session_idle),
            sweep_interval,
            max_batch_size,
        })
    }
}
