//! Environment Configuration Helpers
//!
//! Typed readers for the environment variables the services are configured
//! with. A variable that is unset falls back to its default; one that is set
//! but unparsable is an error rather than being silently ignored.

use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Parse `key` as `T`, or `None` when unset or blank.
pub fn env_opt<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::Invalid {
                    key,
                    reason: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}

/// Parse `key` as `T`, or `default` when unset.
pub fn env_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(env_opt(key)?.unwrap_or(default))
}

/// Whole seconds in `key` as a [`Duration`]
pub fn env_secs(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    Ok(env_opt::<u64>(key)?.map(Duration::from_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names; the process environment is shared.

    #[test]
    fn test_unset_falls_back_to_default() {
        assert_eq!(env_or("PLATFORM_TEST_UNSET_VAR", 42u32), Ok(42));
        assert_eq!(env_secs("PLATFORM_TEST_UNSET_SECS"), Ok(None));
    }

    #[test]
    fn test_parse_and_reject() {
        // SAFETY: the variables are unique to this test.
        unsafe {
            env::set_var("PLATFORM_TEST_GOOD", " 7 ");
            env::set_var("PLATFORM_TEST_BAD", "seven");
        }
        assert_eq!(env_or("PLATFORM_TEST_GOOD", 0u32), Ok(7));
        assert_eq!(env_secs("PLATFORM_TEST_GOOD"), Ok(Some(Duration::from_secs(7))));
        assert!(matches!(
            env_opt::<u32>("PLATFORM_TEST_BAD"),
            Err(ConfigError::Invalid { key: "PLATFORM_TEST_BAD", .. })
        ));
    }
}
