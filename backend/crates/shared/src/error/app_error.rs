//! Application Error - the one error type that crosses the HTTP boundary

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::time::Duration;

use super::kind::ErrorKind;

type Text = Cow<'static, str>;
type BoxedSource = Box<dyn Error + Send + Sync + 'static>;

/// Unified application error
///
/// `message` and `action` are shown to clients. `source` is kept for logs.
/// `retry_after` becomes a `Retry-After` header on retryable kinds.
///
/// ```rust
/// use std::time::Duration;
/// use kernel::error::app_error::AppError;
///
/// let err = AppError::too_many_requests("Rate limit exceeded")
///     .with_action("Wait for the current window to close")
///     .with_retry_after(Duration::from_secs(12));
/// assert_eq!(err.status_code(), 429);
/// assert_eq!(err.retry_after_secs(), Some(12));
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Text,
    action: Option<Text>,
    retry_after: Option<Duration>,
    source: Option<BoxedSource>,
}

pub type AppResult<T> = Result<T, AppError>;

macro_rules! kind_constructors {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $name(message: impl Into<Text>) -> Self {
                Self::new(ErrorKind::$kind, message)
            }
        )*
    };
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<Text>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            retry_after: None,
            source: None,
        }
    }

    kind_constructors! {
        bad_request => BadRequest,
        not_found => NotFound,
        conflict => Conflict,
        unprocessable => UnprocessableEntity,
        too_many_requests => TooManyRequests,
        internal => InternalServerError,
        service_unavailable => ServiceUnavailable,
    }

    /// What the client should do about it.
    pub fn with_action(mut self, action: impl Into<Text>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Earliest point a retry is worth attempting.
    pub fn with_retry_after(mut self, after: Duration) -> Self {
        self.retry_after = Some(after);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Whole seconds to wait, rounded up and at least 1.
    ///
    /// `None` unless the kind is retryable and a delay was attached.
    pub fn retry_after_secs(&self) -> Option<u64> {
        if !self.kind.is_retryable() {
            return None;
        }
        let after = self.retry_after?;
        let secs = after.as_secs() + u64::from(after.subsec_nanos() > 0);
        Some(secs.max(1))
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("action", &self.action)
            .field("retry_after", &self.retry_after)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status_code(), self.kind, self.message)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_pick_kind() {
        assert_eq!(AppError::bad_request("x").kind(), ErrorKind::BadRequest);
        assert_eq!(AppError::not_found("x").status_code(), 404);
        assert_eq!(AppError::conflict("x").status_code(), 409);
        assert_eq!(AppError::unprocessable("x").status_code(), 422);
        assert_eq!(AppError::too_many_requests("x").status_code(), 429);
        assert_eq!(AppError::internal("x").status_code(), 500);
        assert_eq!(AppError::service_unavailable("x").status_code(), 503);
    }

    #[test]
    fn test_display_and_source() {
        let err = AppError::internal("Store failed")
            .with_source(std::io::Error::other("disk"))
            .with_action("Try again later");
        assert_eq!(err.to_string(), "500 Internal Server Error: Store failed");
        assert_eq!(err.action(), Some("Try again later"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let err = AppError::too_many_requests("slow down")
            .with_retry_after(Duration::from_millis(2_100));
        assert_eq!(err.retry_after_secs(), Some(3));

        let err = AppError::service_unavailable("busy").with_retry_after(Duration::ZERO);
        assert_eq!(err.retry_after_secs(), Some(1));

        let err = AppError::too_many_requests("slow down");
        assert_eq!(err.retry_after_secs(), None);
    }

    #[test]
    fn test_retry_after_ignored_for_final_errors() {
        let err = AppError::not_found("gone").with_retry_after(Duration::from_secs(5));
        assert_eq!(err.retry_after_secs(), None);
    }
}
