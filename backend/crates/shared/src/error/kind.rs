//! Error Kind - what went wrong, in HTTP terms

use serde::Serialize;

macro_rules! error_kinds {
    ($($(#[$doc:meta])* $variant:ident => $status:literal $phrase:literal,)*) => {
        /// Error classification
        ///
        /// Each kind renders as exactly one HTTP status.
        ///
        /// ```rust
        /// use kernel::error::kind::ErrorKind;
        ///
        /// assert_eq!(ErrorKind::TooManyRequests.status_code(), 429);
        /// assert_eq!(ErrorKind::TooManyRequests.as_str(), "Too Many Requests");
        /// assert!(ErrorKind::TooManyRequests.is_retryable());
        /// ```
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[non_exhaustive]
        pub enum ErrorKind {
            $($(#[$doc])* $variant,)*
        }

        impl ErrorKind {
            pub const fn status_code(&self) -> u16 {
                match self {
                    $(ErrorKind::$variant => $status,)*
                }
            }

            /// Reason phrase, also used as the problem `title`
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(ErrorKind::$variant => $phrase,)*
                }
            }
        }
    };
}

error_kinds! {
    BadRequest => 400 "Bad Request",
    Unauthorized => 401 "Unauthorized",
    Forbidden => 403 "Forbidden",
    NotFound => 404 "Not Found",
    /// A query or I/O deadline passed
    RequestTimeout => 408 "Request Timeout",
    Conflict => 409 "Conflict",
    /// Well-formed, but refers to state it may not touch
    UnprocessableEntity => 422 "Unprocessable Entity",
    /// The caller's session has used up its window
    TooManyRequests => 429 "Too Many Requests",
    InternalServerError => 500 "Internal Server Error",
    /// Shared resource busy or exhausted; the same request may succeed later
    ServiceUnavailable => 503 "Service Unavailable",
}

impl ErrorKind {
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Repeating the identical request later can succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::RequestTimeout | ErrorKind::TooManyRequests | ErrorKind::ServiceUnavailable
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
