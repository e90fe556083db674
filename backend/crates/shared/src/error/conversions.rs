//! Conversions into [`AppError`] and its HTTP rendering

use super::app_error::AppError;
use super::kind::ErrorKind;

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let kind = if err.kind() == std::io::ErrorKind::TimedOut {
            ErrorKind::RequestTimeout
        } else {
            ErrorKind::InternalServerError
        };
        AppError::new(kind, "I/O failure").with_source(err)
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::bad_request("Malformed identifier").with_source(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Syntax | Category::Data | Category::Eof => {
                AppError::bad_request(format!("Malformed JSON: {err}")).with_source(err)
            }
            Category::Io => AppError::internal("JSON encoding failed").with_source(err),
        }
    }
}

/// Postgres SQLSTATE to error kind.
///
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>.
#[cfg(feature = "sqlx")]
fn classify_sqlstate(code: &str) -> (ErrorKind, &'static str) {
    match code {
        "23505" => (ErrorKind::Conflict, "Duplicate key value"),
        "23503" => (ErrorKind::Conflict, "Referenced row missing"),
        "23502" | "23514" => (ErrorKind::UnprocessableEntity, "Constraint violation"),
        "42501" => (ErrorKind::Forbidden, "Insufficient privilege"),
        "57014" => (ErrorKind::RequestTimeout, "Query cancelled"),
        // Class 53: insufficient resources
        c if c.starts_with("53") => (ErrorKind::ServiceUnavailable, "Database resources exhausted"),
        _ => (ErrorKind::InternalServerError, "Database error"),
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let (kind, message) = match &err {
            sqlx::Error::RowNotFound => (ErrorKind::NotFound, "Record not found"),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                (ErrorKind::ServiceUnavailable, "No database connection available")
            }
            sqlx::Error::Io(_) => (ErrorKind::ServiceUnavailable, "Database unreachable"),
            sqlx::Error::Database(db_err) => db_err
                .code()
                .map_or((ErrorKind::InternalServerError, "Database error"), |code| {
                    classify_sqlstate(&code)
                }),
            _ => (ErrorKind::InternalServerError, "Database error"),
        };
        AppError::new(kind, message).with_source(err)
    }
}

/// Renders an RFC 7807 problem-details body, plus `Retry-After` when set.
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use http::{HeaderValue, StatusCode, header};

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
        });

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.retry_after_secs() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_timeout_maps_to_request_timeout() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow").into();
        assert_eq!(err.kind(), ErrorKind::RequestTimeout);

        let err: AppError = std::io::Error::other("broken").into();
        assert_eq!(err.kind(), ErrorKind::InternalServerError);
    }

    #[test]
    fn test_bad_uuid_is_client_error() {
        let err: AppError = uuid::Uuid::parse_str("scenario-1").unwrap_err().into();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_bad_json_is_client_error() {
        let err: AppError = serde_json::from_str::<Vec<u8>>("[1,").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(err.message().starts_with("Malformed JSON"));
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_sqlstate_classes() {
        assert_eq!(classify_sqlstate("23505").0, ErrorKind::Conflict);
        assert_eq!(classify_sqlstate("23514").0, ErrorKind::UnprocessableEntity);
        assert_eq!(classify_sqlstate("53300").0, ErrorKind::ServiceUnavailable);
        assert_eq!(classify_sqlstate("XX000").0, ErrorKind::InternalServerError);
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_pool_timeout_is_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.status_code(), 503);
    }

    #[cfg(feature = "axum")]
    #[test]
    fn test_problem_response_headers() {
        use axum::response::IntoResponse;
        use std::time::Duration;

        let response = AppError::too_many_requests("Rate limit exceeded")
            .with_retry_after(Duration::from_secs(30))
            .into_response();
        assert_eq!(response.status().as_u16(), 429);
        assert_eq!(response.headers()[http::header::RETRY_AFTER], "30");

        let response = AppError::not_found("gone").into_response();
        assert!(response.headers().get(http::header::RETRY_AFTER).is_none());
    }
}
