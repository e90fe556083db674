//! Decision Error Types
//!
//! Domain-specific failures of the decision API. They render through the
//! unified `kernel::error::AppError` problem-details body.

use std::time::Duration;

use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use kernel::id::{EdgeId, ScenarioId};
use platform::LockError;
use thiserror::Error;

pub type DecisionResult<T> = Result<T, DecisionError>;

/// Suggested back-off after a scenario lock wait times out
const LOCK_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("Edge already exists: {0}")]
    EdgeExists(EdgeId),

    #[error("Edge {edge_id} does not belong to scenario {scenario_id}")]
    ScenarioMismatch {
        edge_id: EdgeId,
        scenario_id: ScenarioId,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session throttle rejected the request
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Waited too long for the scenario lock
    #[error("Scenario {scenario_id} is busy")]
    LockTimeout { scenario_id: ScenarioId },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DecisionError {
    fn log(&self) {
        match self {
            DecisionError::Database(e) => {
                tracing::error!(error = %e, "Decision database error");
            }
            DecisionError::Internal(msg) => {
                tracing::error!(message = %msg, "Decision internal error");
            }
            DecisionError::LockTimeout { scenario_id } => {
                tracing::warn!(scenario_id = %scenario_id, "Scenario lock wait timed out");
            }
            DecisionError::RateLimitExceeded { .. } => {
                tracing::warn!("Request rejected by session throttle");
            }
            _ => {
                tracing::debug!(error = %self, "Decision request failed");
            }
        }
    }
}

impl From<LockError> for DecisionError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Timeout { scenario_id, .. } => DecisionError::LockTimeout { scenario_id },
        }
    }
}

impl From<DecisionError> for AppError {
    fn from(err: DecisionError) -> Self {
        match err {
            DecisionError::EdgeNotFound(_) => AppError::not_found(err.to_string()),
            DecisionError::EdgeExists(_) => AppError::conflict(err.to_string()),
            DecisionError::ScenarioMismatch { .. } => AppError::unprocessable(err.to_string()),
            DecisionError::InvalidInput(_) => AppError::bad_request(err.to_string()),
            DecisionError::RateLimitExceeded { retry_after } => {
                let app_err = AppError::too_many_requests("Rate limit exceeded")
                    .with_action("Wait for the current window to close");
                match retry_after {
                    Some(after) => app_err.with_retry_after(after),
                    None => app_err,
                }
            }
            DecisionError::LockTimeout { .. } => AppError::service_unavailable(err.to_string())
                .with_action("Retry shortly")
                .with_retry_after(LOCK_RETRY_AFTER),
            DecisionError::Database(e) => AppError::from(e),
            // Detail stays in the logs.
            DecisionError::Internal(_) => AppError::internal("Internal error"),
        }
    }
}

impl IntoResponse for DecisionError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
