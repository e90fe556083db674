//! Session Throttle Middleware
//!
//! The one gate every request passes before any route logic runs:
//! resolve (or mint) the session identity, then count the request against
//! that session's window.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::id::SessionId;
use platform::SessionThrottle;
use platform::cookie::{CookieConfig, extract_cookie, set_cookie_header};

use crate::error::DecisionError;

/// Echoes a freshly minted session id to clients that cannot read HttpOnly cookies
pub const NEW_SESSION_HEADER: HeaderName = HeaderName::from_static("x-new-session-id");

/// Middleware state
#[derive(Clone)]
pub struct SessionThrottleState {
    pub throttle: Arc<SessionThrottle>,
    pub cookie: Arc<CookieConfig>,
}

/// Session identity attached to admitted requests
#[derive(Debug, Clone, Copy)]
pub struct SessionContext {
    pub session_id: SessionId,
    /// Position of this request in the session's current window
    pub request_count: u32,
    /// The session was minted by this request
    pub is_new: bool,
}

pub async fn session_throttle(
    State(state): State<SessionThrottleState>,
    mut req: Request,
    next: Next,
) -> Response {
    let presented = extract_cookie(req.headers(), &state.cookie.name)
        .and_then(|raw| raw.parse::<SessionId>().ok());

    let (session_id, is_new) = match presented {
        Some(session_id) => (session_id, false),
        None => {
            let session_id = SessionId::new();
            tracing::debug!(session_id = %session_id, "Minted new session");
            (session_id, true)
        }
    };

    let decision = state.throttle.check(session_id);

    let mut response = if decision.is_allowed() {
        req.extensions_mut().insert(SessionContext {
            session_id,
            request_count: decision.count(),
            is_new,
        });
        next.run(req).await
    } else {
        DecisionError::RateLimitExceeded {
            retry_after: decision.retry_after(),
        }
        .into_response()
    };

    if is_new {
        attach_session(&mut response, &state.cookie, session_id);
    }

    response
}

fn attach_session(response: &mut Response, cookie: &CookieConfig, session_id: SessionId) {
    let value = session_id.to_string();
    let headers = response.headers_mut();

    if let Some(set_cookie) = set_cookie_header(cookie, &value) {
        headers.append(header::SET_COOKIE, set_cookie);
    }
    if let Ok(header_value) = HeaderValue::from_str(&value) {
        headers.insert(NEW_SESSION_HEADER, header_value);
    }
}
