//! Decision Router

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};

use crate::application::config::DecisionConfig;
use crate::application::scenario_gate::ScenarioGate;
use crate::domain::repository::EdgeRepository;
use crate::presentation::handlers::{self, DecisionAppState};
use crate::presentation::middleware::{SessionThrottleState, session_throttle};

/// Create the decision router for any repository implementation
pub fn decision_router<R>(repo: R, gate: ScenarioGate, config: Arc<DecisionConfig>) -> Router
where
    R: EdgeRepository + Send + Sync + 'static,
{
    let state = DecisionAppState {
        repo: Arc::new(repo),
        gate,
        config,
    };

    Router::new()
        .route(
            "/scenarios/{scenario_id}/edges",
            post(handlers::create_edges::<R>)
                .put(handlers::update_edges::<R>)
                .delete(handlers::delete_edges::<R>),
        )
        .route(
            "/scenarios/{scenario_id}/edges/{id}",
            delete(handlers::delete_edge::<R>),
        )
        .route("/edges", get(handlers::list_edges::<R>))
        .route("/edges/{id}", get(handlers::get_edge::<R>))
        .with_state(state)
}

/// Put the session throttle in front of every route of `router`.
pub fn with_session_throttle(router: Router, state: SessionThrottleState) -> Router {
    router.layer(from_fn_with_state(state, session_throttle))
}
