//! Decision Analysis Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities and repository traits
//! - `application/` - Use cases, scenario gate, idle-entry sweeper
//! - `infra/` - In-memory and PostgreSQL repositories
//! - `presentation/` - HTTP handlers, DTOs, session throttle, router
//!
//! ## Concurrency Model
//! - Every mutation of a scenario's graph runs while that scenario's lock is held
//! - Mutations of different scenarios never wait on each other
//! - Reads take no lock
//! - Every request is counted against its session before routing

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::DecisionConfig;
pub use application::scenario_gate::ScenarioGate;
pub use error::{DecisionError, DecisionResult};
pub use infra::memory::InMemoryEdgeRepository;
pub use infra::postgres::PgEdgeRepository;
pub use presentation::router::{decision_router, with_session_throttle};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
