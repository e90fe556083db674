//! Repository Traits
//!
//! Persistence interfaces. Implementations live in the infra layer.
//!
//! Callers that mutate a scenario's edges must hold that scenario's lock;
//! the repositories themselves do not serialize anything.

use kernel::id::{EdgeId, ScenarioId};

use crate::domain::entities::Edge;
use crate::error::DecisionResult;

#[trait_variant::make(EdgeRepository: Send)]
pub trait LocalEdgeRepository {
    /// Insert all edges, or none of them
    async fn create(&self, edges: &[Edge]) -> DecisionResult<()>;

    /// Fetch the edges among `ids` that exist
    async fn get(&self, ids: &[EdgeId]) -> DecisionResult<Vec<Edge>>;

    /// All edges, optionally restricted to one scenario, in insertion order
    async fn list(&self, scenario_id: Option<ScenarioId>) -> DecisionResult<Vec<Edge>>;

    /// Overwrite tail, head and name of existing edges, all or nothing.
    /// Fails with `EdgeNotFound` if any edge is missing.
    async fn update(&self, edges: &[Edge]) -> DecisionResult<()>;

    /// Delete the edges among `ids` that exist, returning how many were removed
    async fn delete(&self, ids: &[EdgeId]) -> DecisionResult<u64>;
}
