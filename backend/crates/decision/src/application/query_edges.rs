//! Query Edges Use Case
//!
//! Reads take no scenario lock; they see whatever was last committed.

use std::sync::Arc;

use kernel::id::{EdgeId, ScenarioId};

use crate::domain::entities::Edge;
use crate::domain::repository::EdgeRepository;
use crate::error::{DecisionError, DecisionResult};

pub struct QueryEdgesUseCase<R>
where
    R: EdgeRepository,
{
    repo: Arc<R>,
}

impl<R> QueryEdgesUseCase<R>
where
    R: EdgeRepository + Sync,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: EdgeId) -> DecisionResult<Edge> {
        self.repo
            .get(&[id])
            .await?
            .into_iter()
            .next()
            .ok_or(DecisionError::EdgeNotFound(id))
    }

    pub async fn list(&self, scenario_id: Option<ScenarioId>) -> DecisionResult<Vec<Edge>> {
        self.repo.list(scenario_id).await
    }
}
