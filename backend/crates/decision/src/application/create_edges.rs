//! Create Edges Use Case

use std::sync::Arc;

use kernel::id::{EdgeId, ScenarioId};

use crate::application::config::DecisionConfig;
use crate::application::scenario_gate::ScenarioGate;
use crate::application::{EdgeInput, ensure_batch_size, ensure_unique};
use crate::domain::entities::Edge;
use crate::domain::repository::EdgeRepository;
use crate::error::{DecisionError, DecisionResult};

pub struct CreateEdgesUseCase<R>
where
    R: EdgeRepository,
{
    repo: Arc<R>,
    gate: ScenarioGate,
    config: Arc<DecisionConfig>,
}

impl<R> CreateEdgesUseCase<R>
where
    R: EdgeRepository + Sync,
{
    pub fn new(repo: Arc<R>, gate: ScenarioGate, config: Arc<DecisionConfig>) -> Self {
        Self { repo, gate, config }
    }

    pub async fn execute(
        &self,
        scenario_id: ScenarioId,
        inputs: Vec<EdgeInput>,
    ) -> DecisionResult<Vec<Edge>> {
        ensure_batch_size(inputs.len(), self.config.max_batch_size)?;

        let edges: Vec<Edge> = inputs
            .into_iter()
            .map(|input| Edge {
                id: input.id.unwrap_or_default(),
                scenario_id,
                tail_id: input.tail_id,
                head_id: input.head_id,
                name: input.name,
            })
            .collect();
        for edge in &edges {
            edge.validate()?;
        }
        ensure_unique(edges.iter().map(|e| e.id))?;

        if edges.is_empty() {
            return Ok(edges);
        }

        let ids: Vec<EdgeId> = edges.iter().map(|e| e.id).collect();
        let (repo, ids_ref, edges_ref) = (&self.repo, &ids, &edges);

        self.gate
            .critical_section(scenario_id, move || async move {
                if let Some(existing) = repo.get(ids_ref).await?.first() {
                    return Err(DecisionError::EdgeExists(existing.id));
                }
                repo.create(edges_ref).await
            })
            .await?;

        tracing::info!(
            scenario_id = %scenario_id,
            count = edges.len(),
            "Edges created"
        );

        Ok(edges)
    }
}
