//! Update Edges Use Case

use std::sync::Arc;

use kernel::id::{EdgeId, ScenarioId};

use crate::application::config::DecisionConfig;
use crate::application::scenario_gate::ScenarioGate;
use crate::application::{EdgeInput, ensure_batch_size, ensure_unique};
use crate::domain::entities::Edge;
use crate::domain::repository::EdgeRepository;
use crate::error::{DecisionError, DecisionResult};

pub struct UpdateEdgesUseCase<R>
where
    R: EdgeRepository,
{
    repo: Arc<R>,
    gate: ScenarioGate,
    config: Arc<DecisionConfig>,
}

impl<R> UpdateEdgesUseCase<R>
where
    R: EdgeRepository + Sync,
{
    pub fn new(repo: Arc<R>, gate: ScenarioGate, config: Arc<DecisionConfig>) -> Self {
        Self { repo, gate, config }
    }

    /// Overwrite existing edges of `scenario_id`.
    ///
    /// The current rows are read, checked and rewritten while the scenario
    /// is held, so a concurrent delete cannot slip in between.
    pub async fn execute(
        &self,
        scenario_id: ScenarioId,
        inputs: Vec<EdgeInput>,
    ) -> DecisionResult<Vec<Edge>> {
        ensure_batch_size(inputs.len(), self.config.max_batch_size)?;

        let edges = inputs
            .into_iter()
            .map(|input| {
                let id = input.id.ok_or_else(|| {
                    DecisionError::InvalidInput("edge id is required for update".to_string())
                })?;
                Ok(Edge {
                    id,
                    scenario_id,
                    tail_id: input.tail_id,
                    head_id: input.head_id,
                    name: input.name,
                })
            })
            .collect::<DecisionResult<Vec<Edge>>>()?;
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
                let current = repo.get(ids_ref).await?;
                for id in ids_ref {
                    let edge = current
                        .iter()
                        .find(|e| e.id == *id)
                        .ok_or(DecisionError::EdgeNotFound(*id))?;
                    if !edge.belongs_to(scenario_id) {
                        return Err(DecisionError::ScenarioMismatch {
                            edge_id: *id,
                            scenario_id,
                        });
                    }
                }
                repo.update(edges_ref).await
            })
            .await?;

        tracing::info!(
            scenario_id = %scenario_id,
            count = edges.len(),
            "Edges updated"
        );

        Ok(edges)
    }
}
