//! Delete Edges Use Case

use std::sync::Arc;

use kernel::id::{EdgeId, ScenarioId};

use crate::application::config::DecisionConfig;
use crate::application::scenario_gate::ScenarioGate;
use crate::application::{ensure_batch_size, ensure_unique};
use crate::domain::repository::EdgeRepository;
use crate::error::{DecisionError, DecisionResult};

pub struct DeleteEdgesUseCase<R>
where
    R: EdgeRepository,
{
    repo: Arc<R>,
    gate: ScenarioGate,
    config: Arc<DecisionConfig>,
}

impl<R> DeleteEdgesUseCase<R>
where
    R: EdgeRepository + Sync,
{
    pub fn new(repo: Arc<R>, gate: ScenarioGate, config: Arc<DecisionConfig>) -> Self {
        Self { repo, gate, config }
    }

    /// Delete whichever of `ids` exist. Ids that are already gone are
    /// skipped; ids owned by another scenario or listed twice fail the
    /// whole call.
    pub async fn execute(&self, scenario_id: ScenarioId, ids: Vec<EdgeId>) -> DecisionResult<u64> {
        ensure_batch_size(ids.len(), self.config.max_batch_size)?;
        ensure_unique(ids.iter().copied())?;
        if ids.is_empty() {
            return Ok(0);
        }

        let (repo, ids_ref) = (&self.repo, &ids);
        let deleted = self
            .gate
            .critical_section(scenario_id, move || async move {
                let current = repo.get(ids_ref).await?;
                if let Some(foreign) = current.iter().find(|e| !e.belongs_to(scenario_id)) {
                    return Err(DecisionError::ScenarioMismatch {
                        edge_id: foreign.id,
                        scenario_id,
                    });
                }
                repo.delete(ids_ref).await
            })
            .await?;

        tracing::info!(
            scenario_id = %scenario_id,
            requested = ids.len(),
            deleted,
            "Edges deleted"
        );

        Ok(deleted)
    }

    /// Delete a single edge; missing is an error here.
    pub async fn delete_one(&self, scenario_id: ScenarioId, id: EdgeId) -> DecisionResult<()> {
        match self.execute(scenario_id, vec![id]).await? {
            0 => Err(DecisionError::EdgeNotFound(id)),
            _ => Ok(()),
        }
    }
}
