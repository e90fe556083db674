//! Domain Entities

use kernel::id::{EdgeId, IssueId, ScenarioId};

use crate::error::{DecisionError, DecisionResult};

pub const MAX_EDGE_NAME_LEN: usize = 256;

/// Directed edge between two issues of one scenario's graph
///
/// `head_id` is empty while the edge is dangling (its head issue has not
/// been attached yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub scenario_id: ScenarioId,
    pub tail_id: IssueId,
    pub head_id: Option<IssueId>,
    pub name: String,
}

impl Edge {
    pub fn new(
        scenario_id: ScenarioId,
        tail_id: IssueId,
        head_id: Option<IssueId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            scenario_id,
            tail_id,
            head_id,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> DecisionResult<()> {
        if self.head_id == Some(self.tail_id) {
            return Err(DecisionError::InvalidInput(format!(
                "edge {} connects issue {} to itself",
                self.id, self.tail_id
            )));
        }
        if self.name.chars().count() > MAX_EDGE_NAME_LEN {
            return Err(DecisionError::InvalidInput(format!(
                "edge name longer than {} characters",
                MAX_EDGE_NAME_LEN
            )));
        }
        Ok(())
    }

    pub fn belongs_to(&self, scenario_id: ScenarioId) -> bool {
        self.scenario_id == scenario_id
    }
}
