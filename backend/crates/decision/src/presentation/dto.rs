//! API DTOs (Data Transfer Objects)

use kernel::id::{EdgeId, IssueId, ScenarioId};
use serde::{Deserialize, Serialize};

use crate::application::EdgeInput;
use crate::domain::entities::Edge;
use crate::error::{DecisionError, DecisionResult};

/// Body element for POST/PUT /api/scenarios/{scenario_id}/edges
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRequest {
    #[serde(default)]
    pub id: Option<EdgeId>,
    pub tail_id: IssueId,
    #[serde(default)]
    pub head_id: Option<IssueId>,
    #[serde(default)]
    pub name: String,
}

impl From<EdgeRequest> for EdgeInput {
    fn from(req: EdgeRequest) -> Self {
        Self {
            id: req.id,
            tail_id: req.tail_id,
            head_id: req.head_id,
            name: req.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResponse {
    pub id: EdgeId,
    pub scenario_id: ScenarioId,
    pub tail_id: IssueId,
    pub head_id: Option<IssueId>,
    pub name: String,
}

impl From<Edge> for EdgeResponse {
    fn from(edge: Edge) -> Self {
        Self {
            id: edge.id,
            scenario_id: edge.scenario_id,
            tail_id: edge.tail_id,
            head_id: edge.head_id,
            name: edge.name,
        }
    }
}

/// Query for GET /api/edges
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEdgesQuery {
    #[serde(default)]
    pub scenario_id: Option<ScenarioId>,
}

/// Query for DELETE /api/scenarios/{scenario_id}/edges?ids=a,b,c
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteEdgesQuery {
    #[serde(default)]
    pub ids: String,
}

impl DeleteEdgesQuery {
    pub fn parse_ids(&self) -> DecisionResult<Vec<EdgeId>> {
        self.ids
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<EdgeId>()
                    .map_err(|_| DecisionError::InvalidInput(format!("invalid edge id: {raw}")))
            })
            .collect()
    }
}
