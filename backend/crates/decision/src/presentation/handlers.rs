//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::id::{EdgeId, ScenarioId};

use crate::application::config::DecisionConfig;
use crate::application::create_edges::CreateEdgesUseCase;
use crate::application::delete_edges::DeleteEdgesUseCase;
use crate::application::query_edges::QueryEdgesUseCase;
use crate::application::scenario_gate::ScenarioGate;
use crate::application::update_edges::UpdateEdgesUseCase;
use crate::domain::repository::EdgeRepository;
use crate::error::DecisionResult;
use crate::presentation::dto::{DeleteEdgesQuery, EdgeRequest, EdgeResponse, ListEdgesQuery};

/// Shared state for decision handlers
pub struct DecisionAppState<R>
where
    R: EdgeRepository + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub gate: ScenarioGate,
    pub config: Arc<DecisionConfig>,
}

// Manual impl: the repository itself need not be Clone.
impl<R> Clone for DecisionAppState<R>
where
    R: EdgeRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            gate: self.gate.clone(),
            config: self.config.clone(),
        }
    }
}

fn to_responses(edges: Vec<crate::domain::entities::Edge>) -> Vec<EdgeResponse> {
    edges.into_iter().map(EdgeResponse::from).collect()
}

/// POST /api/scenarios/{scenario_id}/edges
pub async fn create_edges<R>(
    State(state): State<DecisionAppState<R>>,
    Path(scenario_id): Path<ScenarioId>,
    Json(body): Json<Vec<EdgeRequest>>,
) -> DecisionResult<impl IntoResponse>
where
    R: EdgeRepository + Send + Sync + 'static,
{
    let use_case = CreateEdgesUseCase::new(state.repo, state.gate, state.config);
    let edges = use_case
        .execute(scenario_id, body.into_iter().map(Into::into).collect())
        .await?;

    Ok((StatusCode::CREATED, Json(to_responses(edges))))
}

/// PUT /api/scenarios/{scenario_id}/edges
pub async fn update_edges<R>(
    State(state): State<DecisionAppState<R>>,
    Path(scenario_id): Path<ScenarioId>,
    Json(body): Json<Vec<EdgeRequest>>,
) -> DecisionResult<Json<Vec<EdgeResponse>>>
where
    R: EdgeRepository + Send + Sync + 'static,
{
    let use_case = UpdateEdgesUseCase::new(state.repo, state.gate, state.config);
    let edges = use_case
        .execute(scenario_id, body.into_iter().map(Into::into).collect())
        .await?;

    Ok(Json(to_responses(edges)))
}

/// DELETE /api/scenarios/{scenario_id}/edges/{id}
pub async fn delete_edge<R>(
    State(state): State<DecisionAppState<R>>,
    Path((scenario_id, id)): Path<(ScenarioId, EdgeId)>,
) -> DecisionResult<StatusCode>
where
    R: EdgeRepository + Send + Sync + 'static,
{
    let use_case = DeleteEdgesUseCase::new(state.repo, state.gate, state.config);
    use_case.delete_one(scenario_id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/scenarios/{scenario_id}/edges?ids=...
pub async fn delete_edges<R>(
    State(state): State<DecisionAppState<R>>,
    Path(scenario_id): Path<ScenarioId>,
    Query(query): Query<DeleteEdgesQuery>,
) -> DecisionResult<StatusCode>
where
    R: EdgeRepository + Send + Sync + 'static,
{
    let ids = query.parse_ids()?;
    let use_case = DeleteEdgesUseCase::new(state.repo, state.gate, state.config);
    use_case.execute(scenario_id, ids).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/edges/{id}
pub async fn get_edge<R>(
    State(state): State<DecisionAppState<R>>,
    Path(id): Path<EdgeId>,
) -> DecisionResult<Json<EdgeResponse>>
where
    R: EdgeRepository + Send + Sync + 'static,
{
    let edge = QueryEdgesUseCase::new(state.repo).get(id).await?;
    Ok(Json(edge.into()))
}

/// GET /api/edges
pub async fn list_edges<R>(
    State(state): State<DecisionAppState<R>>,
    Query(query): Query<ListEdgesQuery>,
) -> DecisionResult<Json<Vec<EdgeResponse>>>
where
    R: EdgeRepository + Send + Sync + 'static,
{
    let edges = QueryEdgesUseCase::new(state.repo)
        .list(query.scenario_id)
        .await?;
    Ok(Json(to_responses(edges)))
}
