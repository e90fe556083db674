//! PostgreSQL Repository Implementation

use kernel::id::{EdgeId, IssueId, ScenarioId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::Edge;
use crate::domain::repository::EdgeRepository;
use crate::error::{DecisionError, DecisionResult};

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgEdgeRepository {
    pool: PgPool,
}

impl PgEdgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn uuids(ids: &[EdgeId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

impl EdgeRepository for PgEdgeRepository {
    async fn create(&self, edges: &[Edge]) -> DecisionResult<()> {
        let mut tx = self.pool.begin().await?;

        for edge in edges {
            sqlx::query(
                r#"
                INSERT INTO edges (
                    edge_id,
                    scenario_id,
                    tail_issue_id,
                    head_issue_id,
                    name
                ) VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(edge.id.into_uuid())
            .bind(edge.scenario_id.into_uuid())
            .bind(edge.tail_id.into_uuid())
            .bind(edge.head_id.map(IssueId::into_uuid))
            .bind(&edge.name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(count = edges.len(), "Edge rows inserted");
        Ok(())
    }

    async fn get(&self, ids: &[EdgeId]) -> DecisionResult<Vec<Edge>> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT edge_id, scenario_id, tail_issue_id, head_issue_id, name
            FROM edges
            WHERE edge_id = ANY($1)
            ORDER BY created_at, edge_id
            "#,
        )
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EdgeRow::into_edge).collect())
    }

    async fn list(&self, scenario_id: Option<ScenarioId>) -> DecisionResult<Vec<Edge>> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT edge_id, scenario_id, tail_issue_id, head_issue_id, name
            FROM edges
            WHERE $1::uuid IS NULL OR scenario_id = $1
            ORDER BY created_at, edge_id
            "#,
        )
        .bind(scenario_id.map(ScenarioId::into_uuid))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EdgeRow::into_edge).collect())
    }

    async fn update(&self, edges: &[Edge]) -> DecisionResult<()> {
        let mut tx = self.pool.begin().await?;

        for edge in edges {
            let affected = sqlx::query(
                r#"
                UPDATE edges
                SET tail_issue_id = $2,
                    head_issue_id = $3,
                    name = $4,
                    updated_at = now()
                WHERE edge_id = $1
                "#,
            )
            .bind(edge.id.into_uuid())
            .bind(edge.tail_id.into_uuid())
            .bind(edge.head_id.map(IssueId::into_uuid))
            .bind(&edge.name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if affected == 0 {
                // Dropping the transaction rolls back earlier rows.
                return Err(DecisionError::EdgeNotFound(edge.id));
            }
        }

        tx.commit().await?;

        tracing::debug!(count = edges.len(), "Edge rows updated");
        Ok(())
    }

    async fn delete(&self, ids: &[EdgeId]) -> DecisionResult<u64> {
        let deleted = sqlx::query("DELETE FROM edges WHERE edge_id = ANY($1)")
            .bind(uuids(ids))
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!(deleted, "Edge rows deleted");
        Ok(deleted)
    }
}

// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct EdgeRow {
    edge_id: Uuid,
    scenario_id: Uuid,
    tail_issue_id: Uuid,
    head_issue_id: Option<Uuid>,
    name: String,
}

impl EdgeRow {
    fn into_edge(self) -> Edge {
        Edge {
            id: EdgeId::from_uuid(self.edge_id),
            scenario_id: ScenarioId::from_uuid(self.scenario_id),
            tail_id: IssueId::from_uuid(self.tail_issue_id),
            head_id: self.head_issue_id.map(IssueId::from_uuid),
            name: self.name,
        }
    }
}
