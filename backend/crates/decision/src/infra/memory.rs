//! In-Memory Repository
//!
//! Backs the API when no database is configured, and the test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use kernel::id::{EdgeId, ScenarioId};
use tokio::sync::RwLock;

use crate::domain::entities::Edge;
use crate::domain::repository::EdgeRepository;
use crate::error::{DecisionError, DecisionResult};

#[derive(Debug, Default)]
pub struct InMemoryEdgeRepository {
    edges: RwLock<HashMap<EdgeId, (u64, Edge)>>,
    next_seq: AtomicU64,
}

impl InMemoryEdgeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EdgeRepository for InMemoryEdgeRepository {
    async fn create(&self, edges: &[Edge]) -> DecisionResult<()> {
        let mut stored = self.edges.write().await;
        if let Some(dup) = edges.iter().find(|e| stored.contains_key(&e.id)) {
            return Err(DecisionError::EdgeExists(dup.id));
        }
        for edge in edges {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            stored.insert(edge.id, (seq, edge.clone()));
        }
        Ok(())
    }

    async fn get(&self, ids: &[EdgeId]) -> DecisionResult<Vec<Edge>> {
        let stored = self.edges.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| stored.get(id).map(|(_, e)| e.clone()))
            .collect())
    }

    async fn list(&self, scenario_id: Option<ScenarioId>) -> DecisionResult<Vec<Edge>> {
        let stored = self.edges.read().await;
        let mut found: Vec<&(u64, Edge)> = stored
            .values()
            .filter(|(_, e)| scenario_id.is_none_or(|s| e.belongs_to(s)))
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        Ok(found.into_iter().map(|(_, e)| e.clone()).collect())
    }

    async fn update(&self, edges: &[Edge]) -> DecisionResult<()> {
        let mut stored = self.edges.write().await;
        if let Some(missing) = edges.iter().find(|e| !stored.contains_key(&e.id)) {
            return Err(DecisionError::EdgeNotFound(missing.id));
        }
        for edge in edges {
            if let Some((_, current)) = stored.get_mut(&edge.id) {
                current.tail_id = edge.tail_id;
                current.head_id = edge.head_id;
                current.name.clone_from(&edge.name);
            }
        }
        Ok(())
    }

    async fn delete(&self, ids: &[EdgeId]) -> DecisionResult<u64> {
        let mut stored = self.edges.write().await;
        Ok(ids.iter().filter(|id| stored.remove(*id).is_some()).count() as u64)
    }
}
