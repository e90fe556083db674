//! Application Layer - Use Cases
//!
//! Orchestrates domain logic, the scenario lock and persistence.

pub mod config;
pub mod create_edges;
pub mod delete_edges;
pub mod query_edges;
pub mod scenario_gate;
pub mod sweeper;
pub mod update_edges;

use kernel::id::{EdgeId, IssueId};

/// Caller-supplied edge fields shared by create and update
#[derive(Debug, Clone)]
pub struct EdgeInput {
    /// Required for update; generated on create when absent
    pub id: Option<EdgeId>,
    pub tail_id: IssueId,
    pub head_id: Option<IssueId>,
    pub name: String,
}

pub(crate) fn ensure_batch_size(len: usize, max: usize) -> crate::error::DecisionResult<()> {
    if len > max {
        return Err(crate::error::DecisionError::InvalidInput(format!(
            "batch of {} edges exceeds the limit of {}",
            len, max
        )));
    }
    Ok(())
}

pub(crate) fn ensure_unique(
    ids: impl IntoIterator<Item = EdgeId>,
) -> crate::error::DecisionResult<()> {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(crate::error::DecisionError::InvalidInput(format!(
                "edge {} appears more than once",
                id
            )));
        }
    }
    Ok(())
}
