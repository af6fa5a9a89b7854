use std::collections::HashMap;

use tracing::{info, warn};

use crate::model::action::{Action, ApplyContext};
use crate::remote::{BoardClient, RemoteError};

/// Execution stopped at the first failing action. Nothing already applied
/// is rolled back, so the remote board is left partially updated.
#[derive(Debug, thiserror::Error)]
#[error("{failed}: {source} ({} earlier change(s) were applied)", .applied.len())]
pub struct ExecuteError {
    /// Descriptions of the actions that succeeded before the failure
    pub applied: Vec<String>,
    /// Description of the action that failed
    pub failed: String,
    pub source: RemoteError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Descriptions of applied actions, in application order
    pub applied: Vec<String>,
    /// Placeholder ID -> real ID for everything created
    pub created: HashMap<String, String>,
}

/// Order actions for execution: grouped by phase, emitted order kept within
/// a phase
pub fn plan(actions: &[Action]) -> Vec<Action> {
    let mut ordered = actions.to_vec();
    ordered.sort_by_key(Action::phase);
    ordered
}

/// Apply actions in phase order, one at a time, stopping at the first error.
/// `on_applied` sees each action right after it succeeds.
pub fn execute(
    client: &mut dyn BoardClient,
    board_id: &str,
    actions: &[Action],
    mut on_applied: impl FnMut(&Action),
) -> Result<ExecutionReport, ExecuteError> {
    let mut ctx = ApplyContext::new(board_id);
    let mut applied = Vec::new();

    for action in plan(actions) {
        if let Err(source) = action.apply(client, &mut ctx) {
            warn!(action = %action, error = %source, "action failed, stopping");
            return Err(ExecuteError {
                applied,
                failed: action.describe(),
                source,
            });
        }
        info!(phase = ?action.phase(), "{}", action);
        on_applied(&action);
        applied.push(action.describe());
    }

    Ok(ExecutionReport {
        applied,
        created: ctx.created().clone(),
    })
}
