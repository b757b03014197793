// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fold an agent report into a workspace record.

use rdev_core::transition::resolve;
use rdev_core::{AgentInfo, Observation, TransitionError, Workspace, WorkspaceState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("agent info for {reported} does not belong to workspace {workspace}")]
    NameMismatch { workspace: String, reported: String },
}

/// Record the actual state an agent report implies.
///
/// A change of actual state must be a modeled transition; otherwise only the
/// operator error is recorded and the rest of the record is left untouched.
pub fn ingest_agent_info(
    workspace: &mut Workspace,
    info: &AgentInfo,
    now_ms: u64,
) -> Result<WorkspaceState, IngestError> {
    if info.name != workspace.name {
        return Err(IngestError::NameMismatch {
            workspace: workspace.name.clone(),
            reported: info.name.clone(),
        });
    }

    let observation = Observation::from_report(info);
    let previous = workspace.actual_state();
    let current = observation.actual_state();

    // A lost report leaves no previous state to validate against.
    if current != previous && previous != WorkspaceState::Unknown {
        if let Err(e) = resolve(previous, current, workspace.exists_in_cluster()) {
            let rejected = workspace.record_rejected_report(&e);
            tracing::error!(
                workspace_id = %workspace.id,
                workspace = %workspace.name,
                namespace = %workspace.namespace,
                previous = %previous,
                current = %current,
                workspace_exists = workspace.exists_in_cluster(),
                rejected,
                "rejected agent report"
            );
            return Err(e.into());
        }
    }

    if let Some(details) = &info.error_details {
        tracing::warn!(
            workspace = %workspace.name,
            error_type = %details.error_type,
            error_message = details.error_message.as_deref().unwrap_or_default(),
            "agent reported an error"
        );
    }

    workspace.apply_observation(observation, now_ms);
    workspace.clear_error();
    if current != previous {
        tracing::info!(
            workspace = %workspace.name,
            previous = %previous,
            current = %current,
            desired = %workspace.desired_state(),
            "actual state changed"
        );
    }
    Ok(current)
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
