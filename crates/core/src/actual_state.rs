// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Actual-state calculation from agent reports.
//!
//! Follows Kubernetes Deployment status semantics: the `Progressing`
//! condition says whether a rollout is underway, the `Available` condition and
//! replica counters say where it ended up.

use crate::agent_info::{AgentInfo, TerminationProgress};
use crate::state::WorkspaceState;
use serde_json::Value;

const PROGRESSING: &str = "Progressing";
const AVAILABLE: &str = "Available";

const PROGRESS_DEADLINE_EXCEEDED: &str = "ProgressDeadlineExceeded";
const NEW_REPLICA_SET_AVAILABLE: &str = "NewReplicaSetAvailable";
const ROLLOUT_IN_PROGRESS: &[&str] = &["NewReplicaSetCreated", "FoundNewReplicaSet", "ReplicaSetUpdated"];

const MINIMUM_REPLICAS_AVAILABLE: &str = "MinimumReplicasAvailable";
const MINIMUM_REPLICAS_UNAVAILABLE: &str = "MinimumReplicasUnavailable";

/// Derive the actual state from a report's termination progress and
/// Deployment document.
pub fn calculate_actual_state(
    termination_progress: Option<TerminationProgress>,
    deployment: Option<&Value>,
) -> WorkspaceState {
    if let Some(progress) = termination_progress {
        return progress.state();
    }
    deployment.and_then(from_deployment).unwrap_or(WorkspaceState::Unknown)
}

/// `None` means the document is too incomplete to tell.
fn from_deployment(deployment: &Value) -> Option<WorkspaceState> {
    let spec_replicas = deployment.pointer("/spec/replicas")?.as_i64()?;
    let status = deployment.get("status")?;
    let conditions = status.get("conditions")?.as_array()?;
    let progressing = condition_reason(conditions, PROGRESSING)?;

    if progressing == PROGRESS_DEADLINE_EXCEEDED {
        return Some(WorkspaceState::Failed);
    }
    if ROLLOUT_IN_PROGRESS.contains(&progressing) {
        return match spec_replicas {
            0 => Some(WorkspaceState::Stopping),
            1 => Some(WorkspaceState::Starting),
            _ => None,
        };
    }

    let available_replicas = status.get("availableReplicas").and_then(Value::as_i64).unwrap_or(0);
    let unavailable_replicas =
        status.get("unavailableReplicas").and_then(Value::as_i64).unwrap_or(0);
    let available = condition_reason(conditions, AVAILABLE)?;

    if progressing != NEW_REPLICA_SET_AVAILABLE {
        return None;
    }
    let minimum_available = available == MINIMUM_REPLICAS_AVAILABLE;
    if minimum_available && spec_replicas == 0 && available_replicas == 0 {
        return Some(WorkspaceState::Stopped);
    }
    if minimum_available && spec_replicas == available_replicas && unavailable_replicas == 0 {
        return Some(WorkspaceState::Running);
    }
    if minimum_available && spec_replicas == 0 && available_replicas == 1 {
        return Some(WorkspaceState::Stopping);
    }
    if (minimum_available || available == MINIMUM_REPLICAS_UNAVAILABLE)
        && spec_replicas == 1
        && available_replicas == 0
    {
        return Some(WorkspaceState::Starting);
    }
    None
}

fn condition_reason<'a>(conditions: &'a [Value], kind: &str) -> Option<&'a str> {
    conditions
        .iter()
        .find(|c| c.get("type").and_then(Value::as_str) == Some(kind))?
        .get("reason")?
        .as_str()
}

/// An interpreted agent observation of one workspace.
///
/// This is the only input that moves a workspace's actual state; it can be
/// built from an agent report or from the timeout path, never from a bare
/// state value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    actual_state: WorkspaceState,
    deployment_resource_version: Option<String>,
}

impl Observation {
    pub fn from_report(info: &AgentInfo) -> Self {
        Self {
            actual_state: calculate_actual_state(
                info.termination_progress,
                info.latest_k8s_deployment_info.as_ref(),
            ),
            deployment_resource_version: info.deployment_resource_version(),
        }
    }

    /// The agent did not report within its bound.
    pub fn timed_out() -> Self {
        Self { actual_state: WorkspaceState::Unknown, deployment_resource_version: None }
    }

    pub fn actual_state(&self) -> WorkspaceState {
        self.actual_state
    }

    pub fn deployment_resource_version(&self) -> Option<&str> {
        self.deployment_resource_version.as_deref()
    }

    pub fn into_resource_version(self) -> Option<String> {
        self.deployment_resource_version
    }
}

#[cfg(test)]
#[path = "actual_state_tests.rs"]
mod tests;
