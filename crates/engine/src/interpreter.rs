// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-info interpreter.
//!
//! Produces the agent report that describes a workspace after a modeled
//! transition: the workspace's Deployment at the replica count of the target
//! state, stamped with a resource version and carrying the matching status
//! stanza. The fake agent uses it to answer applies; tests use it to check
//! that the actual-state calculator inverts it.

use crate::status::deployment_status;
use rdev_core::transition::resolve;
use rdev_core::{
    AgentInfo, TerminationProgress, TransitionError, TransitionOutcome, Workspace, WorkspaceState,
};
use rdev_manifest::{build, ManifestError, ManifestParams, ResourceGroups};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("manifest generation failed: {0}")]
    Manifest(#[from] ManifestError),

    #[error("status stanza rejected: {0}")]
    Status(#[source] serde_json::Error),

    #[error("no Deployment generated for workspace {0}")]
    MissingDeployment(String),
}

const WORKLOAD_ONLY: ResourceGroups =
    ResourceGroups { inventory: false, workload: true, network_policy: false, secrets: false };

/// Agent report for `workspace` after `previous -> current`.
pub fn interpret(
    workspace: &Workspace,
    previous: WorkspaceState,
    current: WorkspaceState,
    workspace_exists: bool,
    resource_version: &str,
) -> Result<AgentInfo, InterpretError> {
    let name = workspace.name.clone();
    let namespace = workspace.namespace.clone();

    match current {
        WorkspaceState::Terminating => {
            return Ok(AgentInfo::terminating(name, namespace, TerminationProgress::Terminating))
        }
        WorkspaceState::Terminated => {
            return Ok(AgentInfo::terminating(name, namespace, TerminationProgress::Terminated))
        }
        _ => {}
    }

    let template = match resolve(previous, current, workspace_exists)? {
        TransitionOutcome::NoStatus => {
            return Ok(AgentInfo {
                name,
                namespace,
                termination_progress: None,
                latest_k8s_deployment_info: None,
                error_details: None,
            })
        }
        TransitionOutcome::Status(template) => template,
    };

    // The target state decides the replica count, not the previous one.
    let params = ManifestParams::for_workspace(workspace, WORKLOAD_ONLY).replicas(current.replicas());
    let mut deployment = build(&params)?
        .into_deployment()
        .ok_or_else(|| InterpretError::MissingDeployment(name.clone()))?;
    deployment.metadata.resource_version = Some(resource_version.to_string());
    deployment.status = Some(deployment_status(template, &name).map_err(InterpretError::Status)?);

    let document = serde_json::to_value(&deployment).map_err(InterpretError::Status)?;
    Ok(AgentInfo {
        name,
        namespace,
        termination_progress: None,
        latest_k8s_deployment_info: Some(document),
        error_details: None,
    })
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
