// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Which resources a workspace's next apply carries.

use rdev_core::{UpdateType, Workspace, WorkspaceState};
use rdev_manifest::{build, ManifestError, ManifestParams, ManifestSet, ResourceGroups};

/// Resource groups for the workspace's current phase.
///
/// - desired `Terminated`: the inventories alone, so the agent prunes the rest
/// - first apply (actual `CreationRequested`) or a full resync: everything
/// - variables changed since the last apply: workload, policy and Secrets
/// - any other desired-state change: workload and policy
pub fn select_groups(workspace: &Workspace, update_type: UpdateType) -> ResourceGroups {
    if workspace.desired_state() == WorkspaceState::Terminated {
        ResourceGroups::TERMINATION
    } else if workspace.actual_state() == WorkspaceState::CreationRequested
        || update_type == UpdateType::Full
    {
        ResourceGroups::ALL
    } else if workspace.variables_rotated() {
        ResourceGroups::ROTATION
    } else {
        ResourceGroups::UPDATE
    }
}

/// Manifests the agent should apply next for `workspace`.
pub fn desired_config(
    workspace: &Workspace,
    update_type: UpdateType,
) -> Result<ManifestSet, ManifestError> {
    let groups = select_groups(workspace, update_type);
    build(&ManifestParams::for_workspace(workspace, groups)).inspect_err(|e| {
        tracing::error!(
            workspace_id = %workspace.id,
            workspace = %workspace.name,
            namespace = %workspace.namespace,
            desired_state = %workspace.desired_state(),
            error = %e,
            "manifest generation failed"
        );
    })
}

#[cfg(test)]
#[path = "desired_config_tests.rs"]
mod tests;
