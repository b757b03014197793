// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdev_core::variable::WorkspaceVariable;

#[yare::parameterized(
    creation        = { WorkspaceState::Running, WorkspaceState::CreationRequested, false, UpdateType::Partial, ResourceGroups::ALL },
    full_resync     = { WorkspaceState::Running, WorkspaceState::Running, false, UpdateType::Full, ResourceGroups::ALL },
    stop            = { WorkspaceState::Stopped, WorkspaceState::Running, false, UpdateType::Partial, ResourceGroups::UPDATE },
    rotation        = { WorkspaceState::Running, WorkspaceState::Running, true, UpdateType::Partial, ResourceGroups::ROTATION },
    terminate       = { WorkspaceState::Terminated, WorkspaceState::Running, true, UpdateType::Full, ResourceGroups::TERMINATION },
    terminate_fresh = { WorkspaceState::Terminated, WorkspaceState::CreationRequested, false, UpdateType::Partial, ResourceGroups::TERMINATION },
)]
fn groups_per_phase(
    desired: WorkspaceState,
    actual: WorkspaceState,
    rotated: bool,
    update_type: UpdateType,
    expected: ResourceGroups,
) {
    let ws = Workspace::builder()
        .desired_state(desired)
        .actual_state(actual)
        .variables_rotated(rotated)
        .build();
    assert_eq!(select_groups(&ws, update_type), expected);
}

#[test]
fn restart_requested_generates_zero_replicas() {
    let ws = Workspace::builder()
        .desired_state(WorkspaceState::RestartRequested)
        .actual_state(WorkspaceState::Running)
        .build();
    let set = desired_config(&ws, UpdateType::Partial).unwrap();
    assert_eq!(set.deployment().unwrap().spec.as_ref().unwrap().replicas, Some(0));
}

#[test]
fn creation_includes_secrets_with_variables() {
    let ws = Workspace::builder()
        .variables(vec![WorkspaceVariable::env("EDITOR", "vim")])
        .build();
    let set = desired_config(&ws, UpdateType::Partial).unwrap();
    assert_eq!(set.len(), 8);
    assert_eq!(set.kinds().iter().filter(|k| **k == "Secret").count(), 2);
}

#[test]
fn generation_errors_propagate() {
    let ws = Workspace::builder()
        .variables(vec![WorkspaceVariable::file("x", "y").mount_path("/projects")])
        .build();
    assert!(matches!(
        desired_config(&ws, UpdateType::Full),
        Err(ManifestError::ReservedMountPath { .. })
    ));
}
